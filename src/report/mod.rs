//! PNG charts (plotters) and console tables (tabled).

pub mod bitcoin;
pub mod exercise;
pub mod traffic;

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use colorgrad::Gradient;
use plotters::style::{RGBColor, TextStyle};

use crate::config::PLOT_CONFIG;

/// Make sure the chart's directory exists before the backend opens the file.
pub(crate) fn prepare_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    Ok(())
}

pub(crate) fn caption_style() -> TextStyle<'static> {
    (PLOT_CONFIG.font_family, PLOT_CONFIG.caption_font_size).into()
}

pub(crate) fn label_style() -> TextStyle<'static> {
    (PLOT_CONFIG.font_family, PLOT_CONFIG.label_font_size).into()
}

pub(crate) fn gradient(colors: &[&str]) -> Result<colorgrad::LinearGradient> {
    colorgrad::GradientBuilder::new()
        .html_colors(colors)
        .build::<colorgrad::LinearGradient>()
        .map_err(|e| anyhow!("invalid chart gradient: {}", e))
}

pub(crate) fn to_rgb(color: colorgrad::Color) -> RGBColor {
    let [r, g, b, _] = color.to_rgba8();
    RGBColor(r, g, b)
}

/// Colour for `t` in [0, 1] along `grad`.
pub(crate) fn gradient_at(grad: &colorgrad::LinearGradient, t: f64) -> RGBColor {
    to_rgb(grad.at(t.clamp(0.0, 1.0) as f32))
}

/// Label for category axes drawn on an f64 scale: only whole positions get a name.
pub(crate) fn category_label(x: f64, names: &[String]) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    names.get(i as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_whole_positions() {
        let names = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(category_label(1.0, &names), "Tue");
        assert_eq!(category_label(0.5, &names), "");
        assert_eq!(category_label(-1.0, &names), "");
        assert_eq!(category_label(5.0, &names), "");
    }

    #[test]
    fn gradient_endpoints_match_html_colors() {
        let grad = gradient(&["#000000", "#ffffff"]).unwrap();
        assert_eq!(gradient_at(&grad, 0.0), RGBColor(0, 0, 0));
        assert_eq!(gradient_at(&grad, 2.0), RGBColor(255, 255, 255));
    }
}
