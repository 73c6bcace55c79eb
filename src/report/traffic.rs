use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;
use tabled::{Table, Tabled, settings::Style};

use crate::{
    analysis::{
        route_sim::SimulationResult,
        traffic::{DailySpeedStats, GreenshieldsParams, WeeklyPoint},
    },
    config::PLOT_CONFIG,
    report::{caption_style, category_label, label_style, prepare_output},
    utils::padded_range,
};

/// Scatter of the fit points with the fitted Greenshields line on top.
pub fn draw_speed_density(
    path: &Path,
    points: &[(f64, f64)],
    fit: &GreenshieldsParams,
) -> Result<()> {
    prepare_output(path)?;

    let line = fit.line();
    let densities: Vec<f64> = points.iter().map(|p| p.0).collect();
    let speeds: Vec<f64> = points
        .iter()
        .map(|p| p.1)
        .chain(line.iter().map(|p| p.1))
        .collect();
    let (_, x_hi) = padded_range(&densities, PLOT_CONFIG.plot_y_padding_pct);
    let (y_lo, y_hi) = padded_range(&speeds, PLOT_CONFIG.plot_y_padding_pct);

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Speed vs Density (Greenshields Model)", caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(0f64..x_hi.max(1.0), y_lo.min(0.0)..y_hi)?;

    chart
        .configure_mesh()
        .x_desc("Density (veh/km)")
        .y_desc("Speed (km/h)")
        .label_style(label_style())
        .draw()?;

    let scatter = PLOT_CONFIG.color_scatter;
    let fit_color = PLOT_CONFIG.color_fit_line;

    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 2, scatter.mix(PLOT_CONFIG.scatter_opacity).filled())),
        )?
        .label("Observed")
        .legend(move |(x, y)| Circle::new((x + 10, y), 3, scatter.filled()));

    chart
        .draw_series(LineSeries::new(line, fit_color.stroke_width(2)))?
        .label(format!(
            "v = {:.1} - {:.3}k",
            fit.intercept,
            -fit.slope
        ))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], fit_color));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(label_style())
        .draw()?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

/// Mean volume bars per weekday with mean speed on a secondary axis.
pub fn draw_weekly_pattern(path: &Path, week: &[WeeklyPoint]) -> Result<()> {
    prepare_output(path)?;

    let names: Vec<String> = week.iter().map(|w| w.day.to_string()).collect();
    let volumes: Vec<f64> = week.iter().filter_map(|w| w.mean_volume).collect();
    let speeds: Vec<f64> = week.iter().filter_map(|w| w.mean_speed).collect();
    let (_, vol_hi) = padded_range(&volumes, PLOT_CONFIG.plot_y_padding_pct);
    let (spd_lo, spd_hi) = padded_range(&speeds, PLOT_CONFIG.plot_y_padding_pct);
    let x_range = -0.5f64..(week.len() as f64 - 0.5);

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Weekly Pattern (Traffic vs Speed)", caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .right_y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(x_range.clone(), 0f64..vol_hi.max(1.0))?
        .set_secondary_coord(x_range, spd_lo..spd_hi);

    let x_fmt = |x: &f64| category_label(*x, &names);
    chart
        .configure_mesh()
        .x_labels(week.len())
        .x_label_formatter(&x_fmt)
        .disable_x_mesh()
        .y_desc("Traffic Volume (veh/h)")
        .label_style(label_style())
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Speed (km/h)")
        .label_style(label_style())
        .draw()?;

    let bar = PLOT_CONFIG.color_volume_bar;
    let speed = PLOT_CONFIG.color_speed_line;

    chart
        .draw_series(week.iter().enumerate().filter_map(|(i, w)| {
            let v = w.mean_volume?;
            let x = i as f64;
            Some(Rectangle::new(
                [(x - 0.35, 0.0), (x + 0.35, v)],
                bar.mix(PLOT_CONFIG.bar_opacity).filled(),
            ))
        }))?
        .label("Traffic Volume")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], bar.filled()));

    let speed_points: Vec<(f64, f64)> = week
        .iter()
        .enumerate()
        .filter_map(|(i, w)| Some((i as f64, w.mean_speed?)))
        .collect();
    chart
        .draw_secondary_series(LineSeries::new(
            speed_points.iter().copied(),
            speed.stroke_width(2),
        ))?
        .label("Avg Speed")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], speed));
    chart.draw_secondary_series(
        speed_points
            .iter()
            .map(|&p| Circle::new(p, 4, speed.filled())),
    )?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(label_style())
        .draw()?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

pub fn daily_speed_table(stats: &DailySpeedStats) -> String {
    #[derive(Tabled)]
    struct Row<'a> {
        #[tabled(rename = "Weekday")]
        day: &'a str,
        #[tabled(rename = "Avg Speed (km/h)")]
        speed: String,
    }

    let rows: Vec<Row> = stats
        .by_day
        .iter()
        .map(|(day, s)| Row {
            day,
            speed: format!("{:.1}", s),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn route_table(results: &[SimulationResult]) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Split A %")]
        split: String,
        #[tabled(rename = "Vol A")]
        volume_a: String,
        #[tabled(rename = "Vol B")]
        volume_b: String,
        #[tabled(rename = "Time A (min)")]
        time_a: String,
        #[tabled(rename = "Time B (min)")]
        time_b: String,
        #[tabled(rename = "System (veh-min)")]
        total: String,
    }

    let rows: Vec<Row> = results
        .iter()
        .map(|r| Row {
            split: format!("{:.0}", r.split_a_pct),
            volume_a: format!("{:.0}", r.volume_a),
            volume_b: format!("{:.0}", r.volume_b),
            time_a: format!("{:.1}", r.time_a),
            time_b: format!("{:.1}", r.time_b),
            total: format!("{:.0}", r.total_system_time),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::route_sim::{BprParams, simulate};
    use crate::analysis::traffic::{fit_greenshields, fit_points, weekly_pattern};
    use crate::data::VdsRecord;

    fn record(weekday: &str, volume: f64, speed: f64) -> VdsRecord {
        VdsRecord {
            weekday: Some(weekday.to_string()),
            node: Some("안현JC".to_string()),
            volume: Some(volume),
            speed: Some(speed),
            density: Some(volume / speed),
            ..Default::default()
        }
    }

    #[test]
    fn traffic_charts_render_with_missing_days() {
        let dir = tempfile::tempdir().unwrap();
        // Points on u = 100 - 0.5k
        let records = vec![
            record("월요일", 1800.0, 90.0),
            record("수요일", 3200.0, 80.0),
            record("수요일", 4200.0, 70.0),
            record("토요일", 4800.0, 60.0),
        ];
        let fit = fit_greenshields(&records).unwrap();

        let scatter = dir.path().join("web/speed_density.png");
        draw_speed_density(&scatter, &fit_points(&records), &fit).unwrap();
        let weekly = dir.path().join("web/weekly_pattern.png");
        let week = weekly_pattern(&records);
        assert!(week.iter().any(|w| w.mean_volume.is_none()));
        draw_weekly_pattern(&weekly, &week).unwrap();

        assert!(std::fs::metadata(&scatter).unwrap().len() > 0);
        assert!(std::fs::metadata(&weekly).unwrap().len() > 0);
    }

    #[test]
    fn daily_table_lists_each_day() {
        let stats = DailySpeedStats {
            by_day: vec![("금요일".into(), 61.25), ("일요일".into(), 98.0)],
        };
        let table = daily_speed_table(&stats);
        assert!(table.contains("금요일"));
        assert!(table.contains("61.2") || table.contains("61.3"));
        assert!(table.contains("98.0"));
    }

    #[test]
    fn route_table_rounds_volumes() {
        let r = simulate(2000.0, 50.0, &BprParams::default()).unwrap();
        let table = route_table(&[r]);
        assert!(table.contains("1000"));
        assert!(table.contains("3.0"));
        assert!(table.contains("4.7"));
    }
}
