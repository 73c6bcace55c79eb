use std::path::Path;

use anyhow::{Result, ensure};
use colorgrad::Gradient;
use itertools::Itertools;
use plotters::prelude::*;
use tabled::{Table, Tabled, settings::Style};

use crate::{
    analysis::exercise::{MonthlyReport, MonthlyVolume, WeekdayHeatmap, WeeklyProgress, month_label},
    config::PLOT_CONFIG,
    domain::{Routine, Routines},
    report::{
        caption_style, category_label, gradient, gradient_at, label_style, prepare_output, to_rgb,
    },
    utils::{get_max, padded_range},
};

const WEEK_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn routine_table(today: &[(&str, &Routine)]) -> String {
    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "#")]
        n: usize,
        #[tabled(rename = "Exercise")]
        name: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Intensity")]
        intensity: u8,
        #[tabled(rename = "Type")]
        kind: String,
    }

    let rows: Vec<Row> = today
        .iter()
        .enumerate()
        .map(|(i, (key, r))| Row {
            n: i + 1,
            name: r.name.clone().unwrap_or_else(|| key.to_string()),
            target: format!("{} {}", r.reps, r.unit_or_default()),
            intensity: r.intensity,
            kind: r.kind.to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Every stored routine with its key, for `exercise-routine list`.
pub fn routines_table(routines: &Routines) -> String {
    #[derive(Tabled)]
    struct Row<'a> {
        #[tabled(rename = "Key")]
        key: &'a str,
        #[tabled(rename = "Name")]
        name: &'a str,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Intensity")]
        intensity: u8,
        #[tabled(rename = "Days")]
        days: String,
    }

    let rows: Vec<Row> = routines
        .iter()
        .map(|(key, r)| Row {
            key: key.as_str(),
            name: r.name.as_deref().unwrap_or(key),
            kind: r.kind.to_string(),
            target: format!("{} {}", r.reps, r.unit_or_default()),
            intensity: r.intensity,
            days: r.days.join(" "),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn weekly_progress_line(week: &WeeklyProgress) -> String {
    let days = WEEK_LABELS
        .iter()
        .zip(week.done)
        .map(|(d, n)| format!("{} {}", d, n))
        .join(" | ");
    format!("Week of {}: {} (total {})", week.monday, days, week.total())
}

pub fn monthly_report_text(report: &MonthlyReport) -> String {
    #[derive(Tabled)]
    struct Row<'a> {
        #[tabled(rename = "Exercise")]
        exercise: &'a str,
        #[tabled(rename = "Completed")]
        count: usize,
    }

    let mut out = format!(
        "[Monthly Report {}]\nLogged: {}  Completed: {}  Active days: {}\nCompletion rate: {:.0}%  Avg RPE: {}\n",
        month_label((report.year, report.month)),
        report.records,
        report.completed,
        report.active_days,
        report.completion_rate * 100.0,
        report
            .avg_rpe
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string()),
    );
    if !report.exercise_counts.is_empty() {
        let rows: Vec<Row> = report
            .exercise_counts
            .iter()
            .map(|(e, c)| Row {
                exercise: e,
                count: *c,
            })
            .collect();
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    }
    out
}

/// Exercise x weekday grid coloured by done-ratio.
pub fn draw_weekday_heatmap(path: &Path, heat: &WeekdayHeatmap) -> Result<()> {
    ensure!(!heat.exercises.is_empty(), "no records for the weekday heatmap");
    prepare_output(path)?;

    let grad = gradient(PLOT_CONFIG.heatmap_gradient_colors)?;
    let days: Vec<String> = WEEK_LABELS.iter().map(|d| d.to_string()).collect();
    let rows = heat.exercises.len();

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Weekday Completion Heatmap", caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(-0.5f64..6.5f64, -0.5f64..(rows as f64 - 0.5))?;

    let x_fmt = |x: &f64| category_label(*x, &days);
    let y_fmt = |y: &f64| category_label(*y, &heat.exercises);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(7)
        .y_labels(rows)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style(label_style())
        .draw()?;

    let grad = &grad;
    chart.draw_series(heat.cells.iter().enumerate().flat_map(move |(e, row)| {
        row.iter().enumerate().map(move |(d, &ratio)| {
            let (x, y) = (d as f64, e as f64);
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                gradient_at(grad, ratio).filled(),
            )
        })
    }))?;

    chart.draw_series(heat.cells.iter().enumerate().flat_map(|(e, row)| {
        row.iter().enumerate().map(move |(d, &ratio)| {
            let color: &'static RGBColor = if ratio > 0.6 { &WHITE } else { &BLACK };
            Text::new(
                format!("{:.2}", ratio),
                (d as f64 - 0.12, e as f64),
                label_style().color(color),
            )
        })
    }))?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

/// Mean planned intensity per month.
pub fn draw_intensity_trend(path: &Path, series: &[((i32, u32), f64)]) -> Result<()> {
    ensure!(!series.is_empty(), "no records for the intensity trend");
    prepare_output(path)?;

    let labels: Vec<String> = series.iter().map(|(k, _)| month_label(*k)).collect();
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let (y_lo, y_hi) = padded_range(&values, 0.2);

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Average Intensity", caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(-0.5f64..(series.len() as f64 - 0.5), y_lo..y_hi)?;

    let x_fmt = |x: &f64| category_label(*x, &labels);
    chart
        .configure_mesh()
        .x_labels(series.len())
        .x_label_formatter(&x_fmt)
        .x_desc("Month")
        .y_desc("Intensity")
        .label_style(label_style())
        .draw()?;

    let color = PLOT_CONFIG.color_history;
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 5, color.filled())))?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

/// Completed sessions per month, stacked by exercise.
pub fn draw_stacked_volume(path: &Path, volume: &MonthlyVolume) -> Result<()> {
    ensure!(!volume.months.is_empty(), "no completed records for the volume chart");
    prepare_output(path)?;

    let labels: Vec<String> = volume.months.iter().map(|k| month_label(*k)).collect();
    let totals: Vec<f64> = volume
        .counts
        .iter()
        .map(|row| row.iter().sum::<usize>() as f64)
        .collect();
    let y_hi = get_max(&totals) * 1.15;
    let palette: Vec<RGBColor> = gradient(PLOT_CONFIG.stack_gradient_colors)?
        .colors(volume.exercises.len())
        .into_iter()
        .map(to_rgb)
        .collect();

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Completed Volume by Exercise", caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(
            -0.5f64..(labels.len() as f64 - 0.5),
            0f64..y_hi.max(1.0),
        )?;

    let x_fmt = |x: &f64| category_label(*x, &labels);
    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&x_fmt)
        .disable_x_mesh()
        .x_desc("Month")
        .y_desc("Completed sessions")
        .label_style(label_style())
        .draw()?;

    let mut base = vec![0.0f64; labels.len()];
    for (e, name) in volume.exercises.iter().enumerate() {
        let color = palette.get(e).copied().unwrap_or(PLOT_CONFIG.color_history);
        let bars: Vec<Rectangle<(f64, f64)>> = volume
            .counts
            .iter()
            .enumerate()
            .filter(|(_, row)| row[e] > 0)
            .map(|(m, row)| {
                let x = m as f64;
                let lo = base[m];
                let hi = lo + row[e] as f64;
                Rectangle::new([(x - 0.35, lo), (x + 0.35, hi)], color.filled())
            })
            .collect();
        for (m, row) in volume.counts.iter().enumerate() {
            base[m] += row[e] as f64;
        }
        chart
            .draw_series(bars)?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }

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

/// Done-ratio per month as percentage bars.
pub fn draw_monthly_adherence(path: &Path, series: &[((i32, u32), f64)]) -> Result<()> {
    ensure!(!series.is_empty(), "no records for the adherence chart");
    prepare_output(path)?;

    let labels: Vec<String> = series.iter().map(|(k, _)| month_label(*k)).collect();
    let grad = gradient(PLOT_CONFIG.heatmap_gradient_colors)?;

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Adherence", caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(-0.5f64..(series.len() as f64 - 0.5), 0f64..110f64)?;

    let x_fmt = |x: &f64| category_label(*x, &labels);
    chart
        .configure_mesh()
        .x_labels(series.len())
        .x_label_formatter(&x_fmt)
        .disable_x_mesh()
        .x_desc("Month")
        .y_desc("Completion (%)")
        .label_style(label_style())
        .draw()?;

    chart.draw_series(series.iter().enumerate().map(|(i, (_, ratio))| {
        let x = i as f64;
        Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, ratio * 100.0)],
            gradient_at(&grad, 0.35 + ratio * 0.65).filled(),
        )
    }))?;
    chart.draw_series(series.iter().enumerate().map(|(i, (_, ratio))| {
        Text::new(
            format!("{:.0}%", ratio * 100.0),
            (i as f64 - 0.1, ratio * 100.0 + 4.0),
            label_style(),
        )
    }))?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}

/// Completed sessions per weekday of the current week.
pub fn draw_weekly_progress(path: &Path, week: &WeeklyProgress) -> Result<()> {
    prepare_output(path)?;

    let labels: Vec<String> = WEEK_LABELS.iter().map(|d| d.to_string()).collect();
    let y_hi = (week.done.iter().copied().max().unwrap_or(0) as f64 + 1.0).max(3.0);

    let root = BitMapBackend::new(path, PLOT_CONFIG.chart_size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Weekly Progress (from {})", week.monday), caption_style())
        .margin(PLOT_CONFIG.margin)
        .x_label_area_size(PLOT_CONFIG.x_label_area)
        .y_label_area_size(PLOT_CONFIG.y_label_area)
        .build_cartesian_2d(-0.5f64..6.5f64, 0f64..y_hi)?;

    let x_fmt = |x: &f64| category_label(*x, &labels);
    chart
        .configure_mesh()
        .x_labels(7)
        .x_label_formatter(&x_fmt)
        .disable_x_mesh()
        .y_desc("Completed sessions")
        .label_style(label_style())
        .draw()?;

    let color = PLOT_CONFIG.color_history;
    chart.draw_series(week.done.iter().enumerate().map(|(i, &n)| {
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, n as f64)], color.filled())
    }))?;

    root.present()?;
    log::info!("Chart written to {}", path.display());
    Ok(())
}
