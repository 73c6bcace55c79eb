//! Chart rendering configuration

use plotters::style::RGBColor;

pub struct PlotConfig {
    /// Pixel size of every PNG written
    pub chart_size: (u32, u32),
    pub font_family: &'static str,
    pub caption_font_size: f64,
    pub label_font_size: f64,
    pub margin: u32,
    pub x_label_area: u32,
    pub y_label_area: u32,
    /// Y-Axis Padding factor (e.g. 0.05 = 5% padding top and bottom)
    pub plot_y_padding_pct: f64,
    /// Number of x axis labels on time-series charts
    pub time_axis_labels: usize,

    // --- SERIES COLORS ---
    pub color_history: RGBColor,
    pub color_trend: RGBColor,
    pub color_forecast: RGBColor,
    pub color_scatter: RGBColor,
    pub color_fit_line: RGBColor,
    pub color_volume_bar: RGBColor,
    pub color_speed_line: RGBColor,
    pub color_text_box: RGBColor,
    pub scatter_opacity: f64,
    pub bar_opacity: f64,

    // Gradient colors for the exercise heatmap, low to high done-ratio
    pub heatmap_gradient_colors: &'static [&'static str],
    // Stacked volume series, sampled evenly per exercise
    pub stack_gradient_colors: &'static [&'static str],
}

pub const PLOT_CONFIG: PlotConfig = PlotConfig {
    chart_size: (1200, 600),
    font_family: "sans-serif",
    caption_font_size: 26.0,
    label_font_size: 14.0,
    margin: 15,
    x_label_area: 45,
    y_label_area: 70,
    plot_y_padding_pct: 0.05,
    time_axis_labels: 8,

    color_history: RGBColor(31, 119, 180),
    color_trend: RGBColor(255, 127, 14),
    color_forecast: RGBColor(214, 39, 40),
    color_scatter: RGBColor(70, 130, 180),
    color_fit_line: RGBColor(220, 20, 60),
    color_volume_bar: RGBColor(135, 206, 235), // skyblue
    color_speed_line: RGBColor(255, 0, 0),
    color_text_box: RGBColor(245, 222, 179), // wheat
    scatter_opacity: 0.3,
    bar_opacity: 0.8,

    heatmap_gradient_colors: &["#f7fbff", "#6baed6", "#08306b"],
    stack_gradient_colors: &["#1f77b4", "#2ca02c", "#ff7f0e", "#d62728", "#9467bd"],
};
