use egui::{Color32, FontId, Pos2, RichText, Ui, epaint::TextShape, pos2, vec2};
use egui_plot::{Bar, BarChart, Legend, Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points};

use crate::charts::{ChartLabel, ChartRef, ChartSet, LineChart, StackedBarChart};

const PLOT_HEIGHT: f32 = 360.;
const BAR_WIDTH: f64 = 0.8;
const YEAR_LABEL_SPACE: f32 = 36.;
const LABEL_GAP: f32 = 4.;

fn to_color(rgb: [u8; 3]) -> Color32 {
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

pub(crate) fn show_chart(ui: &mut Ui, charts: &ChartSet, label: ChartLabel) {
    match charts.get(label) {
        ChartRef::Line(chart) => line_chart(ui, chart, label),
        ChartRef::StackedBar(chart) => stacked_bar_chart(ui, chart, label),
    }
}

fn chart_heading(ui: &mut Ui, title: &str, legend_title: &str) {
    ui.label(RichText::new(title).color(Color32::WHITE).strong().size(16.));
    ui.label(RichText::new(format!("Legend: {}", legend_title)).small());
}

fn line_chart(ui: &mut Ui, chart: &LineChart, label: ChartLabel) {
    chart_heading(ui, &chart.title, &chart.legend_title);
    Plot::new(("chart", label.number()))
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(chart.x_label.clone())
        .y_axis_label(chart.y_label.clone())
        .x_axis_formatter(|mark, _range| format!("{:.0}", mark.value))
        .show_grid(true)
        .include_y(0.)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let color = to_color(series.color);
                let values: Vec<[f64; 2]> = series
                    .points
                    .iter()
                    .map(|(year, count)| [*year as f64, *count as f64])
                    .collect();
                plot_ui.line(
                    Line::new(series.phase.as_str(), PlotPoints::new(values.clone()))
                        .color(color)
                        .width(2.),
                );
                plot_ui.points(
                    Points::new(series.phase.as_str(), PlotPoints::new(values))
                        .color(color)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(4.),
                );
            }
        });
}

fn stacked_bar_chart(ui: &mut Ui, chart: &StackedBarChart, label: ChartLabel) {
    chart_heading(ui, &chart.title, &chart.legend_title);

    let mut layers: Vec<BarChart> = Vec::with_capacity(chart.segments.len());
    for segment in &chart.segments {
        let bars = chart
            .years
            .iter()
            .zip(&segment.counts)
            .map(|(year, count)| Bar::new(*year as f64, *count as f64).width(BAR_WIDTH))
            .collect();
        let below: Vec<&BarChart> = layers.iter().collect();
        let layer = BarChart::new(segment.phase.as_str(), bars)
            .color(to_color(segment.color))
            .stack_on(&below);
        layers.push(layer);
    }

    // egui_plot cannot rotate tick labels: the x axis is hidden and the years
    // and axis title are painted below the plot widget instead
    let plot_response = Plot::new(("chart", label.number()))
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(chart.y_label.clone())
        .show_axes([false, true])
        .show_grid([false, true])
        .include_y(0.)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for layer in layers {
                plot_ui.bar_chart(layer);
            }
        });

    let painter = ui.painter();
    let text_color = ui.visuals().text_color();
    let rotation = chart.x_label_rotation_deg.to_radians();
    let frame = plot_response.transform.frame();
    let bottom = plot_response.response.rect.bottom();
    for year in &chart.years {
        let x = plot_response
            .transform
            .position_from_point(&PlotPoint::new(*year as f64, 0.))
            .x;
        if !frame.x_range().contains(x) {
            continue;
        }
        let galley = painter.layout_no_wrap(year.to_string(), FontId::proportional(12.), text_color);
        let pos = rotated_label_pos(pos2(x, bottom), galley.size().x, rotation);
        painter.add(TextShape::new(pos, galley, text_color).with_angle(-rotation));
    }
    ui.add_space(YEAR_LABEL_SPACE);
    ui.vertical_centered(|ui| ui.label(chart.x_label.as_str()));
}

/// Top-left corner for a label of `width` rotated by `rotation` radians so that
/// its end sits just below `anchor` and the text runs up to the right.
fn rotated_label_pos(anchor: Pos2, width: f32, rotation: f32) -> Pos2 {
    anchor + vec2(-width * rotation.cos(), width * rotation.sin() + LABEL_GAP)
}
