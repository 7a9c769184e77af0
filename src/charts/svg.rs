// SVG rendering of the chart models, used to export both charts as files

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::{ChartSet, LineChart, StackedBarChart};
use crate::errors::BirdstrikeError;

pub const LINE_CHART_FILE: &str = "line_chart.svg";
pub const STACKED_BAR_CHART_FILE: &str = "stacked_bar_chart.svg";

const Y_TICKS: u64 = 5;

/// Configuration for SVG chart generation
#[derive(Debug, Clone)]
pub struct ChartSvgConfig {
    /// Canvas dimensions (width, height) in pixels
    pub canvas_size: (u32, u32),
    /// Space reserved around the plot area (left, top, right, bottom); the right side holds the legend
    pub margins: (f32, f32, f32, f32),
    pub stroke_width: f32,
    pub marker_radius: f32,
    pub font_size: f32,
    /// Fraction of each year slot covered by its bar
    pub bar_width: f32,
}

impl Default for ChartSvgConfig {
    fn default() -> Self {
        // Same 2:1 aspect ratio as a 12x6 inch figure
        Self {
            canvas_size: (1200, 600),
            margins: (80., 50., 200., 80.),
            stroke_width: 2.0,
            marker_radius: 4.0,
            font_size: 12.0,
            bar_width: 0.8,
        }
    }
}

/// Plot area in canvas coordinates
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl PlotArea {
    fn width(&self) -> f32 {
        self.right - self.left
    }

    fn height(&self) -> f32 {
        self.bottom - self.top
    }

    fn y_for(&self, value: f64, y_max: f64) -> f32 {
        self.bottom - (value / y_max) as f32 * self.height()
    }
}

pub struct ChartSvgGenerator {
    config: ChartSvgConfig,
}

impl ChartSvgGenerator {
    pub fn new() -> Self {
        Self::with_config(ChartSvgConfig::default())
    }

    pub fn with_config(config: ChartSvgConfig) -> Self {
        Self { config }
    }

    fn plot_area(&self) -> Result<PlotArea, BirdstrikeError> {
        let (width, height) = self.config.canvas_size;
        let (left, top, right, bottom) = self.config.margins;
        let area = PlotArea {
            left,
            top,
            right: width as f32 - right,
            bottom: height as f32 - bottom,
        };
        if area.width() <= 0. || area.height() <= 0. {
            return Err(BirdstrikeError::SvgGenerationError {
                reason: format!(
                    "Canvas {}x{} is too small for the configured margins",
                    width, height
                ),
            });
        }
        Ok(area)
    }

    pub fn generate_line_chart(&self, chart: &LineChart) -> Result<String, BirdstrikeError> {
        let points = chart.series.iter().flat_map(|s| s.points.iter());
        let (Some(min_year), Some(max_year)) = (
            points.clone().map(|(year, _)| *year).min(),
            points.clone().map(|(year, _)| *year).max(),
        ) else {
            return Err(BirdstrikeError::SvgGenerationError {
                reason: "Cannot generate a line chart without data points".to_string(),
            });
        };
        let y_max = nice_max(points.map(|(_, count)| *count).max().unwrap_or(0));
        let area = self.plot_area()?;

        let year_span = (max_year - min_year).max(1) as f32;
        let x_for = |year: i32| {
            if min_year == max_year {
                area.left + area.width() / 2.
            } else {
                area.left + (year - min_year) as f32 / year_span * area.width()
            }
        };

        let mut svg = self.header(&chart.title);
        self.y_axis(&mut svg, &area, y_max, &chart.y_label, false);

        // vertical grid and year labels
        for year in min_year..=max_year {
            let x = x_for(year);
            svg.push_str(&format!(
                "\n  <line class=\"grid\" x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" />",
                area.top, area.bottom
            ));
            svg.push_str(&format!(
                "\n  <text class=\"tick\" x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{year}</text>",
                area.bottom + self.config.font_size * 1.5
            ));
        }
        self.x_axis(&mut svg, &area, &chart.x_label);

        for series in &chart.series {
            let color = rgb(series.color);
            let mut path = String::new();
            for (i, (year, count)) in series.points.iter().enumerate() {
                let command = if i == 0 { "M" } else { "L" };
                path.push_str(&format!(
                    "{}{} {:.2},{:.2}",
                    if i == 0 { "" } else { " " },
                    command,
                    x_for(*year),
                    area.y_for(*count as f64, y_max)
                ));
            }
            svg.push_str(&format!(
                "\n  <path class=\"series\" d=\"{}\" stroke=\"{}\" stroke-width=\"{:.2}\" fill=\"none\" />",
                path, color, self.config.stroke_width
            ));
            for (year, count) in &series.points {
                svg.push_str(&format!(
                    "\n  <circle class=\"marker\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" />",
                    x_for(*year),
                    area.y_for(*count as f64, y_max),
                    self.config.marker_radius,
                    color
                ));
            }
        }

        let entries = chart
            .series
            .iter()
            .map(|s| (s.phase.as_str(), s.color))
            .collect::<Vec<_>>();
        self.legend(&mut svg, &area, &chart.legend_title, &entries);
        self.footer(svg)
    }

    pub fn generate_stacked_bar_chart(
        &self,
        chart: &StackedBarChart,
    ) -> Result<String, BirdstrikeError> {
        if chart.years.is_empty() {
            return Err(BirdstrikeError::SvgGenerationError {
                reason: "Cannot generate a bar chart without years".to_string(),
            });
        }
        let y_max = nice_max(chart.max_total());
        let area = self.plot_area()?;
        let slot = area.width() / chart.years.len() as f32;
        let bar_width = slot * self.config.bar_width.clamp(0.1, 1.0);

        let mut svg = self.header(&chart.title);
        self.y_axis(&mut svg, &area, y_max, &chart.y_label, true);

        let mut segments_drawn = 0;
        for (year_index, year) in chart.years.iter().enumerate() {
            let x = area.left + slot * year_index as f32 + (slot - bar_width) / 2.;
            let mut base = 0u64;
            for segment in &chart.segments {
                let value = segment.counts.get(year_index).copied().unwrap_or(0);
                if value == 0 {
                    continue;
                }
                let y_top = area.y_for((base + value) as f64, y_max);
                let y_bottom = area.y_for(base as f64, y_max);
                svg.push_str(&format!(
                    "\n  <rect class=\"segment\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"0.8\" />",
                    x,
                    y_top,
                    bar_width,
                    y_bottom - y_top,
                    rgb(segment.color)
                ));
                base += value;
                segments_drawn += 1;
            }

            let label_x = area.left + slot * (year_index as f32 + 0.5);
            let label_y = area.bottom + self.config.font_size;
            svg.push_str(&format!(
                "\n  <text class=\"tick\" x=\"{label_x:.2}\" y=\"{label_y:.2}\" text-anchor=\"end\" transform=\"rotate({:.1} {label_x:.2} {label_y:.2})\">{year}</text>",
                -chart.x_label_rotation_deg
            ));
        }
        debug!(
            "Stacked bar chart: {} years, {} segments drawn",
            chart.years.len(),
            segments_drawn
        );
        self.x_axis(&mut svg, &area, &chart.x_label);

        let entries = chart
            .segments
            .iter()
            .map(|s| (s.phase.as_str(), s.color))
            .collect::<Vec<_>>();
        self.legend(&mut svg, &area, &chart.legend_title, &entries);
        self.footer(svg)
    }

    /// Writes both charts into `directory`, creating it if needed, and
    /// returns the written paths (line chart first).
    pub fn write_chart_set(
        &self,
        charts: &ChartSet,
        directory: &Path,
    ) -> Result<Vec<PathBuf>, BirdstrikeError> {
        fs::create_dir_all(directory).map_err(|e| BirdstrikeError::ExportIOError { source: e })?;

        let outputs = [
            (LINE_CHART_FILE, self.generate_line_chart(&charts.line)?),
            (
                STACKED_BAR_CHART_FILE,
                self.generate_stacked_bar_chart(&charts.stacked_bar)?,
            ),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (file_name, content) in outputs {
            let path = directory.join(file_name);
            fs::write(&path, content).map_err(|e| BirdstrikeError::ExportIOError { source: e })?;
            info!("Wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }

    fn header(&self, title: &str) -> String {
        let (width, height) = self.config.canvas_size;
        let mut svg = String::with_capacity(8 * 1024);
        svg.push_str(&format!(
            r#"<svg width="{width}" height="{height}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}">
  <defs>
    <style>
      text {{ font-family: sans-serif; font-size: {:.1}px; fill: #222; }}
      .title {{ font-size: {:.1}px; font-weight: bold; }}
      .axis {{ stroke: #222; stroke-width: 1; }}
      .grid {{ stroke: #ccc; stroke-width: 1; }}
    </style>
  </defs>
  <rect width="{width}" height="{height}" fill="white" />
  <text class="title" x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            self.config.font_size,
            self.config.font_size * 1.4,
            width as f32 / 2.,
            self.config.margins.1 / 2.,
            escape_xml(title)
        ));
        svg
    }

    fn y_axis(&self, svg: &mut String, area: &PlotArea, y_max: f64, label: &str, dashed: bool) {
        for tick in 0..=Y_TICKS {
            let value = y_max * tick as f64 / Y_TICKS as f64;
            let y = area.y_for(value, y_max);
            svg.push_str(&format!(
                "\n  <line class=\"grid\" x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\"{} />",
                area.left,
                area.right,
                if dashed {
                    " stroke-dasharray=\"6 4\" stroke-opacity=\"0.7\""
                } else {
                    ""
                }
            ));
            svg.push_str(&format!(
                "\n  <text class=\"tick\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
                area.left - 8.,
                y + self.config.font_size / 3.,
                value.round() as u64
            ));
        }
        svg.push_str(&format!(
            "\n  <line class=\"axis\" x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" />",
            area.top,
            area.bottom,
            x = area.left
        ));
        let label_x = area.left - 55.;
        let label_y = area.top + area.height() / 2.;
        svg.push_str(&format!(
            "\n  <text class=\"label\" x=\"{label_x:.2}\" y=\"{label_y:.2}\" text-anchor=\"middle\" transform=\"rotate(-90 {label_x:.2} {label_y:.2})\">{}</text>",
            escape_xml(label)
        ));
    }

    fn x_axis(&self, svg: &mut String, area: &PlotArea, label: &str) {
        svg.push_str(&format!(
            "\n  <line class=\"axis\" x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" />",
            area.left,
            area.right,
            y = area.bottom
        ));
        svg.push_str(&format!(
            "\n  <text class=\"label\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\">{}</text>",
            area.left + area.width() / 2.,
            area.bottom + self.config.margins.3 - self.config.font_size,
            escape_xml(label)
        ));
    }

    fn legend(&self, svg: &mut String, area: &PlotArea, title: &str, entries: &[(&str, [u8; 3])]) {
        let x = area.right + 20.;
        let line_height = self.config.font_size * 1.6;
        svg.push_str(&format!(
            "\n  <text class=\"legend-title\" x=\"{x:.2}\" y=\"{:.2}\" font-weight=\"bold\">{}</text>",
            area.top,
            escape_xml(title)
        ));
        for (i, (name, color)) in entries.iter().enumerate() {
            let y = area.top + line_height * (i + 1) as f32;
            svg.push_str(&format!(
                "\n  <rect class=\"legend-key\" x=\"{x:.2}\" y=\"{:.2}\" width=\"12\" height=\"12\" fill=\"{}\" />",
                y - 10.,
                rgb(*color)
            ));
            svg.push_str(&format!(
                "\n  <text class=\"legend-entry\" x=\"{:.2}\" y=\"{y:.2}\">{}</text>",
                x + 18.,
                escape_xml(name)
            ));
        }
    }

    fn footer(&self, mut svg: String) -> Result<String, BirdstrikeError> {
        svg.push_str("\n</svg>");
        if !svg.starts_with("<svg") || !svg.ends_with("</svg>") {
            return Err(BirdstrikeError::SvgGenerationError {
                reason: "Generated SVG has invalid structure".to_string(),
            });
        }
        debug!("Generated SVG with {} characters", svg.len());
        Ok(svg)
    }
}

impl Default for ChartSvgGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounds the axis maximum up to a multiple of a power of ten so tick labels stay readable.
fn nice_max(max: u64) -> f64 {
    if max == 0 {
        return 1.;
    }
    let magnitude = 10f64.powi((max as f64).log10().floor() as i32);
    let step = (magnitude / 2.).max(1.);
    ((max as f64) / step).ceil() * step
}

fn rgb(color: [u8; 3]) -> String {
    format!("rgb({},{},{})", color[0], color[1], color[2])
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PhaseCount;
    use tempfile::TempDir;

    fn count(year: i32, phase: &str, count: u64) -> PhaseCount {
        PhaseCount {
            year,
            phase: phase.to_string(),
            count,
        }
    }

    fn sample_charts() -> ChartSet {
        ChartSet::build(&[
            count(1998, "Climb", 3),
            count(1998, "Take-off run", 5),
            count(1999, "Climb", 4),
            count(2000, "Landing <Roll>", 2),
            count(2000, "Take-off run", 1),
        ])
    }

    #[test]
    fn test_nice_max() {
        assert_eq!(nice_max(0), 1.);
        assert_eq!(nice_max(3), 3.);
        assert_eq!(nice_max(8), 8.);
        assert_eq!(nice_max(42), 45.);
        assert_eq!(nice_max(120), 150.);
    }

    #[test]
    fn test_line_chart_svg() {
        let svg = ChartSvgGenerator::new()
            .generate_line_chart(&sample_charts().line)
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"series\"").count(), 3);
        assert_eq!(svg.matches("class=\"marker\"").count(), 5);
        assert!(svg.contains("Birdstrikes by Phase of Flight Over Time"));
        assert!(svg.contains(">Year</text>"));
        assert!(svg.contains(">Number of Birdstrikes</text>"));
        assert!(svg.contains("Landing &lt;Roll&gt;"));
        assert!(!svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_stacked_bar_chart_svg() {
        let svg = ChartSvgGenerator::new()
            .generate_stacked_bar_chart(&sample_charts().stacked_bar)
            .unwrap();
        // one rect per non-zero (year, phase) cell
        assert_eq!(svg.matches("class=\"segment\"").count(), 5);
        assert_eq!(svg.matches("rotate(-45.0 ").count(), 3);
        assert!(svg.contains("stroke-dasharray"));
        assert_eq!(svg.matches("class=\"legend-entry\"").count(), 3);
    }

    #[test]
    fn test_empty_charts_are_rejected() {
        let charts = ChartSet::build(&[]);
        let generator = ChartSvgGenerator::new();
        assert!(matches!(
            generator.generate_line_chart(&charts.line),
            Err(BirdstrikeError::SvgGenerationError { .. })
        ));
        assert!(matches!(
            generator.generate_stacked_bar_chart(&charts.stacked_bar),
            Err(BirdstrikeError::SvgGenerationError { .. })
        ));
    }

    #[test]
    fn test_tiny_canvas_is_rejected() {
        let generator = ChartSvgGenerator::with_config(ChartSvgConfig {
            canvas_size: (100, 100),
            ..Default::default()
        });
        assert!(generator.generate_line_chart(&sample_charts().line).is_err());
    }

    #[test]
    fn test_single_year_line_chart() {
        let charts = ChartSet::build(&[count(2001, "Climb", 2)]);
        let svg = ChartSvgGenerator::new()
            .generate_line_chart(&charts.line)
            .unwrap();
        assert_eq!(svg.matches("class=\"marker\"").count(), 1);
    }

    #[test]
    fn test_write_chart_set() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("charts");
        let written = ChartSvgGenerator::new()
            .write_chart_set(&sample_charts(), &output)
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with(LINE_CHART_FILE));
        assert!(written[1].ends_with(STACKED_BAR_CHART_FILE));
        for path in written {
            let content = fs::read_to_string(path).unwrap();
            assert!(content.starts_with("<svg"));
        }
    }
}
