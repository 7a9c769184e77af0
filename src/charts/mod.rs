// Chart models for the two designs under test
// Both are derived from one aggregation and stay fixed for the whole session

pub mod svg;

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use rand::Rng;

use crate::data::PhaseCount;
use crate::data::aggregate::{phases, years};

pub const CHART_TITLE: &str = "Birdstrikes by Phase of Flight Over Time";
pub const X_AXIS_LABEL: &str = "Year";
pub const Y_AXIS_LABEL: &str = "Number of Birdstrikes";
pub const LEGEND_TITLE: &str = "Phase of Flight";
pub const BAR_LABEL_ROTATION_DEG: f32 = 45.0;

/// Categorical palette, assigned to phases in order.
pub const PALETTE: [[u8; 3]; 10] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

pub fn phase_color(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

/// Label a chart is referred to by during the experiment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartLabel {
    Line = 1,
    StackedBar = 2,
}

impl ChartLabel {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn other(self) -> Self {
        match self {
            Self::Line => Self::StackedBar,
            Self::StackedBar => Self::Line,
        }
    }

    /// Uniform draw between the two charts.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Line
        } else {
            Self::StackedBar
        }
    }
}

impl fmt::Display for ChartLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => f.write_str("line chart"),
            Self::StackedBar => f.write_str("stacked bar chart"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineSeries {
    pub phase: String,
    pub color: [u8; 3],
    /// (year, count), ascending by year. Years without incidents have no point.
    pub points: Vec<(i32, u64)>,
}

/// Trend view: one line per phase with point markers.
#[derive(Clone, Debug, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: String,
    pub series: Vec<LineSeries>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarSegment {
    pub phase: String,
    pub color: [u8; 3],
    /// One height per year of the chart, zero where the phase has no incidents.
    pub counts: Vec<u64>,
}

/// Composition view: one bar per year, stacked by phase in segment order.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: String,
    pub x_label_rotation_deg: f32,
    pub years: Vec<i32>,
    pub segments: Vec<BarSegment>,
}

impl StackedBarChart {
    pub fn bar_total(&self, year_index: usize) -> u64 {
        self.segments
            .iter()
            .filter_map(|s| s.counts.get(year_index))
            .sum()
    }

    pub fn max_total(&self) -> u64 {
        (0..self.years.len())
            .map(|i| self.bar_total(i))
            .max()
            .unwrap_or(0)
    }
}

/// The two charts built for one session.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSet {
    pub line: LineChart,
    pub stacked_bar: StackedBarChart,
}

pub enum ChartRef<'a> {
    Line(&'a LineChart),
    StackedBar(&'a StackedBarChart),
}

impl ChartSet {
    pub fn build(counts: &[PhaseCount]) -> Self {
        let phase_names = phases(counts);
        let chart_years = years(counts);

        let series = phase_names
            .iter()
            .enumerate()
            .map(|(i, phase)| LineSeries {
                phase: phase.clone(),
                color: phase_color(i),
                points: counts
                    .iter()
                    .filter(|c| &c.phase == phase)
                    .map(|c| (c.year, c.count))
                    .sorted()
                    .collect(),
            })
            .collect();

        let segments = phase_names
            .iter()
            .enumerate()
            .map(|(i, phase)| BarSegment {
                phase: phase.clone(),
                color: phase_color(i),
                counts: chart_years
                    .iter()
                    .map(|year| {
                        counts
                            .iter()
                            .find(|c| c.year == *year && &c.phase == phase)
                            .map_or(0, |c| c.count)
                    })
                    .collect(),
            })
            .collect();

        Self {
            line: LineChart {
                title: CHART_TITLE.to_string(),
                x_label: X_AXIS_LABEL.to_string(),
                y_label: Y_AXIS_LABEL.to_string(),
                legend_title: LEGEND_TITLE.to_string(),
                series,
            },
            stacked_bar: StackedBarChart {
                title: CHART_TITLE.to_string(),
                x_label: X_AXIS_LABEL.to_string(),
                y_label: Y_AXIS_LABEL.to_string(),
                legend_title: LEGEND_TITLE.to_string(),
                x_label_rotation_deg: BAR_LABEL_ROTATION_DEG,
                years: chart_years,
                segments,
            },
        }
    }

    pub fn get(&self, label: ChartLabel) -> ChartRef<'_> {
        match label {
            ChartLabel::Line => ChartRef::Line(&self.line),
            ChartLabel::StackedBar => ChartRef::StackedBar(&self.stacked_bar),
        }
    }

    /// (year, phase) pairs plotted by the line chart.
    pub fn line_keys(&self) -> BTreeSet<(i32, String)> {
        self.line
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(year, _)| (*year, s.phase.clone())))
            .collect()
    }

    /// (year, phase) pairs with a visible segment in the stacked bar chart.
    pub fn bar_keys(&self) -> BTreeSet<(i32, String)> {
        self.stacked_bar
            .segments
            .iter()
            .flat_map(|s| {
                self.stacked_bar
                    .years
                    .iter()
                    .zip(&s.counts)
                    .filter(|(_, count)| **count > 0)
                    .map(|(year, _)| (*year, s.phase.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{IncidentRecord, aggregate_by_year_and_phase};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn count(year: i32, phase: &str, count: u64) -> PhaseCount {
        PhaseCount {
            year,
            phase: phase.to_string(),
            count,
        }
    }

    fn sample_counts() -> Vec<PhaseCount> {
        vec![
            count(1998, "Climb", 3),
            count(1998, "Take-off run", 5),
            count(1999, "Climb", 4),
            count(2000, "Landing Roll", 2),
            count(2000, "Take-off run", 1),
        ]
    }

    #[test]
    fn test_labels() {
        assert_eq!(ChartLabel::Line.number(), 1);
        assert_eq!(ChartLabel::StackedBar.number(), 2);
        assert_eq!(ChartLabel::Line.other(), ChartLabel::StackedBar);
        assert_eq!(ChartLabel::StackedBar.other(), ChartLabel::Line);

        let mut rng = StdRng::seed_from_u64(3);
        let draws = (0..100).map(|_| ChartLabel::random(&mut rng)).collect_vec();
        assert!(draws.contains(&ChartLabel::Line));
        assert!(draws.contains(&ChartLabel::StackedBar));
    }

    #[test]
    fn test_line_chart_has_one_series_per_phase() {
        let charts = ChartSet::build(&sample_counts());
        let line = &charts.line;
        assert_eq!(line.x_label, "Year");
        assert_eq!(line.y_label, "Number of Birdstrikes");
        assert_eq!(
            line.series.iter().map(|s| s.phase.as_str()).collect_vec(),
            vec!["Climb", "Landing Roll", "Take-off run"]
        );
        assert_eq!(line.series[0].points, vec![(1998, 3), (1999, 4)]);
        assert_eq!(line.series[2].points, vec![(1998, 5), (2000, 1)]);
    }

    #[test]
    fn test_stacked_bars_fill_missing_cells_with_zero() {
        let charts = ChartSet::build(&sample_counts());
        let bar = &charts.stacked_bar;
        assert_eq!(bar.years, vec![1998, 1999, 2000]);
        assert_eq!(bar.x_label_rotation_deg, 45.0);
        assert_eq!(bar.segments[0].counts, vec![3, 4, 0]);
        assert_eq!(bar.segments[1].counts, vec![0, 0, 2]);
        assert_eq!(bar.segments[2].counts, vec![5, 0, 1]);
        assert_eq!(bar.bar_total(0), 8);
        assert_eq!(bar.max_total(), 8);
    }

    #[test]
    fn test_phase_colors_match_across_charts() {
        let charts = ChartSet::build(&sample_counts());
        for (series, segment) in charts.line.series.iter().zip(&charts.stacked_bar.segments) {
            assert_eq!(series.phase, segment.phase);
            assert_eq!(series.color, segment.color);
        }
        assert_eq!(phase_color(0), phase_color(PALETTE.len()));
    }

    #[test]
    fn test_empty_table_builds_empty_charts() {
        let charts = ChartSet::build(&[]);
        assert!(charts.line.series.is_empty());
        assert!(charts.stacked_bar.years.is_empty());
        assert_eq!(charts.stacked_bar.max_total(), 0);
        assert!(matches!(charts.get(ChartLabel::Line), ChartRef::Line(_)));
        assert!(matches!(
            charts.get(ChartLabel::StackedBar),
            ChartRef::StackedBar(_)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_both_charts_plot_the_same_keys(
            rows in prop::collection::vec(
                (1995i32..2005, prop::sample::select(vec!["Approach", "Climb", "Descent", "Taxi"])),
                0..100,
            )
        ) {
            let records = rows
                .iter()
                .map(|(year, phase)| IncidentRecord::new(NaiveDate::from_ymd_opt(*year, 3, 1), *phase))
                .collect_vec();
            let counts = aggregate_by_year_and_phase(&records);
            let charts = ChartSet::build(&counts);

            // Property: the line chart and the stacked bar chart show the same (year, phase) pairs
            prop_assert_eq!(charts.line_keys(), charts.bar_keys());
            let expected: BTreeSet<(i32, String)> = counts.iter().map(|c| (c.year, c.phase.clone())).collect();
            prop_assert_eq!(charts.line_keys(), expected);
        }
    }
}
