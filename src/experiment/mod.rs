// Timed A/B experiment comparing the two chart designs
// The user answers the question once per chart; the chart answered faster wins

pub mod clock;

use std::fmt;
use std::time::Duration;

use log::info;
use rand::Rng;

use crate::BirdstrikeError;
use crate::charts::ChartLabel;

pub use clock::{Clock, ManualClock, SystemClock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperimentState {
    Idle,
    ShowingFirst,
    ShowingSecond,
    Finished,
}

impl fmt::Display for ExperimentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "idle",
            Self::ShowingFirst => "showing the first chart",
            Self::ShowingSecond => "showing the second chart",
            Self::Finished => "finished",
        };
        f.write_str(text)
    }
}

/// User actions, one button each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Show,
    Confirm,
    Finish,
    Reset,
}

impl Action {
    pub const ALL: [Action; 4] = [Self::Show, Self::Confirm, Self::Finish, Self::Reset];

    pub fn button_text(&self) -> &'static str {
        match self {
            Self::Show => "Show Graph",
            Self::Confirm => "I answered your question",
            Self::Finish => "Finish",
            Self::Reset => "Reset",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.button_text())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    First,
    Second,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Timings of a complete run and the chart declared better.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExperimentOutcome {
    pub first_chart: ChartLabel,
    pub duration_first: Duration,
    pub duration_second: Duration,
}

impl ExperimentOutcome {
    /// The chart answered faster. A tie goes to the chart shown second.
    pub fn winner_position(&self) -> Position {
        if self.duration_second > self.duration_first {
            Position::First
        } else {
            Position::Second
        }
    }

    pub fn second_chart(&self) -> ChartLabel {
        self.first_chart.other()
    }

    pub fn winner(&self) -> ChartLabel {
        match self.winner_position() {
            Position::First => self.first_chart,
            Position::Second => self.second_chart(),
        }
    }
}

/// State of one experiment run, owned by the session and mutated only by the
/// action handlers below.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentSession {
    selected_graph: ChartLabel,
    first_show: bool,
    second_show: bool,
    start_time: Option<Duration>,
    mid_time: Option<Duration>,
    end_time: Option<Duration>,
}

impl ExperimentSession {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_selected_graph(ChartLabel::random(rng))
    }

    pub fn with_selected_graph(selected_graph: ChartLabel) -> Self {
        Self {
            selected_graph,
            first_show: false,
            second_show: false,
            start_time: None,
            mid_time: None,
            end_time: None,
        }
    }

    pub fn selected_graph(&self) -> ChartLabel {
        self.selected_graph
    }

    pub fn first_show(&self) -> bool {
        self.first_show
    }

    pub fn second_show(&self) -> bool {
        self.second_show
    }

    pub fn start_time(&self) -> Option<Duration> {
        self.start_time
    }

    pub fn mid_time(&self) -> Option<Duration> {
        self.mid_time
    }

    pub fn end_time(&self) -> Option<Duration> {
        self.end_time
    }

    pub fn state(&self) -> ExperimentState {
        if self.end_time.is_some() {
            ExperimentState::Finished
        } else if self.second_show {
            ExperimentState::ShowingSecond
        } else if self.first_show {
            ExperimentState::ShowingFirst
        } else {
            ExperimentState::Idle
        }
    }

    /// The single action offered to the user in the current state.
    pub fn enabled_action(&self) -> Action {
        match self.state() {
            ExperimentState::Idle => Action::Show,
            ExperimentState::ShowingFirst => Action::Confirm,
            ExperimentState::ShowingSecond => Action::Finish,
            ExperimentState::Finished => Action::Reset,
        }
    }

    pub fn is_enabled(&self, action: Action) -> bool {
        self.enabled_action() == action
    }

    /// Charts to draw, in display order.
    pub fn visible_charts(&self) -> Vec<ChartLabel> {
        let mut charts = Vec::with_capacity(2);
        if self.first_show {
            charts.push(self.selected_graph);
        }
        if self.second_show {
            charts.push(self.selected_graph.other());
        }
        charts
    }

    fn ensure_enabled(&self, action: Action) -> Result<(), BirdstrikeError> {
        if self.is_enabled(action) {
            Ok(())
        } else {
            Err(BirdstrikeError::ActionNotEnabled {
                action,
                state: self.state(),
            })
        }
    }

    /// `Idle` -> `ShowingFirst`: starts the clock and shows the selected chart.
    pub fn show(&mut self, now: Duration) -> Result<(), BirdstrikeError> {
        self.ensure_enabled(Action::Show)?;
        self.first_show = true;
        self.start_time = Some(now);
        info!(
            "Experiment started, showing chart {} first",
            self.selected_graph.number()
        );
        Ok(())
    }

    /// `ShowingFirst` -> `ShowingSecond`: records the first answer and adds the other chart.
    pub fn confirm(&mut self, now: Duration) -> Result<(), BirdstrikeError> {
        self.ensure_enabled(Action::Confirm)?;
        self.second_show = true;
        self.mid_time = Some(not_before(now, self.start_time));
        info!(
            "First answer recorded, showing chart {}",
            self.selected_graph.other().number()
        );
        Ok(())
    }

    /// `ShowingSecond` -> `Finished`: records the second answer.
    pub fn finish(&mut self, now: Duration) -> Result<(), BirdstrikeError> {
        self.ensure_enabled(Action::Finish)?;
        self.end_time = Some(not_before(now, self.mid_time));
        if let Some(outcome) = self.outcome() {
            info!(
                "Experiment finished: first {:.2}s, second {:.2}s, chart {} wins",
                outcome.duration_first.as_secs_f64(),
                outcome.duration_second.as_secs_f64(),
                outcome.winner().number()
            );
        }
        Ok(())
    }

    /// Back to `Idle` from any state, with a freshly drawn first chart.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = Self::new(rng);
        info!(
            "Experiment reset, chart {} will be shown first",
            self.selected_graph.number()
        );
    }

    /// Runs the handler for `action` with the current time of `clock`.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> Result<(), BirdstrikeError> {
        match action {
            Action::Show => self.show(clock.now()),
            Action::Confirm => self.confirm(clock.now()),
            Action::Finish => self.finish(clock.now()),
            Action::Reset => {
                self.reset(rng);
                Ok(())
            }
        }
    }

    /// Durations and winner, available once all three timestamps are set.
    pub fn outcome(&self) -> Option<ExperimentOutcome> {
        let (Some(start), Some(mid), Some(end)) = (self.start_time, self.mid_time, self.end_time)
        else {
            return None;
        };
        Some(ExperimentOutcome {
            first_chart: self.selected_graph,
            duration_first: mid.saturating_sub(start),
            duration_second: end.saturating_sub(mid),
        })
    }
}

fn not_before(now: Duration, previous: Option<Duration>) -> Duration {
    previous.map_or(now, |p| now.max(p))
}
