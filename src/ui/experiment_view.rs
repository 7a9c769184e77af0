use egui::{Button, Color32, RichText, ScrollArea, Ui};
use log::warn;
use rand::Rng;

use super::{PALETTE_AMBER, QUESTION, plots};
use crate::charts::ChartSet;
use crate::experiment::{Action, Clock, ExperimentOutcome, ExperimentSession};

const INSTRUCTIONS: [&str; 4] = [
    "Click the \"Show Graph\" button to display the first visualization.",
    "Click the \"I answered your question\" button to display the second visualization.",
    "Click the \"Finish\" button to see the time taken to answer with each visualization.",
    "Click the \"Reset\" button to start over.",
];

pub(crate) fn show<R: Rng + ?Sized>(
    ui: &mut Ui,
    charts: &ChartSet,
    experiment: &mut ExperimentSession,
    clock: &dyn Clock,
    rng: &mut R,
) {
    ScrollArea::vertical().show(ui, |ui| {
        ui.heading(RichText::new("Experiment: Birdstrikes").strong());
        ui.label(RichText::new(format!("Question: {}", QUESTION)).color(PALETTE_AMBER));
        ui.add_space(8.);
        ui.label(RichText::new("Instructions").strong());
        ui.label(
            "You will be presented with two visualizations of birdstrikes data. \
             Answer the question above using each of them; both answers are timed.",
        );
        for step in INSTRUCTIONS {
            ui.label(format!("• {}", step));
        }
        ui.add_space(12.);

        if let Some(action) = action_buttons(ui, experiment)
            && let Err(e) = experiment.handle(action, clock, rng)
        {
            warn!("Ignoring action: {}", e);
        }

        for label in experiment.visible_charts() {
            ui.separator();
            plots::show_chart(ui, charts, label);
        }

        if let Some(outcome) = experiment.outcome() {
            ui.separator();
            show_outcome(ui, &outcome);
        }
    });
}

/// Draws one button per action, enabling only the one the current state allows.
/// Returns the action clicked this frame.
fn action_buttons(ui: &mut Ui, experiment: &ExperimentSession) -> Option<Action> {
    let mut clicked = None;
    ui.horizontal(|ui| {
        for action in Action::ALL {
            let button = Button::new(action.button_text());
            if ui.add_enabled(experiment.is_enabled(action), button).clicked() {
                clicked = Some(action);
            }
        }
    });
    clicked
}

pub(crate) fn outcome_lines(outcome: &ExperimentOutcome) -> [String; 3] {
    [
        format!(
            "Time to answer with the first graph: {:.2} seconds",
            outcome.duration_first.as_secs_f64()
        ),
        format!(
            "Time to answer with the second graph: {:.2} seconds",
            outcome.duration_second.as_secs_f64()
        ),
        format!(
            "You were faster in answering using the {} graph! That must be a better visualization",
            outcome.winner_position()
        ),
    ]
}

fn show_outcome(ui: &mut Ui, outcome: &ExperimentOutcome) {
    let [first, second, verdict] = outcome_lines(outcome);
    ui.label(RichText::new(first).strong());
    ui.label(RichText::new(second).strong());
    ui.label(RichText::new(verdict).color(Color32::LIGHT_GREEN).strong());
    ui.label(format!(
        "The {} graph was the {}.",
        outcome.winner_position(),
        outcome.winner()
    ));
}
