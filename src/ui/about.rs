use egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use super::{PALETTE_AMBER, QUESTION};
use crate::data::{Dataset, PhaseCount, aggregate::total_count};

const ROW_HEIGHT: f32 = 18.;

const EXPERIMENT_TEXT: &str = "The experiment checks which of two visualizations answers the question \
above more effectively. You will be shown two charts of the same birdstrike records, one after \
the other, and asked to answer the question with each. Both answers are timed and at the end the \
chart you answered faster with is declared the better visualization.";

const BUSINESS_TEXT: &str = "Knowing which phase of flight, apart from the approach, sees the most \
birdstrikes helps airlines focus their safety procedures. High-risk phases such as take-off, \
climb or landing roll can be addressed by adjusting altitudes and speeds or by coordinating \
wildlife hazard management with airports.";

const CHART_TEXT: &str = "The line chart is expected to do better: it shows each phase as its own \
trend over time, so close values and rankings stay readable. Stacked bars make small \
differences between phases harder to compare because only the bottom segment shares a baseline.";

pub(crate) fn show(ui: &mut Ui, dataset: &Dataset, counts: &[PhaseCount]) {
    ScrollArea::vertical().show(ui, |ui| {
        ui.heading(RichText::new("Experiment: Birdstrikes").strong());
        ui.label(RichText::new(format!("Question: {}", QUESTION)).color(PALETTE_AMBER));
        ui.add_space(8.);

        section(ui, "1. About the experiment", EXPERIMENT_TEXT);
        section(ui, "2. Why this question matters", BUSINESS_TEXT);
        section(ui, "3. Is one chart better than the other?", CHART_TEXT);

        ui.add_space(8.);
        ui.label(RichText::new("4. Data").strong().size(16.));
        ui.label(format!(
            "{} incident records loaded, {} excluded for unparseable flight dates, {} incidents charted.",
            dataset.records().len(),
            dataset.dropped_count(),
            total_count(counts)
        ));
        ui.add_space(4.);
        counts_table(ui, counts);
    });
}

fn section(ui: &mut Ui, title: &str, body: &str) {
    ui.label(RichText::new(title).strong().size(16.));
    ui.label(body);
    ui.add_space(8.);
}

fn counts_table(ui: &mut Ui, counts: &[PhaseCount]) {
    if counts.is_empty() {
        ui.label(RichText::new("No incidents to chart").color(Color32::LIGHT_RED));
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(60.))
        .column(Column::auto().at_least(160.))
        .column(Column::remainder())
        .header(ROW_HEIGHT + 2., |mut header| {
            header.col(|ui| {
                ui.strong("Year");
            });
            header.col(|ui| {
                ui.strong("Phase of flight");
            });
            header.col(|ui| {
                ui.strong("Count");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, counts.len(), |mut row| {
                let count = &counts[row.index()];
                row.col(|ui| {
                    ui.label(count.year.to_string());
                });
                row.col(|ui| {
                    ui.label(count.phase.as_str());
                });
                row.col(|ui| {
                    ui.label(count.count.to_string());
                });
            });
        });
}
