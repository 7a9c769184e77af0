mod about;
mod experiment_view;
mod plots;

use std::sync::Arc;

use egui::{Color32, Frame, Margin, RichText, Visuals, style::Widgets};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{
    charts::ChartSet,
    config::AppConfig,
    data::{Dataset, DatasetCache, PhaseCount, RecordSource, SessionId, filter_phases},
    experiment::{ExperimentSession, SystemClock},
};

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(18, 18, 18);
pub(crate) const PALETTE_SLATE: Color32 = Color32::from_rgb(38, 44, 52);
pub(crate) const PALETTE_SKY: Color32 = Color32::from_rgb(96, 165, 250);
pub(crate) const PALETTE_AMBER: Color32 = Color32::from_rgb(251, 191, 36);

pub(crate) const QUESTION: &str = "Excluding the Approach phase, which phase of the flight has experienced the highest number of birdstrikes between 1998 and 2002?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    About,
    Experiment,
}

/// Everything derived from the dataset once per session.
struct SessionView {
    dataset: Arc<Dataset>,
    counts: Vec<PhaseCount>,
    charts: ChartSet,
}

enum UiState {
    Loading,
    Error { message: String },
    Display(Box<SessionView>),
}

/// Application window: two tabs, the narrative and the timed experiment.
pub struct BirdstrikesApp {
    app_config: AppConfig,
    source: Box<dyn RecordSource>,
    session_id: SessionId,
    cache: DatasetCache,
    ui_state: UiState,
    tab: Tab,
    experiment: ExperimentSession,
    clock: SystemClock,
    rng: StdRng,
}

impl BirdstrikesApp {
    pub fn new(
        app_config: AppConfig,
        source: Box<dyn RecordSource>,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_SKY,
            faint_bg_color: PALETTE_SLATE,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            widgets: Widgets::dark(),
            striped: true,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        let mut rng = StdRng::from_entropy();
        let experiment = ExperimentSession::new(&mut rng);
        let session_id = SessionId::new();
        info!(
            "Session {} started, chart {} will be shown first",
            session_id,
            experiment.selected_graph().number()
        );

        Self {
            app_config,
            source,
            session_id,
            cache: DatasetCache::new(),
            ui_state: UiState::Loading,
            tab: Tab::About,
            experiment,
            clock: SystemClock::new(),
            rng,
        }
    }

    /// Fetches the dataset through the session cache and builds both charts.
    fn load(&mut self) {
        match self.cache.get_or_load(self.session_id, self.source.as_mut()) {
            Ok(dataset) => {
                let counts =
                    filter_phases(&dataset.aggregate(), &self.app_config.excluded_phases);
                let charts = ChartSet::build(&counts);
                self.ui_state = UiState::Display(Box::new(SessionView {
                    dataset,
                    counts,
                    charts,
                }));
            }
            Err(e) => {
                error!("Could not load incident records: {}", e);
                self.ui_state = UiState::Error {
                    message: format!(
                        "Could not load incident records from {}: {}",
                        self.source.describe(),
                        e
                    ),
                };
            }
        }
    }

    fn show_tabs(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("Tabs")
            .frame(Frame::default().inner_margin(Margin::same(6)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.tab, Tab::About, "About the exercise");
                    ui.selectable_value(&mut self.tab, Tab::Experiment, "Experiment: See the graphs");
                });
            });
    }
}

impl eframe::App for BirdstrikesApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.app_config.save() {
            error!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.app_config.window_width = rect.width();
            self.app_config.window_height = rect.height();
        }

        if matches!(self.ui_state, UiState::Loading) {
            self.load();
        }

        if matches!(self.ui_state, UiState::Display(_)) {
            self.show_tabs(ctx);
        }

        match &self.ui_state {
            UiState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.spinner();
                });
            }
            UiState::Error { message } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading(RichText::new(message).color(Color32::RED).strong());
                });
            }
            UiState::Display(view) => {
                let tab = self.tab;
                egui::CentralPanel::default()
                    .frame(
                        Frame::default()
                            .fill(PALETTE_BLACK)
                            .inner_margin(Margin::same(12)),
                    )
                    .show(ctx, |ui| match tab {
                        Tab::About => about::show(ui, &view.dataset, &view.counts),
                        Tab::Experiment => experiment_view::show(
                            ui,
                            &view.charts,
                            &mut self.experiment,
                            &self.clock,
                            &mut self.rng,
                        ),
                    });
            }
        }
    }
}
