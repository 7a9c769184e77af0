use std::path::PathBuf;

use birdstrikes::{
    AppConfig, BirdstrikeError, ChartSet, DatasetCache, SessionId, SourceOverrides,
    charts::svg::ChartSvgGenerator,
    data::{SheetCredentials, aggregate::total_count, filter_phases},
    ui::BirdstrikesApp,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use egui::Vec2;
use log::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
struct SourceArgs {
    /// Identifier of the Google spreadsheet holding the incident records
    #[arg(long)]
    sheet_id: Option<String>,

    /// Name of the sheet (tab) inside the spreadsheet
    #[arg(long)]
    sheet_name: Option<String>,

    /// Read the incident records from a local CSV file instead
    #[arg(long, conflicts_with = "sheet_id")]
    csv: Option<PathBuf>,

    /// Flight phase to leave out of both charts, may be repeated
    #[arg(long = "exclude-phase")]
    exclude_phases: Vec<String>,
}

impl From<SourceArgs> for SourceOverrides {
    fn from(value: SourceArgs) -> Self {
        Self {
            sheet_id: value.sheet_id,
            sheet_name: value.sheet_name,
            csv_path: value.csv,
            excluded_phases: value.exclude_phases,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the experiment window
    Run {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Write both charts as SVG files
    Export {
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn load_config(source: SourceArgs) -> AppConfig {
    AppConfig::from_local_file()
        .unwrap_or_default()
        .with_overrides(source.into())
}

fn run(app_config: AppConfig) -> Result<(), BirdstrikeError> {
    let source = app_config.record_source(SheetCredentials::from_env())?;

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options.viewport.with_inner_size(Vec2::new(
        app_config.window_width,
        app_config.window_height,
    ));

    eframe::run_native(
        "Birdstrikes",
        native_options,
        Box::new(move |cc| Ok(Box::new(BirdstrikesApp::new(app_config, source, cc)))),
    )
    .expect("could not start app");
    Ok(())
}

fn export(app_config: AppConfig, output: &PathBuf) -> Result<(), BirdstrikeError> {
    let mut source = app_config.record_source(SheetCredentials::from_env())?;
    let dataset = DatasetCache::new().get_or_load(SessionId::new(), source.as_mut())?;
    let counts = filter_phases(&dataset.aggregate(), &app_config.excluded_phases);
    for count in &counts {
        info!("{}\t{}\t{}", count.year, count.phase, count.count);
    }
    info!(
        "{} incidents in {} (year, phase) groups",
        total_count(&counts),
        counts.len()
    );

    let charts = ChartSet::build(&counts);
    for path in ChartSvgGenerator::new().write_chart_set(&charts, output)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");
    match cli.command {
        Commands::Run { source } => {
            run(load_config(source)).expect("Error while running the experiment")
        }
        Commands::Export { output, source } => {
            export(load_config(source), &output).expect("Error while exporting charts")
        }
    };
}
