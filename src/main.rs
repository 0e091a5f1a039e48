use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use glycoreport::{
    ChartRenderer, FontSource, LayoutConfig, NoCharts, PaperSize, PlottersRenderer, ReportKind,
    ReportStatus,
};

/// Generate a paginated diabetes self-management PDF report.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Report data as JSON (patient, period, glucose, medications, meals)
    #[arg(short, long)]
    input: PathBuf,

    /// comprehensive, glucose, medication or meals
    #[arg(short, long, default_value = "comprehensive")]
    kind: ReportKind,

    /// Directory the PDF is written to
    #[arg(short, long, default_value = "reports")]
    out_dir: PathBuf,

    /// Report identifier, used as the file name
    #[arg(long)]
    id: Option<String>,

    /// letter or a4
    #[arg(long, default_value = "letter")]
    paper: PaperSize,

    /// Directory of TrueType fonts to embed (overrides $GLYCOREPORT_FONTS)
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Leave chart slots empty instead of rendering charts
    #[arg(long)]
    no_charts: bool,

    /// Write uncompressed page content streams
    #[arg(long)]
    no_compress: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let fonts = args
        .fonts
        .map(FontSource::Directory)
        .unwrap_or_else(FontSource::from_env);
    let config = LayoutConfig {
        compress: !args.no_compress,
        ..LayoutConfig::default()
    }
    .with_paper(args.paper)
    .with_fonts(fonts);

    let id = args
        .id
        .unwrap_or_else(|| format!("{}-{}", args.kind, chrono::Local::now().format("%Y%m%d-%H%M%S")));

    let plotters = PlottersRenderer::default();
    let charts: &dyn ChartRenderer = if args.no_charts { &NoCharts } else { &plotters };

    let record = match glycoreport::generate_report_to_dir(
        &args.input,
        &args.out_dir,
        &id,
        args.kind,
        config,
        charts,
    ) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&record) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }

    if record.status == ReportStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
