#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatwatch::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;
use seatwatch::{
    BrowserType, Config, ConsoleReporter, OutputFormat, Reporter, RunReport, UiMode, WatcherError,
    Watcher, WebDriverPage, notifier,
};

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "seatwatch")]
#[command(about = "Watches the IPA CBT site for open exam seats", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, search every eligible month and day, and report open slots
    Run {
        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// How filter controls are driven (overrides WATCH_UI_MODE)
        #[arg(long, value_enum)]
        ui_mode: Option<UiMode>,

        /// Output format for the run report
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Log lines only, without GitHub Actions workflow commands (implied by `--format json`)
        #[arg(long)]
        plain: bool,
    },

    /// Print the effective configuration with secrets redacted
    Config,

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing to stderr (so workflow commands on stdout stay clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatwatch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    let format = match &cli.command {
        Commands::Run { format, .. } => *format,
        _ => OutputFormat::Text,
    };

    let result = run(cli).await;

    // Always clean up WebDriver processes before exiting
    GLOBAL_WEBDRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            if matches!(format, OutputFormat::Json) {
                let report = RunReport::failed(&err);
                println!(
                    "{}",
                    serde_json::to_string(&report).unwrap_or_else(|_| "{}".to_string())
                );
            }
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), WatcherError> {
    match cli.command {
        Commands::Run {
            browser,
            no_headless,
            ui_mode,
            format,
            plain,
        } => handle_run(browser, !no_headless, ui_mode, format, plain).await,
        Commands::Config => {
            let config = Config::from_env()?;
            for (key, value) in config.describe() {
                println!("{}={}", key, value);
            }
            Ok(())
        }
        Commands::Version => {
            println!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn handle_run(
    browser: String,
    headless: bool,
    ui_mode: Option<UiMode>,
    format: OutputFormat,
    plain: bool,
) -> Result<(), WatcherError> {
    let reporter = ConsoleReporter::for_output(plain, format);
    let abort = |err: WatcherError| {
        reporter.fail("Job Summary", &format!("aborted by a fatal error: {}", err));
        err
    };

    let mut config = Config::from_env().map_err(abort)?;
    if let Some(mode) = ui_mode {
        config.ui_mode = mode;
    }
    let browser_type: BrowserType = browser
        .parse()
        .map_err(|e: anyhow::Error| abort(WatcherError::Config(e.to_string())))?;

    info!(
        "Watching {} / {} from {} for {} center(s)",
        config.region,
        config.prefecture,
        config.start,
        config.target_centers.len()
    );

    let page = WebDriverPage::connect(browser_type, headless, config.timeouts)
        .await
        .map_err(|e| abort(WatcherError::from_session_error(e)))?;
    let notifier = notifier::from_config(&config);

    let report = Watcher::new(&config, &reporter, notifier.as_ref())
        .run(&page)
        .await?;

    if matches!(format, OutputFormat::Json) {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?
        );
    }
    Ok(())
}
