use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use site_insight::adapters::{CsvTabularSource, OpenAIConfig, OpenAIProvider, StdioConsole};
use site_insight::application::RunSessionHandler;
use site_insight::config::{AppConfig, LogFormat, LoggingConfig};
use site_insight::domain::foundation::SiteId;
use site_insight::domain::session::SessionContext;

#[derive(Parser)]
#[command(name = "site-insight")]
#[command(about = "Interactive marketing report for one website")]
struct Args {
    /// Site to report on (overrides SITE_INSIGHT__SESSION__SITE_ID)
    #[arg(long)]
    site_id: Option<String>,

    /// Oracle rounds allowed per elicited field
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Page-analytics CSV export
    #[arg(long)]
    landing_page_csv: Option<PathBuf>,

    /// Site/service descriptor CSV export
    #[arg(long)]
    site_csv: Option<PathBuf>,

    /// Chat model used for every oracle call
    #[arg(long)]
    model: Option<String>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(site_id) = self.site_id {
            config.session.site_id = site_id;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.session.max_attempts = max_attempts;
        }
        if let Some(path) = self.landing_page_csv {
            config.data.landing_page_csv = path;
        }
        if let Some(path) = self.site_csv {
            config.data.site_csv = path;
        }
        if let Some(model) = self.model {
            config.ai.model = model;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Logs go to stderr; stdout belongs to the operator dialogue.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);

    init_tracing(&config.logging);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Session ended without a report: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = config
        .ai
        .openai_api_key
        .as_ref()
        .map(|key| key.expose_secret().clone())
        .unwrap_or_default();

    let provider = OpenAIProvider::new(
        OpenAIConfig::new(api_key)
            .with_model(config.ai.model.clone())
            .with_base_url(config.ai.base_url.clone())
            .with_timeout(config.ai.timeout())
            .with_max_retries(config.ai.max_retries),
    );
    let source = CsvTabularSource::new(config.data.landing_page_csv, config.data.site_csv);
    let mut console = StdioConsole::new();

    let site_id = SiteId::new(config.session.site_id)?;
    let mut ctx = SessionContext::start(site_id, chrono::Local::now().date_naive())?;

    let handler = RunSessionHandler::new(
        Arc::new(provider),
        Arc::new(source),
        config.session.max_attempts,
    );
    handler.handle(&mut ctx, &mut console).await?;
    Ok(())
}
