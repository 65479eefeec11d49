//! CLI command definitions, routing, and tracing setup.

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use variantscope_core::{
    ContainerDetector, Detection, generate_variant_job_name, inspect_document, plan_variant_jobs,
};
use variantscope_shared::{AppConfig, ContentRef, init_config, load_config, resolve_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// VariantScope: find personalization variants and plan their translation jobs.
#[derive(Parser)]
#[command(
    name = "variantscope",
    version,
    about = "Find personalization variants in content documents and plan per-locale jobs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List the personalization containers of a content entry.
    Detect(ContentArgs),

    /// Plan one translation job per personalization variant.
    Jobs(ContentArgs),

    /// Print the job name for a variant.
    JobName {
        /// Content entry id.
        content_id: String,

        /// Variant name.
        #[arg(short, long)]
        name: Option<String>,

        /// Variant index, used when the name is missing or blank.
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Which content entry to inspect, and how to reach the content API.
#[derive(Args, Debug)]
pub(crate) struct ContentArgs {
    /// Content entry id.
    #[arg(long)]
    pub id: String,

    /// Content model name (defaults to the configured model).
    #[arg(short, long)]
    pub model: Option<String>,

    /// API key (defaults to the env var named in the config).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Content API origin, overriding the config.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds, overriding the config.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "variantscope=info",
        1 => "variantscope=debug",
        _ => "variantscope=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays machine-readable JSON.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Detect(args) => cmd_detect(&args).await,
        Command::Jobs(args) => cmd_jobs(&args).await,
        Command::JobName {
            content_id,
            name,
            index,
        } => cmd_job_name(&content_id, name.as_deref(), index),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Everything a content command needs, resolved from config + flags.
struct ContentSession {
    detector: ContainerDetector,
    content: ContentRef,
    api_key: String,
}

impl ContentSession {
    fn resolve(args: &ContentArgs) -> Result<Self> {
        let mut config = load_config()?;
        apply_overrides(&mut config, args);

        let api_key = match &args.api_key {
            Some(key) => key.clone(),
            None => resolve_api_key(&config)?,
        };

        Ok(Self {
            detector: ContainerDetector::from_config(&config.content_api)?,
            content: content_ref(args, &config),
            api_key,
        })
    }
}

/// CLI flags override config file values.
fn apply_overrides(config: &mut AppConfig, args: &ContentArgs) {
    if let Some(base_url) = &args.base_url {
        config.content_api.base_url = base_url.clone();
    }
    if let Some(timeout) = args.timeout_secs {
        config.content_api.timeout_secs = timeout;
    }
}

fn content_ref(args: &ContentArgs, config: &AppConfig) -> ContentRef {
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.content_api.default_model.clone());
    ContentRef::new(&args.id).with_model_name(model)
}

async fn cmd_detect(args: &ContentArgs) -> Result<()> {
    let session = ContentSession::resolve(args)?;
    info!(id = %session.content.id, model = %session.content.model(), "detecting containers");

    let spinner = spinner(format!("Fetching {}", session.content.id));
    let detection = session
        .detector
        .detect(&session.content, &session.api_key)
        .await;
    spinner.finish_and_clear();

    report_failure(&detection);
    println!(
        "{}",
        serde_json::to_string_pretty(detection.containers())?
    );
    Ok(())
}

async fn cmd_jobs(args: &ContentArgs) -> Result<()> {
    let session = ContentSession::resolve(args)?;
    info!(id = %session.content.id, model = %session.content.model(), "planning variant jobs");

    let spinner = spinner(format!("Fetching {}", session.content.id));
    let fetched = session
        .detector
        .client()
        .fetch_content(&session.content, &session.api_key)
        .await;
    spinner.finish_and_clear();

    let jobs = match fetched {
        Ok(document) => {
            let detection = inspect_document(&document);
            report_failure(&detection);
            plan_variant_jobs(&document, detection.containers())
        }
        Err(e) => {
            warn!(error = %e, "could not fetch content; no jobs planned");
            Vec::new()
        }
    };

    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

fn cmd_job_name(content_id: &str, name: Option<&str>, index: Option<usize>) -> Result<()> {
    println!("{}", generate_variant_job_name(content_id, name, index));
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn report_failure(detection: &Detection) {
    match detection {
        Detection::Found(_) => {}
        Detection::FetchFailed { reason, transient } => {
            warn!(%reason, transient, "detection failed, reporting no containers");
        }
        Detection::ParseFailed { reason } => {
            warn!(%reason, "document blocks unreadable, reporting no containers");
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_detect_flags() {
        let cli = Cli::try_parse_from([
            "variantscope",
            "detect",
            "--id",
            "abc123",
            "--model",
            "landing",
            "--base-url",
            "http://localhost:4000",
        ])
        .expect("parse");

        match cli.command {
            Command::Detect(args) => {
                assert_eq!(args.id, "abc123");
                assert_eq!(args.model.as_deref(), Some("landing"));
                assert_eq!(args.base_url.as_deref(), Some("http://localhost:4000"));
            }
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn flags_override_config() {
        let args = ContentArgs {
            id: "abc123".into(),
            model: None,
            api_key: None,
            base_url: Some("http://localhost:4000".into()),
            timeout_secs: Some(3),
        };
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.content_api.base_url, "http://localhost:4000");
        assert_eq!(config.content_api.timeout_secs, 3);

        let content = content_ref(&args, &config);
        assert_eq!(content.model(), "page");
    }

    #[test]
    fn explicit_model_wins() {
        let args = ContentArgs {
            id: "abc123".into(),
            model: Some("blog-post".into()),
            api_key: None,
            base_url: None,
            timeout_secs: None,
        };
        let content = content_ref(&args, &AppConfig::default());
        assert_eq!(content.model(), "blog-post");
    }
}
