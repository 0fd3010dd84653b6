//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use coursekit_core::menu::serialize_navigation;
use coursekit_core::navigation::build_navigation;
use coursekit_core::pipeline::{self, ProgressReporter, PublishConfig, PublishReport};
use coursekit_lessons::discover_lessons;
use coursekit_markdown::RenderOptions;
use coursekit_remediation::{AwsClients, Remediator, RemediatorConfig, SecurityHubEvent};
use coursekit_shared::{
    AppConfig, PublisherEnv, RemediationEnv, SideEffect, init_config, load_config, parse_site_url,
};
use coursekit_sharepoint::{MenuState, SaveMenuStateRequest, SharePointClient};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// coursekit: publish course lessons to SharePoint and remediate public S3 buckets.
#[derive(Parser)]
#[command(
    name = "coursekit",
    version,
    about = "Publish Markdown lessons to SharePoint and auto-remediate public S3 buckets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./coursekit.toml, then ~/.coursekit/coursekit.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

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
    /// Publish changed lessons and rebuild site navigation.
    Publish {
        /// File holding newline-separated changed paths.
        #[arg(long)]
        changed: PathBuf,

        /// Lessons root (overrides `[publisher].lessons_root`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Repository-relative prefix to strip from changed paths (e.g. `course`).
        #[arg(long)]
        changed_prefix: Option<String>,

        /// Skip the navigation rebuild.
        #[arg(long)]
        no_navigation: bool,
    },

    /// Remediate public S3 buckets named in a Security Hub event.
    Remediate {
        /// Event JSON file, or `-` for stdin.
        #[arg(long)]
        event: String,
    },

    /// Navigation tools.
    Nav {
        #[command(subcommand)]
        action: NavAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Navigation subcommands.
#[derive(Subcommand)]
pub(crate) enum NavAction {
    /// Print the menu that would be saved, without contacting the site.
    Preview {
        /// Lessons root (overrides `[publisher].lessons_root`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Site URL the links are built from.
        #[arg(long, env = "SHAREPOINT_SITE_URL")]
        base_url: String,
    },
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

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursekit=info",
        1 => "coursekit=debug",
        _ => "coursekit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Publish {
            changed,
            root,
            changed_prefix,
            no_navigation,
        } => cmd_publish(&config, &changed, root, changed_prefix, no_navigation).await,
        Command::Remediate { event } => cmd_remediate(&config, &event).await,
        Command::Nav { action } => match action {
            NavAction::Preview { root, base_url } => cmd_nav_preview(&config, root, &base_url),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn lessons_root(config: &AppConfig, root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| PathBuf::from(&config.publisher.lessons_root))
}

// ---------------------------------------------------------------------------
// publish
// ---------------------------------------------------------------------------

async fn cmd_publish(
    config: &AppConfig,
    changed_file: &Path,
    root: Option<PathBuf>,
    changed_prefix: Option<String>,
    no_navigation: bool,
) -> Result<ExitCode> {
    let changed = pipeline::read_changed_files(changed_file)?;
    if pipeline::changed_lessons(&changed, changed_prefix.as_deref()).is_empty() {
        info!(changed = changed.len(), "no lesson files changed, nothing to publish");
        println!("No lesson files changed, nothing to publish.");
        return Ok(ExitCode::SUCCESS);
    }

    let env = PublisherEnv::from_env()?;

    let publish_config = PublishConfig {
        lessons_root: lessons_root(config, root),
        changed_prefix,
        site_url: env.site_url.clone(),
        navigation: config.navigation.clone(),
        publish_navigation: config.publisher.publish_navigation && !no_navigation,
        render: RenderOptions::default(),
    };

    info!(
        site = %env.site_url,
        root = %publish_config.lessons_root.display(),
        changed = changed.len(),
        "starting publish run"
    );

    let client = SharePointClient::connect(&env)
        .await
        .wrap_err("could not connect to the SharePoint site")?;

    let reporter = CliProgress::new();
    let report = pipeline::publish(&publish_config, &client, &changed, &reporter).await;

    print_report(&report);

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_report(report: &PublishReport) {
    println!();
    for lesson in &report.published {
        let publish = match &lesson.publish {
            SideEffect::Failed(_) => " (not published)",
            _ => "",
        };
        println!("  ✓ {} → {} [{:?}]{publish}", lesson.path, lesson.page_name, lesson.action);
    }
    for lesson in &report.failed {
        println!("  ✗ {}: {}", lesson.path, lesson.error);
    }
    println!();
    println!("  Succeeded:  {}", report.succeeded());
    println!("  Failed:     {}", report.failed.len());
    println!("  Skipped:    {}", report.skipped.len());
    println!("  Navigation: {}", side_effect_label(&report.navigation));
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

fn side_effect_label(effect: &SideEffect) -> String {
    match effect {
        SideEffect::Succeeded => "updated".into(),
        SideEffect::Skipped => "skipped".into(),
        SideEffect::Failed(e) => format!("failed ({e})"),
    }
}

// ---------------------------------------------------------------------------
// remediate
// ---------------------------------------------------------------------------

async fn cmd_remediate(config: &AppConfig, source: &str) -> Result<ExitCode> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).wrap_err_with(|| format!("failed to read event file '{source}'"))?
    };

    let event: SecurityHubEvent =
        serde_json::from_str(&raw).map_err(|e| eyre!("invalid Security Hub event: {e}"))?;

    let env = RemediationEnv::from_env();
    if env.sns_topic_arn.is_none() {
        info!("SNS_TOPIC_ARN not set, notifications disabled");
    }

    let clients = AwsClients::from_env().await;
    let remediator = Remediator::new(
        &clients,
        &clients,
        &clients,
        RemediatorConfig {
            topic_arn: env.sns_topic_arn,
            updated_by: config.remediation.updated_by.clone(),
        },
    );

    let (response, _reports) = remediator.handle_event(&event).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// nav preview
// ---------------------------------------------------------------------------

fn cmd_nav_preview(config: &AppConfig, root: Option<PathBuf>, base_url: &str) -> Result<ExitCode> {
    let site_url = parse_site_url(base_url)?;
    let root = lessons_root(config, root);

    let lessons = discover_lessons(&root);
    let tree = build_navigation(&lessons, &site_url, &config.navigation);
    let nodes = serialize_navigation(&tree, config.navigation.menu_base_id)?;

    info!(lessons = lessons.len(), nodes = nodes.len(), "navigation preview");

    let request = SaveMenuStateRequest {
        menu_state: MenuState::for_site(site_url.path().trim_end_matches('/'), nodes),
    };
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(config: &AppConfig) -> Result<ExitCode> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn lesson_done(&self, path: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("Published [{current}/{total}] {path}"));
    }

    fn done(&self, _report: &PublishReport) {
        self.spinner.finish_and_clear();
    }
}
