use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use leadtrack::config::Config;
use leadtrack::rest::{self, ApiDoc, ApiState};
use leadtrack::tracking::validate_window_days;
use leadtrack::{logging, store};

#[derive(Parser)]
#[command(name = "leadtrack")]
#[command(about = "Valuation form tracking and conversion analytics")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server (default)
    Api {
        /// Port to listen on (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the conversion rollup
    Rollup {
        /// Days to look back (default: tracking.default_window_days)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Print the form funnel
    Funnel {
        /// Days to look back (default: tracking.default_window_days)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show one form session as JSON
    Session {
        /// Form session id
        id: String,
    },

    /// Print the OpenAPI document
    Openapi {
        /// Emit YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },

    /// Inspect or write the project config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the effective config to .leadtrack/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective config as TOML
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_server_mode = matches!(cli.command, None | Some(Commands::Api { .. }));
    let logging_handle = logging::init_logging(&config, is_server_mode, cli.debug)?;

    match cli.command {
        None => cmd_api(config, None).await?,
        Some(Commands::Api { port }) => cmd_api(config, port).await?,
        Some(Commands::Rollup { days }) => cmd_rollup(config, days).await?,
        Some(Commands::Funnel { days }) => cmd_funnel(config, days).await?,
        Some(Commands::Session { id }) => cmd_session(config, &id).await?,
        Some(Commands::Openapi { yaml }) => cmd_openapi(yaml)?,
        Some(Commands::Config { action }) => cmd_config(&config, action)?,
    }

    if let Some(log_path) = logging_handle.log_file_path {
        if log_path.metadata().map(|m| m.len() > 0).unwrap_or(false) {
            eprintln!("Server log: {}", log_path.display());
        }
    }

    Ok(())
}

async fn open_state(config: Config) -> Result<ApiState> {
    let store = store::open_store(&config)
        .await
        .context("Failed to open record store")?;
    Ok(ApiState::new(config, store))
}

async fn cmd_api(config: Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.server.port);

    println!("Starting REST API server...");
    println!("  Port: {}", port);
    println!("  Store: {:?} ({})", config.store.backend, config.data_path().display());
    println!("  Docs: http://localhost:{}/swagger-ui", port);
    println!();

    let state = open_state(config).await?;
    rest::serve(state, port).await
}

async fn cmd_rollup(config: Config, days: Option<u32>) -> Result<()> {
    let days = validate_window_days(days)?;
    let state = open_state(config).await?;
    let days = state.window_days(days);
    let rollup = state.analytics.conversion_rollup(days).await?;
    let summary = &rollup.summary;

    println!("Conversions (last {} days)", summary.window_days);
    println!("{}", "─".repeat(60));
    println!("Visitor sessions:   {}", summary.total_sessions);
    println!("Unique visitors:    {}", summary.unique_visitors);
    println!("Converted sessions: {}", summary.converted_sessions);
    println!("Leads:              {}", summary.total_leads);
    println!("Conversion rate:    {}%", summary.overall_conversion_rate);

    if !rollup.page_conversion_rates.is_empty() {
        println!();
        println!("{:<40} {:>8} {:>8} {:>7}", "Page", "Visitors", "Conv.", "Rate");
        for page in rollup.page_conversion_rates.iter().take(20) {
            println!(
                "{:<40} {:>8} {:>8} {:>6}%",
                page.page, page.visitors, page.conversions, page.conversion_rate
            );
        }
    }

    Ok(())
}

async fn cmd_funnel(config: Config, days: Option<u32>) -> Result<()> {
    let days = validate_window_days(days)?;
    let state = open_state(config).await?;
    let days = state.window_days(days);
    let funnel = state.analytics.form_funnel(days).await?;

    println!("Form funnel (last {} days)", funnel.window_days);
    println!("{}", "─".repeat(60));
    println!("Sessions:        {}", funnel.total_sessions);
    println!("Completed:       {}", funnel.completed_sessions);
    println!("Converted:       {}", funnel.converted_sessions);
    println!("Open:            {}", funnel.open_sessions);
    println!("Completion rate: {}%", funnel.completion_rate);
    println!("Avg steps:       {:.1}", funnel.average_steps_completed);
    println!("Avg duration:    {:.1}s", funnel.average_duration);

    if !funnel.steps.is_empty() {
        println!();
        println!("{:>4} {:>8} {:>6} {:>7}", "Step", "Reached", "Exits", "Reach");
        for step in &funnel.steps {
            println!(
                "{:>4} {:>8} {:>6} {:>6}%",
                step.step, step.sessions_reached, step.exits, step.reach_rate
            );
        }
    }

    if !funnel.by_source.is_empty() {
        println!();
        println!("{:<24} {:>8} {:>9} {:>7}", "Source", "Sessions", "Completed", "Rate");
        for source in &funnel.by_source {
            println!(
                "{:<24} {:>8} {:>9} {:>6}%",
                source.source, source.sessions, source.completed, source.completion_rate
            );
        }
    }

    Ok(())
}

async fn cmd_session(config: Config, id: &str) -> Result<()> {
    let state = open_state(config).await?;
    let session = state.tracker.get_session(id).await?;
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

fn cmd_openapi(yaml: bool) -> Result<()> {
    let doc = if yaml {
        ApiDoc::yaml().context("Failed to render OpenAPI YAML")?
    } else {
        ApiDoc::json().context("Failed to render OpenAPI JSON")?
    };
    println!("{}", doc);
    Ok(())
}

fn cmd_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = Config::local_config_path();
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let path = config.save()?;
            println!("Wrote {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
