//! # MathPad CLI
//!
//! Usage:
//!   mathpad serve [--bind <addr>] [--model <name>]
//!   mathpad solve <sketch.png>... [--gateway <url>]
//!   mathpad prompt [--var <name=value>]...
//!
//! Examples:
//!   GOOGLE_GEMI_API=... mathpad serve --bind 0.0.0.0:3000
//!   mathpad solve assign_x.png use_x.png
//!   mathpad prompt --var x=2 --var y=5

use clap::{Parser, Subcommand};
use mathpad_client::{HttpTransport, Pad, Surface, DEFAULT_GATEWAY};
use mathpad_error::{Error, Result};
use mathpad_gateway::{build_prompt, EchoMode, GatewayConfig, GeminiProvider, Solver, VariableMap};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mathpad")]
#[command(author, version, about = "MathPad - solve hand-drawn math with a vision model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Listen address (overrides MATHPAD_BIND)
        #[arg(short, long)]
        bind: Option<String>,

        /// Model name (overrides MATHPAD_MODEL)
        #[arg(short, long)]
        model: Option<String>,

        /// Per-attempt model timeout in seconds (overrides MATHPAD_TIMEOUT_SECS)
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Retries for transient model failures (overrides MATHPAD_MAX_RETRIES)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Sampling temperature (overrides MATHPAD_TEMPERATURE)
        #[arg(long)]
        temperature: Option<f32>,

        /// `first` or `all` (overrides MATHPAD_ECHO_MODE)
        #[arg(long)]
        echo_mode: Option<String>,

        /// Ask for free text instead of schema-constrained JSON
        #[arg(long)]
        no_structured_output: bool,
    },
    /// Solve PNG sketches in order, carrying variables from one to the next
    Solve {
        #[arg(required = true)]
        files: Vec<String>,

        /// Gateway base URL
        #[arg(short, long, default_value = DEFAULT_GATEWAY)]
        gateway: String,

        #[arg(long, default_value = "60")]
        timeout_secs: u64,

        /// Print the final session as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the prompt the gateway would send
    Prompt {
        /// Known variable, as name=value
        #[arg(long = "var", value_parser = parse_assignment)]
        vars: Vec<(String, String)>,
    },
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct ServeOverrides {
    bind: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    temperature: Option<f32>,
    echo_mode: Option<String>,
    no_structured_output: bool,
}

async fn serve(overrides: ServeOverrides) -> Result<()> {
    let mut config = GatewayConfig::from_env()?;

    if let Some(bind) = overrides.bind {
        config.bind = bind.parse().map_err(|e| {
            Error::config_invalid("--bind", format!("invalid address '{}': {}", bind, e))
        })?;
    }
    if let Some(model) = overrides.model {
        config.provider = config.provider.with_model(model);
    }
    if let Some(secs) = overrides.timeout_secs {
        config.provider = config.provider.with_timeout(secs);
        config.solver = config.solver.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = overrides.max_retries {
        let backoff = config.solver.retry_backoff;
        config.solver = config.solver.with_retries(retries, backoff);
    }
    if let Some(temperature) = overrides.temperature {
        config.solver = config.solver.with_temperature(temperature);
    }
    if let Some(mode) = overrides.echo_mode {
        config.solver = config.solver.with_echo_mode(mode.parse::<EchoMode>()?);
    }
    if overrides.no_structured_output {
        config.solver = config.solver.with_structured_output(false);
    }

    let provider = GeminiProvider::new(config.provider).map_err(Error::from)?;
    let solver = Arc::new(Solver::new(provider, config.solver));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    mathpad_gateway::serve(listener, solver).await
}

async fn solve_files(files: &[String], gateway: &str, timeout_secs: u64, json: bool) -> Result<()> {
    let transport = HttpTransport::new(gateway, Duration::from_secs(timeout_secs))?;
    let mut pad = Pad::new(Surface::new(0, 0), transport);
    tracing::info!(files = files.len(), endpoint = pad.transport().endpoint(), "solving sketches");

    for file in files {
        pad.replace_surface(Surface::load_png(file)?);
        let records = pad.solve().await.map_err(|e| e.with_context("file", file.as_str()))?;

        if !json {
            match records.first() {
                Some(first) => println!("{}: {} = {}", file, first.expression, first.result),
                None => println!("{}: (no result)", file),
            }
        }
    }

    if json {
        let session = serde_json::json!({
            "labels": pad.state().labels(),
            "variables": pad.state().variables(),
        });
        println!("{}", serde_json::to_string_pretty(&session).unwrap_or_default());
    } else if !pad.state().variables().is_empty() {
        println!("\nVariables:");
        for (name, value) in pad.state().variables().iter() {
            println!("  {} = {}", name, value);
        }
    }

    Ok(())
}

fn show_prompt(vars: Vec<(String, String)>) {
    let vars: VariableMap = vars.into_iter().collect();
    println!("{}", build_prompt(&vars));
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Serve {
            bind,
            model,
            timeout_secs,
            max_retries,
            temperature,
            echo_mode,
            no_structured_output,
        } => {
            serve(ServeOverrides {
                bind,
                model,
                timeout_secs,
                max_retries,
                temperature,
                echo_mode,
                no_structured_output,
            })
            .await
        }
        Commands::Solve {
            files,
            gateway,
            timeout_secs,
            json,
        } => solve_files(&files, &gateway, timeout_secs, json).await,
        Commands::Prompt { vars } => {
            show_prompt(vars);
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
