//! panda-publish CLI
//!
//! Builds every configured module and uploads it to a private devpi index

use anyhow::Result;
use clap::{ArgAction, Parser};
use panda_publish::{
    BatchPublisher, ConfigLayer, ConfigLoadOptions, ConfigLoader, PublishError,
};
use secrecy::SecretString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// Build and publish the panda modules to a private package index
#[derive(Parser)]
#[command(name = "panda-publish")]
#[command(version)]
#[command(about = "Build and publish the panda modules to a private package index", long_about = None)]
struct Cli {
    /// Index URL (default: http://localhost:3141/root/dev)
    #[arg(value_name = "INDEX_URL")]
    index_url: Option<String>,

    /// Index password (default: empty)
    #[arg(value_name = "PASSWORD")]
    password: Option<String>,

    /// Index username (default: root)
    #[arg(short, long)]
    username: Option<String>,

    /// Directory containing the module directories (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Comma-separated module list, replacing the configured one
    #[arg(long, value_delimiter = ',')]
    modules: Option<Vec<String>>,

    /// Config file (default: <root>/.panda-publish.yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Exit without waiting for Enter
    #[arg(long)]
    no_pause: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// More diagnostic output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("panda_publish={level}")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run(cli: Cli) -> Result<i32> {
    println!("\n📦 panda-publish\n");

    let project_path = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let pause_requested = !cli.no_pause;

    let cli_layer = ConfigLayer {
        index_url: cli.index_url,
        username: cli.username,
        password: cli.password.map(|p| SecretString::new(p.into())),
        root_dir: cli.root,
        modules: cli.modules,
        pause_on_exit: cli.no_pause.then_some(false),
        ..Default::default()
    };

    let config = match ConfigLoader::load(ConfigLoadOptions {
        project_path,
        config_file: cli.config,
        home_dir: std::env::var_os("HOME").map(PathBuf::from),
        cli_args: cli_layer,
        env: std::env::vars().collect(),
    })
    .await
    {
        Ok(config) => config,
        Err(e) => {
            report_fatal(&e);
            pause_before_exit(pause_requested).await;
            return Ok(1);
        }
    };

    tracing::debug!("resolved configuration: {:?}", config);

    let publisher = BatchPublisher::new(config);
    let pause = publisher.config().pause_on_exit;

    let summary = match publisher.run().await {
        Ok(summary) => summary,
        Err(e) => {
            report_fatal(&e);
            pause_before_exit(pause).await;
            return Ok(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        BatchPublisher::print_summary(&summary);
    }

    pause_before_exit(pause).await;

    // Per-module failures only show up in the summary
    Ok(0)
}

fn report_fatal(error: &PublishError) {
    eprintln!("\n❌ {} [{}]", error, error.code());
    if let Some(index_url) = error.index_url() {
        eprintln!("   Index: {}", index_url);
    }
    for action in error.suggested_actions() {
        eprintln!("   - {}", action);
    }
}

async fn pause_before_exit(enabled: bool) {
    if !enabled || !std::io::stdin().is_terminal() {
        return;
    }

    println!("Press Enter to exit...");
    let mut line = String::new();
    let mut reader = BufReader::new(io::stdin());
    if let Err(e) = reader.read_line(&mut line).await {
        tracing::debug!("stdin closed: {}", e);
    }
}
