//! Keel - A plugin lifecycle kernel
//!
//! This is the main entry point for the Keel CLI.

mod shell;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use keel_core::config::ConfigLoader;
use keel_kernel::Kernel;
use keel_plugin::LifecycleStage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Keel - Plugin lifecycle kernel for device-control hosts
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the kernel with the example plugins
    Run {
        /// Path to a keel.toml or keel.json
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Console command to run once the kernel is ready (repeatable)
        #[arg(short = 'e', long = "execute", value_name = "CMD")]
        execute: Vec<String>,

        /// Skip the interactive console mainloop
        #[arg(long)]
        batch: bool,

        /// Arguments passed through to plugins
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print the lifecycle stage order
    Stages,

    /// Validate a configuration file
    Validate {
        /// Path to a keel.toml or keel.json
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

/// Install the tracing subscriber; logs go to stderr, console output owns stdout
fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            execute,
            batch,
            args,
        } => {
            let config = ConfigLoader::load_or_default(config.as_deref())
                .context("failed to load configuration")?;
            init_tracing(cli.verbose, &config.logging.level);

            if cli.verbose {
                tracing::info!("Verbose mode enabled");
            }

            let mut kernel = Kernel::new(config);
            kernel.context_mut().set_cli_args(args);
            kernel.context_mut().console_channel().watch(|line| println!("{}", line));

            kernel.add_plugin(keel_example::plugin())?;
            kernel.add_plugin(Arc::new(shell::ScriptPlugin::new(execute)))?;
            kernel.add_plugin(Arc::new(shell::ConsolePlugin::new(batch)))?;

            kernel.run()?;
        }

        Commands::Stages => {
            for (index, stage) in LifecycleStage::ALL.iter().enumerate() {
                println!("{:>2} {}", index, stage);
            }
        }

        Commands::Validate { config } => {
            let path = match config.or_else(ConfigLoader::default_path) {
                Some(path) => path,
                None => anyhow::bail!("no configuration path given and no config directory found"),
            };

            match ConfigLoader::load(&path) {
                Ok(_) => {
                    println!("✅ Configuration '{}' is valid!", path.display());
                }
                Err(e) => {
                    eprintln!("❌ Configuration Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Keel v{}", keel_core::VERSION);
            println!("Built with ❤️ in Rust");
        }
    }

    Ok(())
}
