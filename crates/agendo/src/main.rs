// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agendo - appointment scheduling assistant for chat.
//!
//! This is the binary entry point.

mod serve;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Agendo - appointment scheduling assistant for chat.
#[derive(Parser, Debug)]
#[command(name = "agendo", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway and the dialogue engine.
    Serve,
    /// Chat with the engine from the terminal as a given phone number.
    Shell {
        /// Phone number to speak as.
        #[arg(long)]
        address: String,
        /// Tenant whose channel receives the messages.
        #[arg(long)]
        tenant: Option<String>,
        /// Mark messages as sent from the tenant's own device.
        #[arg(long)]
        self_channel: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => agendo_config::load_and_validate_path(path),
        None => agendo_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            agendo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.agent.log_level);
            serve::run_serve(config).await
        }
        Some(Commands::Shell {
            address,
            tenant,
            self_channel,
        }) => {
            init_tracing("warn");
            shell::run_shell(config, shell::ShellIdentity {
                address,
                tenant,
                self_channel,
            })
            .await
        }
        None => {
            println!("agendo: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("agendo: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("agendo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
