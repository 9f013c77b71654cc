// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KiroQ - a local message bridge between Kiro and Amazon Q.
//!
//! Binary entry point: config loading, logging, and command dispatch.

use clap::{Parser, Subcommand};

mod client;
mod serve;
mod shutdown;

/// KiroQ - a local message bridge between Kiro and Amazon Q.
#[derive(Parser, Debug)]
#[command(name = "kiroq", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve both front ends: HTTP gateway plus stdio tool calls.
    Serve,
    /// Serve only the stdio tool-call protocol (for MCP clients).
    Mcp,
    /// Query a running bridge for liveness and counts.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// List messages awaiting an Amazon Q response.
    Messages,
    /// Respond as Amazon Q through a running bridge.
    Respond {
        /// Response body.
        message: String,
        /// Id of the question this answers.
        #[arg(long)]
        reply_to: Option<String>,
        /// Priority: low, normal, or high.
        #[arg(long)]
        priority: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match kiroq_config::load_and_validate() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("kiroq: {err}");
            std::process::exit(1);
        }
    };
    serve::init_tracing(&config.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(&config).await,
        Some(Commands::Mcp) => serve::run_mcp(&config).await,
        Some(Commands::Status { json }) => client::run_status(&config, json).await,
        Some(Commands::Messages) => client::run_messages(&config).await,
        Some(Commands::Respond {
            message,
            reply_to,
            priority,
        }) => {
            client::run_respond(
                &config,
                &message,
                reply_to.as_deref(),
                priority.as_deref(),
            )
            .await
        }
        None => {
            println!("kiroq: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("kiroq: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        super::Cli::command().debug_assert();
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = kiroq_config::load_and_validate_str("").expect("defaults should be valid");
        assert_eq!(config.gateway.port, 3847);
        assert_eq!(config.store.max_messages, 100);
    }
}
