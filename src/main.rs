//! Gateway Relay CLI entry point

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_relay::cli::{
    app::{load_merged_config, run_oneshot, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use gateway_relay::infrastructure::XdgConfigStore;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Daemon { action }) => {
            #[cfg(unix)]
            {
                use gateway_relay::cli::daemon_cmd::handle_daemon_command;
                if let Err(e) = handle_daemon_command(action, &presenter).await {
                    presenter.error(&e);
                    return ExitCode::from(EXIT_ERROR);
                }
                return ExitCode::SUCCESS;
            }
            #[cfg(not(unix))]
            {
                let _ = action;
                presenter.error("Daemon mode is only supported on Unix");
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        }
        None => {}
    }

    // Merge: defaults < file < env < cli
    let config = load_merged_config(cli.overrides()).await;

    if cli.daemon {
        #[cfg(unix)]
        {
            return gateway_relay::cli::daemon_app::run_daemon(config).await;
        }
        #[cfg(not(unix))]
        {
            presenter.error("Daemon mode is only supported on Unix");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    match cli.payload.as_deref() {
        Some(payload) => run_oneshot(payload, config).await,
        None => {
            presenter.error("No payload given. Pass a JSON payload, \"-\" for stdin, or --daemon");
            let _ = Cli::command().print_help();
            ExitCode::from(EXIT_USAGE_ERROR)
        }
    }
}
