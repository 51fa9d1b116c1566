//! Signoff CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use signoff::cli::{Cli, Commands};
use signoff::domain::models::StageAction;
use signoff::infrastructure::config::ConfigLoader;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => signoff::cli::commands::init::execute(args, cli.json).await,
        Commands::Template(command) => {
            signoff::cli::commands::template::execute(command, cli.json).await
        }
        Commands::Submit(args) => {
            signoff::cli::commands::instance::execute_submit(args, cli.json).await
        }
        Commands::Approve(args) => {
            signoff::cli::commands::instance::execute_act(args, StageAction::Approve, cli.json)
                .await
        }
        Commands::Decline(args) => {
            signoff::cli::commands::instance::execute_act(args, StageAction::Decline, cli.json)
                .await
        }
        Commands::Attach(args) => {
            signoff::cli::commands::instance::execute_act(args, StageAction::Attach, cli.json)
                .await
        }
        Commands::Cancel(args) => {
            signoff::cli::commands::instance::execute_cancel(args, cli.json).await
        }
        Commands::Show(args) => signoff::cli::commands::instance::execute_show(args, cli.json).await,
        Commands::List(args) => signoff::cli::commands::instance::execute_list(args, cli.json).await,
        Commands::Pending(args) => {
            signoff::cli::commands::instance::execute_pending(args, cli.json).await
        }
        Commands::Audit(args) => signoff::cli::commands::audit::execute(args, cli.json).await,
        Commands::Inbox(args) => signoff::cli::commands::inbox::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        signoff::cli::handle_error(err, cli.json);
    }
}

/// Install the global subscriber. `RUST_LOG` wins; otherwise the configured
/// level and format apply. Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    let logging = ConfigLoader::load().map(|c| c.logging).unwrap_or_default();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
