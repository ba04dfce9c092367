use anyhow::Error;
use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing_log::log::warn;

use issue_buckets::cli::{command, command::histogram::resolve_range, Cli, Commands};
use issue_buckets::configuration::get_configuration_from;
use issue_buckets::datasource::HistogramRequest;
use issue_buckets::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();

    // Logs go to stderr so stdout only carries rendered rows.
    let subscriber = get_subscriber("issue-buckets".into(), "warn".into(), std::io::stderr);
    init_subscriber(subscriber)?;

    let cli = Cli::parse();
    let settings = get_configuration_from(&cli.config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Health {} => {
            command::health(&settings, cli.format, cancel).await?;
        }

        Commands::Issues { terms } => {
            command::issues(&settings, cli.format, cancel, &terms).await?;
        }

        Commands::Labels {} => {
            command::labels(&settings, cli.format, cancel).await?;
        }

        Commands::Histogram {
            field,
            unit,
            from,
            to,
            omit_time,
            terms,
        } => {
            let request = HistogramRequest {
                field,
                unit,
                range: resolve_range(from, to),
                omit_time,
                terms,
            };
            command::histogram(&settings, cli.format, cancel, request).await?;
        }

        Commands::Batch { file } => {
            command::batch(&settings, cli.format, cancel, &file).await?;
        }
    }

    Ok(())
}
