//! Command-line front end for the Pegasus batch client.
//!
//! All real logic lives in `pegasus-client`; this binary only parses
//! arguments, wires up logging, and renders the engine's event stream as
//! status lines plus an aggregate progress bar.

use clap::{Arg, ArgAction, Command};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pegasus_client::{BatchManager, ClientConfig, ClientEvent};
use pegasus_core::input::{display_name, parse_work_items};
use pegasus_core::Classification;

fn build_cli() -> Command {
    Command::new("pegasus")
        .about("Submit media URLs to a Pegasus server and track their progress")
        .arg(
            Arg::new("urls")
                .help("Media URLs to submit (one batch)")
                .action(ArgAction::Append)
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .help("Base URL of the Pegasus server")
                .env("PEGASUS_SERVER")
                .default_value("http://localhost:3000")
                .num_args(1),
        )
        .arg(
            Arg::new("out_dir")
                .long("out-dir")
                .help("Destination directory on the server")
                .default_value("/tmp/pegasus_downloads")
                .num_args(1),
        )
        .arg(
            Arg::new("option")
                .long("option")
                .help("Processing option, repeatable; order is preserved")
                .action(ArgAction::Append)
                .num_args(1),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pegasus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = build_cli().get_matches();

    let server = matches.get_one::<String>("server").unwrap().clone();
    let out_dir = matches.get_one::<String>("out_dir").unwrap().clone();
    let options: Vec<String> = matches
        .get_many::<String>("option")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let raw_urls = matches
        .get_many::<String>("urls")
        .unwrap()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    let items = parse_work_items(&raw_urls);

    let manager = BatchManager::start(ClientConfig { base_url: server })?;
    let mut events = manager.subscribe();
    manager.connect().await;

    let summary = manager.submit_batch(items, &out_dir, &options).await?;
    tracing::info!(
        total = summary.total,
        dispatched = summary.dispatched,
        immediate_failures = summary.immediate_failures,
        "Batch dispatched",
    );

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {wide_msg}")
            .expect("valid template"),
    );
    bar.set_message("waiting for progress events...");

    // Render events until every item has a terminal outcome. Immediate
    // failures are already final; the rest resolve via the stream.
    let mut settled = summary.immediate_failures;
    while settled < summary.total {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                bar.abandon_with_message("interrupted");
                break;
            }
        };
        let event = match event {
            Ok(event) => event,
            Err(_) => break, // engine shut down or we lagged too far behind
        };

        match event {
            ClientEvent::ItemDispatched {
                index,
                total,
                source,
                job_id,
            } => {
                bar.println(format!(
                    "({index}/{total}) submitted {} [{job_id}]",
                    display_name(&source)
                ));
            }
            ClientEvent::ItemRejected {
                index,
                total,
                source,
                detail,
            } => {
                bar.println(format!("({index}/{total}) REJECTED {source}: {detail}"));
            }
            ClientEvent::JobProgressed { source, message, .. } => {
                if let Some(message) = message {
                    bar.set_message(format!("{}: {message}", display_name(&source)));
                }
            }
            ClientEvent::JobCompleted { source, .. } => {
                settled += 1;
                bar.println(format!("completed {}", display_name(&source)));
            }
            ClientEvent::JobFailed { source, detail, .. } => {
                settled += 1;
                let detail = detail.unwrap_or_else(|| "unknown error".to_string());
                bar.println(format!("FAILED {source}: {detail}"));
            }
            ClientEvent::AggregateUpdated(aggregate) => {
                bar.set_position(u64::from(aggregate.percent));
                match aggregate.classification {
                    Classification::Success => bar.set_message("all items complete"),
                    Classification::Failure => bar.set_message("some items failed"),
                    Classification::Processing => {}
                    Classification::Pending => {}
                }
            }
            ClientEvent::StreamConnected => {
                tracing::info!("Progress stream connected");
            }
            ClientEvent::StreamDisconnected => {
                tracing::warn!("Progress stream disconnected; reconnecting");
            }
        }
    }

    let aggregate = manager.aggregate().await;
    match aggregate.classification {
        Classification::Success => bar.finish_with_message("all items complete"),
        Classification::Failure => bar.abandon_with_message("finished with failures"),
        _ => bar.abandon(),
    }

    manager.shutdown().await;

    if aggregate.classification == Classification::Failure {
        std::process::exit(1);
    }
    Ok(())
}
