//! CLI entry point for the speedtest tool.

use anyhow::Result;
use clap::Parser;
use speedtest_core::{SpeedTest, SpeedTestConfig};
use tokio::sync::mpsc;
use tracing::{debug, info};

mod cli;

use cli::Args;

const RULE: &str = "----------------------------------------";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut config = SpeedTestConfig::default();
    if !args.urls.is_empty() {
        config = config.with_candidate_urls(args.urls.iter().cloned());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = SpeedTest::new(config)?.with_progress(tx);

    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling speed test");
            cancel.cancel();
        }
    });

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if !json {
                println!("{event}");
            }
        }
    });

    if !json {
        println!("Welcome to speedtest!");
        println!("Starting the download speed test for your connection...");
    }

    let report = session.run().await;
    // Closing the channel lets the printer drain and exit.
    drop(session);
    printer.await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.summary())?);
        return Ok(());
    }

    let average = report.average_speed_mbps();
    println!();
    println!("{RULE}");
    println!("Speed test complete.");
    if average > 0.0 {
        println!("Download speed: {average:.2} Mbps");
    } else {
        println!("Could not determine the connection speed.");
    }
    println!("{RULE}");
    println!();
    println!("Speed test finished.");

    Ok(())
}
