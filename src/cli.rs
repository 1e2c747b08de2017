//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Estimate download throughput by timing ranged transfers from public mirrors.
///
/// Each candidate is checked for availability and range support, then the
/// first 10 MiB are downloaded and timed. The result is the average speed in
/// megabits per second.
#[derive(Parser, Debug)]
#[command(name = "speedtest")]
#[command(author, version, about)]
pub struct Args {
    /// Candidate file URLs to test instead of the built-in mirror list
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output below errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the session summary as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,
}
