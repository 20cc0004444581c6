//! bucket-relay CLI
//!
//! Filtered bulk copy and download of S3 objects.

use br_cli_common::{format_bytes, format_duration, format_number, init_logging};
use br_relay::RunReport;
use clap::Parser;

mod args;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so dry-run output on stdout stays clean
    init_logging(args.log_level)?;

    let report = run::execute(args).await?;

    // Individual transfer failures do not change the exit status
    eprintln!();
    match report {
        RunReport::Empty => {
            eprintln!("No objects matched the criteria.");
        }
        RunReport::DryRun { records } => {
            eprintln!("Dry run completed:");
            eprintln!("  Objects matched:  {}", format_number(records as u64));
        }
        RunReport::Completed(stats) => {
            eprintln!("Relay completed:");
            eprintln!(
                "  Objects matched:  {}",
                format_number(stats.records_matched as u64)
            );
            eprintln!("  Bytes matched:    {}", format_bytes(stats.bytes_matched));
            eprintln!(
                "  Transfers:        {}",
                format_number(stats.tasks_built as u64)
            );
            eprintln!(
                "  Succeeded:        {}",
                format_number(stats.transfers_succeeded as u64)
            );
            eprintln!(
                "  Failed:           {}",
                format_number(stats.transfers_failed as u64)
            );
            eprintln!("  Peak in flight:   {}", stats.peak_in_flight);

            if let Some(duration) = stats.duration() {
                eprintln!("  Duration:         {}", format_duration(duration));

                if let Some(rate) = stats.transfers_per_second() {
                    eprintln!("  Throughput:       {:.1} transfers/sec", rate);
                }
            }

            if stats.has_failures() {
                eprintln!();
                eprintln!("Some transfers failed; see the log for details.");
            }
        }
    }

    Ok(())
}
