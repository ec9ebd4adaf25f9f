use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use log::{error, info};
use playlist_downloader::cli::Cli;
use playlist_downloader::downloader::Downloader;
use playlist_downloader::extractor::YtDlp;
use playlist_downloader::observer::{ProgressBarObserver, QueuedObserver};
use playlist_downloader::report::write_report_csv;
use playlist_downloader::tool::YtDlpLocator;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Starting playlist downloader");

    let cli = Cli::parse();
    cli.validate()?;
    info!("CLI arguments parsed: parallelism={}", cli.parallelism);

    let request = cli.request();
    let yt_dlp = Arc::new(YtDlp::new());
    let downloader = Downloader::new(
        cli.config(),
        Arc::new(YtDlpLocator::new(cli.yt_dlp.clone())),
        yt_dlp.clone(),
        yt_dlp,
    );

    let (observer, delivery) = QueuedObserver::spawn(ProgressBarObserver::new());
    let result = downloader.run(&request, Arc::new(observer)).await;
    // all observer handles are gone once run returns
    delivery.await.context("observer delivery task failed")?;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Download process failed: {}", e);
            if e.is_batch_fatal() {
                eprintln!("{}", "Nothing was downloaded".red());
            }
            return Err(e.into());
        }
    };

    println!("\n{}", "Download Summary:".bold());
    println!("Playlist: {} -> {}", report.batch_name, report.destination.display());
    println!("Total tracks: {}", report.total);
    println!("Downloaded: {}", report.succeeded_count().to_string().green());
    println!("Failed: {}", report.failed_count().to_string().red());
    println!("Total duration: {:.2?}", report.duration);

    if !report.downloaded.is_empty() {
        println!("\n{}", "Downloaded Tracks:".green().bold());
        for track in &report.downloaded {
            println!("✓ Track {} ({}) {}", track.item.number(), track.format, track.item.url.green());
        }
    }

    if !report.failures.is_empty() {
        println!("\n{}", "Failed Tracks:".red().bold());
        for failure in &report.failures {
            println!("✗ {}", failure.to_string().red());
        }
    }

    if let Some(path) = &cli.report {
        write_report_csv(&report, path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!("Wrote report to {}", path.display());
    }

    if !report.is_success() {
        bail!("{} of {} tracks failed to download", report.failed_count(), report.total);
    }

    println!("\n{}", "All downloads completed successfully".green());
    Ok(())
}
