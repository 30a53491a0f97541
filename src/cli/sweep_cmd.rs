//! `chronosweep sweep <url>`: collect the newest listing entries and
//! certify that they are sorted newest to oldest.

use crate::cli::output;
use crate::collector::{Collector, SweepConfig};
use crate::model::Record;
use crate::progress::{self, SweepEvent, SweepReceiver};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat};
use indicatif::{ProgressBar, ProgressStyle};

/// Run the sweep command.
pub async fn run(url: &str, count: usize) -> Result<()> {
    url::Url::parse(url).context("invalid listing URL")?;

    let config = SweepConfig::default();
    let renderer = ChromiumRenderer::new().await?;
    let mut page = renderer.new_page().await?;
    page.open(url, config.row_wait_timeout_ms).await?;

    let (tx, rx) = progress::channel();
    let bar = if output::is_quiet() || output::is_json() {
        None
    } else {
        Some(spawn_progress_bar(rx, count))
    };

    let mut collector = Collector::new(config).with_progress(tx);
    let outcome = collector.run(page.as_mut(), count).await;

    // Dropping the collector drops the sender, so the bar task drains and exits.
    drop(collector);
    if let Some(handle) = bar {
        let _ = handle.await;
    }

    page.close().await?;
    renderer.shutdown().await?;

    let records = outcome?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "url": url,
            "requested": count,
            "collected": records.len(),
            "verified": true,
            "records": records,
        }));
        return Ok(());
    }

    if !output::is_quiet() {
        println!(
            "Verified first {} entries are sorted newest → oldest",
            records.len()
        );
        for (i, record) in records.iter().enumerate() {
            println!(
                "{}. {} — {}",
                i + 1,
                display_title(record),
                format_iso(record.timestamp_ms)
            );
        }
    }

    Ok(())
}

fn display_title(record: &Record) -> &str {
    if record.title.is_empty() {
        "(untitled)"
    } else {
        &record.title
    }
}

fn format_iso(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// Render sweep events as a progress bar until the channel closes.
fn spawn_progress_bar(mut rx: SweepReceiver, target: usize) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(target as u64);
        bar.set_style(
            ProgressStyle::with_template("  {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        while let Ok(event) = rx.recv().await {
            match event {
                SweepEvent::PageMerged { page, total, .. } => {
                    bar.set_position(total as u64);
                    bar.set_message(format!("page {page}"));
                }
                SweepEvent::NavigationRetry { attempt, .. } => {
                    bar.set_message(format!("retrying navigation (attempt {attempt})"));
                }
                SweepEvent::SweepComplete { .. } => break,
            }
        }
        bar.finish_and_clear();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_iso_matches_source_output() {
        assert_eq!(format_iso(1767323045000), "2026-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_display_title_defaults_empty() {
        let record = Record {
            id: "x".to_string(),
            title: String::new(),
            timestamp_ms: 0,
        };
        assert_eq!(display_title(&record), "(untitled)");
    }
}
