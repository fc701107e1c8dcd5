use std::time::Duration;

use anyhow::Result;
use calsync_core::config::SyncConfig;
use chrono::Local;
use owo_colors::OwoColorize;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::render::ReportRender;
use crate::utils::tui;

pub async fn run(every: Option<Duration>, verbose: bool) -> Result<()> {
    let config = SyncConfig::load()?;
    let interval = match every {
        Some(interval) => interval,
        None => config.watch_interval()?,
    };
    if interval.is_zero() {
        anyhow::bail!("Watch interval must be greater than zero");
    }

    let reconciler = super::reconciler(&config)?;
    println!(
        "Syncing every {} (Ctrl-C to stop)",
        humantime::format_duration(interval)
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for pass in 1u64.. {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped");
                return Ok(());
            }
        }

        let stamp = Local::now().format("%H:%M:%S").to_string();
        let result = tui::while_spinning(format!("Pass {}", pass), reconciler.run_pass()).await;
        match result {
            Ok(report) if report.is_empty() => {}
            Ok(report) => println!("{}\n{}\n", stamp.dimmed(), report.render(verbose)),
            // A failed pass is retried on the next tick
            Err(e) => {
                warn!(error = %e, "sync pass failed");
                println!("{} {}\n", stamp.dimmed(), e.to_string().red());
            }
        }
    }

    Ok(())
}
