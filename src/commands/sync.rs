use anyhow::Result;
use calsync_core::config::SyncConfig;

use crate::render::ReportRender;
use crate::utils::tui;

pub async fn run(verbose: bool) -> Result<()> {
    let config = SyncConfig::load()?;
    let reconciler = super::reconciler(&config)?;

    let report = tui::while_spinning("Syncing", reconciler.run_pass()).await?;
    println!("{}", report.render(verbose));

    let summary = report.render_summary();
    if !summary.is_empty() {
        println!("\n{}", summary);
    }

    if !report.is_clean() {
        anyhow::bail!(
            "{} of the tracked events could not be synced; they will be retried next pass",
            report.failures.len()
        );
    }

    Ok(())
}
