use anyhow::Result;
use calsync_core::config::SyncConfig;
use calsync_core::source::SyncWindow;

use crate::render::ReportRender;
use crate::utils::tui;

pub async fn run(verbose: bool) -> Result<()> {
    let config = SyncConfig::load()?;
    let reconciler = super::reconciler(&config)?;

    let window = SyncWindow::starting_now();
    let plan = tui::while_spinning("Comparing", reconciler.plan(window)).await?;
    println!("{}", plan.render(verbose));
    if !plan.is_empty() {
        println!("\n{}", plan.render_summary());
    }

    Ok(())
}
