use anyhow::Result;
use calsync_core::config::SyncConfig;
use calsync_core::event::Side;
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config_path = SyncConfig::config_path()?;
    let config = SyncConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Store:      {}", config.store_path().display());

    println!();
    println!("{}", "Sync".bold());
    println!("  Timezone:   {}", config.timezone);
    println!("  Timeout:    {}", config.pass_timeout);
    println!("  Interval:   {}", config.watch_interval);

    println!();
    println!("{}", "Sources".bold());
    for side in [Side::Tasks, Side::Schedule] {
        let label = format!("{}:", side);
        match config.remote(side) {
            Ok(remote) => println!(
                "  {:<11} {} {}",
                label,
                remote.provider.name(),
                format!("({})", remote.provider.binary_name()).dimmed()
            ),
            Err(_) => println!("  {:<11} {}", label, "not configured".red()),
        }
    }

    Ok(())
}
