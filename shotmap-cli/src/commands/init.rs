//! Init command implementation - write an example configuration file

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::config::Config;

pub fn execute(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            output.display()
        ));
    }

    std::fs::write(&output, Config::example_toml())
        .with_context(|| format!("Failed to write configuration file: {}", output.display()))?;

    log::info!("Wrote example configuration to: {}", output.display());
    Ok(())
}
