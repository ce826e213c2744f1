//! Command implementations.

pub mod accrue;
pub mod inspect;
pub mod liquidate;
pub mod snapshot;

use std::path::Path;

use anyhow::{Context, Result};
use sgl_rs_sim::{Scenario, World};

pub use accrue::run_accrue;
pub use inspect::run_inspect;
pub use liquidate::run_liquidate;
pub use snapshot::run_snapshot;

/// Read a scenario file.
fn load_scenario(path: &Path) -> Result<Scenario> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse scenario {}", path.display()))
}

/// Read a scenario file and build its world.
fn load_world(path: &Path) -> Result<World> {
    let world = load_scenario(path)?
        .build()
        .with_context(|| format!("Invalid scenario {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        market = %world.market.address,
        timestamp = world.timestamp,
        "loaded scenario"
    );
    Ok(world)
}

/// Write a scenario file.
fn write_scenario(path: &Path, scenario: &Scenario) -> Result<()> {
    let json = serde_json::to_string_pretty(scenario)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write scenario {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote scenario");
    Ok(())
}
