//! Interest accrual.

use anyhow::{bail, Result};
use sgl_rs_sim::Scenario;

use super::{load_world, write_scenario};
use crate::cli::{AccrueArgs, OutputFormat};
use crate::output::format_accrual_detail;

pub fn run_accrue(args: &AccrueArgs, format: OutputFormat) -> Result<()> {
    let mut world = load_world(&args.scenario)?;

    let timestamp = match (args.to, args.elapsed) {
        (Some(to), _) => to,
        (None, Some(elapsed)) => world
            .timestamp
            .checked_add(elapsed)
            .ok_or_else(|| anyhow::anyhow!("--elapsed {} overflows the scenario clock", elapsed))?,
        (None, None) => bail!("either --elapsed or --to is required"),
    };

    let outcome = world.accrue(timestamp)?;

    match format {
        OutputFormat::Table => {
            println!("{}", format_accrual_detail(&outcome, timestamp));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "timestamp": timestamp,
                "accrual": outcome,
                "events": world.market.take_events(),
            }))?;
            println!("{}", json);
        }
    }

    if let Some(path) = &args.output {
        write_scenario(path, &Scenario::from_world(&world))?;
    }

    Ok(())
}
