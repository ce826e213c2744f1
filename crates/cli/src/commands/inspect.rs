//! Solvency inspection.

use anyhow::Result;

use super::load_world;
use crate::cli::{InspectArgs, OutputFormat};
use crate::output::format_solvency_table;

pub fn run_inspect(args: &InspectArgs, format: OutputFormat) -> Result<()> {
    let world = load_world(&args.scenario)?;

    let rate = args.rate.unwrap_or(world.market.exchange_rate);
    let mut reports = world.market.solvency_reports(&world.vault, rate)?;
    if args.liquidatable {
        reports.retain(|report| report.state.is_liquidatable());
    }

    match format {
        OutputFormat::Table => {
            println!("{}", format_solvency_table(&reports));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports)?;
            println!("{}", json);
        }
    }

    Ok(())
}
