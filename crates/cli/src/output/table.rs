//! Table formatting for borrower lists.

use colored::Colorize;
use sgl_rs_sim::{PositionState, SolvencyReport};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::{format_amount, format_fee, truncate_address};

#[derive(Tabled)]
struct SolvencyRow {
    #[tabled(rename = "Borrower")]
    borrower: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Debt")]
    debt: String,
    #[tabled(rename = "Collateral")]
    collateral: String,
    #[tabled(rename = "Collateral Value")]
    max_tvl: String,
    #[tabled(rename = "To Solvency")]
    amount_to_solvency: String,
    #[tabled(rename = "Closing Factor")]
    closing_factor: String,
    #[tabled(rename = "Reward")]
    reward: String,
}

fn format_state(state: PositionState) -> String {
    match state {
        PositionState::Liquidatable => state.to_string().red().bold().to_string(),
        PositionState::Healthy => state.to_string().green().to_string(),
        PositionState::Empty => state.to_string().dimmed().to_string(),
    }
}

pub fn format_solvency_table(reports: &[SolvencyReport]) -> String {
    if reports.is_empty() {
        return "No borrowers found.".to_string();
    }

    let rows: Vec<SolvencyRow> = reports
        .iter()
        .map(|report| {
            let liquidatable = report.state.is_liquidatable();
            SolvencyRow {
                borrower: truncate_address(&report.user.to_string()),
                state: format_state(report.state),
                debt: format_amount(report.borrowed),
                collateral: format_amount(report.collateral_amount),
                max_tvl: format_amount(report.max_tvl),
                amount_to_solvency: if liquidatable {
                    format_amount(report.amount_to_solvency)
                } else {
                    "-".to_string()
                },
                closing_factor: if liquidatable {
                    format_amount(report.closing_factor)
                } else {
                    "-".to_string()
                },
                reward: if liquidatable {
                    format_fee(report.liquidator_reward)
                } else {
                    "-".to_string()
                },
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()));

    table.to_string()
}
