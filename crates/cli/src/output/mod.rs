//! Output formatting for CLI results.

pub mod detail;
pub mod table;

use alloy_primitives::U256;
use sgl_rs_sim::math::fee_to_f64;

pub use detail::{format_accrual_detail, format_liquidation_detail, format_snapshot_detail};
pub use table::format_solvency_table;

fn truncate_address(addr: &str) -> String {
    if addr.len() > 10 {
        format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
    } else {
        addr.to_string()
    }
}

/// Integer amount with thousands separators
fn format_amount(value: U256) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// 1e5-scaled percentage
fn format_fee(fee: U256) -> String {
    format!("{:.2}%", fee_to_f64(fee) * 100.0)
}
