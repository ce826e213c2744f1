//! Integration tests for the Singularity CLI.
//!
//! These tests run the `sgl` binary against scenario fixtures.
//!
//! # Test Categories
//!
//! - **Inspect tests**: solvency tables and JSON reports
//! - **Accrue tests**: interest accrual and scenario output
//! - **Liquidate tests**: closed-market and order book simulations
//! - **CLI validation tests**: argument parsing, help text, error handling
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sgl-rs-cli --test integration
//! ```

mod integration {
    pub mod accrue_tests;
    pub mod cli_validation_tests;
    pub mod helpers;
    pub mod inspect_tests;
    pub mod liquidate_tests;
}
