//! Test helper utilities for CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecation

use std::path::PathBuf;

use alloy_primitives::Address;
use assert_cmd::Command;

/// Create a CLI command with no RPC configuration from the environment.
pub fn sgl_cmd() -> Command {
    let mut cmd = Command::cargo_bin("sgl").unwrap();
    cmd.env_remove("SGL_RPC_URL")
        .env_remove("PRIVATE_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// Path of a fixture file.
pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}.json", env!("CARGO_MANIFEST_DIR"), name)
}

/// Scratch file for scenario output.
pub fn output_path(name: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(format!("{}.json", name));
    let _ = std::fs::remove_file(&path);
    path
}

pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

pub fn liquidator() -> Address {
    Address::repeat_byte(0xca)
}

pub fn swapper() -> Address {
    Address::repeat_byte(0x5a)
}
