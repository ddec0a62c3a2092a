//! `ffigen backends` lists the available backends.

use anyhow::Result;
use ffigen_emit::available_backends;

pub fn run() -> Result<()> {
    println!("Available backends:");
    for kind in available_backends() {
        println!(
            "  {:<10} .{:<5} {}",
            kind.name(),
            kind.file_extension(),
            kind.description()
        );
    }
    Ok(())
}
