//! CLI Engines Command
//!
//! Lists recognition engines and whether their credential is configured.

use anyhow::Result;
use scanchat_agent::Workbench;

use crate::terminal_output::render_engine_table;

pub async fn run(workbench: &Workbench) -> Result<()> {
    println!("\n🔎 Recognition engines\n");
    print!("{}", render_engine_table(&workbench.engines().await));
    println!();
    Ok(())
}
