use std::io::Write;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

use crate::dispatch::Cli;

pub fn write_completion_script<W: Write>(shell: Shell, writer: &mut W) -> Result<()> {
    let mut command = Cli::command();
    let mut generated = Vec::new();
    clap_complete::generate(shell, &mut command, "firstrun", &mut generated);

    writer
        .write_all(&generated)
        .context("failed writing generated completion script")?;
    writer
        .write_all(b"\n")
        .context("failed writing completion script delimiter")?;
    Ok(())
}
