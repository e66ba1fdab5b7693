//! Renders roff man pages for `stagewatch` and each of its subcommands into
//! `OUT_DIR`, named `stagewatch.1` and `stagewatch-<subcommand>.1`.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use clap::{Command, CommandFactory};
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

fn main() -> Result<(), Box<dyn Error>> {
    let mut cargo = io::stdout().lock();
    for watched in ["build.rs", "src/cli/mod.rs"] {
        writeln!(cargo, "cargo:rerun-if-changed={watched}")?;
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR was not set"))?;

    let root = cli::Cli::command();
    let root_page = out_dir.join(format!("{}.1", root.get_name()));
    for sub in root.get_subcommands() {
        let page = out_dir.join(format!("{}-{}.1", root.get_name(), sub.get_name()));
        render_man_page(sub.clone(), &page)?;
    }
    render_man_page(root, &root_page)?;

    Ok(())
}

fn render_man_page(command: Command, target: &Path) -> Result<(), Box<dyn Error>> {
    let mut page = Vec::new();
    Man::new(command).render(&mut page)?;
    fs::write(target, page)?;
    Ok(())
}
