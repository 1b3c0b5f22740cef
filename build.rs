//! Build script for barcodeverify
//!
//! Generates man pages from CLI definitions using clap_mangen.

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs::{self, File};
use std::io::Error;
use std::path::{Path, PathBuf};

// Include the CLI module
include!("src/cli.rs");

fn render(cmd: &clap::Command, path: &Path) -> Result<(), Error> {
    let mut file = File::create(path)?;
    Man::new(cmd.clone()).render(&mut file)
}

fn main() -> Result<(), Error> {
    // Tell cargo to rerun if CLI definitions change
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=BARCODEVERIFY_GEN_MANPAGES");

    // Only generate man pages for release builds or when explicitly requested
    let profile = env::var("PROFILE").unwrap_or_default();
    let generate = env::var("BARCODEVERIFY_GEN_MANPAGES").is_ok() || profile == "release";

    if !generate {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| "target".to_string()));
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let cmd = Cli::command();
    render(&cmd, &man_dir.join("barcodeverify.1"))?;

    // One page per subcommand, plus nested ones (barcodeverify-shipment-select.1)
    for subcommand in cmd.get_subcommands() {
        let name = subcommand.get_name();
        if name == "help" {
            continue;
        }
        render(subcommand, &man_dir.join(format!("barcodeverify-{}.1", name)))?;

        for nested in subcommand.get_subcommands() {
            let nested_name = nested.get_name();
            if nested_name == "help" {
                continue;
            }
            render(
                nested,
                &man_dir.join(format!("barcodeverify-{}-{}.1", name, nested_name)),
            )?;
        }
    }

    println!(
        "cargo:warning=Man pages generated in: {}",
        man_dir.display()
    );

    Ok(())
}
