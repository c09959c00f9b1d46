use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate_to, Shell};
use std::env;
use std::io::Error;

// Completions are generated from the same definition the binary parses
include!("src/cli.rs");

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let Some(out_dir) = env::var_os("OUT_DIR") else {
        return Ok(());
    };

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    // one script per shell clap_complete supports
    for &shell in Shell::value_variants() {
        generate_to(shell, &mut cmd, &bin_name, &out_dir)?;
    }

    Ok(())
}
