//! Command-line interface for the `skillx` application.
//!
//! `skillx <skill> [args...]` resolves a skill directory across the search
//! roots and runs its subcommand or `main` script with the child's exit code.

#![deny(unsafe_code)]

mod app;
mod cli;
mod signals;

use std::io::Write;

fn main() {
    let code = match app::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("skillx: {e:#}");
            1
        }
    };
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}
