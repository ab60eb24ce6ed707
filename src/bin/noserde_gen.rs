//! # noserde-gen CLI Entry Point
//!
//! Binary entry point for the schema generator.
//!
//! ## Usage
//!
//! ```bash
//! # Generate (or refresh) the output file
//! noserde-gen --in schema.rs --out generated.rs
//!
//! # Verify the output is current without writing (CI mode)
//! noserde-gen --in schema.rs --out generated.rs --check
//!
//! # Show version
//! noserde-gen --version
//! ```
//!
//! Exit code 0 on success (including an up-to-date `--check`); 1 on any
//! error: file access, parse failure, unsupported schema construct, or a
//! `--check` mismatch. Parse diagnostics go to stderr as
//! `path:line:col: error: message`.

use std::env;
use std::path::PathBuf;

use eyre::{bail, Result};
use noserde::gen::{check_output, generate_to_file, CheckOutcome, Outcome};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut check = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-v" => {
                println!("noserde-gen {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--check" => {
                check = true;
            }
            "--in" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("--in requires a path");
                };
                input = Some(PathBuf::from(value));
            }
            "--out" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("--out requires a path");
                };
                output = Some(PathBuf::from(value));
            }
            arg => {
                bail!("unknown option: {arg} (try --help)");
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        print_usage();
        bail!("--in is required");
    };
    let Some(output) = output else {
        print_usage();
        bail!("--out is required");
    };

    if check {
        match check_output(&input, &output)? {
            CheckOutcome::UpToDate => {
                println!("up-to-date: {}", output.display());
                Ok(())
            }
            CheckOutcome::Missing => {
                bail!("{} is missing (run the generator)", output.display())
            }
            CheckOutcome::Stale => {
                bail!("{} is out of date (run the generator)", output.display())
            }
        }
    } else {
        match generate_to_file(&input, &output)? {
            Outcome::Generated => println!("generated: {}", output.display()),
            Outcome::Unchanged => println!("unchanged: {}", output.display()),
        }
        Ok(())
    }
}

fn print_usage() {
    println!("noserde-gen - generate typed record views from a noserde schema");
    println!();
    println!("USAGE:");
    println!("    noserde-gen --in <schema.rs> --out <generated.rs> [--check]");
    println!();
    println!("OPTIONS:");
    println!("    --in <path>     Schema source containing #[noserde] structs");
    println!("    --out <path>    Destination for the generated source");
    println!("    --check         Fail (exit 1) if the output is missing or stale");
    println!("    -h, --help      Show this help");
    println!("    -v, --version   Show version");
}
