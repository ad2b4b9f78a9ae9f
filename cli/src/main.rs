mod catalog;

use anyhow::Result;
use clap::Parser;
use mathcalc::ops;
use mathcalc::{MathError, Operation};

#[derive(Parser)]
#[command(name = "mathcalc")]
#[command(about = "Deterministic symbolic math operations with JSON output.")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Operation name (case-insensitive), e.g. derivative, solve, gcd
    #[arg(allow_hyphen_values = true)]
    operation: Option<String>,
    /// Positional arguments, or a single JSON object/array of arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    // Help is matched on the raw argument, before any case folding.
    let name = match cli.operation.as_deref() {
        None | Some("-h" | "--help" | "help") => {
            print!("{}", catalog::render());
            return;
        }
        Some(name) => name,
    };

    if let Err(e) = evaluate_command(name, &cli.args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn evaluate_command(name: &str, args: &[String]) -> Result<()> {
    let operation = match Operation::resolve(name) {
        Ok(operation) => operation,
        Err(MathError::UnknownOperation(lowered)) => {
            eprintln!("Unknown operation: {}", lowered);
            eprintln!("Use --help to see available operations");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let document = ops::run(operation, args)?;
    println!("{}", document);
    Ok(())
}
