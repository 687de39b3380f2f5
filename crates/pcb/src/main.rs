use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod board;
mod replicate;
mod sheets;

#[derive(Parser)]
#[command(name = "pcb")]
#[command(about = "Replicate the layout of hierarchical sheets across a PCB", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets an anchor footprint's layout can be replicated onto
    #[command(alias = "s")]
    Sheets(sheets::SheetsArgs),

    /// Replicate a sheet's layout onto other instances of the same sheet
    #[command(alias = "r")]
    Replicate(replicate::ReplicateArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Sheets(args) => sheets::execute(args),
        Commands::Replicate(args) => replicate::execute(args),
    }
}
