use clap::{Parser, Subcommand};

use rtdetect::cmd::detect::{run_detect, DetectCli};
use rtdetect::logger::init_logger;

#[derive(Parser)]
#[command(
    name = "rtdetect",
    about = "[rtdetect] Retrotransposed transcript detection from paired structural-variant breakends",
    author,
    version,
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Detect(DetectCli),
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(ref detect_cli) => {
            init_logger(detect_cli.verbose);
            if let Err(e) = run_detect(detect_cli) {
                eprintln!("Error running detection: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
