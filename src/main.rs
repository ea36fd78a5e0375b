use clap::Parser;
use dotenv::dotenv;
use pairscan::cli::{Cli, Commands};
use pairscan::commands::run_screen;
use pairscan::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.verbose, &cli.log_file)?;

    match cli.command {
        Commands::Screen(args) => run_screen(args).await?,
    }

    Ok(())
}
