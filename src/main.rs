use clap::Parser;
use gatecheck::cli::{run, validate, Cli, Commands};
use gatecheck::config::LoggingConfig;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Validate(args) => {
            LoggingConfig::default().init();
            validate::execute(args)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
