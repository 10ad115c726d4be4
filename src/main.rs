use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use replanforge::config::ReplanConfig;
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with replanning parameters. Flags given on the command line win.
    #[arg(global = true, short, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Simulate(cmd::simulate::SimulateArgs),
    Validate(cmd::validate::ValidateArgs),
}

fn main() {
    // 1. Raw matches tell user input apart from defaults
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // 2. Replanning flags live inside the subcommand's matches
    let (cli_config, sub_name) = match &cli.command {
        Commands::Simulate(args) => (&args.config, "simulate"),
        Commands::Validate(args) => (&args.config, "validate"),
    };

    // 3. File config is the base, explicit flags override it
    let config = match &cli.config {
        Some(path) => {
            let mut file_config = ReplanConfig::load_from_file(path).unwrap_or_else(|e| {
                eprintln!("❌ Failed to load config '{}': {}", path, e);
                process::exit(1);
            });
            if let Some(sub_matches) = matches.subcommand_matches(sub_name) {
                file_config.merge_from_cli(cli_config, sub_matches);
            }
            file_config
        }
        None => cli_config.clone(),
    };

    // 4. Execute
    let result = match &cli.command {
        Commands::Simulate(args) => cmd::simulate::run(args, config),
        Commands::Validate(args) => cmd::validate::run(args, config),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}
