use clap::{Parser, Subcommand};
use serde::Serialize;
use transfer_validator::config::AppConfig;
use transfer_validator::logging::init_logging;
use transfer_validator::service::ValidatorService;

#[derive(Parser)]
#[command(name = "transfer-validator")]
#[command(about = "Validate token transfers through a pool of JSON-RPC endpoints")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file (overrides CONFIG_FILE)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a transaction
    Details {
        /// Transaction hash
        hash: String,
    },

    /// Check whether a contract is the expected token
    #[command(name = "check-token")]
    CheckToken {
        /// Contract address
        address: String,
    },

    /// Check whether a transaction exists
    Exists {
        /// Transaction hash
        hash: String,
    },

    /// Print the current head block number
    #[command(name = "block-number")]
    BlockNumber,

    /// Check whether any endpoint is reachable
    Connected,

    /// Probe every endpoint and print pool health
    Stats,

    /// Check whether a wallet received the expected token in a transaction
    #[command(name = "validate-wallet")]
    ValidateWallet {
        /// Transaction hash
        hash: String,
        /// Receiving wallet address
        wallet: String,
    },

    /// Print a configuration file with default values
    #[command(name = "sample-config")]
    SampleConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::SampleConfig = cli.command {
        println!("{}", AppConfig::generate_sample_config()?);
        return Ok(());
    }

    if let Some(path) = &cli.config {
        std::env::set_var("CONFIG_FILE", path);
    }
    let config = AppConfig::load()?;

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    // One-shot commands do not need the background probe loop
    let service = ValidatorService::new(&config)?;
    let validator = service.validator();

    match cli.command {
        Commands::Details { hash } => print_json(&validator.get_details(&hash).await?)?,
        Commands::CheckToken { address } => {
            print_json(&validator.contract_is_expected_token(&address).await)?
        }
        Commands::Exists { hash } => print_json(&serde_json::json!({
            "hash": hash,
            "exists": validator.exists(&hash).await,
        }))?,
        Commands::BlockNumber => print_json(&serde_json::json!({
            "block_number": validator.current_block_number().await?,
        }))?,
        Commands::Connected => print_json(&serde_json::json!({
            "connected": validator.is_connected().await,
        }))?,
        Commands::Stats => {
            service.pool().probe_all().await;
            print_json(&validator.pool_stats())?
        }
        Commands::ValidateWallet { hash, wallet } => {
            print_json(&validator.validate_for_target_wallet(&hash, &wallet).await?)?
        }
        Commands::SampleConfig => {}
    }

    service.shutdown();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
