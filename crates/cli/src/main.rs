use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "slate", about = "Report-card reference data sync", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "slate.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize Slate data directory and configuration
    Init {
        /// Data directory path
        #[arg(long, default_value = "/var/lib/slate")]
        data_dir: String,
    },
    /// Sync one entity type from PowerSchool, or all of them in dependency order
    Sync {
        /// schools, terms, teachers, courses, contacts or all
        #[arg(default_value = "all")]
        entity: String,
    },
    /// Show the latest sync job per entity and the current term
    Status,
    /// Start the JSON console server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            commands::init::run(&data_dir).await?;
        }
        Commands::Sync { entity } => {
            commands::sync::run(&cli.config, &entity).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
        Commands::Serve { port } => {
            commands::serve::run(&cli.config, port).await?;
        }
    }

    Ok(())
}
