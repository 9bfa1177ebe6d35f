use anyhow::Context;
use clap::{Parser, Subcommand};
use handler_registry::{
    db,
    repositories::{HandlerRepository, RepositoryError, SqliteHandlerRepository},
};

#[derive(Parser)]
#[command(name = "handler-registry-cli")]
#[command(about = "CLI tool for inspecting registered handlers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handler management commands
    Handlers {
        #[command(subcommand)]
        command: HandlerCommands,
    },
}

#[derive(Subcommand)]
enum HandlerCommands {
    /// List all registered handlers
    List,

    /// Show one handler's specification
    Show {
        /// Handler ID
        #[arg(short, long)]
        id: String,

        /// Print the specification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a handler and its methods
    Remove {
        /// Handler ID
        #[arg(short, long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    // Connect to database
    let pool = db::create_pool(&database_url)
        .await
        .context("Failed to open database")?;

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let repository = SqliteHandlerRepository::new(pool);

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Handlers { command } => match command {
            HandlerCommands::List => {
                let handlers = repository
                    .list_handlers()
                    .await
                    .context("Failed to list handlers")?;

                if handlers.is_empty() {
                    println!("No handlers registered.");
                } else {
                    println!("{:<38} {:<40} {:<8} {:<20}", "ID", "Socket", "Methods", "Created");
                    println!("{}", "-".repeat(108));
                    for handler in handlers {
                        println!(
                            "{:<38} {:<40} {:<8} {:<20}",
                            handler.id,
                            handler.specification.socket,
                            handler.specification.methods.len(),
                            handler.created_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }

            HandlerCommands::Show { id, json } => match repository.get_specification(&id).await {
                Ok(spec) if json => {
                    println!("{}", serde_json::to_string_pretty(&spec)?);
                }
                Ok(spec) => {
                    println!("Handler {}", id);
                    println!("  Socket: {}", spec.socket);
                    println!("  Methods:");
                    for method in &spec.methods {
                        println!("    {:<8} {}", method.method_type, method.path_part);
                    }
                }
                Err(RepositoryError::NotFound(_)) => {
                    eprintln!("❌ Handler '{}' not found", id);
                    std::process::exit(1);
                }
                Err(err) => return Err(err).context("Failed to load handler"),
            },

            HandlerCommands::Remove { id } => {
                repository
                    .remove_handler(&id)
                    .await
                    .context("Failed to remove handler")?;
                println!("✅ Handler '{}' removed (if it existed)", id);
            }
        },
    }

    Ok(())
}
