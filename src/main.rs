use clap::{Parser, Subcommand};
use lica::Result;
use lica::admin::ProductRegistration;
use lica::commands::{add_product, embed_text, run_chat, search_products, show_status};
use lica::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "lica")]
#[command(about = "Cleaning-products chat assistant with semantic product search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chat with Lica in the terminal
    Chat,
    /// Search the catalog the way the assistant does
    Search {
        /// What to look for, in natural language
        text: String,
    },
    /// Print the embedding vector for a piece of text
    Embed {
        text: String,
    },
    /// Register or update a product in the catalog and vector index
    AddProduct {
        /// Unique product code
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// How to use the product
        #[arg(long = "usage", default_value = "")]
        usage_instructions: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long = "image")]
        image_url: String,
        #[arg(long)]
        featured: bool,
        /// Text to embed instead of name, description and usage
        #[arg(long)]
        embedding_text: Option<String>,
    },
    /// Show connectivity and catalog status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Chat => {
            run_chat().await?;
        }
        Commands::Search { text } => {
            search_products(&text).await?;
        }
        Commands::Embed { text } => {
            embed_text(&text).await?;
        }
        Commands::AddProduct {
            code,
            name,
            description,
            usage_instructions,
            price,
            category,
            image_url,
            featured,
            embedding_text,
        } => {
            add_product(ProductRegistration {
                code,
                name,
                description,
                usage_instructions,
                price,
                category,
                image_url,
                featured,
                embedding: None,
                embedding_text,
            })
            .await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
