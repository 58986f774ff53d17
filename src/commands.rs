use anyhow::{Context, Result};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::admin::{ProductAdmin, ProductRegistration};
use crate::assistant::{ConversationContext, ConversationOrchestrator, ResolvedProduct};
use crate::config::Config;
use crate::database::lancedb::VectorStore;
use crate::database::sqlite::Database;
use crate::embeddings::ollama::OllamaClient;
use crate::providers::Providers;
use crate::session::ChatSession;

/// A line typed into the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    ShowCart,
    AddCurrent,
    Remove(String),
    Checkout,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

#[inline]
pub fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next().unwrap_or_default(), parts.next()) {
        ("cart" | "carrinho", None) => ChatInput::ShowCart,
        ("add" | "adicionar", None) => ChatInput::AddCurrent,
        ("remove" | "remover", Some(code)) => ChatInput::Remove(code.to_string()),
        ("checkout" | "finalizar", None) => ChatInput::Checkout,
        ("help" | "ajuda", None) => ChatInput::Help,
        ("quit" | "exit" | "sair", None) => ChatInput::Quit,
        _ => ChatInput::Unknown(line.to_string()),
    }
}

async fn load_providers() -> Result<(Config, Providers)> {
    let config = Config::load().context("Failed to load configuration")?;
    let providers = Providers::from_config(&config)
        .await
        .context("Failed to initialize providers")?;
    Ok((config, providers))
}

fn print_product(product: &ResolvedProduct) {
    println!(
        "   {} {} ({})",
        style("🧴").cyan(),
        style(&product.name).bold(),
        product.code
    );
    println!("      💰 {}", product.display_price());
    if !product.category.is_empty() {
        println!("      🏷️  {}", product.category);
    }
    if !product.usage_instructions.is_empty() {
        println!("      📋 {}", product.usage_instructions);
    }
}

fn print_chat_help() {
    println!("Comandos:");
    println!("  /cart       mostra o carrinho");
    println!("  /add        adiciona o produto atual ao carrinho");
    println!("  /remove COD remove um produto do carrinho");
    println!("  /checkout   gera o link para finalizar a compra");
    println!("  /quit       encerra a conversa");
}

fn print_cart(session: &ChatSession) {
    let cart = session.cart();
    if cart.is_empty() {
        println!("🛒 Carrinho vazio");
        return;
    }
    println!("🛒 Carrinho:");
    for line in cart.lines() {
        println!(
            "   {} x{} = R$ {:.2}",
            line.product.name,
            line.quantity,
            line.subtotal()
        );
    }
    println!("   Total: R$ {:.2}", cart.total());
}

/// Interactive chat on stdin/stdout
#[inline]
pub async fn run_chat() -> Result<()> {
    let (config, providers) = load_providers().await?;
    let mut session = ChatSession::new(ConversationOrchestrator::new(&providers, &config));

    println!("{}", style("Lica: Olá! Como posso ajudar com a sua limpeza hoje?").green());
    println!("{}", style("(digite /help para ver os comandos)").dim());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout()).context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match parse_chat_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Quit => break,
            ChatInput::Help => print_chat_help(),
            ChatInput::ShowCart => print_cart(&session),
            ChatInput::AddCurrent => match session.add_current_to_cart() {
                Some(quantity) => println!("✅ Adicionado ao carrinho (quantidade: {})", quantity),
                None => println!("⚠️  Nenhum produto selecionado ainda"),
            },
            ChatInput::Remove(code) => {
                if session.cart_mut().remove(&code) {
                    println!("🗑️  {} removido do carrinho", code);
                } else {
                    println!("⚠️  {} não está no carrinho", code);
                }
            }
            ChatInput::Checkout => match session.cart().checkout_url(&config.checkout.url) {
                Ok(url) => println!("🔗 Finalize sua compra em: {}", url),
                Err(e) => println!("⚠️  {}", e),
            },
            ChatInput::Unknown(command) => {
                println!("❓ Comando desconhecido: {}", command);
                print_chat_help();
            }
            ChatInput::Message(text) => {
                let reply = session.send(&text).await;
                println!();
                println!("{} {}", style("Lica:").green().bold(), reply.text);
                if let Some(product) = &reply.product {
                    print_product(product);
                }
                println!();
            }
        }
    }

    info!("Chat session ended after {} messages", session.messages().len());
    Ok(())
}

/// Run product resolution for `text` and list what was found
#[inline]
pub async fn search_products(text: &str) -> Result<()> {
    let (config, providers) = load_providers().await?;
    let orchestrator = ConversationOrchestrator::new(&providers, &config);
    let context = ConversationContext::with_user_message(&[], text);

    let products = orchestrator
        .resolver()
        .resolve(text, &context)
        .await
        .context("Product search failed")?;

    if products.is_empty() {
        println!("No products found for \"{}\"", text);
        return Ok(());
    }

    println!("Found {} product(s) for \"{}\":", products.len(), text);
    for (rank, product) in products.iter().enumerate() {
        println!(
            "{}. {} [{}] similarity: {}",
            rank + 1,
            style(&product.name).bold(),
            product.code,
            product.display_similarity()
        );
        println!("   {} | {}", product.display_price(), product.category);
        if !product.active {
            println!("   {}", style("(inactive)").yellow());
        }
    }
    Ok(())
}

/// Print the embedding of `text` as a JSON array
#[inline]
pub async fn embed_text(text: &str) -> Result<()> {
    let (_, providers) = load_providers().await?;
    let vector = providers
        .embeddings
        .embed(text)
        .await
        .context("Failed to generate embedding")?;
    println!("{}", serde_json::to_string(&vector)?);
    Ok(())
}

#[inline]
pub async fn add_product(registration: ProductRegistration) -> Result<()> {
    let (_, providers) = load_providers().await?;
    let admin = ProductAdmin::new(&providers);

    let saved = admin
        .save_product(&registration)
        .await
        .with_context(|| format!("Failed to save product {}", registration.code))?;

    println!("✅ Saved product {} ({})", saved.name, saved.code);
    println!("   Price: {}", saved.display_price());
    Ok(())
}

#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("📊 Lica Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match tokio::task::spawn_blocking(move || client.health_check()).await? {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Embedding model: {}", config.ollama.embedding_model);
                println!("   💬 Chat model: {}", config.ollama.chat_model);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Connected but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {}", e);
        }
    }

    println!();
    println!("🗄️  Catalog Status:");
    match Database::initialize_from_config_dir(config.get_base_dir()).await {
        Ok(database) => match database.statistics().await {
            Ok(stats) => {
                println!("   ✅ SQLite: Connected");
                println!("   📦 Products: {}", stats.total_products);
                println!("   🟢 Active: {}", stats.active_products);
                println!("   ⭐ Featured: {}", stats.featured_products);
            }
            Err(e) => {
                warn!("Failed to read catalog statistics: {}", e);
                println!("   ⚠️  SQLite: Connected but statistics unavailable - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ SQLite: Failed to connect - {}", e);
        }
    }

    println!();
    println!("🔍 Vector Database Status:");
    match VectorStore::new(&config).await {
        Ok(store) => match store.count().await {
            Ok(count) => {
                println!("   ✅ LanceDB: Connected");
                println!("   🧮 Product vectors: {}", count);
                println!("   📐 Dimension: {}", store.vector_dimension());
            }
            Err(e) => {
                println!("   ⚠️  LanceDB: Connected but count failed - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ LanceDB: Failed to connect - {}", e);
        }
    }

    Ok(())
}
