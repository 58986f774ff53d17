// Embeddings module
// Ollama integration for embeddings and chat completions

pub mod ollama;

pub use ollama::{ChatMessage, OllamaClient};
