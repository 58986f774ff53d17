// Configuration management module
// TOML settings for the Ollama connection, generation parameters, search and checkout

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CheckoutConfig, Config, ConfigError, GenerationConfig, OllamaConfig, SearchConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
