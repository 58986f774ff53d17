
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::assistant::models::{Message, Role};
use crate::config::GenerationConfig;
use crate::providers::{CompletionProvider, CompletionRequest};

/// Two user/assistant turn pairs
pub const CONTEXT_WINDOW: usize = 4;

/// Rewrites a chat utterance into a denser catalog search query
#[derive(Clone)]
pub struct QueryOptimizer {
    completions: Arc<dyn CompletionProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl QueryOptimizer {
    #[inline]
    pub fn new(completions: Arc<dyn CompletionProvider>, generation: &GenerationConfig) -> Self {
        Self {
            completions,
            temperature: generation.optimizer_temperature,
            max_tokens: generation.optimizer_max_tokens,
        }
    }

    /// Never fails: any provider error or blank rewrite yields `raw_message`
    #[inline]
    pub async fn optimize(&self, raw_message: &str, recent_messages: &[Message]) -> String {
        let prompt = build_prompt(raw_message, recent_window(recent_messages));
        let request = CompletionRequest::prompt(prompt, self.temperature, self.max_tokens);

        match self.completions.complete(request).await {
            Ok(rewritten) => match clean_query(&rewritten) {
                Some(query) => {
                    debug!("Optimized search query: {:?} -> {:?}", raw_message, query);
                    query
                }
                None => {
                    debug!("Optimizer returned blank text, using raw message");
                    raw_message.to_string()
                }
            },
            Err(e) => {
                warn!("Query optimization failed, using raw message: {}", e);
                raw_message.to_string()
            }
        }
    }
}

fn recent_window(messages: &[Message]) -> &[Message] {
    &messages[messages.len().saturating_sub(CONTEXT_WINDOW)..]
}

fn build_prompt(raw_message: &str, recent: &[Message]) -> String {
    let history = if recent.is_empty() {
        "(sem mensagens anteriores)".to_string()
    } else {
        recent
            .iter()
            .map(|message| {
                let speaker = match message.role {
                    Role::User => "Usuário",
                    Role::Assistant => "Lica",
                };
                format!("{}: {}", speaker, message.content)
            })
            .join("\n")
    };

    format!(
        r#"Reescreva a mensagem do usuário como uma consulta curta para buscar produtos de limpeza em um catálogo.
Use a conversa recente para resolver referências vagas como "esse", "um desses" ou "outro".

CONVERSA RECENTE:
{history}

MENSAGEM DO USUÁRIO:
"{raw_message}"

Responda apenas com a consulta de busca, sem explicações."#
    )
}

/// Trimmed rewrite without surrounding quotes, `None` when nothing is left
fn clean_query(text: &str) -> Option<String> {
    let query = text
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”'))
        .trim();
    (!query.is_empty()).then(|| query.to_string())
}
