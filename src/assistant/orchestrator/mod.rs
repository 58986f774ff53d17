
use std::sync::Arc;
use tracing::{debug, info};

use crate::assistant::intent::IntentClassifier;
use crate::assistant::models::{ConversationContext, Message, ResolvedProduct, TurnReply};
use crate::assistant::optimizer::QueryOptimizer;
use crate::assistant::prompt::system_prompt;
use crate::assistant::resolver::ProductResolver;
use crate::assistant::selector::select_product;
use crate::config::Config;
use crate::embeddings::ollama::ChatMessage;
use crate::providers::{CompletionProvider, CompletionRequest, Providers};
use crate::{LicaError, Result};

/// Reply used when the generation provider answers with nothing
pub const EMPTY_REPLY_FALLBACK: &str = "Desculpe, não consegui processar sua pergunta.";

/// Entry point for a single conversation turn.
///
/// Holds no per-conversation state: history and the current product are
/// passed in by the caller on every turn, so one orchestrator can serve any
/// number of conversations.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    classifier: IntentClassifier,
    resolver: ProductResolver,
    completions: Arc<dyn CompletionProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl ConversationOrchestrator {
    #[inline]
    pub fn new(providers: &Providers, config: &Config) -> Self {
        let classifier =
            IntentClassifier::new(Arc::clone(&providers.completions), &config.generation);
        let optimizer =
            QueryOptimizer::new(Arc::clone(&providers.completions), &config.generation);
        let resolver = ProductResolver::new(optimizer, providers, config.search.top_k);

        Self {
            classifier,
            resolver,
            completions: Arc::clone(&providers.completions),
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
        }
    }

    #[inline]
    pub fn resolver(&self) -> &ProductResolver {
        &self.resolver
    }

    /// Process one user message.
    ///
    /// With a current product the classifier decides between reusing it and
    /// searching again; without one it decides whether to search at all. The
    /// attached product is chosen from the reply text, or carried over from
    /// `current_product` when there were no candidates. Showing a product only
    /// once per conversation is left to the caller.
    #[inline]
    pub async fn turn(
        &self,
        user_message: &str,
        prior_messages: &[Message],
        current_product: Option<&ResolvedProduct>,
    ) -> Result<TurnReply> {
        let mut context = ConversationContext::with_user_message(prior_messages, user_message);

        let candidates = self
            .candidates_for(user_message, &context, current_product)
            .await
            .map_err(|e| LicaError::Resolution(format!("could not process message: {}", e)))?;

        let request = CompletionRequest {
            system: Some(system_prompt(&candidates)),
            messages: context.messages.iter().map(ChatMessage::from).collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let reply = self.completions.complete(request).await.map_err(|e| match e {
            LicaError::Generation(_) => e,
            other => LicaError::Generation(other.to_string()),
        })?;

        let reply_text = if reply.trim().is_empty() {
            EMPTY_REPLY_FALLBACK.to_string()
        } else {
            reply
        };

        let attached_product = if candidates.is_empty() {
            current_product.cloned()
        } else {
            select_product(&reply_text, &candidates).cloned()
        };
        debug!(
            "Attached product: {:?}",
            attached_product.as_ref().map(|product| &product.code)
        );

        context.relevant_products = (!candidates.is_empty()).then_some(candidates);

        Ok(TurnReply {
            reply_text,
            attached_product,
            context,
        })
    }

    async fn candidates_for(
        &self,
        user_message: &str,
        context: &ConversationContext,
        current_product: Option<&ResolvedProduct>,
    ) -> Result<Vec<ResolvedProduct>> {
        match current_product {
            Some(current) => {
                if self
                    .classifier
                    .wants_different_product(user_message, current)
                    .await?
                {
                    info!("User moved on from {}, searching again", current.code);
                    self.resolver.resolve(user_message, context).await
                } else {
                    info!("User is still asking about {}", current.code);
                    Ok(vec![current.clone()])
                }
            }
            None => {
                if self.classifier.needs_product_lookup(user_message).await? {
                    info!("Message needs a product lookup");
                    self.resolver.resolve(user_message, context).await
                } else {
                    info!("No product lookup needed");
                    Ok(Vec::new())
                }
            }
        }
    }
}
