
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::database::lancedb::VectorRecord;
use crate::database::sqlite::CatalogRecord;
use crate::embeddings::ollama::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    #[inline]
    fn from(message: &Message) -> Self {
        Self::new(message.role.as_str(), message.content.as_str())
    }
}

/// A catalog product joined with the descriptive text stored next to its vector.
///
/// Built fresh for every search and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProduct {
    pub code: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub featured: bool,
    pub active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    /// Score of the similarity candidate this product was resolved from
    pub similarity: Option<f32>,
    pub usage_instructions: String,
    pub vector_description: String,
}

impl ResolvedProduct {
    #[inline]
    pub fn join(catalog: CatalogRecord, vector: &VectorRecord, similarity: Option<f32>) -> Self {
        Self {
            code: catalog.code,
            name: catalog.name,
            price: catalog.price,
            description: catalog.description,
            category: catalog.category,
            image_url: catalog.image_url,
            featured: catalog.featured,
            active: catalog.active,
            created_at: catalog.created_at,
            updated_at: catalog.updated_at,
            similarity,
            usage_instructions: vector.metadata.usage_instructions.clone(),
            vector_description: vector.metadata.description.clone(),
        }
    }

    /// Price formatted the way the storefront shows it, e.g. `R$ 12.90`
    #[inline]
    pub fn display_price(&self) -> String {
        format!("R$ {:.2}", self.price)
    }

    /// Similarity as shown to people; a missing score reads `n/a`
    #[inline]
    pub fn display_similarity(&self) -> String {
        self.similarity
            .map_or_else(|| "n/a".to_string(), |score| format!("{:.3}", score))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub messages: Vec<Message>,
    pub relevant_products: Option<Vec<ResolvedProduct>>,
}

impl ConversationContext {
    /// New context holding `prior` followed by the user's message
    #[inline]
    pub fn with_user_message(prior: &[Message], text: &str) -> Self {
        let mut messages = Vec::with_capacity(prior.len() + 1);
        messages.extend_from_slice(prior);
        messages.push(Message::user(text));
        Self {
            messages,
            relevant_products: None,
        }
    }

    /// Messages that came before the newest one
    #[inline]
    pub fn history(&self) -> &[Message] {
        match self.messages.split_last() {
            Some((_, history)) => history,
            None => &[],
        }
    }
}

/// Outcome of one conversation turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub reply_text: String,
    pub attached_product: Option<ResolvedProduct>,
    pub context: ConversationContext,
}
