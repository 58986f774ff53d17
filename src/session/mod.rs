
use std::collections::HashSet;
use tracing::error;

use crate::assistant::models::{Message, ResolvedProduct};
use crate::assistant::orchestrator::ConversationOrchestrator;
use crate::cart::Cart;

/// Shown to the user whenever a turn fails
pub const SESSION_FALLBACK_MESSAGE: &str =
    "Desculpe, ocorreu um erro ao processar sua mensagem. Por favor, tente novamente.";

/// What the user sees after sending a message
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReply {
    pub text: String,
    /// Product to display, `None` when it was already shown earlier
    pub product: Option<ResolvedProduct>,
    pub failed: bool,
}

/// One user's conversation: history, current product, display dedup and cart
pub struct ChatSession {
    orchestrator: ConversationOrchestrator,
    messages: Vec<Message>,
    current_product: Option<ResolvedProduct>,
    displayed: HashSet<String>,
    cart: Cart,
}

impl ChatSession {
    #[inline]
    pub fn new(orchestrator: ConversationOrchestrator) -> Self {
        Self {
            orchestrator,
            messages: Vec::new(),
            current_product: None,
            displayed: HashSet::new(),
            cart: Cart::new(),
        }
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub fn current_product(&self) -> Option<&ResolvedProduct> {
        self.current_product.as_ref()
    }

    #[inline]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    #[inline]
    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Add the current product to the cart, returning its new quantity
    #[inline]
    pub fn add_current_to_cart(&mut self) -> Option<u32> {
        let product = self.current_product.clone()?;
        Some(self.cart.add(product))
    }

    /// Run one turn and record it in the history.
    ///
    /// A failed turn keeps the user's message, answers with the fixed
    /// fallback text and leaves the current product alone, so the user can
    /// simply try again.
    #[inline]
    pub async fn send(&mut self, text: &str) -> SessionReply {
        let result = self
            .orchestrator
            .turn(text, &self.messages, self.current_product.as_ref())
            .await;
        self.messages.push(Message::user(text));

        match result {
            Ok(turn) => {
                let product = turn.attached_product.and_then(|product| {
                    let first_showing = self.displayed.insert(product.code.clone());
                    self.current_product = Some(product.clone());
                    first_showing.then_some(product)
                });
                self.messages.push(Message::assistant(turn.reply_text.as_str()));
                SessionReply {
                    text: turn.reply_text,
                    product,
                    failed: false,
                }
            }
            Err(e) => {
                error!("Failed to process message: {}", e);
                self.messages
                    .push(Message::assistant(SESSION_FALLBACK_MESSAGE));
                SessionReply {
                    text: SESSION_FALLBACK_MESSAGE.to_string(),
                    product: None,
                    failed: true,
                }
            }
        }
    }
}
