// Assistant module
// Conversational product resolution: intent, search, prompt and reply

pub mod intent;
pub mod models;
pub mod optimizer;
pub mod orchestrator;
pub mod prompt;
pub mod resolver;
pub mod selector;

#[cfg(test)]
pub(crate) mod testing;

pub use intent::IntentClassifier;
pub use models::{ConversationContext, Message, ResolvedProduct, Role, TurnReply};
pub use optimizer::QueryOptimizer;
pub use orchestrator::{ConversationOrchestrator, EMPTY_REPLY_FALLBACK};
pub use resolver::ProductResolver;
pub use selector::select_product;
