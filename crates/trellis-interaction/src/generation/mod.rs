//! Typed generation services.
//!
//! Each service renders a prompt, calls the [`CompletionAgent`], and maps
//! the reply to a domain value. Agent failures never surface as errors:
//! they become `None`, a fallback value, or an error string on the result.
//!
//! [`CompletionAgent`]: trellis_core::agent::CompletionAgent

pub mod chat;
pub mod demo_generation;
pub mod digest;
pub mod feed_generation;
pub mod knowledge_extraction;
pub mod topic_identification;
pub mod topic_summary_generation;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat::{ChatOutcome, ChatReply, ChatService};
pub use demo_generation::{DemoGenerator, DemoResult};
pub use feed_generation::{FeedGenerator, FeedResult, default_cards};
pub use knowledge_extraction::{ExtractedConcept, ExtractedKnowledge, KnowledgeExtractor};
pub use topic_identification::{IdentifiedTopic, TopicIdentifier, TopicMatch};
pub use topic_summary_generation::{
    TopicSummaryGenerator, TopicSummaryResult, default_suggestions,
};

/// Error string reported when the CLI executable is missing.
pub const CLI_NOT_FOUND: &str = "CLI not found";
/// Error string reported when no JSON object could be found in the reply.
pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format";
