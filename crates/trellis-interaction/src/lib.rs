//! Everything that talks to the external CLI.
//!
//! - [`ClaudeCodeAgent`]: the production [`CompletionAgent`](trellis_core::agent::CompletionAgent)
//! - [`PromptLibrary`]: the prompt templates
//! - [`generation`]: typed generation services built on the two

pub mod claude_code;
pub mod generation;
pub mod json_extract;
pub mod prompts;
pub mod system_prompt;

pub use claude_code::ClaudeCodeAgent;
pub use prompts::PromptLibrary;
pub use system_prompt::{build_system_prompt, with_knowledge_context};
