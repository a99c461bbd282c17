//! Tutor system prompt assembled from the learner's teaching style.

use trellis_core::settings::{Depth, Formality, TeachingPreset, TeachingStyle};

pub const BASE_TUTOR_PROMPT: &str = "You are a knowledgeable tutor helping someone learn.";

fn preset_instruction(preset: TeachingPreset) -> &'static str {
    match preset {
        TeachingPreset::Socratic => {
            "Use the Socratic method: ask guiding questions rather than giving direct answers."
        }
        TeachingPreset::HandsOn => {
            "Focus on practical examples and exercises. Show code and let the learner experiment."
        }
        TeachingPreset::Theoretical => {
            "Emphasize underlying theory and principles. Build a solid conceptual foundation."
        }
        TeachingPreset::Storyteller => {
            "Use narratives and analogies to make concepts memorable and engaging."
        }
    }
}

/// Builds the system prompt; without a style only the base sentence is used.
pub fn build_system_prompt(style: Option<&TeachingStyle>) -> String {
    let Some(style) = style else {
        return BASE_TUTOR_PROMPT.to_string();
    };

    let mut parts: Vec<&str> = vec![BASE_TUTOR_PROMPT];

    if let Some(preset) = style.preset {
        parts.push(preset_instruction(preset));
    }

    let params = &style.parameters;
    match params.depth {
        Depth::Deep => parts.push("Provide thorough, detailed explanations."),
        Depth::Shallow => parts.push("Keep explanations concise and high-level."),
        Depth::Moderate => {}
    }

    if params.use_analogies {
        parts.push("Use analogies to relate new concepts to familiar ones.");
    }

    match params.formality {
        Formality::Casual => parts.push("Use a casual, conversational tone."),
        Formality::Formal => parts.push("Maintain a professional, academic tone."),
        Formality::Balanced => {}
    }

    if let Some(instructions) = style.custom_instructions.as_deref() {
        parts.push(instructions);
    }

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Appends the prior-knowledge paragraph when there is one.
pub fn with_knowledge_context(system_prompt: &str, knowledge_context: Option<&str>) -> String {
    match knowledge_context {
        Some(context) if !context.is_empty() => {
            format!("{}\n\nPrior knowledge context:\n{}", system_prompt, context)
        }
        _ => system_prompt.to_string(),
    }
}
