//! Shared text renderings of topics, concepts and transcripts.

use crate::prompts::{TopicDigest, TranscriptLine};
use trellis_core::concept::Concept;
use trellis_core::session::{Message, MessageRole};
use trellis_core::topic::Topic;

/// Which pair of labels to use for a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speakers {
    /// `User` / `Assistant`
    Chat,
    /// `Student` / `Teacher`
    Classroom,
}

pub fn transcript(messages: &[Message], speakers: Speakers) -> Vec<TranscriptLine> {
    messages
        .iter()
        .map(|message| TranscriptLine {
            speaker: speaker_label(message.role, speakers),
            content: message.content.clone(),
        })
        .collect()
}

fn speaker_label(role: MessageRole, speakers: Speakers) -> &'static str {
    match speakers {
        Speakers::Chat => role.chat_label(),
        Speakers::Classroom => role.classroom_label(),
    }
}

/// `Name (level), Name (level)` for the concepts belonging to `topic_id`,
/// or `None extracted`.
pub fn concept_list(topic_id: &str, concepts: &[Concept]) -> String {
    let list = concepts
        .iter()
        .filter(|concept| concept.topic_id == topic_id)
        .map(|concept| format!("{} ({})", concept.name, concept.familiarity_level))
        .collect::<Vec<_>>()
        .join(", ");
    if list.is_empty() {
        "None extracted".to_string()
    } else {
        list
    }
}

pub fn topic_digest(topic: &Topic, concepts: &[Concept]) -> TopicDigest {
    TopicDigest {
        id: topic.id.clone(),
        label: topic.label(),
        last_explored: topic.last_explored_at.format("%Y-%m-%d").to_string(),
        summary: topic
            .summary
            .clone()
            .unwrap_or_else(|| "No summary".to_string()),
        concepts: concept_list(&topic.id, concepts),
    }
}
