//! Prompt templates.
//!
//! Every prompt sent to the CLI is a minijinja template registered here.
//! Callers pass typed, already-formatted context; templates only lay it out.

use minijinja::{AutoEscape, Environment, Value};
use serde::Serialize;
use trellis_core::{Result, TrellisError};

pub const TOPIC_IDENTIFICATION: &str = "topic_identification";
pub const TOPIC_MATCHING: &str = "topic_matching";
pub const KNOWLEDGE_EXTRACTION: &str = "knowledge_extraction";
pub const KNOWLEDGE_CONTEXT: &str = "knowledge_context";
pub const FEED_GENERATION: &str = "feed_generation";
pub const TOPIC_SUMMARY: &str = "topic_summary";
pub const DEMO_GENERATION: &str = "demo_generation";

const TOPIC_IDENTIFICATION_TEMPLATE: &str = r#"Analyze the following user message and identify the main topic they want to learn about.

Return a JSON object with this exact structure:
{
  "topicName": "clear, concise topic name (e.g., 'Trigonometry', 'Rust Ownership', 'French Revolution')",
  "topicCategory": "optional broad category (e.g., 'Mathematics', 'Programming', 'History')"
}

Rules:
- The topic name should be specific but not too narrow
- If the message is unclear or doesn't indicate a learning topic, return null
- Only return valid JSON, no markdown or explanation

User message:
{{ message }}"#;

const TOPIC_MATCHING_TEMPLATE: &str = r#"Given a new topic the user wants to learn about, determine if it matches any existing topics.

New topic: "{{ new_topic }}"
{% if new_category %}Category: {{ new_category }}{% endif %}

Existing topics:
{% for topic in existing_topics %}- {{ topic }}{% if not loop.last %}
{% endif %}{% endfor %}

Return a JSON object with this exact structure:
{
  "matchedTopicName": "exact name of the matching existing topic, or null if no match"
}

Rules:
- Match if the new topic is essentially the same subject as an existing topic
- Match if the new topic is a subtopic or closely related aspect of an existing topic
- Examples of matches: "React Hooks" matches "React", "Linear Equations" matches "Algebra"
- Examples of non-matches: "React" does not match "Vue.js", "Calculus" does not match "Statistics"
- Only return valid JSON, no markdown or explanation
"#;

const KNOWLEDGE_EXTRACTION_TEMPLATE: &str = r#"Analyze the following learning conversation and extract knowledge information.

Return a JSON object with this exact structure:
{
  "topicName": "clear topic name (e.g., 'Trigonometry', 'Rust Ownership')",
  "topicCategory": "optional category (e.g., 'Mathematics', 'Programming')",
  "topicSummary": "1-2 sentence summary of what was learned",
  "concepts": [
    {
      "name": "concept name",
      "familiarityLevel": "introduced|explored|understood",
      "relatedTo": ["other concept names if any"]
    }
  ]
}

Familiarity levels:
- "introduced": briefly mentioned or just started learning
- "explored": discussed in some detail
- "understood": thoroughly explained with examples

Only return valid JSON, no markdown or explanation.

Conversation:
{% for line in lines %}{{ line.speaker }}: {{ line.content }}{% if not loop.last %}

{% endif %}{% endfor %}"#;

const KNOWLEDGE_CONTEXT_TEMPLATE: &str = r#"The student has previously explored:
{% for topic in topics %}- {{ topic.label }}: {{ topic.summary }}
  Concepts: {{ topic.concepts }}{% if not loop.last %}
{% endif %}{% endfor %}"#;

const FEED_GENERATION_TEMPLATE: &str = r#"Based on the student's learning history, generate dashboard cards to encourage continued learning.

Return a JSON object with this exact structure:
{
  "cards": [
    {
      "type": "resume|expand|discover|connection",
      "title": "short title",
      "description": "1-2 sentence description",
      "topicId": "ID if resuming existing topic, null otherwise",
      "suggestedPrompt": "optional prompt to start the session"
    }
  ]
}

Card types:
- "resume": Continue where they left off on a specific topic
- "expand": Deepen knowledge on an explored topic
- "discover": Suggest new related topics based on interests
- "connection": Show how different topics they've learned connect

Generate 3-5 cards that are engaging and personalized.
Only return valid JSON, no markdown or explanation.

Student's learning history:
{% for topic in topics %}Topic: {{ topic.label }}
  Last explored: {{ topic.last_explored }}
  Summary: {{ topic.summary }}
  Concepts: {{ topic.concepts }}
  Topic ID: {{ topic.id }}{% if not loop.last %}

{% endif %}{% endfor %}"#;

const TOPIC_SUMMARY_TEMPLATE: &str = r#"You are analyzing a student's learning journey within a specific topic. Generate a comprehensive topic summary with a knowledge graph and follow-up suggestions.

Return a JSON object with this exact structure:
{
  "knowledgeGraph": [
    {
      "conceptName": "Main Concept Name",
      "familiarityLevel": "introduced|explored|understood",
      "children": [
        {
          "conceptName": "Sub-concept",
          "familiarityLevel": "introduced|explored|understood",
          "children": []
        }
      ],
      "relatedConcepts": ["Related concept from another branch"]
    }
  ],
  "followUpSuggestions": [
    {
      "title": "Engaging title (question or hook)",
      "description": "1-2 sentences explaining why this is valuable to explore",
      "suggestedPrompt": "The actual prompt to start the conversation",
      "type": "deepen|connect|challenge|apply"
    }
  ]
}

Knowledge Graph Guidelines:
- Organize concepts hierarchically (parent concepts contain more specific children)
- Maximum depth of 3 levels
- Root-level concepts should be the main themes/areas explored
- "relatedConcepts" shows connections to other branches (cross-references)
- Use the exact concept names provided, but organize them logically
- If no concepts exist yet, return an empty knowledgeGraph array

Suggestion Types (generate 2 of each, 8 total):
- "deepen": Explore current concepts more thoroughly, advanced angles
- "connect": Bridge to related domains or show how concepts interconnect
- "challenge": Pose problems, paradoxes, or edge cases to test understanding
- "apply": Practical applications, projects, or real-world scenarios

Guidelines:
- Make suggestions specific to what they've already learned
- Reference their actual concepts when possible
- Write titles that provoke curiosity
- Suggested prompts should open conversations, not close them

Only return valid JSON, no markdown or explanation.

Topic: {{ name }}
Category: {{ category }}
Current Summary: {{ summary }}

Explored Concepts:
{% for concept in concepts %}- {{ concept }}
{% else %}No concepts extracted yet
{% endfor %}
Recent Session Excerpts:
{% for excerpt in excerpts %}{{ excerpt }}{% if not loop.last %}

{% endif %}{% else %}No conversations yet{% endfor %}
"#;

const DEMO_GENERATION_TEMPLATE: &str = r#"Based on our recent conversation, create an interactive HTML demo that visualizes the main concept being discussed.

Recent conversation:
{% for line in lines %}{{ line.speaker }}: {{ line.content }}{% if not loop.last %}

{% endif %}{% endfor %}

Requirements:
1. Create a single self-contained HTML document with embedded CSS and JavaScript
2. The demo should be interactive and help visualize the concept
3. Use a clean, minimal design with a dark background (#0a0a0a) and light text (#ededed)
4. Make it educational - the user should learn by interacting with it
5. Include brief instructions within the demo itself

Respond with ONLY valid HTML - no markdown, no explanation, just the complete HTML document starting with <!DOCTYPE html>."#;

/// One `Speaker: content` line of a transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptLine {
    pub speaker: &'static str,
    pub content: String,
}

/// One topic as rendered in history-style prompts.
#[derive(Debug, Clone, Serialize)]
pub struct TopicDigest {
    pub id: String,
    /// Name with optional ` [category]`
    pub label: String,
    pub last_explored: String,
    pub summary: String,
    /// `name (level), ...` or a placeholder
    pub concepts: String,
}

/// Compiled prompt templates.
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        let templates = [
            (TOPIC_IDENTIFICATION, TOPIC_IDENTIFICATION_TEMPLATE),
            (TOPIC_MATCHING, TOPIC_MATCHING_TEMPLATE),
            (KNOWLEDGE_EXTRACTION, KNOWLEDGE_EXTRACTION_TEMPLATE),
            (KNOWLEDGE_CONTEXT, KNOWLEDGE_CONTEXT_TEMPLATE),
            (FEED_GENERATION, FEED_GENERATION_TEMPLATE),
            (TOPIC_SUMMARY, TOPIC_SUMMARY_TEMPLATE),
            (DEMO_GENERATION, DEMO_GENERATION_TEMPLATE),
        ];
        for (name, source) in templates {
            env.add_template(name, source).map_err(|e| {
                TrellisError::internal(format!("Invalid prompt template '{}': {}", name, e))
            })?;
        }

        Ok(Self { env })
    }

    /// Renders a registered template with the given context.
    pub fn render(&self, name: &str, ctx: Value) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| TrellisError::internal(format!("Unknown prompt template '{}': {}", name, e)))?;
        template
            .render(ctx)
            .map_err(|e| TrellisError::internal(format!("Failed to render '{}': {}", name, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn library() -> PromptLibrary {
        PromptLibrary::new().unwrap()
    }

    #[test]
    fn test_identification_appends_message() {
        let prompt = library()
            .render(TOPIC_IDENTIFICATION, context! { message => "Teach me about <b>tags</b>" })
            .unwrap();
        assert!(prompt.ends_with("User message:\nTeach me about <b>tags</b>"));
    }

    #[test]
    fn test_matching_without_category() {
        let prompt = library()
            .render(
                TOPIC_MATCHING,
                context! {
                    new_topic => "React Hooks",
                    new_category => None::<String>,
                    existing_topics => vec!["React [Programming]", "Algebra"],
                },
            )
            .unwrap();
        assert!(prompt.contains("New topic: \"React Hooks\"\n\n\nExisting topics:\n- React [Programming]\n- Algebra\n\nReturn"));
    }

    #[test]
    fn test_matching_with_category() {
        let prompt = library()
            .render(
                TOPIC_MATCHING,
                context! {
                    new_topic => "Limits",
                    new_category => "Mathematics",
                    existing_topics => vec!["Calculus"],
                },
            )
            .unwrap();
        assert!(prompt.contains("New topic: \"Limits\"\nCategory: Mathematics\n\nExisting topics:\n- Calculus\n"));
    }

    #[test]
    fn test_extraction_transcript() {
        let lines = vec![
            TranscriptLine {
                speaker: "Student",
                content: "What is a derivative?".to_string(),
            },
            TranscriptLine {
                speaker: "Teacher",
                content: "A rate of change.".to_string(),
            },
        ];
        let prompt = library()
            .render(KNOWLEDGE_EXTRACTION, context! { lines => lines })
            .unwrap();
        assert!(prompt.ends_with(
            "Conversation:\nStudent: What is a derivative?\n\nTeacher: A rate of change."
        ));
    }

    #[test]
    fn test_knowledge_context_layout() {
        let topics = vec![
            TopicDigest {
                id: "t1".into(),
                label: "Calculus [Mathematics]".into(),
                last_explored: String::new(),
                summary: "Limits and derivatives".into(),
                concepts: "Limit (explored), Derivative (introduced)".into(),
            },
            TopicDigest {
                id: "t2".into(),
                label: "Rust".into(),
                last_explored: String::new(),
                summary: "No summary".into(),
                concepts: "None extracted".into(),
            },
        ];
        let text = library()
            .render(KNOWLEDGE_CONTEXT, context! { topics => topics })
            .unwrap();
        assert_eq!(
            text,
            "The student has previously explored:\n\
             - Calculus [Mathematics]: Limits and derivatives\n  Concepts: Limit (explored), Derivative (introduced)\n\
             - Rust: No summary\n  Concepts: None extracted"
        );
    }

    #[test]
    fn test_summary_placeholders() {
        let prompt = library()
            .render(
                TOPIC_SUMMARY,
                context! {
                    name => "Chess",
                    category => "General",
                    summary => "No summary available yet",
                    concepts => Vec::<String>::new(),
                    excerpts => Vec::<String>::new(),
                },
            )
            .unwrap();
        assert!(prompt.contains("Explored Concepts:\nNo concepts extracted yet\n"));
        assert!(prompt.ends_with("Recent Session Excerpts:\nNo conversations yet\n"));
    }

    #[test]
    fn test_demo_prompt_includes_context() {
        let lines = vec![TranscriptLine {
            speaker: "User",
            content: "Show me sine waves".to_string(),
        }];
        let prompt = library()
            .render(DEMO_GENERATION, context! { lines => lines })
            .unwrap();
        assert!(prompt.contains("Recent conversation:\nUser: Show me sine waves\n\nRequirements:"));
        assert!(prompt.ends_with("starting with <!DOCTYPE html>."));
    }
}
