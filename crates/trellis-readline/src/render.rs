//! Terminal rendering of the shell's screens.

use colored::Colorize;
use trellis_application::KnowledgeStats;
use trellis_core::agent::CliStatus;
use trellis_core::concept::Concept;
use trellis_core::feed::DashboardCard;
use trellis_core::session::{Message, MessageRole, Session};
use trellis_core::settings::TeachingStyle;
use trellis_core::summary::{KnowledgeGraphNode, TopicSummary};
use trellis_core::topic::Topic;

pub fn banner() {
    println!("{}", "=== Trellis ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a question to start learning, '/help' for commands, or 'quit' to exit."
            .bright_black()
    );
    println!();
}

pub fn help() {
    let rows = [
        ("/home, /refresh", "show or regenerate the dashboard"),
        ("/open <n>", "start the session suggested by card n"),
        ("/topics", "list explored topics"),
        ("/topic <n|name>", "show a topic with its knowledge graph"),
        ("/summary", "regenerate the open topic's summary"),
        ("/try <n>", "start a session from suggestion n"),
        ("/create-topic <name> [| category]", "add a topic by hand"),
        ("/delete-topic <n|name>", "delete a topic and everything in it"),
        ("/new [n|name]", "start a new session, optionally in a topic"),
        ("/sessions, /resume <n>", "list and reopen the open topic's sessions"),
        ("/delete-session <n>", "delete one of the listed sessions"),
        ("/end", "end the session and extract what was learned"),
        ("/history, /context", "show the conversation or the last prompt"),
        ("/demo", "generate an interactive HTML demo"),
        ("/style [key value]", "show or change the teaching style"),
        ("/cli-path <path|clear>", "override where the claude CLI lives"),
        ("/status, /stats", "check the CLI or show learning stats"),
        ("/export [file], /import <file>", "back up or restore all data"),
        ("/clear-all", "delete all knowledge (settings stay)"),
        ("quit", "leave after pending work finishes"),
    ];
    for (command, description) in rows {
        println!("  {:<36} {}", command.bright_cyan(), description.bright_black());
    }
}

pub fn info(text: &str) {
    println!("{}", text.bright_black());
}

pub fn success(text: &str) {
    println!("{}", text.bright_green());
}

pub fn warning(text: &str) {
    println!("{}", text.yellow());
}

pub fn error(text: &str) {
    eprintln!("{}", text.red());
}

pub fn onboarding(status: Option<&CliStatus>) {
    println!();
    println!("{}", "Claude CLI setup".bright_yellow().bold());
    println!(
        "{}",
        "Trellis needs the Claude CLI installed and signed in.".bright_yellow()
    );
    if let Some(status) = status {
        if let Some(error) = &status.error {
            println!("  {}", error.red());
        }
    }
    println!("  1. npm install -g @anthropic-ai/claude-code");
    println!("  2. claude   (sign in once)");
    println!(
        "  3. {}",
        "/status to check again, or /cli-path <path> if it is installed elsewhere".bright_black()
    );
    println!();
}

pub fn status(status: &CliStatus) {
    let mark = |ok: bool| if ok { "yes".bright_green() } else { "no".red() };
    println!("  installed:     {}", mark(status.installed));
    println!("  authenticated: {}", mark(status.authenticated));
    if let Some(account) = &status.account {
        println!("  account:       {}", account);
    }
    if let Some(step) = &status.step_failed {
        println!("  failed step:   {}", step.yellow());
    }
}

pub fn cards(cards: &[DashboardCard]) {
    println!("{}", "Dashboard".bright_magenta().bold());
    if cards.is_empty() {
        info("  No suggestions yet.");
    }
    for (i, card) in cards.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).bright_cyan(),
            format!("({})", card.card_type).bright_black(),
            card.title.bold()
        );
        println!("      {}", card.description);
    }
}

pub fn topics(topics: &[Topic]) {
    if topics.is_empty() {
        info("No topics yet. Have a conversation and /end it.");
        return;
    }
    for (i, topic) in topics.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).bright_cyan(),
            topic.label().bold(),
            format!(
                "({} sessions, last {})",
                topic.session_ids.len(),
                topic.last_explored_at.format("%Y-%m-%d")
            )
            .bright_black()
        );
    }
}

pub fn topic_header(topic: &Topic, concepts: &[Concept], related: &[Topic]) {
    println!("{}", topic.label().bright_magenta().bold());
    if let Some(summary) = &topic.summary {
        println!("{}", summary);
    }
    if !concepts.is_empty() {
        let names: Vec<String> = concepts
            .iter()
            .map(|c| format!("{} ({})", c.name, c.familiarity_level))
            .collect();
        println!("{} {}", "Concepts:".bold(), names.join(", "));
    }
    if !related.is_empty() {
        let names: Vec<&str> = related.iter().map(|t| t.name.as_str()).collect();
        println!("{} {}", "Related:".bold(), names.join(", "));
    }
}

pub fn summary(summary: &TopicSummary) {
    if !summary.knowledge_graph.is_empty() {
        println!("{}", "Knowledge graph".bold());
        for node in &summary.knowledge_graph {
            graph_node(node, 1);
        }
    }
    if !summary.follow_up_suggestions.is_empty() {
        println!("{}", "Where to go next".bold());
        for (i, suggestion) in summary.follow_up_suggestions.iter().enumerate() {
            println!(
                "  {} {} {}",
                format!("[{}]", i + 1).bright_cyan(),
                format!("({})", suggestion.suggestion_type).bright_black(),
                suggestion.title
            );
            println!("      {}", suggestion.description.bright_black());
        }
    }
}

fn graph_node(node: &KnowledgeGraphNode, depth: usize) {
    let indent = "  ".repeat(depth);
    println!(
        "{}- {} {}",
        indent,
        node.concept_name,
        format!("({})", node.familiarity_level).bright_black()
    );
    for child in &node.children {
        graph_node(child, depth + 1);
    }
}

pub fn sessions(sessions: &[Session]) {
    if sessions.is_empty() {
        info("No sessions in this topic.");
        return;
    }
    for (i, session) in sessions.iter().enumerate() {
        println!(
            "  {} started {} {}",
            format!("[{}]", i + 1).bright_cyan(),
            session.started_at.format("%Y-%m-%d %H:%M"),
            format!("(last message {})", session.last_message_at.format("%Y-%m-%d %H:%M"))
                .bright_black()
        );
    }
}

pub fn message(message: &Message) {
    match message.role {
        MessageRole::User => println!("{}", format!("> {}", message.content).green()),
        MessageRole::Assistant => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
            println!();
        }
    }
}

pub fn teaching_style(style: &TeachingStyle) {
    let preset = style
        .preset
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".to_string());
    let params = &style.parameters;
    println!("  preset:       {}", preset);
    println!("  depth:        {}", params.depth);
    println!("  pace:         {}", params.pace);
    println!("  examples:     {}", params.example_frequency);
    println!("  analogies:    {}", if params.use_analogies { "on" } else { "off" });
    println!("  formality:    {}", params.formality);
    if let Some(instructions) = &style.custom_instructions {
        println!("  instructions: {}", instructions);
    }
}

pub fn stats(stats: &KnowledgeStats) {
    println!(
        "  {} topics, {} sessions, {} concepts",
        stats.topic_count, stats.session_count, stats.concept_count
    );
    println!(
        "  {} introduced, {} explored, {} understood",
        stats.introduced, stats.explored, stats.understood
    );
}
