mod common;

use common::{EXTRACT, TestApp, extraction_json};
use std::time::Duration;
use trellis_core::concept::{Concept, FamiliarityLevel};
use trellis_core::session::{Message, Session};

fn conversation(session_id: &str) -> Vec<Message> {
    vec![
        Message::user(session_id, "Teach me about ownership"),
        Message::assistant(session_id, "Every value has a single owner."),
    ]
}

async fn persisted_session(app: &TestApp) -> Session {
    let session = Session::new(None);
    app.ctx.repositories.sessions.save(&session).await.unwrap();
    session
}

#[tokio::test]
async fn test_merge_adds_only_unseen_concepts() {
    let app = TestApp::new().await;
    app.agent.reply(
        EXTRACT,
        &extraction_json("Rust Ownership", &[("Ownership", "introduced", "")]),
    );
    app.agent.reply(
        EXTRACT,
        &extraction_json(
            "rust ownership",
            &[
                ("OWNERSHIP", "understood", "Moves"),
                ("Moves", "explored", "Ownership"),
            ],
        ),
    );

    let first = persisted_session(&app).await;
    let topic = app
        .ctx
        .knowledge
        .extract_and_save_knowledge(&conversation(&first.id), &first.id)
        .await
        .unwrap()
        .unwrap();

    let second = persisted_session(&app).await;
    let merged = app
        .ctx
        .knowledge
        .extract_and_save_knowledge(&conversation(&second.id), &second.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(merged.id, topic.id);
    assert_eq!(merged.name, "Rust Ownership");
    assert_eq!(merged.session_ids, vec![first.id.clone(), second.id.clone()]);
    assert!(merged.last_explored_at >= topic.last_explored_at);

    let concepts = app.ctx.repositories.concepts.list_by_topic(&topic.id).await.unwrap();
    assert_eq!(concepts.len(), 2);
    let ownership = concepts.iter().find(|c| c.name == "Ownership").unwrap();
    assert_eq!(ownership.familiarity_level, FamiliarityLevel::Introduced);
    let moves = concepts.iter().find(|c| c.name == "Moves").unwrap();
    // The duplicate was not saved, so nothing may point at it.
    assert!(moves.related_concept_ids.is_empty());
    assert_eq!(merged.concept_ids, vec![ownership.id.clone(), moves.id.clone()]);

    let second = app
        .ctx
        .repositories
        .sessions
        .find_by_id(&second.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.topic_id.as_deref(), Some(topic.id.as_str()));
    assert_eq!(second.extracted_concept_ids, vec![moves.id.clone()]);

    let state = app.ctx.knowledge.snapshot().await;
    assert_eq!(state.topics.len(), 1);
    assert_eq!(state.concepts.len(), 2);
    assert!(state.last_extraction.is_some());
}

#[tokio::test]
async fn test_update_missing_topic_is_noop() {
    let app = TestApp::new().await;
    app.agent
        .reply(EXTRACT, &extraction_json("Anything", &[("Idea", "introduced", "")]));
    let session = persisted_session(&app).await;

    let result = app
        .ctx
        .knowledge
        .update_topic_from_session("no-such-topic", &session.id, &conversation(&session.id))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(app.ctx.repositories.concepts.list_all().await.unwrap().is_empty());
    assert!(app.ctx.repositories.topics.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_short_conversation_skips_agent() {
    let app = TestApp::new().await;
    let session = persisted_session(&app).await;
    let result = app
        .ctx
        .knowledge
        .extract_and_save_knowledge(&[Message::user(&session.id, "hi")], &session.id)
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(app.agent.requests().is_empty());
}

#[tokio::test]
async fn test_delete_topic_cascades() {
    let app = TestApp::new().await;
    app.agent.reply(
        EXTRACT,
        &extraction_json("Chess", &[("Fork", "explored", ""), ("Pin", "introduced", "")]),
    );
    app.agent
        .reply(EXTRACT, &extraction_json("Go", &[("Ko", "introduced", "")]));

    let chess_session = persisted_session(&app).await;
    for message in conversation(&chess_session.id) {
        app.ctx.repositories.messages.save(&message).await.unwrap();
    }
    let chess = app
        .ctx
        .knowledge
        .extract_and_save_knowledge(&conversation(&chess_session.id), &chess_session.id)
        .await
        .unwrap()
        .unwrap();

    let go_session = persisted_session(&app).await;
    for message in conversation(&go_session.id) {
        app.ctx.repositories.messages.save(&message).await.unwrap();
    }
    let go = app
        .ctx
        .knowledge
        .extract_and_save_knowledge(&conversation(&go_session.id), &go_session.id)
        .await
        .unwrap()
        .unwrap();

    app.ctx.knowledge.delete_topic(&chess.id).await.unwrap();

    let repos = &app.ctx.repositories;
    assert!(repos.topics.find_by_id(&chess.id).await.unwrap().is_none());
    assert!(repos.sessions.find_by_id(&chess_session.id).await.unwrap().is_none());
    assert!(repos.messages.list_by_session(&chess_session.id).await.unwrap().is_empty());
    assert!(repos.concepts.list_by_topic(&chess.id).await.unwrap().is_empty());

    assert!(repos.topics.find_by_id(&go.id).await.unwrap().is_some());
    assert_eq!(repos.messages.list_by_session(&go_session.id).await.unwrap().len(), 2);
    assert_eq!(repos.concepts.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_related_topics_follow_concept_links() {
    let app = TestApp::new().await;
    let physics = app.ctx.knowledge.create_topic("Physics", None).await.unwrap();
    let calculus = app.ctx.knowledge.create_topic("Calculus", None).await.unwrap();
    let _music = app.ctx.knowledge.create_topic("Music", None).await.unwrap();

    let derivative = Concept::new("Derivative", &calculus.id, FamiliarityLevel::Explored, "s1");
    let mut velocity = Concept::new("Velocity", &physics.id, FamiliarityLevel::Introduced, "s2");
    let force = Concept::new("Force", &physics.id, FamiliarityLevel::Introduced, "s2");
    velocity.related_concept_ids = vec![derivative.id.clone(), force.id.clone()];
    app.ctx
        .repositories
        .concepts
        .save_all(&[derivative, velocity, force])
        .await
        .unwrap();

    let related = app.ctx.knowledge.get_related_topics(&physics.id).await.unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, calculus.id);

    assert!(app.ctx.knowledge.get_related_topics(&calculus.id).await.unwrap().is_empty());
    assert!(app.ctx.knowledge.get_related_topics("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_knowledge_context() {
    let app = TestApp::new().await;
    assert_eq!(app.ctx.knowledge.get_knowledge_context().await.unwrap(), "");

    let topic = app
        .ctx
        .knowledge
        .create_topic("Calculus", Some("Mathematics".to_string()))
        .await
        .unwrap();
    let limit = Concept::new("Limit", &topic.id, FamiliarityLevel::Explored, "s1");
    app.ctx.repositories.concepts.save(&limit).await.unwrap();
    app.ctx.knowledge.create_topic("Chess", None).await.unwrap();

    let context = app.ctx.knowledge.get_knowledge_context().await.unwrap();
    assert!(context.starts_with("The student has previously explored:\n"));
    assert!(context.contains("- Calculus [Mathematics]: No summary\n  Concepts: Limit (explored)"));
    assert!(context.contains("- Chess: No summary\n  Concepts: None extracted"));
}

#[tokio::test]
async fn test_create_topic_reuses_existing_name() {
    let app = TestApp::new().await;
    let first = app.ctx.knowledge.create_topic("Linear Algebra", None).await.unwrap();
    let again = app
        .ctx
        .knowledge
        .create_topic("  linear algebra ", Some("Math".to_string()))
        .await
        .unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(app.ctx.repositories.topics.list_all().await.unwrap().len(), 1);
    assert!(app.ctx.knowledge.create_topic("   ", None).await.is_err());
}

#[tokio::test]
async fn test_stats_and_clear_all_keep_settings() {
    let app = TestApp::new().await;
    app.agent.reply(
        EXTRACT,
        &extraction_json(
            "Biology",
            &[
                ("Cell", "understood", ""),
                ("Mitosis", "explored", ""),
                ("Meiosis", "introduced", ""),
            ],
        ),
    );
    app.ctx.settings.complete_onboarding().await.unwrap();
    let session = persisted_session(&app).await;
    app.ctx
        .knowledge
        .extract_and_save_knowledge(&conversation(&session.id), &session.id)
        .await
        .unwrap();

    let stats = app.ctx.knowledge.knowledge_stats().await.unwrap();
    assert_eq!(stats.topic_count, 1);
    assert_eq!(stats.session_count, 1);
    assert_eq!(stats.concept_count, 3);
    assert_eq!((stats.introduced, stats.explored, stats.understood), (1, 1, 1));

    app.ctx.clear_all_knowledge().await.unwrap();

    let stats = app.ctx.knowledge.knowledge_stats().await.unwrap();
    assert_eq!(stats.topic_count + stats.session_count + stats.concept_count, 0);
    let settings = app.ctx.repositories.settings.load().await.unwrap().unwrap();
    assert!(settings.onboarding_complete);
    assert!(app.ctx.knowledge.snapshot().await.topics.is_empty());
}

#[tokio::test]
async fn test_extracting_flag_holds_until_last_extraction_finishes() {
    let app = TestApp::new().await;
    app.agent.reply(
        EXTRACT,
        &extraction_json("Rust Ownership", &[("Ownership", "introduced", "")]),
    );
    let first_gate = app.agent.gate_next(EXTRACT);
    let second_gate = app.agent.gate_next(EXTRACT);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let session = persisted_session(&app).await;
        let knowledge = app.ctx.knowledge.clone();
        handles.push(tokio::spawn(async move {
            knowledge
                .extract_and_save_knowledge(&conversation(&session.id), &session.id)
                .await
        }));
    }
    app.agent.wait_for_calls(EXTRACT, 2).await;
    assert!(app.ctx.knowledge.is_extracting().await);

    first_gate.notify_one();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !handles.iter().any(|h| h.is_finished()) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert!(app.ctx.knowledge.is_extracting().await);
    assert!(app.ctx.knowledge.snapshot().await.is_extracting);

    second_gate.notify_one();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert!(!app.ctx.knowledge.is_extracting().await);
}
