mod common;

use common::{EXTRACT, MockAgent, TestApp, extraction_json, open};
use trellis_application::ExportData;
use trellis_core::session::{Message, Session};
use trellis_core::settings::{Depth, TeachingParametersUpdate, TeachingStyleUpdate};
use trellis_core::topic::Topic;

async fn populated_app() -> TestApp {
    let app = TestApp::new().await;
    app.agent.reply(
        EXTRACT,
        &extraction_json(
            "Thermodynamics",
            &[("Entropy", "explored", "Heat"), ("Heat", "introduced", "")],
        ),
    );

    let session = Session::new(None);
    app.ctx.repositories.sessions.save(&session).await.unwrap();
    let messages = vec![
        Message::user(&session.id, "Why does entropy increase?"),
        Message::assistant(&session.id, "Because there are more disordered states."),
    ];
    for message in &messages {
        app.ctx.repositories.messages.save(message).await.unwrap();
    }
    app.ctx
        .knowledge
        .extract_and_save_knowledge(&messages, &session.id)
        .await
        .unwrap();
    app.ctx
        .settings
        .update_teaching_style(TeachingStyleUpdate {
            parameters: TeachingParametersUpdate {
                depth: Some(Depth::Deep),
                ..Default::default()
            },
            ..Default::default()
        })
        .await
        .unwrap();
    app
}

#[tokio::test]
async fn test_export_then_import_into_fresh_store() {
    let source = populated_app().await;
    let file = source.dir.path().join("backup.json");
    let exported = source.ctx.data_transfer.export_to_file(&file).await.unwrap();

    assert_eq!(exported.version, 1);
    assert_eq!(exported.topics.len(), 1);
    assert_eq!(exported.concepts.len(), 2);
    assert_eq!(exported.sessions.len(), 1);
    assert_eq!(exported.messages.len(), 2);

    let target = TestApp::new().await;
    target.ctx.knowledge.create_topic("To be replaced", None).await.unwrap();
    let imported = target.ctx.import_from_file(&file).await.unwrap();
    assert_eq!(imported, exported);

    let again = target.ctx.data_transfer.export_all().await.unwrap();
    assert_eq!(again.topics, exported.topics);
    assert_eq!(again.settings, exported.settings);
    for concept in &exported.concepts {
        let stored = target
            .ctx
            .repositories
            .concepts
            .find_by_id(&concept.id)
            .await
            .unwrap();
        assert_eq!(stored.as_ref(), Some(concept));
    }
    let session = &exported.sessions[0];
    assert_eq!(
        target.ctx.repositories.sessions.find_by_id(&session.id).await.unwrap().as_ref(),
        Some(session)
    );
    assert_eq!(
        target.ctx.repositories.messages.list_by_session(&session.id).await.unwrap().len(),
        2
    );

    // In-memory views follow the imported data.
    let knowledge = target.ctx.knowledge.snapshot().await;
    assert_eq!(knowledge.topics.len(), 1);
    assert_eq!(knowledge.topics[0].name, "Thermodynamics");
    let style = target.ctx.settings.teaching_style().await;
    assert_eq!(style.parameters.depth, Depth::Deep);
}

#[tokio::test]
async fn test_import_rejects_unsupported_version() {
    let app = populated_app().await;
    let mut data = app.ctx.data_transfer.export_all().await.unwrap();
    data.version = 2;

    let err = app.ctx.data_transfer.import_data(&data).await.unwrap_err();
    assert!(err.is_import());
    assert!(err.to_string().contains("Unsupported export version"));
    assert_eq!(app.ctx.repositories.topics.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_from_file_reports_bad_documents() {
    let app = TestApp::new().await;
    app.ctx.knowledge.create_topic("Keep me", None).await.unwrap();

    let cases = [
        ("garbage.json", "{ definitely not json", "Failed to parse file"),
        ("shape.json", r#"{"version": 1, "topics": "nope"}"#, "Invalid export file format"),
        (
            "future.json",
            r#"{"version": 9, "exportedAt": "2026-01-01T00:00:00Z", "topics": []}"#,
            "Unsupported export version",
        ),
    ];
    for (name, content, message) in cases {
        let path = app.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        let err = app.ctx.import_from_file(&path).await.unwrap_err();
        assert!(err.to_string().contains(message), "{}: {}", name, err);
    }

    assert_eq!(app.ctx.repositories.topics.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_without_settings_resets_them() {
    let source = TestApp::new().await;
    let data = ExportData::parse(
        r#"{"version": 1, "exportedAt": "2026-01-01T00:00:00Z", "topics": []}"#,
    )
    .unwrap();
    source.ctx.settings.complete_onboarding().await.unwrap();

    source.ctx.data_transfer.import_data(&data).await.unwrap();
    assert!(source.ctx.repositories.settings.load().await.unwrap().is_none());

    // Reopening recreates defaults.
    let reopened = open(&source.dir, MockAgent::new()).await;
    let settings = reopened.settings.settings().await.unwrap();
    assert!(!settings.onboarding_complete);
}

#[tokio::test]
async fn test_import_with_unstorable_id_keeps_existing_data() {
    let app = TestApp::new().await;
    let kept = app.ctx.knowledge.create_topic("Keep me", None).await.unwrap();

    let mut data = ExportData::parse(
        r#"{"version": 1, "exportedAt": "2026-01-01T00:00:00Z", "topics": []}"#,
    )
    .unwrap();
    let mut topic = Topic::new("Imported", None);
    topic.id = "bad id/..".to_string();
    data.topics.push(topic);

    let err = app.ctx.data_transfer.import_data(&data).await.unwrap_err();
    assert!(err.to_string().contains("Invalid export file format"));

    let topics = app.ctx.repositories.topics.list_all().await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].id, kept.id);
}

#[tokio::test]
async fn test_import_failing_mid_write_restores_previous_data() {
    let app = populated_app().await;
    let before = app.ctx.data_transfer.export_all().await.unwrap();

    let session = Session::new(None);
    let message = Message::user(&session.id, "Blocked");
    let mut data = ExportData::parse(
        r#"{"version": 1, "exportedAt": "2026-01-01T00:00:00Z", "topics": []}"#,
    )
    .unwrap();
    data.topics.push(Topic::new("Imported", None));
    data.sessions.push(session);
    data.messages.push(message.clone());

    // A directory where the message's temporary file goes makes its write fail.
    std::fs::create_dir_all(
        app.dir
            .path()
            .join("messages")
            .join(format!(".{}.toml.tmp", message.id)),
    )
    .unwrap();

    assert!(app.ctx.data_transfer.import_data(&data).await.is_err());

    let after = app.ctx.data_transfer.export_all().await.unwrap();
    assert_eq!(after.topics, before.topics);
    assert_eq!(after.concepts.len(), before.concepts.len());
    assert_eq!(after.sessions, before.sessions);
    assert_eq!(after.messages.len(), before.messages.len());
    assert_eq!(after.settings, before.settings);
}
