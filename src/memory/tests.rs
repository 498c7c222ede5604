//! Unit tests for session records and the in-memory store.

use super::*;
use chrono::Duration;
use serde_json::json;

fn session_at(user: &str, minutes_ago: i64, text: &str) -> LearningSession {
    let mut s = LearningSession::lesson(user, "agno:worked_examples")
        .started_at(Utc::now() - Duration::minutes(minutes_ago));
    s.interactions = vec![json!({"role": "user", "message": text})];
    s
}

#[tokio::test]
async fn lists_newest_first_with_limit() {
    let store = InMemoryStore::new();
    store.save_session(&session_at("ana", 30, "velha")).await.unwrap();
    store.save_session(&session_at("ana", 1, "nova")).await.unwrap();
    store.save_session(&session_at("ana", 10, "meio")).await.unwrap();

    let recent = store.recent_sessions("ana", 2).await.unwrap();
    let texts: Vec<_> = recent
        .iter()
        .map(|s| s.interactions[0]["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["nova", "meio"]);
    assert_eq!(store.len().await, 3);
}

#[tokio::test]
async fn sessions_are_scoped_per_user() {
    let store = InMemoryStore::new();
    store.save_session(&session_at("ana", 1, "a")).await.unwrap();
    store.save_session(&session_at("bia", 1, "b")).await.unwrap();

    assert_eq!(store.recent_sessions("ana", 5).await.unwrap().len(), 1);
    assert!(store.recent_sessions("caio", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_store_reports_empty() {
    let store = InMemoryStore::new();
    tokio_test::assert_ok!(store.recent_sessions("ninguem", 5).await);
    assert!(store.is_empty().await);
}

#[test]
fn close_sets_end_time_and_whole_minutes() {
    let start = Utc::now() - Duration::seconds(150);
    let mut s = LearningSession::lesson("u", "agno:default").started_at(start);
    s.close(Utc::now());

    assert_eq!(s.duration_minutes, 2);
    assert!(s.end_time.unwrap() >= start);
    assert!(s.completed);
    assert_eq!(s.session_type, SessionType::Lesson);
}

#[test]
fn close_before_start_clamps_to_zero() {
    let mut s = LearningSession::lesson("u", "agno:default");
    s.close(s.start_time - Duration::minutes(5));
    assert_eq!(s.duration_minutes, 0);
}

#[test]
fn session_serializes_snake_case_type() {
    let s = LearningSession::lesson("u", "agno:analogy");
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["session_type"], "lesson");
    assert_eq!(v["content_id"], "agno:analogy");
    assert!(v["end_time"].is_null());
}
