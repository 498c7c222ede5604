//! PocketBase REST client for the `learning_sessions` collection.

use super::{LearningSession, SessionStore, SessionType, StoreError};
use crate::config::StoreConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Wire shape of a session record. `interactions` is written as a JSON
/// string; reading also accepts a plain array.
#[derive(Serialize, Deserialize, Debug)]
struct SessionRecord {
    session_id: String,
    user_id: String,
    content_id: String,
    session_type: String,
    start_time: String,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    duration_minutes: i64,
    #[serde(default)]
    interactions: Value,
    #[serde(default)]
    performance_score: Option<f64>,
    #[serde(default)]
    engagement_score: Option<f64>,
    #[serde(default)]
    difficulty_rating: Option<String>,
    #[serde(default)]
    completed: bool,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

pub struct PocketBaseStore {
    client: Client,
    base_url: String,
    collection: String,
    credentials: Option<(String, String)>,
    token: RwLock<Option<String>>,
}

impl PocketBaseStore {
    pub fn new(base_url: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        let credentials = match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => Some((email.clone(), password.clone())),
            _ => None,
        };
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            credentials,
            token: RwLock::new(None),
        })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.base_url, self.collection
        )
    }

    /// Admin token, fetched on first use and cached until a 401.
    async fn token(&self) -> Result<Option<String>, StoreError> {
        let Some((identity, password)) = &self.credentials else {
            return Ok(None);
        };
        if let Some(token) = self.token.read().await.clone() {
            return Ok(Some(token));
        }

        let response = self
            .client
            .post(format!("{}/api/admins/auth-with-password", self.base_url))
            .json(&serde_json::json!({ "identity": identity, "password": password }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("{}: {}", status, body)));
        }
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))?;

        info!("PocketBase admin authenticated");
        *self.token.write().await = Some(auth.token.clone());
        Ok(Some(auth.token))
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        Ok(match self.token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn check(
        &self,
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(operation, "Authentication required by PocketBase");
                self.token.write().await.take();
            }
            StatusCode::FORBIDDEN => warn!(operation, "Permission denied, check collection rules"),
            StatusCode::NOT_FOUND => warn!(operation, "Collection or record not found"),
            _ => {}
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SessionStore for PocketBaseStore {
    #[instrument(skip(self))]
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<LearningSession>, StoreError> {
        let request = self.client.get(self.records_url()).query(&[
            ("filter", user_filter(user_id)),
            ("sort", "-start_time".to_string()),
            ("perPage", limit.to_string()),
        ]);
        let response = self.authorize(request).await?.send().await?;
        let response = self.check(response, "List sessions").await?;
        let list: ListResponse = response.json().await?;

        let sessions: Vec<LearningSession> = list
            .items
            .into_iter()
            .filter_map(|item| match decode_record(item) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable session record");
                    None
                }
            })
            .collect();
        debug!(count = sessions.len(), "Loaded recent sessions");
        Ok(sessions)
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn save_session(&self, session: &LearningSession) -> Result<(), StoreError> {
        let record = encode_record(session)?;
        let request = self.client.post(self.records_url()).json(&record);
        let response = self.authorize(request).await?.send().await?;
        self.check(response, "Save session").await?;
        debug!("Session saved to PocketBase");
        Ok(())
    }
}

fn user_filter(user_id: &str) -> String {
    format!("user_id='{}'", user_id.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn encode_record(session: &LearningSession) -> Result<SessionRecord, StoreError> {
    let interactions = serde_json::to_string(&session.interactions)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(SessionRecord {
        session_id: session.id.to_string(),
        user_id: session.user_id.clone(),
        content_id: session.content_id.clone(),
        session_type: session.session_type.as_str().to_string(),
        start_time: session.start_time.to_rfc3339(),
        end_time: session.end_time.map(|t| t.to_rfc3339()),
        duration_minutes: session.duration_minutes,
        interactions: Value::String(interactions),
        performance_score: session.performance_score,
        engagement_score: session.engagement_score,
        difficulty_rating: session.difficulty_rating.clone(),
        completed: session.completed,
    })
}

fn decode_record(item: Value) -> Result<LearningSession, StoreError> {
    let record: SessionRecord =
        serde_json::from_value(item).map_err(|e| StoreError::Decode(e.to_string()))?;

    let start_time = parse_timestamp(&record.start_time)
        .ok_or_else(|| StoreError::Decode(format!("bad start_time '{}'", record.start_time)))?;
    let session_type = serde_json::from_value(Value::String(record.session_type.clone()))
        .unwrap_or(SessionType::Lesson);

    Ok(LearningSession {
        id: Uuid::parse_str(&record.session_id).unwrap_or_else(|_| Uuid::new_v4()),
        user_id: record.user_id,
        content_id: record.content_id,
        session_type,
        start_time,
        end_time: record.end_time.as_deref().and_then(parse_timestamp),
        duration_minutes: record.duration_minutes,
        interactions: decode_interactions(record.interactions),
        performance_score: record.performance_score,
        engagement_score: record.engagement_score,
        difficulty_rating: record.difficulty_rating,
        completed: record.completed,
    })
}

/// Interactions come back as a JSON string or an array; anything else is empty.
fn decode_interactions(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// RFC 3339, or PocketBase's `YYYY-MM-DD HH:MM:SS.sssZ` form.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.trim_end_matches('Z');
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|n| n.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_pocketbase_and_rfc3339_timestamps() {
        let a = parse_timestamp("2024-05-01 12:30:00.123Z").unwrap();
        let b = parse_timestamp("2024-05-01T12:30:00.123+00:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("2024-05-01T12:30:00").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("ontem").is_none());
    }

    #[test]
    fn interactions_accept_string_or_array() {
        let arr = json!([{"role": "user", "message": "oi"}]);
        assert_eq!(decode_interactions(arr.clone()).len(), 1);
        assert_eq!(decode_interactions(Value::String(arr.to_string())).len(), 1);
        assert!(decode_interactions(Value::String("nope".into())).is_empty());
        assert!(decode_interactions(Value::Null).is_empty());
    }

    #[test]
    fn record_encoding_stores_interactions_as_string() {
        let mut session = LearningSession::lesson("u-1", "agno:socratic");
        session.interactions = vec![json!({"role": "user", "message": "Explique recursão"})];
        let record = encode_record(&session).unwrap();
        let wire = serde_json::to_value(&record).unwrap();

        assert_eq!(wire["session_type"], "lesson");
        assert_eq!(wire["session_id"], session.id.to_string());
        assert!(wire["interactions"].is_string());

        let decoded = decode_record(wire).unwrap();
        assert_eq!(decoded.id, session.id);
        assert_eq!(decoded.interactions, session.interactions);
        assert_eq!(decoded.content_id, "agno:socratic");
    }

    #[test]
    fn decode_rejects_missing_start_time() {
        let item = json!({
            "session_id": "x", "user_id": "u", "content_id": "c",
            "session_type": "lesson", "start_time": ""
        });
        assert!(matches!(decode_record(item), Err(StoreError::Decode(_))));
    }

    #[test]
    fn foreign_session_types_survive_decoding() {
        let record = |kind: &str| {
            json!({
                "session_id": Uuid::new_v4().to_string(), "user_id": "u", "content_id": "quiz:7",
                "session_type": kind, "start_time": "2024-05-01 12:30:00.000Z"
            })
        };
        assert_eq!(
            decode_record(record("assessment")).unwrap().session_type,
            SessionType::Assessment
        );
        assert_eq!(
            decode_record(record("practice")).unwrap().session_type,
            SessionType::Practice
        );
        assert_eq!(
            decode_record(record("workshop")).unwrap().session_type,
            SessionType::Lesson
        );
    }

    #[test]
    fn filter_escapes_quotes() {
        assert_eq!(user_filter("abc"), "user_id='abc'");
        assert_eq!(user_filter("a'b"), "user_id='a\\'b'");
    }

    #[test]
    fn base_url_is_normalised() {
        let store = PocketBaseStore::new("http://localhost:8090/", &StoreConfig::default()).unwrap();
        assert_eq!(
            store.records_url(),
            "http://localhost:8090/api/collections/learning_sessions/records"
        );
        assert!(store.credentials.is_none());
    }
}
