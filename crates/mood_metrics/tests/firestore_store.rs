use chrono::{TimeZone, Utc};
use mood_metrics::config::FirestoreConfig;
use mood_metrics::http_client::FirestoreMoodStore;
use mood_metrics::{Mood, MoodError, MoodPatch, MoodStore, NewMoodRecord};
use secrecy::SecretString;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS: &str = "/v1/projects/mood-app/databases/(default)/documents";

fn store_for(server: &MockServer) -> FirestoreMoodStore {
    let mut cfg = FirestoreConfig::new("mood-app");
    cfg.base_url = server.uri();
    cfg.api_key = Some(SecretString::new("web-key".into()));
    cfg.id_token = Some(SecretString::new("id-tok".into()));
    FirestoreMoodStore::new(cfg).expect("store")
}

fn doc(id: &str, mood: &str, created: &str) -> serde_json::Value {
    serde_json::json!({
        "name": format!("projects/mood-app/databases/(default)/documents/moods/{id}"),
        "fields": {
            "userId": {"stringValue": "u1"},
            "mood": {"stringValue": mood},
            "tags": {"arrayValue": {"values": [{"stringValue": "sport"}]}},
            "createdAt": {"timestampValue": created},
            "updatedAt": {"timestampValue": created}
        }
    })
}

#[tokio::test]
async fn query_runs_structured_query_with_credentials() {
    let server = MockServer::start().await;
    let body = serde_json::json!([
        {"document": doc("a", "Çok İyi", "2025-03-01T08:00:00Z"), "readTime": "2025-03-02T00:00:00Z"},
        {"document": doc("b", "bad", "2025-03-01T09:00:00Z"), "readTime": "2025-03-02T00:00:00Z"}
    ]);
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:runQuery")))
        .and(query_param("key", "web-key"))
        .and(header("authorization", "Bearer id-tok"))
        .and(body_partial_json(serde_json::json!({
            "structuredQuery": {"from": [{"collectionId": "moods"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2025, 2, 23, 0, 0, 0).unwrap();
    let records = store_for(&server)
        .query_records("u1", since)
        .await
        .expect("records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "a");
    assert_eq!(records[0].mood(), Some(Mood::VeryGood));
    assert_eq!(records[1].mood(), Some(Mood::Bad));
    assert_eq!(records[0].tags, vec!["sport"]);
}

#[tokio::test]
async fn empty_query_result_has_only_read_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:runQuery")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"readTime": "2025-03-02T00:00:00Z"}])),
        )
        .mount(&server)
        .await;

    let records = store_for(&server)
        .query_records("u1", Utc::now())
        .await
        .expect("records");
    assert!(records.is_empty());
}

#[tokio::test]
async fn create_posts_typed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}/moods")))
        .and(body_partial_json(serde_json::json!({
            "fields": {
                "userId": {"stringValue": "u1"},
                "mood": {"stringValue": "good"},
                "stressLevel": {"integerValue": "2"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc(
            "new1",
            "good",
            "2025-03-01T08:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut new = NewMoodRecord::new("u1", Mood::Good);
    new.stress_level = Some(2);
    let created = store_for(&server).create_record(new).await.expect("create");
    assert_eq!(created.id, "new1");
}

#[tokio::test]
async fn update_sends_mask_and_existence_precondition() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("{DOCS}/moods/a")))
        .and(query_param("updateMask.fieldPaths", "mood"))
        .and(query_param("updateMask.fieldPaths", "updatedAt"))
        .and(query_param("currentDocument.exists", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc(
            "a",
            "neutral",
            "2025-03-01T08:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let patch = MoodPatch {
        mood: Some(Mood::Neutral),
        ..Default::default()
    };
    let updated = store_for(&server)
        .update_record("a", patch)
        .await
        .expect("update");
    assert_eq!(updated.mood(), Some(Mood::Neutral));
}

#[tokio::test]
async fn delete_of_missing_document_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{DOCS}/moods/gone")))
        .respond_with(ResponseTemplate::new(404).set_body_string("NOT_FOUND: no document"))
        .mount(&server)
        .await;

    let err = store_for(&server).delete_record("gone").await.unwrap_err();
    assert!(matches!(err, MoodError::NotFound(_)));
}

#[tokio::test]
async fn permission_denied_maps_to_auth_and_server_errors_are_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{DOCS}:runQuery")))
        .and(query_param("key", "web-key"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.query_records("u1", Utc::now()).await.unwrap_err();
    assert!(matches!(err, MoodError::Auth(_)));
    assert!(!err.is_transient());

    let err = store.delete_record("x").await.unwrap_err();
    assert!(matches!(err, MoodError::Api { status: 503, .. }));
    assert!(err.is_transient());
}
