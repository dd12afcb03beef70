//! Firestore REST implementation of [`MoodStore`](crate::MoodStore).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::{Value, json};

use crate::config::FirestoreConfig;
use crate::firestore::{self, Document, RunQueryItem};
use crate::{MoodError, MoodPatch, MoodRecord, MoodStore, NewMoodRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mood store backed by a Firestore collection, spoken to over REST v1.
#[derive(Clone, Debug)]
pub struct FirestoreMoodStore {
    config: FirestoreConfig,
    documents_url: String,
    client: reqwest::Client,
}

impl FirestoreMoodStore {
    pub fn new(config: FirestoreConfig) -> Result<Self, MoodError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            documents_url: config.documents_url(),
            config,
            client,
        })
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, self.config.collection, id)
    }

    /// Attach the ID token and API key, when configured.
    fn authorize(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.config.id_token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key.expose_secret())]);
        }
        request
    }

    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        op: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, MoodError> {
        metrics::counter!("mood_store_requests_total", "op" => op).increment(1);
        let resp = self.authorize(request).send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(op, resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    async fn execute_empty(
        &self,
        op: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<(), MoodError> {
        metrics::counter!("mood_store_requests_total", "op" => op).increment(1);
        let resp = self.authorize(request).send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(op, resp).await);
        }
        Ok(())
    }

    async fn error_from_response(&self, op: &'static str, resp: reqwest::Response) -> MoodError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        metrics::counter!("mood_store_errors_total", "op" => op, "status" => status.to_string())
            .increment(1);
        tracing::debug!(op, status, body = %body_snippet, "firestore request failed");
        MoodError::from_status(status, body_snippet)
    }
}

#[async_trait]
impl MoodStore for FirestoreMoodStore {
    async fn query_records(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MoodRecord>, MoodError> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = firestore::records_since_query(&self.config.collection, user_id, since);
        let items: Vec<RunQueryItem> = self
            .execute_json("query", self.client.post(&url).json(&body))
            .await?;

        let records = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(firestore::decode_document)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(user_id, count = records.len(), %since, "queried mood records");
        Ok(records)
    }

    async fn create_record(&self, record: NewMoodRecord) -> Result<MoodRecord, MoodError> {
        let url = format!("{}/{}", self.documents_url, self.config.collection);
        let body = json!({ "fields": firestore::encode_new(&record, Utc::now()) });
        let doc: Document = self
            .execute_json("create", self.client.post(&url).json(&body))
            .await?;
        firestore::decode_document(doc)
    }

    async fn update_record(&self, id: &str, patch: MoodPatch) -> Result<MoodRecord, MoodError> {
        let (fields, mask) = firestore::encode_patch(&patch, Utc::now());
        let mut query: Vec<(&str, &str)> = mask
            .iter()
            .map(|path| ("updateMask.fieldPaths", *path))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let body = json!({ "fields": Value::Object(fields) });
        let doc: Document = self
            .execute_json(
                "update",
                self.client
                    .patch(self.document_url(id))
                    .query(&query)
                    .json(&body),
            )
            .await?;
        firestore::decode_document(doc)
    }

    async fn delete_record(&self, id: &str) -> Result<(), MoodError> {
        self.execute_empty(
            "delete",
            self.client
                .delete(self.document_url(id))
                .query(&[("currentDocument.exists", "true")]),
        )
        .await
    }
}
