//! Document Store REST Client
//!
//! Upserts documents through the hosted document database REST API. JSON
//! records are encoded into the API's typed field values.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use url::Url;

use super::{DocumentStore, ServiceError, ServiceResult, TokenStore};

/// Error envelope returned by the document API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Document store backed by the document database REST API.
#[derive(Clone)]
pub struct FirestoreDocumentStore {
    http: HttpClient,
    base_url: String,
    project_id: String,
    tokens: TokenStore,
}

impl FirestoreDocumentStore {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        tokens: TokenStore,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            project_id: project_id.into(),
            tokens,
        }
    }

    /// URL of the document at `collection/key`.
    fn document_url(&self, collection: &str, key: &str) -> ServiceResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ServiceError::new("invalid-argument", format!("Bad base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::new("invalid-argument", "Base URL cannot hold a path"))?
            .pop_if_empty()
            .extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                collection,
                key,
            ]);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn write(&self, collection: &str, key: &str, record: Value) -> ServiceResult<()> {
        let url = self.document_url(collection, key)?;
        let body = encode_document(&record)?;

        let mut request = self.http.patch(url).json(&body);
        if let Some(token) = self.tokens.get().await {
            request = request.bearer_auth(token.token);
        }

        let response = request.send().await.map_err(|e| {
            error!(collection, key, "Document write failed: {}", e);
            ServiceError::new("unavailable", e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(collection, key, %status, "Document write rejected: {}", body);
            return Err(parse_error(&body));
        }

        debug!(collection, key, "Document written");
        Ok(())
    }
}

/// Wrap a JSON object as a document body (`{"fields": {...}}`).
fn encode_document(record: &Value) -> ServiceResult<Value> {
    let Value::Object(fields) = record else {
        return Err(ServiceError::new(
            "invalid-argument",
            "Document record must be a JSON object",
        ));
    };
    Ok(json!({ "fields": encode_fields(fields) }))
}

fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // 64-bit integers travel as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Turn an error status like `PERMISSION_DENIED` into `permission-denied`.
fn parse_error(body: &str) -> ServiceError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.status.is_empty() => ServiceError::new(
            envelope.error.status.to_ascii_lowercase().replace('_', "-"),
            envelope.error.message,
        ),
        Ok(envelope) => ServiceError::new("unknown", envelope.error.message),
        Err(_) => ServiceError::new("unknown", body.to_string()),
    }
}
