#![doc = "HTTP implementation of the document store contract: talks to the LMS site's REST and method endpoints."]
//
//! # Remote store (CLI <-> Core)
//!
//! This module wires the [`DocumentStore`] trait from `monctl-core` to the
//! LMS site over HTTP, and provides the [`SiteClient`] used by the CLI.
//!
//! - Construct [`SiteClient`] from a [`SiteConfig`] (see `load_config`).
//! - Documents are read through `/api/resource/<doctype>/<name>`.
//! - Documents are written through the `mon_school.api.save_document` method,
//!   which answers with a `{"message": {"ok": ...}}` envelope.
//!
//! All transport, serialization and envelope handling is encapsulated here.

use async_trait::async_trait;
use monctl_core::config::SiteConfig;
use monctl_core::contract::{Document, DocumentStore, RemoteUser};
use monctl_core::StoreError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};

/// Server-side method that creates or updates a document.
pub const SAVE_METHOD: &str = "mon_school.api.save_document";

pub struct SiteClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SiteClient {
    pub fn new(config: &SiteConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.site_url).map_err(|e| {
            tracing::error!(error = ?e, site_url = %config.site_url, "Invalid site URL");
            transport(e)
        })?;

        let mut token =
            HeaderValue::from_str(&format!("token {}:{}", config.api_key, config.api_secret))
                .map_err(transport)?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(transport)?;
        tracing::info!(site_url = %base_url, "Initialized SiteClient");
        Ok(Self { http, base_url })
    }

    /// `<base>/<segments...>` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::InvalidResponse(format!("site URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn invoke_method(&self, method: &str, data: &Value) -> Result<Value, StoreError> {
        let url = self.endpoint(&["api", "method", method])?;
        tracing::debug!(method, "Invoking remote method");
        let body: Value = self
            .http
            .post(url)
            .json(data)
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;
        parse_method_response(method, body)
    }
}

#[async_trait]
impl DocumentStore for SiteClient {
    async fn get_document(
        &self,
        doctype: &str,
        name: &str,
    ) -> Result<Option<Document>, StoreError> {
        let url = self.endpoint(&["api", "resource", doctype, name])?;
        let response = self.http.get(url).send().await.map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(doctype, name, "Document not found");
            return Ok(None);
        }
        let body: Value = successful(response).await?.json().await.map_err(transport)?;
        match parse_resource_response(body)? {
            Some(Value::Object(doc)) => Ok(Some(doc)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(StoreError::InvalidResponse(format!(
                "expected a document for {doctype} {name}, got {other}"
            ))),
        }
    }

    async fn save_document(
        &self,
        doctype: &str,
        name: &str,
        doc: &Document,
    ) -> Result<Value, StoreError> {
        let data = json!({
            "doctype": doctype,
            "name": name,
            "doc": doc,
        });
        match self.invoke_method(SAVE_METHOD, &data).await {
            Ok(message) => {
                tracing::info!(doctype, name, "Saved document");
                Ok(message)
            }
            Err(e) => {
                tracing::error!(error = %e, doctype, name, "Failed to save document");
                Err(e)
            }
        }
    }

    async fn list_users(&self, username: &str) -> Result<Vec<RemoteUser>, StoreError> {
        let url = self.endpoint(&["api", "resource", "User"])?;
        let filters = json!({ "username": username }).to_string();
        let response = self
            .http
            .get(url)
            .query(&[("fields", r#"["name"]"#), ("filters", filters.as_str())])
            .send()
            .await
            .map_err(transport)?;
        let body: Value = successful(response)
            .await?
            .json()
            .await
            .map_err(transport)?;
        let rows = parse_resource_response(body)?.unwrap_or(Value::Array(Vec::new()));
        let users: Vec<RemoteUser> = serde_json::from_value(rows)
            .map_err(|e| StoreError::InvalidResponse(format!("user list: {e}")))?;
        tracing::debug!(username, count = users.len(), "Looked up users");
        Ok(users)
    }
}

fn transport<E>(e: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Transport(Box::new(e))
}

/// Passes 2xx responses through; anything else is an error carrying the
/// status and body. A rejected read must never look like an absent document.
async fn successful(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    tracing::error!(%status, %url, body = %body, "Request rejected by site");
    Err(StoreError::InvalidResponse(format!(
        "{url} answered {status}: {body}"
    )))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Unwraps the success envelope of a method call.
pub fn parse_method_response(method: &str, body: Value) -> Result<Value, StoreError> {
    let Some(message) = body.get("message") else {
        tracing::error!(method, response = %body, "Method response has no message");
        return Err(StoreError::InvalidResponse(format!(
            "Failed to invoke method: {method}"
        )));
    };
    if message.get("ok").is_some_and(truthy) {
        return Ok(message.clone());
    }
    let reported = message
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("unknown error: {message}"));
    Err(StoreError::RemoteWrite {
        method: method.to_string(),
        message: reported,
    })
}

/// Payload of a resource response: `message` if present, else `data`.
pub fn parse_resource_response(body: Value) -> Result<Option<Value>, StoreError> {
    if let Some(exc) = body.get("exc").filter(|v| truthy(v)) {
        return Err(StoreError::InvalidResponse(format!("remote exception: {exc}")));
    }
    Ok(body
        .get("message")
        .or_else(|| body.get("data"))
        .cloned())
}
