//! Mixer configuration client
//!
//! Get, create and delete operations on top of a [`Requester`]. Documents
//! are YAML on the user's side and JSON on the wire.

use super::http::Requester;
use super::paths::{resource_path, rule_path, ResourceKind};
use crate::error::{MixerError, Result};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;

/// Message reported when the service did not send one
pub const UNKNOWN_MESSAGE: &str = "unknown";

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: StatusCode,
    pub message: String,
}

/// Client for the Mixer configuration API
#[derive(Clone)]
pub struct MixerClient {
    requester: Arc<dyn Requester>,
}

impl MixerClient {
    pub fn new(requester: Arc<dyn Requester>) -> Self {
        Self { requester }
    }

    /// Fetch the document stored at `path`, rendered as YAML
    pub async fn get(&self, path: &str) -> Result<String> {
        let document = self.get_document(path).await?;
        serde_yaml::to_string(&document).map_err(|e| MixerError::Format(e.to_string()))
    }

    /// Fetch the document stored at `path`
    pub async fn get_document(&self, path: &str) -> Result<Value> {
        let response = self.requester.request(Method::GET, path, None).await?;
        if response.status != StatusCode::OK {
            return Err(MixerError::from_status(response.status));
        }

        Ok(ApiResponse::parse(&response.body)?.source_data())
    }

    /// Store the YAML document `raw` at `path`
    pub async fn create<W: Write>(&self, path: &str, raw: &[u8], out: &mut W) -> Result<Outcome> {
        let encoded = yaml_to_json(raw)?;
        self.request(Method::PUT, path, Some(encoded), out).await
    }

    /// Remove the document stored at `path`
    pub async fn delete<W: Write>(&self, path: &str, out: &mut W) -> Result<Outcome> {
        self.request(Method::DELETE, path, None, out).await
    }

    /// Issue a write and interpret the answer.
    ///
    /// Any response body is echoed to `out` before it is inspected, since it
    /// usually carries the reason for a failure.
    pub async fn request<W: Write>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        out: &mut W,
    ) -> Result<Outcome> {
        let response = self.requester.request(method.clone(), path, body).await?;

        let message = match response.body() {
            Some(body) => {
                out.write_all(body).map_err(MixerError::Output)?;
                writeln!(out).map_err(MixerError::Output)?;
                extract_message(body)
            }
            None => UNKNOWN_MESSAGE.to_string(),
        };

        if response.status != StatusCode::OK {
            return Err(MixerError::Application {
                method,
                path: path.to_string(),
                status: response.status.as_u16(),
                message,
            });
        }

        if response.body().is_some() {
            writeln!(out, "{}", message).map_err(MixerError::Output)?;
        }
        tracing::info!("{} {}: {}", method, path, message);

        Ok(Outcome {
            status: response.status,
            message,
        })
    }

    pub async fn rule_get(&self, scope: &str, subject: &str) -> Result<String> {
        self.get(&rule_path(scope, subject)).await
    }

    pub async fn rule_create<W: Write>(
        &self,
        scope: &str,
        subject: &str,
        raw: &[u8],
        out: &mut W,
    ) -> Result<Outcome> {
        self.create(&rule_path(scope, subject), raw, out).await
    }

    pub async fn rule_delete<W: Write>(
        &self,
        scope: &str,
        subject: &str,
        out: &mut W,
    ) -> Result<Outcome> {
        self.delete(&rule_path(scope, subject), out).await
    }

    pub async fn resource_get(&self, kind: ResourceKind, scope: &str) -> Result<String> {
        self.get(&resource_path(scope, kind)).await
    }

    pub async fn resource_create<W: Write>(
        &self,
        kind: ResourceKind,
        scope: &str,
        raw: &[u8],
        out: &mut W,
    ) -> Result<Outcome> {
        self.create(&resource_path(scope, kind), raw, out).await
    }
}

/// Envelope the configuration service wraps every answer in
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    pub data: Value,
    pub status: ApiStatus,
    /// Payload of services that do not wrap it in `data`
    source_data: Value,
}

/// `google.rpc.Status` as the configuration service reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiStatus {
    pub code: i32,
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(MixerError::Decode)
    }

    /// `data.source_data`, or a bare `source_data`
    pub fn source_data(&self) -> Value {
        match self.data.get("source_data") {
            Some(payload) => payload.clone(),
            None => self.source_data.clone(),
        }
    }

    /// `status.message`, or [`UNKNOWN_MESSAGE`]
    pub fn message(&self) -> &str {
        self.status.message.as_deref().unwrap_or(UNKNOWN_MESSAGE)
    }
}

/// `status.message` of a response body, or [`UNKNOWN_MESSAGE`] when the
/// body is not a readable envelope
pub fn extract_message(body: &[u8]) -> String {
    ApiResponse::parse(body)
        .map(|response| response.message().to_string())
        .unwrap_or_else(|_| UNKNOWN_MESSAGE.to_string())
}

/// Re-encode a YAML mapping as JSON.
///
/// Only the first document of a multi-document stream is used, and `<<`
/// merge keys are resolved. An empty stream is an empty mapping.
pub fn yaml_to_json(raw: &[u8]) -> Result<Vec<u8>> {
    let mut document = match serde_yaml::Deserializer::from_slice(raw).next() {
        Some(first) => serde_yaml::Value::deserialize(first)?,
        None => serde_yaml::Value::Null,
    };
    document.apply_merge()?;

    let document = match document {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
        serde_yaml::Value::Mapping(_) => document,
        other => return Err(MixerError::InvalidDocument(yaml_kind(&other))),
    };

    let json = serde_json::to_value(&document).map_err(MixerError::Encode)?;
    serde_json::to_vec(&json).map_err(MixerError::Encode)
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
