// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for a worker's `opencode serve` surface: session management,
//! prompt dispatch, and provider catalog queries (spec §4.1 steps 9-11,
//! §4.1 "send").

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    pub id: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub has_credentials: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCatalog {
    pub providers: Vec<ProviderEntry>,
}

#[derive(Debug, Clone, Serialize)]
struct PromptPartText<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct PromptResponsePart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PromptResponseBody {
    #[serde(default)]
    parts: Vec<PromptResponsePart>,
}

/// Thin HTTP client over a worker's base URL, shared by the Spawner
/// (session/provider setup) and the Spawner's `send` operation.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    http: reqwest::Client,
}

impl Default for WorkerClient {
    fn default() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

impl WorkerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions currently known to the worker, under a short bounded
    /// timeout (spec §4.1 step 3 "Probe its HTTP surface... with a short
    /// bounded timeout").
    pub async fn list_sessions(&self, base_url: &str) -> Result<Vec<SessionSummary>, AdapterError> {
        const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
        let resp = tokio::time::timeout(
            PROBE_TIMEOUT,
            self.http.get(format!("{base_url}/session")).send(),
        )
        .await
        .map_err(|_| AdapterError::Timeout(PROBE_TIMEOUT))??;
        let sessions: Vec<SessionSummary> = resp.error_for_status()?.json().await?;
        Ok(sessions)
    }

    pub async fn create_session(&self, base_url: &str, title: &str) -> Result<String, AdapterError> {
        let resp = self
            .http
            .post(format!("{base_url}/session"))
            .json(&serde_json::json!({ "title": title }))
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AdapterError::SessionCreate(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AdapterError::SessionCreate(format!("HTTP {}", resp.status())));
        }
        let summary: SessionSummary =
            resp.json().await.map_err(|e| AdapterError::SessionCreate(e.to_string()))?;
        Ok(summary.id)
    }

    pub async fn provider_catalog(&self, base_url: &str) -> Result<ProviderCatalog, AdapterError> {
        let resp = self
            .http
            .get(format!("{base_url}/config/providers"))
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send()
            .await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    /// Send a one-shot, non-reply system message (spec §4.1 step 11).
    pub async fn send_system_message(
        &self,
        base_url: &str,
        session_id: &str,
        text: &str,
    ) -> Result<(), AdapterError> {
        self.http
            .post(format!("{base_url}/session/{session_id}/system"))
            .json(&PromptPartText { kind: "text", text })
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Send a prompt and extract its response text (spec §4.1 `send`).
    /// Empty part-text falls back to concatenated "reasoning" parts; if
    /// still empty, the caller should raise `WORKER_EMPTY`.
    pub async fn send_prompt(
        &self,
        base_url: &str,
        session_id: &str,
        text: &str,
        deadline: Duration,
    ) -> Result<Option<String>, AdapterError> {
        let resp = self
            .http
            .post(format!("{base_url}/session/{session_id}/message"))
            .json(&PromptPartText { kind: "text", text })
            .timeout(deadline)
            .send()
            .await?
            .error_for_status()?;

        let body: PromptResponseBody = resp.json().await?;
        Ok(extract_response_text(&body.parts))
    }
}

fn extract_response_text(parts: &[PromptResponsePart]) -> Option<String> {
    let direct: String =
        parts.iter().filter(|p| p.kind == "text").map(|p| p.text.as_str()).collect();
    if !direct.trim().is_empty() {
        return Some(direct);
    }
    let reasoning: String =
        parts.iter().filter(|p| p.kind == "reasoning").map(|p| p.text.as_str()).collect();
    if !reasoning.trim().is_empty() {
        return Some(reasoning);
    }
    None
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
