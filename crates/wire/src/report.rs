// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/report` request/response bodies (spec §4.4).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub orchestrator_instance_id: Option<Uuid>,
    pub worker_id: String,
    pub job_id: Option<String>,
    pub report: Option<serde_json::Value>,
    #[serde(rename = "final")]
    pub final_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub ok: bool,
}

impl ReportResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
