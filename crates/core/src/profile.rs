// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker profile — the immutable declaration of a kind of worker (spec §3).

use crate::ids::ProfileId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Symbolic model tags. A small closed enumeration, not arbitrary strings
/// (spec §9 "Symbolic tags").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTag {
    Auto,
    Node,
    AutoVision,
    NodeVision,
    AutoDocs,
    NodeDocs,
    AutoFast,
    NodeFast,
}

impl ModelTag {
    pub const ALL: &'static [ModelTag] = &[
        ModelTag::Auto,
        ModelTag::Node,
        ModelTag::AutoVision,
        ModelTag::NodeVision,
        ModelTag::AutoDocs,
        ModelTag::NodeDocs,
        ModelTag::AutoFast,
        ModelTag::NodeFast,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "node" => Some(Self::Node),
            "auto:vision" => Some(Self::AutoVision),
            "node:vision" => Some(Self::NodeVision),
            "auto:docs" => Some(Self::AutoDocs),
            "node:docs" => Some(Self::NodeDocs),
            "auto:fast" => Some(Self::AutoFast),
            "node:fast" => Some(Self::NodeFast),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Node => "node",
            Self::AutoVision => "auto:vision",
            Self::NodeVision => "node:vision",
            Self::AutoDocs => "auto:docs",
            Self::NodeDocs => "node:docs",
            Self::AutoFast => "auto:fast",
            Self::NodeFast => "node:fast",
        }
    }

    /// Whether a candidate model must support image input/attachments to
    /// satisfy this tag.
    pub fn requires_vision(&self) -> bool {
        matches!(self, Self::AutoVision | Self::NodeVision)
    }

    /// Whether a candidate model must be web-capable to satisfy this tag.
    pub fn requires_docs(&self) -> bool {
        matches!(self, Self::AutoDocs | Self::NodeDocs)
    }

    /// Whether this tag prefers a small/fast model.
    pub fn prefers_fast(&self) -> bool {
        matches!(self, Self::AutoFast | Self::NodeFast)
    }
}

/// A profile's model reference: either a concrete `provider/model` pair or a
/// symbolic tag resolved at spawn time (spec §4.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelRef {
    Concrete { provider: String, model: String },
    Tag(ModelTag),
}

impl ModelRef {
    /// Parse a raw reference string as found in configuration: either a
    /// symbolic tag or a `provider/model` string.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(tag) = ModelTag::parse(raw) {
            return Some(Self::Tag(tag));
        }
        let (provider, model) = raw.split_once('/')?;
        if provider.is_empty() || model.is_empty() {
            return None;
        }
        Some(Self::Concrete { provider: provider.to_string(), model: model.to_string() })
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concrete { provider, model } => write!(f, "{provider}/{model}"),
            Self::Tag(tag) => write!(f, "{}", tag.as_str()),
        }
    }
}

/// Per-profile tool allow/deny configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicy {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

/// Declarative capability flags for a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub supports_image_input: bool,
    #[serde(default)]
    pub supports_web: bool,
}

/// Immutable description of a kind of worker (spec §3 "Worker Profile").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: ProfileId,
    pub name: String,
    pub model: ModelRef,
    pub purpose: String,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub tool_policy: Option<ToolPolicy>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Arbitrary system prompt seeded at spawn (spec §4.1 step 11).
    #[serde(default)]
    pub system_prompt: String,
    /// Pin a fixed port instead of letting the OS assign one.
    #[serde(default)]
    pub pinned_port: Option<u16>,
}

impl WorkerProfile {
    pub fn requires_vision(&self) -> bool {
        self.capabilities.supports_image_input
            || matches!(&self.model, ModelRef::Tag(t) if t.requires_vision())
    }

    /// Extra key/value pairs consumers attach via tags, e.g. `key=value`.
    pub fn tag_map(&self) -> HashMap<&str, &str> {
        self.tags
            .iter()
            .filter_map(|t| t.split_once('='))
            .collect()
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
