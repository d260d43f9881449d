// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model Resolution — maps a model reference (concrete or symbolic tag) plus
//! a live provider catalog to a single `providerId/modelId` string (spec §4.7).

use std::collections::BTreeMap;

use orch_core::{ModelRef, ModelTag, OrchError, WorkerProfile};

/// Where a provider's entry in the catalog came from. Non-`Api` sources are
/// "usable" for symbolic-tag resolution (spec §4.7 "filtered catalog of
/// usable providers").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    Config,
    Custom,
    Env,
    Api,
}

impl ProviderSource {
    fn is_api(&self) -> bool {
        matches!(self, Self::Api)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelCapabilities {
    pub supports_image_input: bool,
    pub supports_web: bool,
}

#[derive(Debug, Clone)]
pub struct CatalogModel {
    pub id: String,
    pub name: String,
    pub capabilities: ModelCapabilities,
}

#[derive(Debug, Clone)]
pub struct CatalogProvider {
    pub id: String,
    pub source: ProviderSource,
    /// `modelId -> model`, ordered for deterministic iteration.
    pub models: BTreeMap<String, CatalogModel>,
}

#[derive(Debug, Clone, Default)]
pub struct ProviderCatalog {
    pub providers: Vec<CatalogProvider>,
}

/// Reserved provider id that is always considered "usable" regardless of its
/// recorded source (spec §4.7 "the reserved `opencode` provider").
const RESERVED_PROVIDER: &str = "opencode";

/// Optional hints threaded through resolution (spec §4.7 "Inputs").
#[derive(Debug, Clone, Default)]
pub struct ResolutionHints {
    pub small_model: Option<String>,
    pub default_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub provider_id: String,
    pub model_id: String,
}

impl std::fmt::Display for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}

#[derive(Debug, Clone)]
struct Candidate<'a> {
    provider: &'a CatalogProvider,
    model: &'a CatalogModel,
    score: i32,
}

pub fn resolve_model_ref(
    reference: &str,
    catalog: &ProviderCatalog,
    hints: &ResolutionHints,
    profile: &WorkerProfile,
) -> Result<Resolved, OrchError> {
    if reference.trim().is_empty() {
        return Err(OrchError::ModelInvalid("model reference is empty".into()));
    }

    let resolved = if let Some(parsed) = ModelRef::parse(reference) {
        match parsed {
            ModelRef::Concrete { provider, model } => resolve_concrete(&provider, &model, catalog)?,
            ModelRef::Tag(tag) => resolve_tag(tag, catalog, hints)?,
        }
    } else if reference.contains('/') {
        // Slash-shaped but didn't parse as concrete (empty provider/model).
        return Err(OrchError::ModelInvalid(format!("malformed model reference '{reference}'")));
    } else {
        resolve_fuzzy(reference, all_models(catalog))?
    };

    enforce_capabilities(profile, &resolved, catalog)?;
    Ok(resolved)
}

fn resolve_concrete(
    provider_id: &str,
    model_id: &str,
    catalog: &ProviderCatalog,
) -> Result<Resolved, OrchError> {
    if let Some(provider) = catalog.providers.iter().find(|p| p.id == provider_id) {
        if provider.models.contains_key(model_id) {
            return Ok(Resolved { provider_id: provider.id.clone(), model_id: model_id.to_string() });
        }
        let scoped: Vec<Candidate> = provider
            .models
            .values()
            .map(|m| Candidate { provider, model: m, score: score_candidate(model_id, provider, m) })
            .filter(|c| c.score > 0)
            .collect();
        if let Some(best) = pick_best(scoped) {
            return Ok(Resolved { provider_id: best.provider.id.clone(), model_id: best.model.id.clone() });
        }
    }
    resolve_fuzzy(model_id, all_models(catalog))
}

fn resolve_tag(tag: ModelTag, catalog: &ProviderCatalog, hints: &ResolutionHints) -> Result<Resolved, OrchError> {
    let usable: Vec<&CatalogProvider> =
        catalog.providers.iter().filter(|p| !p.source.is_api() || p.id == RESERVED_PROVIDER).collect();

    if tag.requires_vision() {
        let candidates: Vec<Candidate> = usable
            .iter()
            .flat_map(|p| p.models.values().map(move |m| (*p, m)))
            .filter(|(_, m)| m.capabilities.supports_image_input)
            .map(|(p, m)| Candidate { provider: p, model: m, score: score_candidate(&m.id, p, m) })
            .collect();
        return pick_best(candidates)
            .map(|c| Resolved { provider_id: c.provider.id.clone(), model_id: c.model.id.clone() })
            .ok_or_else(|| OrchError::ModelUnresolvable { tag: tag.as_str().to_string() });
    }

    if tag.requires_docs() {
        let candidates: Vec<Candidate> = usable
            .iter()
            .flat_map(|p| p.models.values().map(move |m| (*p, m)))
            .filter(|(_, m)| m.capabilities.supports_web)
            .map(|(p, m)| Candidate { provider: p, model: m, score: score_candidate(&m.id, p, m) })
            .collect();
        if let Some(best) = pick_best(candidates) {
            return Ok(Resolved { provider_id: best.provider.id.clone(), model_id: best.model.id.clone() });
        }
        return fall_back_to_default(catalog, hints, &tag);
    }

    if tag.prefers_fast() {
        if let Some(small) = &hints.small_model {
            if let Ok(resolved) = resolve_fuzzy(small, all_models(catalog)) {
                return Ok(resolved);
            }
        }
        let candidates: Vec<Candidate> = usable
            .iter()
            .flat_map(|p| p.models.values().map(move |m| (*p, m)))
            .map(|(p, m)| Candidate { provider: p, model: m, score: score_candidate(&m.id, p, m) })
            .filter(|c| c.score > 0)
            .collect();
        if let Some(best) = pick_best(candidates) {
            return Ok(Resolved { provider_id: best.provider.id.clone(), model_id: best.model.id.clone() });
        }
        return fall_back_to_default(catalog, hints, &tag);
    }

    fall_back_to_default(catalog, hints, &tag)
}

fn fall_back_to_default(
    catalog: &ProviderCatalog,
    hints: &ResolutionHints,
    tag: &ModelTag,
) -> Result<Resolved, OrchError> {
    match &hints.default_model {
        Some(default) => resolve_fuzzy(default, all_models(catalog)),
        None => Err(OrchError::ModelUnresolvable { tag: tag.as_str().to_string() }),
    }
}

fn all_models(catalog: &ProviderCatalog) -> Vec<(&CatalogProvider, &CatalogModel)> {
    catalog.providers.iter().flat_map(|p| p.models.values().map(move |m| (p, m))).collect()
}

fn resolve_fuzzy(needle: &str, pool: Vec<(&CatalogProvider, &CatalogModel)>) -> Result<Resolved, OrchError> {
    let candidates: Vec<Candidate> = pool
        .into_iter()
        .map(|(p, m)| Candidate { provider: p, model: m, score: score_candidate(needle, p, m) })
        .filter(|c| c.score > 0)
        .collect();
    pick_best(candidates)
        .map(|c| Resolved { provider_id: c.provider.id.clone(), model_id: c.model.id.clone() })
        .ok_or_else(|| OrchError::ModelUnresolvable { tag: needle.to_string() })
}

/// Deterministic tie-break: highest score wins; ties broken lexicographically
/// by `providerId` then `modelId` (spec §4.7 "Determinism of ties").
fn pick_best<'a>(mut candidates: Vec<Candidate<'a>>) -> Option<Candidate<'a>> {
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.provider.id.cmp(&b.provider.id))
            .then_with(|| a.model.id.cmp(&b.model.id))
    });
    candidates.into_iter().next()
}

fn normalize(raw: &str) -> String {
    let mut s = raw.trim().to_lowercase();
    if let Some((_, rest)) = s.split_once(':') {
        // Strip a leading `providerPrefix:` segment only; a bare tag like
        // `auto:vision` never reaches here (handled by resolve_tag instead).
        s = rest.to_string();
    }
    strip_version_suffix(&s)
}

fn strip_version_suffix(s: &str) -> String {
    // Strip trailing `-YYYY-MM-DD`, `-YYYYMMDD`, or `-vN`.
    let date_iso = regex_like_date_suffix(s, true);
    if let Some(stripped) = date_iso {
        return stripped;
    }
    if let Some(stripped) = regex_like_date_suffix(s, false) {
        return stripped;
    }
    if let Some(pos) = s.rfind("-v") {
        let (head, tail) = s.split_at(pos + 2);
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
            return head[..pos].to_string();
        }
    }
    s.to_string()
}

/// Matches a trailing `-YYYY-MM-DD` (hyphenated=true) or `-YYYYMMDD` suffix.
fn regex_like_date_suffix(s: &str, hyphenated: bool) -> Option<String> {
    let suffix_len = if hyphenated { 11 } else { 9 };
    if s.len() <= suffix_len {
        return None;
    }
    let (head, tail) = s.split_at(s.len() - suffix_len);
    if !tail.starts_with('-') {
        return None;
    }
    let digits = &tail[1..];
    let plausible = if hyphenated {
        digits.len() == 10
            && digits.as_bytes()[4] == b'-'
            && digits.as_bytes()[7] == b'-'
            && digits.chars().enumerate().all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
    } else {
        digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit())
    };
    plausible.then(|| head.to_string())
}

fn score_candidate(needle: &str, provider: &CatalogProvider, model: &CatalogModel) -> i32 {
    let needle_norm = normalize(needle);
    let id_norm = normalize(&model.id);
    let name_norm = normalize(&model.name);

    let mut score = 0;
    if !provider.source.is_api() {
        score += 5;
    }

    if id_norm == needle_norm || name_norm == needle_norm {
        score += 50;
    } else if id_norm.starts_with(&format!("{needle_norm}-")) || name_norm.starts_with(&format!("{needle_norm}-")) {
        score += 25;
    } else if id_norm.contains(&needle_norm) || name_norm.contains(&needle_norm) {
        score += 10;
    } else {
        return 0;
    }

    let haystack = format!("{id_norm} {name_norm}");
    if haystack.contains("thinking") {
        score -= 10;
    }
    if haystack.contains("reasoning") {
        score -= 5;
    }
    score
}

fn enforce_capabilities(profile: &WorkerProfile, resolved: &Resolved, catalog: &ProviderCatalog) -> Result<(), OrchError> {
    if !profile.requires_vision() {
        return Ok(());
    }
    let has_vision = catalog
        .providers
        .iter()
        .find(|p| p.id == resolved.provider_id)
        .and_then(|p| p.models.get(&resolved.model_id))
        .map(|m| m.capabilities.supports_image_input)
        .unwrap_or(false);
    if has_vision {
        Ok(())
    } else {
        Err(OrchError::VisionRequired { profile: profile.id.to_string(), model: resolved.to_string() })
    }
}

#[cfg(test)]
#[path = "model_resolution_tests.rs"]
mod tests;
