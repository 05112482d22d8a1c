// src/resolver.rs
// THE RESOLUTION POLICY
// Normalize -> curated match -> model tiers -> fallback portal.
// Every terminal outcome is written to the query log; log failures never fail a request.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::brain::{ChatTurn, Role, TextGenerator};
use crate::config::{ModelTier, ResolverSettings};
use crate::curated::CuratedStore;
use crate::error::{GenerationError, ResolveError};
use crate::link::{extract_first_url, is_trusted_link, strip_link};
use crate::matcher::find_match;
use crate::normalizer::normalize_query;
use crate::query_log::{QueryLog, QueryLogEntry};

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that returns official government websites for users' civic tasks. Your answers MUST:\n\
- Include a short summary of how to complete the task\n\
- Include exactly one direct official link (a .gov site or a trusted .org site)\n\
- Never invent or guess a URL; if you are not sure a page exists, do not include it\n\
- If unsure, suggest searching on usa.gov";

pub const UNAVAILABLE_SUMMARY: &str =
    "Sorry, we couldn't find an official link for that request right now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSource {
    Curated,
    /// 1-based tier number.
    ModelTier(usize),
    Fallback,
}

impl fmt::Display for OutcomeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeSource::Curated => f.write_str("curated"),
            OutcomeSource::ModelTier(n) => write!(f, "model-tier-{}", n),
            OutcomeSource::Fallback => f.write_str("fallback"),
        }
    }
}

impl Serialize for OutcomeSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The sole result of a resolution, returned to the caller and logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub summary: String,
    pub link: String,
    pub source: OutcomeSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A tier reply that carried a trusted link.
struct TierHit {
    summary: String,
    link: String,
}

pub struct Resolver {
    curated: Arc<dyn CuratedStore>,
    brain: Arc<dyn TextGenerator>,
    query_log: Arc<dyn QueryLog>,
    settings: ResolverSettings,
}

impl Resolver {
    pub fn new(
        curated: Arc<dyn CuratedStore>,
        brain: Arc<dyn TextGenerator>,
        query_log: Arc<dyn QueryLog>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            curated,
            brain,
            query_log,
            settings,
        }
    }

    /// Resolves one query. Only `ResolveError::InvalidInput` is ever returned;
    /// every other failure ends in a fallback outcome.
    pub async fn resolve(
        &self,
        query: &str,
        history: &[ChatTurn],
    ) -> Result<ResolutionOutcome, ResolveError> {
        let normalized = normalize_query(query)?;

        // 1. Curated codex
        let entries = match self.curated.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Curated store unavailable, escalating to model tiers");
                Vec::new()
            }
        };

        if let Some(hit) = find_match(&normalized, &entries, self.settings.policy) {
            tracing::info!(score = hit.score, link = %hit.entry.link, "Curated match");
            let outcome = ResolutionOutcome {
                summary: hit.entry.summary,
                link: hit.entry.link,
                source: OutcomeSource::Curated,
                note: None,
            };
            self.record(query, &outcome).await;
            return Ok(outcome);
        }

        // 2. Model tiers
        tracing::info!(policy = %self.settings.policy, "No curated match, escalating to model tiers");
        let turns = build_turns(query, history);
        let mut last_reply: Option<String> = None;

        for (index, tier) in self.settings.tiers.iter().enumerate() {
            let number = index + 1;
            match self.attempt_tier(number, tier, &turns).await {
                Ok(hit) => {
                    tracing::info!(tier = number, model = %tier.model, link = %hit.link, "Model tier produced a trusted link");
                    let outcome = ResolutionOutcome {
                        summary: hit.summary,
                        link: hit.link,
                        source: OutcomeSource::ModelTier(number),
                        note: None,
                    };
                    self.record(query, &outcome).await;
                    return Ok(outcome);
                }
                Err(ResolveError::NoValidLink { reply, .. }) => {
                    tracing::info!(tier = number, model = %tier.model, "Model reply had no trusted link");
                    last_reply = Some(reply);
                }
                Err(ResolveError::GenerationFailure { source, .. }) => {
                    tracing::warn!(tier = number, model = %tier.model, error = %source, "Model tier failed");
                }
                Err(other) => {
                    tracing::warn!(tier = number, error = %other, "Unexpected tier failure");
                }
            }
        }

        // 3. Fallback portal
        let outcome = self.fallback(last_reply.as_deref());
        tracing::info!(link = %outcome.link, "All model tiers exhausted, using fallback portal");
        self.record(query, &outcome).await;
        Ok(outcome)
    }

    async fn attempt_tier(
        &self,
        number: usize,
        tier: &ModelTier,
        turns: &[ChatTurn],
    ) -> Result<TierHit, ResolveError> {
        let timeout = self.settings.tier_timeout;
        let reply = match tokio::time::timeout(timeout, self.brain.generate(&tier.model, turns)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(source)) => return Err(ResolveError::GenerationFailure { tier: number, source }),
            Err(_) => {
                return Err(ResolveError::GenerationFailure {
                    tier: number,
                    source: GenerationError::Timeout(timeout),
                })
            }
        };

        let trusted = extract_first_url(&reply)
            .filter(|link| is_trusted_link(link, &tier.trusted_markers))
            .map(str::to_string);

        match trusted {
            Some(link) => Ok(TierHit {
                summary: strip_link(&reply, &link),
                link,
            }),
            None => Err(ResolveError::NoValidLink { tier: number, reply }),
        }
    }

    fn fallback(&self, last_reply: Option<&str>) -> ResolutionOutcome {
        let summary = last_reply
            .map(|reply| strip_link(reply, extract_first_url(reply).unwrap_or("")))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNAVAILABLE_SUMMARY.to_string());

        ResolutionOutcome {
            summary,
            link: self.settings.fallback_url.clone(),
            source: OutcomeSource::Fallback,
            note: Some(format!(
                "No direct link found. Please visit {} for more info.",
                self.settings.fallback_url
            )),
        }
    }

    async fn record(&self, query: &str, outcome: &ResolutionOutcome) {
        let entry = QueryLogEntry {
            query: query.to_string(),
            source: outcome.source.to_string(),
            link: outcome.link.clone(),
        };
        if let Err(e) = self.query_log.append(entry).await {
            let err = ResolveError::LogWriteFailure(e);
            tracing::warn!(error = %err, "Query log write failed, continuing");
        }
    }
}

/// System instruction, prior user/assistant turns, then the query as the latest user turn.
/// Skips re-appending the query when the history already ends with it.
pub fn build_turns(query: &str, history: &[ChatTurn]) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(ChatTurn::system(SYSTEM_INSTRUCTION));
    turns.extend(history.iter().filter(|t| t.role != Role::System).cloned());

    let already_last = matches!(
        turns.last(),
        Some(ChatTurn { role: Role::User, content }) if content.trim() == query.trim()
    );
    if !already_last {
        turns.push(ChatTurn::user(query));
    }
    turns
}
