use crate::backend::{DecompositionBackend, TaskSpec};
use async_trait::async_trait;
use fanout_core::FanoutResult;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Deterministic rule-based decomposition backend.
///
/// Splits the query into clauses on conjunctions, then classifies each
/// clause into a capability:
///
/// - "weather in/for \<city\>" → `weather` with `{city}`
/// - "\<FROM\> to \<TO\>" (ISO-style 3-letter codes) → `fx` with
///   `{from, to}`
/// - anything else → `search` with `{query}`
///
/// Same-capability multi-object queries ("weather in Beijing, weather in
/// Shanghai") naturally split into one subtask per object, while
/// unrelated queries joined by "and" split into one subtask per
/// capability. This mirrors the planner rules the production setup runs
/// through an LLM, and lets the whole pipeline execute without one.
pub struct KeywordPlanner {
    clause_split: Regex,
    weather: Regex,
    fx: Regex,
}

impl KeywordPlanner {
    /// Capability tag for unclassified clauses.
    pub const FALLBACK_CAPABILITY: &'static str = "search";

    /// Creates the planner with its clause and capability patterns.
    pub fn new() -> Self {
        // The patterns are static and known-good; constructing them can
        // only fail on a typo caught by the tests below.
        #[allow(clippy::expect_used)]
        Self {
            clause_split: Regex::new(r"\s+and\s+|\s*[,;，；]\s*")
                .expect("clause split pattern"),
            weather: Regex::new(r"(?i)weather\s+(?:in|for|at)\s+([\p{L}][\p{L} .'-]*)")
                .expect("weather pattern"),
            fx: Regex::new(r"\b([A-Z]{3})\s+(?:to|/)\s+([A-Z]{3})\b").expect("fx pattern"),
        }
    }

    fn classify(&self, clause: &str) -> TaskSpec {
        if let Some(captures) = self.weather.captures(clause) {
            let mut params = BTreeMap::new();
            params.insert("city".to_string(), captures[1].trim().to_string());
            return TaskSpec::new("weather", params);
        }
        if let Some(captures) = self.fx.captures(clause) {
            let mut params = BTreeMap::new();
            params.insert("from".to_string(), captures[1].to_string());
            params.insert("to".to_string(), captures[2].to_string());
            return TaskSpec::new("fx", params);
        }
        let mut params = BTreeMap::new();
        params.insert("query".to_string(), clause.to_string());
        TaskSpec::new(Self::FALLBACK_CAPABILITY, params)
    }
}

impl Default for KeywordPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecompositionBackend for KeywordPlanner {
    async fn decompose(&self, query_text: &str) -> FanoutResult<Vec<TaskSpec>> {
        let specs: Vec<TaskSpec> = self
            .clause_split
            .split(query_text)
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| self.classify(clause))
            .collect();

        debug!(clauses = specs.len(), "Keyword planner decomposed query");
        Ok(specs)
    }
}
