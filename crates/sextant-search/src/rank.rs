//! Merge-rank and join stages of the search pipeline.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::warn;

use sextant_core::types::{Match, NamespaceMatches, ResolvedEntity, SearchResult};

/// Total order used for the global ranking: score descending, then
/// namespace ascending, then id ascending.
fn rank_order(a: &Match, b: &Match) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.namespace.cmp(&b.namespace))
        .then_with(|| a.id.cmp(&b.id))
}

/// Flatten per-namespace results and keep the global top `top_k`.
///
/// The cut is global across namespaces, not per namespace. Ties never depend
/// on the order in which namespace queries completed.
pub fn merge_rank(results: Vec<NamespaceMatches>, top_k: usize) -> Vec<Match> {
    let mut all: Vec<Match> = results
        .into_iter()
        .flat_map(|r| {
            let namespace = r.namespace;
            r.matches.into_iter().map(move |mut m| {
                m.namespace = namespace.clone();
                m
            })
        })
        .collect();

    all.sort_by(rank_order);
    all.truncate(top_k);
    all
}

/// Distinct ids of `matches`, in first-seen order.
pub fn unique_ids(matches: &[Match]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(matches.len());
    matches
        .iter()
        .filter(|m| seen.insert(m.id.as_str()))
        .map(|m| m.id.clone())
        .collect()
}

/// Join ranked matches with their resolved entities, preserving rank order.
///
/// Matches whose id did not resolve are dropped and logged.
pub fn join_entities(matches: Vec<Match>, entities: Vec<ResolvedEntity>) -> Vec<SearchResult> {
    let by_pi: HashMap<String, ResolvedEntity> = entities
        .into_iter()
        .map(|e| (e.pi.clone(), e))
        .collect();

    matches
        .into_iter()
        .filter_map(|m| match by_pi.get(&m.id) {
            Some(entity) => Some(SearchResult::join(m, entity)),
            None => {
                warn!(pi = %m.id, namespace = %m.namespace, "Entity not found for match, dropping");
                None
            }
        })
        .collect()
}
