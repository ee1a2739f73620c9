use std::collections::{BTreeMap, BTreeSet, HashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, QueryId};

/// Gold standard: the documents judged relevant for each query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceJudgments {
    judgments: BTreeMap<QueryId, BTreeSet<DocId>>,
}

impl RelevanceJudgments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query_id: QueryId, doc_id: DocId) {
        self.judgments.entry(query_id).or_default().insert(doc_id);
    }

    /// Groups `(query id, doc id)` rows, keeping only queries in `queries`.
    pub fn from_rows<I>(rows: I, queries: &BTreeMap<QueryId, String>) -> Self
    where
        I: IntoIterator<Item = (QueryId, DocId)>,
    {
        let mut judgments = Self::new();
        for (query_id, doc_id) in rows {
            if queries.contains_key(&query_id) {
                judgments.insert(query_id, doc_id);
            }
        }
        judgments
    }

    pub fn relevant(&self, query_id: QueryId) -> Option<&BTreeSet<DocId>> {
        self.judgments.get(&query_id)
    }

    pub fn query_ids(&self) -> impl Iterator<Item = QueryId> + '_ {
        self.judgments.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }
}

impl From<BTreeMap<QueryId, BTreeSet<DocId>>> for RelevanceJudgments {
    fn from(judgments: BTreeMap<QueryId, BTreeSet<DocId>>) -> Self {
        RelevanceJudgments { judgments }
    }
}

fn check_cutoff(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::invalid_argument("cutoff k must be at least 1"));
    }
    Ok(())
}

// Distinct relevant documents among the first k retrieved
fn relevant_in_top_k(relevant: &BTreeSet<DocId>, retrieved: &[DocId], k: usize) -> usize {
    let mut counted = HashSet::new();
    retrieved.iter()
        .take(k)
        .filter(|doc| relevant.contains(doc) && counted.insert(**doc))
        .count()
}

/// `|relevant ∩ retrieved[..k]| / k`
pub fn precision_at_k(relevant: &BTreeSet<DocId>, retrieved: &[DocId], k: usize) -> Result<f64> {
    check_cutoff(k)?;
    Ok(relevant_in_top_k(relevant, retrieved, k) as f64 / k as f64)
}

/// `|relevant ∩ retrieved[..k]| / |relevant|`, and 0.0 when nothing is relevant.
pub fn recall_at_k(relevant: &BTreeSet<DocId>, retrieved: &[DocId], k: usize) -> Result<f64> {
    if relevant.is_empty() {
        return Ok(0.0);
    }
    check_cutoff(k)?;
    Ok(relevant_in_top_k(relevant, retrieved, k) as f64 / relevant.len() as f64)
}

/// Runs every query through `search_fn` in parallel.
pub fn retrieve_top_k<F>(
    queries: &BTreeMap<QueryId, String>,
    search_fn: F,
    k: usize,
) -> Result<BTreeMap<QueryId, Vec<DocId>>>
where
    F: Fn(&str, usize) -> Result<Vec<DocId>> + Sync,
{
    check_cutoff(k)?;
    queries.par_iter()
        .map(|(query_id, query)| {
            let mut retrieved = search_fn(query, k)?;
            retrieved.truncate(k);
            Ok((*query_id, retrieved))
        })
        .collect()
}

fn mean_at_k<F, M>(
    queries: &BTreeMap<QueryId, String>,
    gold: &RelevanceJudgments,
    search_fn: F,
    k: usize,
    metric: M,
) -> Result<f64>
where
    F: Fn(&str, usize) -> Result<Vec<DocId>> + Sync,
    M: Fn(&BTreeSet<DocId>, &[DocId], usize) -> Result<f64> + Sync,
{
    check_cutoff(k)?;

    let judged: Vec<(&str, &BTreeSet<DocId>)> = queries.iter()
        .filter_map(|(query_id, query)| match gold.relevant(*query_id) {
            Some(relevant) => Some((query.as_str(), relevant)),
            None => {
                warn!(query_id, "query has no relevance judgments, skipped");
                None
            }
        })
        .collect();

    if judged.is_empty() {
        warn!(queries = queries.len(), "no query could be evaluated");
        return Ok(0.0);
    }

    let values = judged.par_iter()
        .map(|(query, relevant)| metric(relevant, &search_fn(query, k)?, k))
        .collect::<Result<Vec<f64>>>()?;

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of precision@k over the judged queries.
pub fn map_at_k<F>(queries: &BTreeMap<QueryId, String>, gold: &RelevanceJudgments, search_fn: F, k: usize) -> Result<f64>
where
    F: Fn(&str, usize) -> Result<Vec<DocId>> + Sync,
{
    mean_at_k(queries, gold, search_fn, k, precision_at_k)
}

/// Mean of recall@k over the judged queries.
pub fn mar_at_k<F>(queries: &BTreeMap<QueryId, String>, gold: &RelevanceJudgments, search_fn: F, k: usize) -> Result<f64>
where
    F: Fn(&str, usize) -> Result<Vec<DocId>> + Sync,
{
    mean_at_k(queries, gold, search_fn, k, recall_at_k)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffMetrics {
    pub k: usize,
    pub map: f64,
    pub mar: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub cutoffs: Vec<CutoffMetrics>,
    pub evaluated: usize,
    pub skipped: Vec<QueryId>,
}

impl EvaluationReport {
    pub fn at(&self, k: usize) -> Option<&CutoffMetrics> {
        self.cutoffs.iter().find(|c| c.k == k)
    }
}

/// MAP@k and MAR@k for every cutoff in `ks`, from one retrieval pass at the
/// largest cutoff.
pub fn evaluate<F>(
    queries: &BTreeMap<QueryId, String>,
    gold: &RelevanceJudgments,
    search_fn: F,
    ks: &[usize],
) -> Result<EvaluationReport>
where
    F: Fn(&str, usize) -> Result<Vec<DocId>> + Sync,
{
    let Some(&max_k) = ks.iter().max() else {
        return Err(Error::invalid_argument("at least one cutoff is required"));
    };
    for &k in ks {
        check_cutoff(k)?;
    }

    let (judged, skipped): (BTreeMap<QueryId, String>, BTreeMap<QueryId, String>) = queries.iter()
        .map(|(id, query)| (*id, query.clone()))
        .partition(|(id, _)| gold.relevant(*id).is_some());
    for query_id in skipped.keys() {
        warn!(query_id, "query has no relevance judgments, skipped");
    }
    if judged.is_empty() {
        warn!(queries = queries.len(), "no query could be evaluated");
    }

    let retrieved = retrieve_top_k(&judged, search_fn, max_k)?;

    let mut cutoffs = Vec::with_capacity(ks.len());
    for &k in ks {
        let (mut precision, mut recall) = (0.0, 0.0);
        for (query_id, docs) in &retrieved {
            if let Some(relevant) = gold.relevant(*query_id) {
                precision += precision_at_k(relevant, docs, k)?;
                recall += recall_at_k(relevant, docs, k)?;
            }
        }
        let n = retrieved.len().max(1) as f64;
        cutoffs.push(CutoffMetrics { k, map: precision / n, mar: recall / n });
    }

    info!(evaluated = retrieved.len(), skipped = skipped.len(), "evaluation finished");
    Ok(EvaluationReport {
        cutoffs,
        evaluated: retrieved.len(),
        skipped: skipped.into_keys().collect(),
    })
}
