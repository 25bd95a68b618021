//! Entity merging: which records describe the same person
//!
//! Records are compared pairwise on their identifying fields, matches are
//! joined transitively, and each resulting cluster is merged into one
//! [`ResolvedIdentity`].

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use super::contradiction::Contradiction;
use super::identity::{is_present, ResolvedIdentity, IDENTIFYING_FIELDS};
use super::record::ExtractedRecord;
use crate::config::EngineConfig;
use crate::fuzzy::FieldMatcher;

/// Fields checked for disagreement between records of one cluster
pub const COMPARED_FIELDS: [&str; 5] = ["name", "email", "location", "company", "title"];

/// Share of compared identifying fields that must match
const MIN_MATCH_RATIO: f64 = 0.5;

/// Resolution-confidence bonus per additional source, and its cap
const SOURCE_BONUS_STEP: f64 = 0.1;
const SOURCE_BONUS_CAP: f64 = 0.2;

/// Outcome of comparing two records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMatch {
    pub source_id_1: String,
    pub source_id_2: String,
    /// Mean similarity over the compared fields
    pub similarity_score: f64,
    pub matching_fields: Vec<String>,
    pub conflicting_fields: Vec<String>,
}

impl EntityMatch {
    pub fn compared(&self) -> usize {
        self.matching_fields.len() + self.conflicting_fields.len()
    }

    /// At least one field matched and at least half of the compared fields did
    pub fn is_same_entity(&self) -> bool {
        let matched = self.matching_fields.len();
        matched > 0 && matched as f64 / self.compared() as f64 >= MIN_MATCH_RATIO
    }
}

/// How a candidate's identity was assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// One or more records clustered by fuzzy field matching
    FuzzyMatching,
    /// No records; the candidate was built from standalone claims
    ClaimsOnly,
}

/// Bookkeeping of one cluster's resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionMetadata {
    pub source_count: usize,
    pub resolution_method: ResolutionMethod,
    /// Identifying fields that joined records of this cluster
    pub matching_fields: Vec<String>,
    pub identifying_fields: usize,
}

/// One person: merged identity plus the records behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCluster {
    pub candidate_id: String,
    pub identity: ResolvedIdentity,
    pub records: Vec<ExtractedRecord>,
    pub confidence: f64,
    pub metadata: ResolutionMetadata,
    /// Field-level disagreements between the cluster's records
    pub contradictions: Vec<Contradiction>,
}

/// Union-find over record indices
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Mean record confidence plus a capped bonus for extra sources
pub fn resolution_confidence(records: &[ExtractedRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let count = records.len() as f64;
    let avg = records.iter().map(|r| r.extraction_confidence).sum::<f64>() / count;
    let bonus = (SOURCE_BONUS_STEP * (count - 1.0)).min(SOURCE_BONUS_CAP);
    (avg + bonus).min(1.0)
}

/// Deterministic id: email, else name, else the first source id
pub fn candidate_id(identity: &ResolvedIdentity, records: &[ExtractedRecord]) -> String {
    if let Some(email) = identity.email() {
        return format!("candidate_{}", email.trim().replace(['@', '.'], "_"));
    }
    if let Some(name) = identity.name() {
        return format!(
            "candidate_{}",
            name.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase()
        );
    }
    match records.first() {
        Some(record) => format!("candidate_{}", record.source_id),
        None => "candidate_unknown".to_string(),
    }
}

/// Fold one value into the merged identity
fn merge_value(identity: &mut ResolvedIdentity, key: &str, value: &Value) {
    if identity.get(key).is_none() {
        identity.insert(key, value.clone());
        return;
    }
    let Some(existing) = identity.entry_mut(key) else {
        return;
    };
    if !is_present(existing) {
        *existing = value.clone();
        return;
    }
    match (existing, value) {
        (Value::Array(have), Value::Array(incoming)) => {
            for item in incoming {
                if !have.contains(item) {
                    have.push(item.clone());
                }
            }
        }
        (Value::Object(have), Value::Object(incoming)) => {
            for (k, v) in incoming {
                have.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        _ => {}
    }
}

/// Merge records, walking them in confidence-descending order
pub fn merge_records(records: &[ExtractedRecord]) -> ResolvedIdentity {
    let mut ordered: Vec<&ExtractedRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.extraction_confidence.total_cmp(&a.extraction_confidence));

    let mut identity = ResolvedIdentity::new();
    for record in ordered {
        for (key, value) in &record.content {
            merge_value(&mut identity, key, value);
        }
    }
    identity
}

/// Clusters records into entities and merges each cluster
pub struct EntityMerger<'a> {
    config: &'a EngineConfig,
    matcher: FieldMatcher,
    contradiction_matcher: FieldMatcher,
}

impl<'a> EntityMerger<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            matcher: FieldMatcher::new(config.similarity_metric, config.fuzzy_match_threshold),
            contradiction_matcher: FieldMatcher::new(
                config.similarity_metric,
                config.field_contradiction_threshold,
            ),
        }
    }

    /// Compare two records on the identifying fields both carry
    pub fn compare(&self, a: &ExtractedRecord, b: &ExtractedRecord) -> EntityMatch {
        let mut matching_fields = Vec::new();
        let mut conflicting_fields = Vec::new();
        let mut total_similarity = 0.0;

        for field in IDENTIFYING_FIELDS {
            let (Some(va), Some(vb)) = (a.field_text(field), b.field_text(field)) else {
                continue;
            };
            let score = self.matcher.score(&va, &vb);
            total_similarity += score;
            if score >= self.matcher.threshold {
                matching_fields.push(field.to_string());
            } else {
                conflicting_fields.push(field.to_string());
            }
        }

        let compared = matching_fields.len() + conflicting_fields.len();
        EntityMatch {
            source_id_1: a.source_id.clone(),
            source_id_2: b.source_id.clone(),
            similarity_score: if compared == 0 {
                0.0
            } else {
                total_similarity / compared as f64
            },
            matching_fields,
            conflicting_fields,
        }
    }

    /// Partition record indices into entity clusters.
    ///
    /// Clusters come back ordered by their lowest index, members ascending.
    pub fn cluster(&self, records: &[ExtractedRecord]) -> Vec<(Vec<usize>, BTreeSet<String>)> {
        let mut set = DisjointSet::new(records.len());
        let mut evidence: Vec<(usize, Vec<String>)> = Vec::new();

        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                let m = self.compare(&records[i], &records[j]);
                if m.is_same_entity() {
                    debug!(
                        a = %m.source_id_1,
                        b = %m.source_id_2,
                        fields = ?m.matching_fields,
                        similarity = m.similarity_score,
                        "records matched"
                    );
                    set.union(i, j);
                    evidence.push((i, m.matching_fields));
                }
            }
        }

        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<(Vec<usize>, BTreeSet<String>)> = Vec::new();
        for i in 0..records.len() {
            let root = set.find(i);
            let index = *slot.entry(root).or_insert_with(|| {
                clusters.push((Vec::new(), BTreeSet::new()));
                clusters.len() - 1
            });
            clusters[index].0.push(i);
        }
        for (i, fields) in evidence {
            let root = set.find(i);
            if let Some(index) = slot.get(&root) {
                clusters[*index].1.extend(fields);
            }
        }
        clusters
    }

    /// Field-level disagreements between every pair of records
    pub fn field_contradictions(&self, candidate_id: &str, records: &[ExtractedRecord]) -> Vec<Contradiction> {
        let mut found = Vec::new();
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                for field in COMPARED_FIELDS {
                    let (Some(va), Some(vb)) = (a.field_text(field), b.field_text(field)) else {
                        continue;
                    };
                    if !self.contradiction_matcher.matches(&va, &vb) {
                        found.push(Contradiction::field_mismatch(
                            candidate_id,
                            field,
                            (a.source_id.as_str(), va.as_str()),
                            (b.source_id.as_str(), vb.as_str()),
                        ));
                    }
                }
            }
        }
        found
    }

    /// Build one cluster from its records
    fn build(&self, records: Vec<ExtractedRecord>, matching_fields: BTreeSet<String>) -> EntityCluster {
        let identity = merge_records(&records);
        let candidate_id = candidate_id(&identity, &records);
        let identifying_fields = identity.identifying_field_count();

        let mut confidence = resolution_confidence(&records);
        if identifying_fields == 0 {
            confidence *= self.config.unidentified_penalty;
        }

        let contradictions = self.field_contradictions(&candidate_id, &records);

        EntityCluster {
            metadata: ResolutionMetadata {
                source_count: records.len(),
                resolution_method: ResolutionMethod::FuzzyMatching,
                matching_fields: matching_fields.into_iter().collect(),
                identifying_fields,
            },
            candidate_id,
            identity,
            records,
            confidence,
            contradictions,
        }
    }

    /// Cluster and merge a batch of records. Every record lands in exactly
    /// one cluster; candidate ids are unique within the batch.
    pub fn resolve(&self, records: Vec<ExtractedRecord>) -> Vec<EntityCluster> {
        let total = records.len();
        let groups = self.cluster(&records);

        let mut slots: Vec<Option<ExtractedRecord>> = records.into_iter().map(Some).collect();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut clusters = Vec::with_capacity(groups.len());

        for (members, fields) in groups {
            let members: Vec<ExtractedRecord> =
                members.iter().filter_map(|i| slots[*i].take()).collect();
            let mut cluster = self.build(members, fields);

            let count = seen.entry(cluster.candidate_id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                cluster.candidate_id = format!("{}_{}", cluster.candidate_id, count);
                for c in &mut cluster.contradictions {
                    c.candidate_id = cluster.candidate_id.clone();
                }
            }
            clusters.push(cluster);
        }

        info!(records = total, candidates = clusters.len(), "entity resolution complete");
        clusters
    }
}
