//! End-to-end candidate processing
//!
//! ```text
//! records ──► EntityMerger ──► clusters ─┐
//! claims  ──► ClaimNormalizer ───────────┴─► per candidate:
//!             ContradictionResolver ─► IndexCalculator ─► ActionPlanner
//! ```
//!
//! Candidates share nothing but the read-only configuration, so each one
//! is resolved independently (in parallel with the `parallel` feature). A
//! failing candidate is reported next to the others, never instead of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
use rayon::prelude::*;

use crate::claim::{Claim, FactType, RawClaim, SourceType};
use crate::config::EngineConfig;
use crate::entity::{
    is_present, Contradiction, EntityCluster, EntityMerger, ExtractedRecord, RawRecord,
    ResolutionMetadata, ResolutionMethod, ResolvedIdentity,
};
use crate::error::{ConfigError, ItemError, ResolutionError, ValidationError};
use crate::index::{ExtraordinaryIndex, IndexCalculator, IndexSignals};
use crate::normalize::{normalize_person, ClaimNormalizer};
use crate::plan::{ActionPlan, ActionPlanner};
use crate::profile::{Profile, ProfileComposer};
use crate::validate::ResolvedClaims;

/// Identity fields filled from claims when no record supplied them
const CLAIM_BACKED_FIELDS: [(FactType, &str); 5] = [
    (FactType::Email, "email"),
    (FactType::Location, "location"),
    (FactType::Company, "company"),
    (FactType::Title, "title"),
    (FactType::Name, "name"),
];

/// Everything the engine knows about one processed person
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessedCandidate {
    pub candidate_id: String,
    pub resolved_identity: ResolvedIdentity,
    pub source_records: Vec<ExtractedRecord>,
    pub claims: ResolvedClaims,
    /// Field-level and claim-level disagreements
    pub contradictions: Vec<Contradiction>,
    pub extraordinary_index: ExtraordinaryIndex,
    pub confidence_score: f64,
    pub metadata: CandidateMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMetadata {
    #[serde(flatten)]
    pub resolution: ResolutionMetadata,
    pub signals: IndexSignals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient_data: Option<String>,
}

impl Default for CandidateMetadata {
    fn default() -> Self {
        Self {
            resolution: ResolutionMetadata {
                source_count: 0,
                resolution_method: ResolutionMethod::ClaimsOnly,
                matching_fields: Vec::new(),
                identifying_fields: 0,
            },
            signals: IndexSignals::default(),
            insufficient_data: None,
        }
    }
}

impl ProcessedCandidate {
    /// A candidate with no data and zero confidence
    pub fn empty(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            ..Self::default()
        }
    }

    /// Every source type behind the records and claims, sorted
    pub fn source_types(&self) -> Vec<SourceType> {
        let mut types: Vec<SourceType> = self
            .source_records
            .iter()
            .map(|r| r.source_type)
            .chain(
                self.claims
                    .table
                    .iter()
                    .flat_map(|c| c.sources.iter().map(|s| s.source_type)),
            )
            .collect();
        types.sort();
        types.dedup();
        types
    }
}

/// One candidate's work, ready for resolution
#[derive(Debug, Clone)]
pub struct CandidateInput {
    pub candidate_id: String,
    /// Absent for candidates built only from standalone claims
    pub cluster: Option<EntityCluster>,
    pub claims: Vec<Claim>,
}

/// Raw batch: per-source records and standalone claims
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchInput {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub claims: Vec<RawClaim>,
}

#[derive(Debug, Deserialize)]
struct LooseBatch {
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    claims: Vec<Value>,
}

impl BatchInput {
    /// Parse a batch item by item so a malformed item is rejected alone
    pub fn from_value(value: Value) -> Result<(Self, Vec<ValidationError>), serde_json::Error> {
        let loose: LooseBatch = serde_json::from_value(value)?;
        let mut batch = Self::default();
        let mut rejected = Vec::new();

        for (position, record) in loose.records.into_iter().enumerate() {
            match RawRecord::from_value(record, position) {
                Ok(r) => batch.records.push(r),
                Err(e) => rejected.push(e),
            }
        }
        for (position, claim) in loose.claims.into_iter().enumerate() {
            let item_id = claim
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("claim[{}]", position));
            match serde_json::from_value::<RawClaim>(claim) {
                Ok(c) => batch.claims.push(c),
                Err(e) => rejected.push(ValidationError::new(item_id, e.to_string())),
            }
        }
        Ok((batch, rejected))
    }
}

/// Full result for one candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub candidate: ProcessedCandidate,
    pub action_plan: ActionPlan,
    pub profile: Profile,
}

/// Result of a batch: successes, failed candidates, rejected items
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutput {
    pub candidates: Vec<CandidateReport>,
    pub failures: Vec<ItemError>,
    pub rejected: Vec<ItemError>,
}

/// Candidates ready to resolve, plus the items that were rejected on the way
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub candidates: Vec<CandidateInput>,
    pub rejected: Vec<ItemError>,
}

fn slug(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase()
}

/// The resolution engine: validated configuration plus a reference date
#[derive(Debug, Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    today: NaiveDate,
}

impl Engine {
    /// Validate the configuration once; it is read-only afterwards
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            today: chrono::Utc::now().date_naive(),
        })
    }

    /// Pin the date recency is measured against
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Validate inputs, cluster records and assign claims to candidates
    pub fn prepare(&self, input: BatchInput) -> PreparedBatch {
        let config = self.config.as_ref();
        let normalizer = ClaimNormalizer::new(config);
        let mut rejected: Vec<ItemError> = Vec::new();

        let mut records = Vec::with_capacity(input.records.len());
        for (position, raw) in input.records.into_iter().enumerate() {
            match raw.validate(position) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(item = %e.item_id, reason = %e.reason, "record rejected");
                    rejected.push(e.into());
                }
            }
        }

        let clusters = EntityMerger::new(config).resolve(records);
        let mut candidates: Vec<CandidateInput> = Vec::with_capacity(clusters.len());

        for mut cluster in clusters {
            let fallback_person = cluster.identity.name();
            let mut raws = Vec::new();
            for record in &mut cluster.records {
                for (i, mut raw) in std::mem::take(&mut record.claims).into_iter().enumerate() {
                    if raw.id.is_none() {
                        raw.id = Some(format!("{}.claims[{}]", record.source_id, i));
                    }
                    if raw.person.is_none() && raw.value.field("person").is_none() {
                        raw.person = fallback_person.clone();
                    }
                    raws.push(raw);
                }
            }
            let (claims, bad) = normalizer.normalize_all(raws);
            rejected.extend(bad.into_iter().map(ItemError::from));

            candidates.push(CandidateInput {
                candidate_id: cluster.candidate_id.clone(),
                cluster: Some(cluster),
                claims,
            });
        }

        let (standalone, bad) = normalizer.normalize_all(input.claims);
        for e in &bad {
            warn!(item = %e.item_id, reason = %e.reason, "claim rejected");
        }
        rejected.extend(bad.into_iter().map(ItemError::from));

        let mut taken: HashSet<String> = candidates.iter().map(|c| c.candidate_id.clone()).collect();
        for claim in standalone {
            let person = normalize_person(&claim.person);
            let home = candidates.iter().position(|c| match &c.cluster {
                Some(cluster) => cluster
                    .identity
                    .name()
                    .map_or(false, |name| normalize_person(&name) == person),
                None => c
                    .claims
                    .first()
                    .map_or(false, |first| normalize_person(&first.person) == person),
            });

            match home {
                Some(index) => candidates[index].claims.push(claim),
                None => {
                    let base = format!("candidate_{}", slug(&person));
                    let mut candidate_id = base.clone();
                    let mut n = 1;
                    while taken.contains(&candidate_id) {
                        n += 1;
                        candidate_id = format!("{}_{}", base, n);
                    }
                    taken.insert(candidate_id.clone());
                    candidates.push(CandidateInput {
                        candidate_id,
                        cluster: None,
                        claims: vec![claim],
                    });
                }
            }
        }

        PreparedBatch {
            candidates,
            rejected,
        }
    }

    /// Resolve one candidate
    pub fn resolve_candidate(&self, input: CandidateInput) -> Result<ProcessedCandidate, ResolutionError> {
        self.resolve_candidate_until(input, &AtomicBool::new(false))
    }

    /// Resolve one candidate, giving up as soon as `cancel` is set.
    ///
    /// A cancelled run returns [`ResolutionError::Cancelled`] and nothing else.
    pub fn resolve_candidate_until(
        &self,
        input: CandidateInput,
        cancel: &AtomicBool,
    ) -> Result<ProcessedCandidate, ResolutionError> {
        let config = self.config.as_ref();
        let candidate_id = input.candidate_id;
        let checkpoint = |cancel: &AtomicBool| {
            if cancel.load(Ordering::Relaxed) {
                Err(ResolutionError::Cancelled {
                    candidate_id: candidate_id.clone(),
                })
            } else {
                Ok(())
            }
        };

        checkpoint(cancel)?;

        let usable_records = input
            .cluster
            .as_ref()
            .map_or(0, |c| c.records.iter().filter(|r| r.content.values().any(is_present)).count());
        if usable_records == 0 && input.claims.is_empty() {
            let err = ResolutionError::InsufficientData {
                candidate_id: candidate_id.clone(),
            };
            warn!(candidate = %candidate_id, "no usable data");
            let mut candidate = ProcessedCandidate::empty(candidate_id.clone());
            if let Some(cluster) = input.cluster {
                candidate.resolved_identity = cluster.identity;
                candidate.source_records = cluster.records;
                candidate.metadata.resolution = cluster.metadata;
            }
            candidate.metadata.insufficient_data = Some(err.to_string());
            return Ok(candidate);
        }

        let claims = crate::validate::ContradictionResolver::new(config, self.today).resolve(input.claims);
        checkpoint(cancel)?;

        let (mut identity, records, mut contradictions, mut metadata, cluster_confidence) = match input.cluster {
            Some(cluster) => (
                cluster.identity,
                cluster.records,
                cluster.contradictions,
                cluster.metadata,
                Some(cluster.confidence),
            ),
            None => (
                ResolvedIdentity::new(),
                Vec::new(),
                Vec::new(),
                CandidateMetadata::default().resolution,
                None,
            ),
        };

        for group in &claims.groups {
            let Some(primary) = claims.table.get(group.primary) else {
                continue;
            };
            for dissenter in claims.table.resolve(&group.contradictions) {
                contradictions.push(Contradiction::claim_conflict(
                    &candidate_id,
                    &group.key,
                    primary,
                    dissenter,
                ));
            }
        }

        enrich_identity(&mut identity, &claims);
        metadata.identifying_fields = identity.identifying_field_count();

        let calculator = IndexCalculator::new(config, self.today);
        let signals = calculator.signals(&identity, claims.primaries(), contradictions.len());
        let index = calculator.score(&signals);
        index.check(&candidate_id)?;
        checkpoint(cancel)?;

        let confidence_score = match cluster_confidence {
            Some(confidence) => confidence,
            None => {
                let primaries: Vec<f64> = claims.primaries().map(|c| c.confidence_score).collect();
                let mean = if primaries.is_empty() {
                    0.0
                } else {
                    primaries.iter().sum::<f64>() / primaries.len() as f64
                };
                if metadata.identifying_fields == 0 {
                    mean * config.unidentified_penalty
                } else {
                    mean
                }
            }
        };

        debug!(
            candidate = %candidate_id,
            groups = claims.groups.len(),
            contradictions = contradictions.len(),
            overall = index.overall_score,
            "candidate resolved"
        );

        Ok(ProcessedCandidate {
            candidate_id,
            resolved_identity: identity,
            source_records: records,
            claims,
            contradictions,
            extraordinary_index: index,
            confidence_score,
            metadata: CandidateMetadata {
                resolution: metadata,
                signals,
                insufficient_data: None,
            },
        })
    }

    /// Plan and compose a resolved candidate
    pub fn report(&self, candidate: ProcessedCandidate) -> CandidateReport {
        let action_plan = ActionPlanner::new().plan(&candidate);
        let profile = ProfileComposer::new(self.config.as_ref()).compose(&candidate);
        CandidateReport {
            candidate,
            action_plan,
            profile,
        }
    }

    /// Resolve, plan and compose one candidate
    pub fn run_candidate(&self, input: CandidateInput, cancel: &AtomicBool) -> Result<CandidateReport, ResolutionError> {
        self.resolve_candidate_until(input, cancel).map(|c| self.report(c))
    }

    #[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
    fn run_all(&self, inputs: Vec<CandidateInput>) -> Vec<Result<CandidateReport, ResolutionError>> {
        let never = AtomicBool::new(false);
        inputs
            .into_par_iter()
            .map(|input| self.run_candidate(input, &never))
            .collect()
    }

    #[cfg(any(target_arch = "wasm32", not(feature = "parallel")))]
    fn run_all(&self, inputs: Vec<CandidateInput>) -> Vec<Result<CandidateReport, ResolutionError>> {
        let never = AtomicBool::new(false);
        inputs
            .into_iter()
            .map(|input| self.run_candidate(input, &never))
            .collect()
    }

    /// Process a whole batch
    pub fn process(&self, input: BatchInput) -> BatchOutput {
        let prepared = self.prepare(input);
        let mut output = BatchOutput {
            rejected: prepared.rejected,
            ..BatchOutput::default()
        };

        for result in self.run_all(prepared.candidates) {
            match result {
                Ok(report) => output.candidates.push(report),
                Err(e) => {
                    warn!(candidate = %e.candidate_id(), error = %e, "candidate failed");
                    output.failures.push(e.into());
                }
            }
        }

        info!(
            candidates = output.candidates.len(),
            failures = output.failures.len(),
            rejected = output.rejected.len(),
            "batch processed"
        );
        output
    }
}

/// Fill identity gaps from the asserted claims
fn enrich_identity(identity: &mut ResolvedIdentity, claims: &ResolvedClaims) {
    for (fact_type, field) in CLAIM_BACKED_FIELDS {
        if identity.has(field) {
            continue;
        }
        if let Some(claim) = claims.primaries().find(|c| c.fact_type == fact_type) {
            identity.insert(field, Value::String(claim.value.display()));
        }
    }

    if !identity.has("name") {
        if let Some(claim) = claims.primaries().next() {
            identity.insert("name", Value::String(claim.person.clone()));
        }
    }

    let claimed: Vec<String> = claims
        .primaries()
        .filter(|c| c.fact_type == FactType::Skill)
        .map(|c| c.value.display())
        .collect();
    if !claimed.is_empty() {
        let mut skills: Vec<Value> = identity.list("skills").to_vec();
        for skill in claimed {
            let value = Value::String(skill);
            if !skills.contains(&value) {
                skills.push(value);
            }
        }
        identity.insert("skills", Value::Array(skills));
    }
}

/// JSON input of [`process_batch_json`]
#[derive(Debug, Deserialize)]
struct ProcessInput {
    #[serde(flatten)]
    batch: Value,
    #[serde(default)]
    config: Option<EngineConfig>,
    #[serde(default)]
    today: Option<NaiveDate>,
}

/// Process a JSON batch (string in, string out)
pub fn process_batch_json(input: &str) -> String {
    let parsed: ProcessInput = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid batch input: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let engine = match Engine::new(parsed.config.unwrap_or_default()) {
        Ok(engine) => engine,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid configuration: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };
    let engine = match parsed.today {
        Some(today) => engine.with_today(today),
        None => engine,
    };

    let (batch, shape_errors) = match BatchInput::from_value(parsed.batch) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid batch input: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let mut output = engine.process(batch);
    let mut rejected: Vec<ItemError> = shape_errors.into_iter().map(ItemError::from).collect();
    rejected.append(&mut output.rejected);
    output.rejected = rejected;

    match serde_json::to_string(&output) {
        Ok(json) => json,
        Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
    }
}
