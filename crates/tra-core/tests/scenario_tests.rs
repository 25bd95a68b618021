//! End-to-end scenarios for the resolution engine

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use tra_core::index::IndexSignals;
use tra_core::plan::ActionKind;
use tra_core::validate::ResolutionKind;
use tra_core::{
    BatchInput, ClaimBuilder, ClaimNormalizer, ClaimValue, ContradictionResolver, Engine,
    EngineConfig, IndexCalculator, Priority, ProcessedCandidate, RawClaim, RawRecord, Source,
    SourceType,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap().with_today(today())
}

/// Helper to create a patent-count claim about Jane Doe
fn patent_count(n: f64, source_type: SourceType, url: &str, conf: f64) -> RawClaim {
    ClaimBuilder::new()
        .person("Jane Doe")
        .fact_type("patentCount")
        .number(n)
        .source(Source::new(source_type, url, conf, 1_704_067_200_000))
        .build()
}

fn record(value: serde_json::Value) -> RawRecord {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_conflicting_patent_counts_elect_the_stronger_claim() {
    let config = EngineConfig::default();
    let (claims, rejected) = ClaimNormalizer::new(&config).normalize_all(vec![
        patent_count(52.0, SourceType::Ibm, "https://ibm.com/jane", 0.9),
        patent_count(48.0, SourceType::Uspto, "https://uspto.gov/jane", 0.8),
    ]);
    assert!(rejected.is_empty());

    let resolved = ContradictionResolver::new(&config, today()).resolve(claims);
    assert_eq!(resolved.groups.len(), 1);
    let group = &resolved.groups[0];
    assert_eq!(group.kind, ResolutionKind::Contradicted);

    let primary = resolved.table.get(group.primary).unwrap();
    assert_eq!(primary.value, ClaimValue::Number(52.0));
    assert!(primary.human_review_needed);

    let dissenters: Vec<&ClaimValue> = resolved
        .table
        .resolve(&primary.contradictions)
        .map(|c| &c.value)
        .collect();
    assert_eq!(dissenters, vec![&ClaimValue::Number(48.0)]);
}

#[test]
fn test_patents_and_emerging_skills_saturate_innovation() {
    let config = EngineConfig::default();
    let calculator = IndexCalculator::new(&config, today());
    let signals = IndexSignals {
        patents: 3.0,
        papers: 0.0,
        emerging_skills: 2,
        ..IndexSignals::default()
    };
    assert_eq!(calculator.innovation(&signals), 1.0);
}

#[test]
fn test_high_score_plans_evidence_packet() {
    let mut candidate = ProcessedCandidate::empty("candidate_jane_doe");
    candidate.extraordinary_index.overall_score = 0.82;

    let plan = tra_core::ActionPlanner::new().plan(&candidate);
    assert_eq!(plan.priority, Priority::High);
    assert!(plan.has(ActionKind::EvidencePacket));
}

#[test]
fn test_unidentified_record_still_yields_one_candidate() {
    let output = engine().process(BatchInput {
        records: vec![record(json!({
            "source_id": "pdf-7",
            "source_type": "pdf",
            "content": {"bio": "Works on reinforcement learning"},
            "extraction_confidence": 0.8
        }))],
        claims: Vec::new(),
    });

    assert!(output.failures.is_empty());
    assert_eq!(output.candidates.len(), 1);
    let candidate = &output.candidates[0].candidate;
    assert_eq!(candidate.candidate_id, "candidate_pdf-7");
    assert!((candidate.confidence_score - 0.4).abs() < 1e-9);
}

#[test]
fn test_shared_email_merges_records() {
    let output = engine().process(BatchInput {
        records: vec![
            record(json!({
                "source_id": "gh-1",
                "source_type": "github",
                "content": {"name": "Jane Doe", "email": "jane@x.io", "followers": 900},
                "extraction_confidence": 0.9
            })),
            record(json!({
                "source_id": "crm-1",
                "source_type": "crm",
                "content": {"email": "jane@x.io", "company": "IBM"},
                "extraction_confidence": 0.7
            })),
            record(json!({
                "source_id": "li-1",
                "source_type": "linkedin",
                "content": {"name": "Bob Roe", "email": "bob@y.io"},
                "extraction_confidence": 0.8
            })),
        ],
        claims: Vec::new(),
    });

    let ids: Vec<&str> = output
        .candidates
        .iter()
        .map(|r| r.candidate.candidate_id.as_str())
        .collect();
    assert_eq!(ids, vec!["candidate_jane_x_io", "candidate_bob_y_io"]);

    let jane = &output.candidates[0].candidate;
    assert_eq!(jane.metadata.resolution.source_count, 2);
    assert_eq!(jane.resolved_identity.text("company").as_deref(), Some("IBM"));
    assert_eq!(jane.source_types(), vec![SourceType::Github, SourceType::Crm]);
}

#[test]
fn test_one_failing_item_does_not_sink_the_batch() {
    let output = engine().process(BatchInput {
        records: vec![
            record(json!({"source_id": "bad", "source_type": "github", "extraction_confidence": 1.7})),
            record(json!({
                "source_id": "gh-2",
                "source_type": "github",
                "content": {"name": "Jane Doe"},
                "extraction_confidence": 0.9
            })),
        ],
        claims: vec![patent_count(52.0, SourceType::Ibm, "https://ibm.com/jane", 0.9)],
    });

    assert_eq!(output.rejected.len(), 1);
    assert_eq!(output.rejected[0].item_id, "bad");
    assert_eq!(output.candidates.len(), 1);

    let jane = &output.candidates[0];
    assert_eq!(jane.candidate.claims.groups.len(), 1);
    assert_eq!(jane.profile.total_claims, 1);
}
