//! Action planner

use serde::Serialize;

use crate::claim::SourceType;
use crate::entity::ResolvedIdentity;
use crate::index::IndexSignals;
use crate::pipeline::ProcessedCandidate;

pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.8;
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 0.6;

/// Stars above which repositories count as an achievement
const NOTABLE_STARS: f64 = 100.0;
/// Citations above which papers count as an achievement
const NOTABLE_CITATIONS: f64 = 50.0;
/// Skills named in a personalization point
const PERSONALIZED_SKILLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Minimal,
    Moderate,
    Significant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Standard,
    Good,
    Exceptional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CrmUpsert,
    OutreachDraft,
    EvidencePacket,
}

impl ActionKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::CrmUpsert => "Update CRM with resolved candidate data",
            Self::OutreachDraft => "Generate personalized outreach message",
            Self::EvidencePacket => "Compile evidence packet for visa applications",
        }
    }
}

/// Payload handed to the system that executes an action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionData {
    CrmUpsert {
        email: String,
        name: Option<String>,
        extraordinary_index: f64,
        source_count: usize,
    },
    OutreachDraft {
        candidate_name: Option<String>,
        key_achievements: Vec<String>,
        personalization_points: Vec<String>,
    },
    EvidencePacket {
        candidate_id: String,
        extraordinary_index: f64,
        supporting_documents: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub description: &'static str,
    pub data: ActionData,
}

impl ActionDescriptor {
    fn new(kind: ActionKind, data: ActionData) -> Self {
        Self {
            kind,
            description: kind.description(),
            data,
        }
    }
}

/// Follow-up work for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    pub candidate_id: String,
    pub actions: Vec<ActionDescriptor>,
    pub priority: Priority,
    pub estimated_effort: Effort,
    pub expected_outcome: Outcome,
}

impl ActionPlan {
    pub fn has(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind)
    }
}

/// Tier of an overall score
pub fn tier(overall_score: f64) -> (Priority, Effort, Outcome) {
    if overall_score >= HIGH_PRIORITY_THRESHOLD {
        (Priority::High, Effort::Significant, Outcome::Exceptional)
    } else if overall_score >= MEDIUM_PRIORITY_THRESHOLD {
        (Priority::Medium, Effort::Moderate, Outcome::Good)
    } else {
        (Priority::Low, Effort::Minimal, Outcome::Standard)
    }
}

fn key_achievements(signals: &IndexSignals) -> Vec<String> {
    let mut achievements = Vec::new();
    if signals.stars > NOTABLE_STARS {
        achievements.push(format!("GitHub repositories with {:.0} total stars", signals.stars));
    }
    if signals.patents > 0.0 {
        achievements.push(format!("{:.0} patents filed", signals.patents));
    }
    if signals.citations > NOTABLE_CITATIONS {
        achievements.push(format!("Research papers with {:.0} citations", signals.citations));
    }
    achievements
}

fn personalization_points(identity: &ResolvedIdentity) -> Vec<String> {
    let mut points = Vec::new();
    let skills = identity.strings("skills");
    if !skills.is_empty() {
        let named: Vec<&str> = skills.into_iter().take(PERSONALIZED_SKILLS).collect();
        points.push(format!("Expertise in {}", named.join(", ")));
    }
    if let Some(company) = identity.text("company") {
        points.push(format!("Experience at {}", company));
    }
    if let Some(location) = identity.text("location") {
        points.push(format!("Based in {}", location));
    }
    points
}

fn supporting_documents(source_types: &[SourceType]) -> Vec<String> {
    const DOCUMENTS: [(SourceType, &str); 4] = [
        (SourceType::Github, "GitHub profile and repositories"),
        (SourceType::Arxiv, "Research publications and citations"),
        (SourceType::Uspto, "Patent filings and intellectual property"),
        (SourceType::Resume, "Professional resume and experience"),
    ];
    DOCUMENTS
        .iter()
        .filter(|(t, _)| source_types.contains(t))
        .map(|(_, doc)| doc.to_string())
        .collect()
}

/// Maps a processed candidate onto a prioritized action plan
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionPlanner;

impl ActionPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, candidate: &ProcessedCandidate) -> ActionPlan {
        let score = candidate.extraordinary_index.overall_score;
        let (priority, estimated_effort, expected_outcome) = tier(score);
        let identity = &candidate.resolved_identity;
        let mut actions = Vec::new();

        if let Some(email) = identity.email() {
            actions.push(ActionDescriptor::new(
                ActionKind::CrmUpsert,
                ActionData::CrmUpsert {
                    email,
                    name: identity.name(),
                    extraordinary_index: score,
                    source_count: candidate.metadata.resolution.source_count,
                },
            ));
        }

        if priority >= Priority::Medium {
            actions.push(ActionDescriptor::new(
                ActionKind::OutreachDraft,
                ActionData::OutreachDraft {
                    candidate_name: identity.name(),
                    key_achievements: key_achievements(&candidate.metadata.signals),
                    personalization_points: personalization_points(identity),
                },
            ));
        }

        if priority == Priority::High {
            actions.push(ActionDescriptor::new(
                ActionKind::EvidencePacket,
                ActionData::EvidencePacket {
                    candidate_id: candidate.candidate_id.clone(),
                    extraordinary_index: score,
                    supporting_documents: supporting_documents(&candidate.source_types()),
                },
            ));
        }

        ActionPlan {
            candidate_id: candidate.candidate_id.clone(),
            actions,
            priority,
            estimated_effort,
            expected_outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ExtraordinaryIndex;
    use serde_json::json;

    fn candidate(score: f64, fields: serde_json::Value) -> ProcessedCandidate {
        let mut candidate = ProcessedCandidate::empty("candidate_jane");
        if let serde_json::Value::Object(map) = fields {
            candidate.resolved_identity = map.into();
        }
        candidate.extraordinary_index = ExtraordinaryIndex {
            overall_score: score,
            ..ExtraordinaryIndex::default()
        };
        candidate
    }

    #[test]
    fn tiers_at_the_boundaries() {
        assert_eq!(tier(0.8).0, Priority::High);
        assert_eq!(tier(0.7999).0, Priority::Medium);
        assert_eq!(tier(0.6).0, Priority::Medium);
        assert_eq!(tier(0.59).0, Priority::Low);
        assert_eq!(tier(0.82), (Priority::High, Effort::Significant, Outcome::Exceptional));
    }

    #[test]
    fn high_score_emits_every_action() {
        let plan = ActionPlanner::new().plan(&candidate(0.82, json!({"email": "jane@x.io", "name": "Jane"})));
        assert_eq!(plan.priority, Priority::High);
        let kinds: Vec<ActionKind> = plan.actions.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::CrmUpsert, ActionKind::OutreachDraft, ActionKind::EvidencePacket]
        );
    }

    #[test]
    fn crm_upsert_needs_an_email() {
        let plan = ActionPlanner::new().plan(&candidate(0.65, json!({"name": "Jane"})));
        assert_eq!(plan.priority, Priority::Medium);
        assert!(!plan.has(ActionKind::CrmUpsert));
        assert!(plan.has(ActionKind::OutreachDraft));
        assert!(!plan.has(ActionKind::EvidencePacket));

        let low = ActionPlanner::new().plan(&candidate(0.1, json!({})));
        assert!(low.actions.is_empty());
        assert_eq!(low.estimated_effort, Effort::Minimal);
    }

    #[test]
    fn outreach_is_never_blocked_by_missing_personalization() {
        let plan = ActionPlanner::new().plan(&candidate(0.7, json!({})));
        match &plan.actions[0].data {
            ActionData::OutreachDraft {
                personalization_points,
                ..
            } => assert!(personalization_points.is_empty()),
            other => panic!("expected outreach draft, got {:?}", other),
        }
    }

    #[test]
    fn personalization_and_achievements() {
        let identity: ResolvedIdentity = match json!({
            "skills": ["rust", "ai", "go", "zig"],
            "company": "IBM",
            "location": "Zurich"
        }) {
            serde_json::Value::Object(map) => map.into(),
            _ => unreachable!(),
        };
        assert_eq!(
            personalization_points(&identity),
            vec!["Expertise in rust, ai, go", "Experience at IBM", "Based in Zurich"]
        );

        let signals = IndexSignals {
            stars: 250.0,
            patents: 52.0,
            citations: 10.0,
            ..IndexSignals::default()
        };
        assert_eq!(
            key_achievements(&signals),
            vec!["GitHub repositories with 250 total stars", "52 patents filed"]
        );
    }

    #[test]
    fn documents_follow_source_types() {
        assert_eq!(
            supporting_documents(&[SourceType::Uspto, SourceType::Github, SourceType::Twitter]),
            vec!["GitHub profile and repositories", "Patent filings and intellectual property"]
        );
    }

    #[test]
    fn plan_serializes_wire_shape() {
        let plan = ActionPlanner::new().plan(&candidate(0.9, json!({"email": "jane@x.io"})));
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["priority"], "high");
        assert_eq!(json["actions"][0]["type"], "crm_upsert");
        assert_eq!(json["actions"][0]["data"]["email"], "jane@x.io");
        assert_eq!(json["actions"][2]["data"]["candidate_id"], "candidate_jane");
    }
}
