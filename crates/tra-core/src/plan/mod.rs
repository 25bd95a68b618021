//! Action planning from the overall index score
//!
//! | overall score | priority | actions |
//! |---|---|---|
//! | >= 0.8 | high | crm_upsert (with email), outreach_draft, evidence_packet |
//! | >= 0.6 | medium | crm_upsert (with email), outreach_draft |
//! | < 0.6 | low | crm_upsert (with email) |

mod planner;

pub use planner::{
    ActionData, ActionDescriptor, ActionKind, ActionPlan, ActionPlanner, Effort, Outcome,
    Priority, HIGH_PRIORITY_THRESHOLD, MEDIUM_PRIORITY_THRESHOLD,
};
