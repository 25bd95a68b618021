//! Fact-key grouping
//!
//! Partitions a candidate's claims into equivalence classes. Grouping is
//! exact key equality, so no tie-breaking is involved; groups come back
//! sorted by key for deterministic downstream processing.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::claim::{ClaimId, ClaimTable};
use crate::normalize::{fact_key, FactKey};

/// Claims sharing one fact key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimGroup {
    pub key: FactKey,
    pub members: Vec<ClaimId>,
}

impl ClaimGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Group every claim in the table by fact key
pub fn group_by_fact_key(table: &ClaimTable) -> Vec<ClaimGroup> {
    let mut map: AHashMap<FactKey, Vec<ClaimId>> = AHashMap::with_capacity(table.len());

    for claim in table.iter() {
        map.entry(fact_key(claim)).or_default().push(claim.id);
    }

    let mut groups: Vec<ClaimGroup> = map
        .into_iter()
        .map(|(key, members)| ClaimGroup { key, members })
        .collect();
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups
}
