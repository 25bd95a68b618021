//! Candidate-scoped claim arena

use serde::{Deserialize, Serialize};

use super::types::{Claim, ClaimId};

/// Owns every claim of one candidate's resolution run.
///
/// Contradictions point at other entries by [`ClaimId`], so disagreeing
/// claims are stored once and never copied into each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimTable {
    claims: Vec<Claim>,
}

impl ClaimTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a claim, assigning its id
    pub fn insert(&mut self, mut claim: Claim) -> ClaimId {
        let id = ClaimId(self.claims.len());
        claim.id = id;
        self.claims.push(claim);
        id
    }

    pub fn get(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: ClaimId) -> Option<&mut Claim> {
        self.claims.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Resolve a list of ids, skipping any that are not in this table
    pub fn resolve<'a>(&'a self, ids: &'a [ClaimId]) -> impl Iterator<Item = &'a Claim> + 'a {
        ids.iter().filter_map(move |id| self.get(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{ClaimValue, FactType};

    fn claim(person: &str) -> Claim {
        Claim {
            id: ClaimId(999),
            person: person.to_string(),
            fact_text: String::new(),
            fact_type: FactType::Name,
            value: ClaimValue::Text(person.to_string()),
            sources: Vec::new(),
            supporting_snippets: Vec::new(),
            confidence_score: 0.0,
            contradictions: Vec::new(),
            temporal_context: None,
            human_review_needed: false,
            notes: Vec::new(),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut table = ClaimTable::new();
        let a = table.insert(claim("a"));
        let b = table.insert(claim("b"));
        assert_eq!(a, ClaimId(0));
        assert_eq!(b, ClaimId(1));
        assert_eq!(table.get(b).map(|c| c.id), Some(ClaimId(1)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn resolve_skips_unknown_ids() {
        let mut table = ClaimTable::new();
        let a = table.insert(claim("a"));
        let ids = [a, ClaimId(42)];
        let found: Vec<_> = table.resolve(&ids).map(|c| c.person.as_str()).collect();
        assert_eq!(found, vec!["a"]);
    }
}
