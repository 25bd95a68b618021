//! Extraordinary Index: five weighted talent dimensions
//!
//! | dimension | driven by |
//! |---|---|
//! | innovation | patents, papers, repository stars, emerging skills |
//! | adoption | followers, big-employer bonus, social reach |
//! | influence | citations, stars, awards |
//! | velocity | recently updated repositories, experience entries |
//! | selectivity | profile completeness, absence of contradictions |

mod calculator;

pub use calculator::{
    is_emerging_skill, ExtraordinaryIndex, IndexCalculator, IndexSignals, BIG_EMPLOYERS,
    EMERGING_SKILLS, REQUIRED_FIELDS,
};
