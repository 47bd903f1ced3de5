// src/scoring/config.rs

use super::age::AgeBand;
use crate::domain::{Energy, Shedding};
use serde::{Deserialize, Serialize};

/// Default breed tokens: breed text containing any of these earns the bonus.
pub const TARGET_BREED_TOKENS: &[&str] = &["doodle", "poodle", "poo"];

/// Point values for every scoring rule.
///
/// Global per user. A settings file may give any subset of these; the rest
/// keep their defaults, and unknown names are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub weight_threshold_lbs: u32,
    pub weight_bonus: i32,

    pub age_yearling: i32,   // 0.75-1 yrs
    pub age_sweet_spot: i32, // 1-2 yrs
    pub age_young: i32,      // 2-3 yrs
    pub age_prime: i32,      // 3-4 yrs
    pub age_mature: i32,     // 4-5 yrs
    pub age_older: i32,      // 5-6 yrs
    pub age_senior: i32,     // 6+ yrs

    pub shedding_none: i32,
    pub shedding_low: i32,
    pub shedding_high: i32,
    /// Also used when shedding was never scraped.
    pub shedding_unknown: i32,

    pub energy_low_medium: i32,
    pub energy_unknown: i32,

    pub good_with_dogs: i32,
    pub good_with_kids: i32,
    pub good_with_cats: i32,

    pub breed_bonus: i32,
    /// Matched case-insensitively anywhere in the breed text.
    pub breed_tokens: Vec<String>,

    pub special_needs_penalty: i32,
    pub pending_penalty: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_threshold_lbs: 40,
            weight_bonus: 2,

            age_yearling: 1,
            age_sweet_spot: 2,
            age_young: 1,
            age_prime: 0,
            age_mature: -1,
            age_older: -2,
            age_senior: -4,

            shedding_none: 2,
            shedding_low: 1,
            shedding_high: -1,
            shedding_unknown: 1,

            energy_low_medium: 2,
            energy_unknown: 1,

            good_with_dogs: 2,
            good_with_kids: 1,
            good_with_cats: 1,

            breed_bonus: 1,
            breed_tokens: TARGET_BREED_TOKENS.iter().map(|t| t.to_string()).collect(),

            special_needs_penalty: -1,
            pending_penalty: -8,
        }
    }
}

impl ScoringConfig {
    pub fn age_points(&self, band: AgeBand) -> i32 {
        match band {
            AgeBand::TooYoung => 0,
            AgeBand::Yearling => self.age_yearling,
            AgeBand::SweetSpot => self.age_sweet_spot,
            AgeBand::Young => self.age_young,
            AgeBand::Prime => self.age_prime,
            AgeBand::Mature => self.age_mature,
            AgeBand::Older => self.age_older,
            AgeBand::Senior => self.age_senior,
        }
    }

    pub fn shedding_points(&self, shedding: Shedding) -> i32 {
        match shedding {
            Shedding::None => self.shedding_none,
            Shedding::Low => self.shedding_low,
            Shedding::Moderate => 0,
            Shedding::High => self.shedding_high,
            Shedding::Unknown => self.shedding_unknown,
        }
    }

    pub fn energy_points(&self, energy: Energy) -> i32 {
        match energy {
            Energy::Low | Energy::Medium => self.energy_low_medium,
            Energy::High => 0,
            Energy::Unknown => self.energy_unknown,
        }
    }
}
