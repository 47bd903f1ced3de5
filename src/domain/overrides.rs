// src/domain/overrides.rs

use super::dog::{Compatibility, Energy, Shedding};
use serde::{Deserialize, Serialize};

/// User corrections to scraped dog data.
///
/// Sparse: every unset field falls through to the scraped value. Never
/// produced by scraping; lives in the settings file, not in dog history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserOverrides {
    pub shedding: Option<Shedding>,
    pub energy: Option<Energy>,
    pub good_with_dogs: Option<Compatibility>,
    pub good_with_kids: Option<Compatibility>,
    pub good_with_cats: Option<Compatibility>,
    pub weight_lbs: Option<f64>,
    pub age_years: Option<f64>,
    pub special_needs: Option<bool>,
    pub breed: Option<String>,
    /// Signed points added after every rule, unclamped.
    pub manual_adjustment: i32,
}

impl UserOverrides {
    pub fn has_overrides(&self) -> bool {
        *self != UserOverrides::default()
    }
}
