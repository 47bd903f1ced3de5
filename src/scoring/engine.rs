// src/scoring/engine.rs

use super::age::{parse_age, AgeBand, AgeYears};
use super::config::ScoringConfig;
use crate::domain::{Compatibility, DogRecord, DogStatus, Energy, Shedding, UserOverrides};
use serde::Serialize;
use std::fmt;

/// One scoring rule, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    Weight,
    Age,
    Shedding,
    Energy,
    GoodWithDogs,
    GoodWithKids,
    GoodWithCats,
    Breed,
    SpecialNeeds,
    Pending,
    Manual,
}

impl ScoreRule {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreRule::Weight => "Weight",
            ScoreRule::Age => "Age",
            ScoreRule::Shedding => "Shedding",
            ScoreRule::Energy => "Energy",
            ScoreRule::GoodWithDogs => "Good with dogs",
            ScoreRule::GoodWithKids => "Good with kids",
            ScoreRule::GoodWithCats => "Good with cats",
            ScoreRule::Breed => "Breed",
            ScoreRule::SpecialNeeds => "Special needs",
            ScoreRule::Pending => "Pending",
            ScoreRule::Manual => "Manual adjustment",
        }
    }
}

/// A single rule's contribution to a fit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreTerm {
    pub rule: ScoreRule,
    pub points: i32,
}

impl fmt::Display for ScoreTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:+}", self.rule.label(), self.points)
    }
}

/// Picks the override when one is set, else the scraped value.
/// Every rule resolves its input through here.
fn prefer<T>(over: Option<T>, scraped: T) -> T {
    over.unwrap_or(scraped)
}

/// Attribute values after applying user overrides.
#[derive(Debug, Clone, PartialEq)]
struct Effective {
    weight_lbs: Option<f64>,
    age: Option<AgeYears>,
    shedding: Shedding,
    energy: Energy,
    good_with_dogs: Compatibility,
    good_with_kids: Compatibility,
    good_with_cats: Compatibility,
    breed: Option<String>,
    special_needs: bool,
    status: DogStatus,
    manual_adjustment: i32,
}

impl Effective {
    fn resolve(dog: &DogRecord, overrides: Option<&UserOverrides>) -> Self {
        let o = overrides;
        Self {
            weight_lbs: prefer(o.and_then(|o| o.weight_lbs).map(Some), dog.weight_lbs()),
            // An override that is not a real age degrades to unknown.
            age: prefer(
                o.and_then(|o| o.age_years).map(AgeYears::from_years),
                dog.age_text.as_deref().and_then(parse_age),
            ),
            shedding: prefer(o.and_then(|o| o.shedding), dog.shedding),
            energy: prefer(o.and_then(|o| o.energy), dog.energy),
            good_with_dogs: prefer(o.and_then(|o| o.good_with_dogs), dog.good_with_dogs),
            good_with_kids: prefer(o.and_then(|o| o.good_with_kids), dog.good_with_kids),
            good_with_cats: prefer(o.and_then(|o| o.good_with_cats), dog.good_with_cats),
            breed: prefer(o.and_then(|o| o.breed.clone()).map(Some), dog.breed.clone()),
            special_needs: prefer(o.and_then(|o| o.special_needs), dog.special_needs),
            status: dog.status,
            manual_adjustment: o.map(|o| o.manual_adjustment).unwrap_or(0),
        }
    }
}

fn weight_points(weight_lbs: Option<f64>, config: &ScoringConfig) -> i32 {
    match weight_lbs {
        Some(w) if w >= f64::from(config.weight_threshold_lbs) => config.weight_bonus,
        _ => 0,
    }
}

/// Ranges score their better endpoint: "1-6 yrs" still covers the sweet spot.
fn age_points(age: Option<AgeYears>, config: &ScoringConfig) -> i32 {
    match age {
        None => 0,
        Some(age) => {
            let (lo, hi) = age.endpoints();
            config
                .age_points(AgeBand::of(lo))
                .max(config.age_points(AgeBand::of(hi)))
        }
    }
}

fn breed_points(breed: Option<&str>, config: &ScoringConfig) -> i32 {
    let breed = breed.unwrap_or_default().to_lowercase();
    let hit = config
        .breed_tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .any(|t| !t.is_empty() && breed.contains(&t));
    if hit {
        config.breed_bonus
    } else {
        0
    }
}

fn flag_points(set: bool, points: i32) -> i32 {
    if set {
        points
    } else {
        0
    }
}

/// Every rule's contribution, in evaluation order. Zero terms are omitted.
pub fn score_breakdown(
    dog: &DogRecord,
    overrides: Option<&UserOverrides>,
    config: &ScoringConfig,
) -> Vec<ScoreTerm> {
    let eff = Effective::resolve(dog, overrides);

    let terms = [
        (ScoreRule::Weight, weight_points(eff.weight_lbs, config)),
        (ScoreRule::Age, age_points(eff.age, config)),
        (ScoreRule::Shedding, config.shedding_points(eff.shedding)),
        (ScoreRule::Energy, config.energy_points(eff.energy)),
        (ScoreRule::GoodWithDogs, flag_points(eff.good_with_dogs.is_yes(), config.good_with_dogs)),
        (ScoreRule::GoodWithKids, flag_points(eff.good_with_kids.is_yes(), config.good_with_kids)),
        (ScoreRule::GoodWithCats, flag_points(eff.good_with_cats.is_yes(), config.good_with_cats)),
        (ScoreRule::Breed, breed_points(eff.breed.as_deref(), config)),
        (ScoreRule::SpecialNeeds, flag_points(eff.special_needs, config.special_needs_penalty)),
        (ScoreRule::Pending, flag_points(eff.status == DogStatus::Pending, config.pending_penalty)),
        (ScoreRule::Manual, eff.manual_adjustment),
    ];

    terms
        .into_iter()
        .filter(|(_, points)| *points != 0)
        .map(|(rule, points)| ScoreTerm { rule, points })
        .collect()
}

/// The fit score: sum of all rule terms, floored at zero.
///
/// Pure and total: bad or missing data scores as neutral, never errors.
pub fn score(dog: &DogRecord, overrides: Option<&UserOverrides>, config: &ScoringConfig) -> i32 {
    score_breakdown(dog, overrides, config)
        .iter()
        .fold(0i32, |acc, t| acc.saturating_add(t.points))
        .max(0)
}

pub fn is_good_fit(score: i32, min_score: i32) -> bool {
    score >= min_score
}

/// Watch-list names match case-insensitively, ignoring surrounding whitespace.
pub fn on_watch_list(name: &str, watch_list: &[String]) -> bool {
    let name = name.trim();
    watch_list.iter().any(|w| w.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goldendoodle() -> DogRecord {
        DogRecord {
            status: DogStatus::Available,
            weight: Some("45".into()),
            age_text: Some("1.5 yrs".into()),
            breed: Some("Goldendoodle".into()),
            shedding: Shedding::None,
            energy: Energy::Low,
            good_with_dogs: Compatibility::Yes,
            ..DogRecord::new("RescueA", "Biscuit")
        }
    }

    #[test]
    fn reference_dog_scores_eleven() {
        let cfg = ScoringConfig::default();
        assert_eq!(score(&goldendoodle(), None, &cfg), 11);

        let rules: Vec<_> = score_breakdown(&goldendoodle(), None, &cfg)
            .into_iter()
            .map(|t| t.rule)
            .collect();
        assert_eq!(
            rules,
            vec![
                ScoreRule::Weight,
                ScoreRule::Age,
                ScoreRule::Shedding,
                ScoreRule::Energy,
                ScoreRule::GoodWithDogs,
                ScoreRule::Breed,
            ]
        );
    }

    #[test]
    fn pending_costs_the_penalty() {
        let cfg = ScoringConfig::default();
        let pending = DogRecord {
            status: DogStatus::Pending,
            ..goldendoodle()
        };
        assert_eq!(score(&pending, None, &cfg), 11 - 8);
    }

    #[test]
    fn missing_everything_is_optimistic_not_zero() {
        let cfg = ScoringConfig::default();
        let bare = DogRecord::new("RescueA", "Mystery");
        // shedding unknown +1, energy unknown +1
        assert_eq!(score(&bare, None, &cfg), 2);
    }

    #[test]
    fn score_never_goes_negative() {
        let cfg = ScoringConfig::default();
        let rough = DogRecord {
            status: DogStatus::Pending,
            age_text: Some("11 years".into()),
            shedding: Shedding::High,
            energy: Energy::High,
            special_needs: true,
            ..DogRecord::new("RescueA", "Grizzle")
        };
        assert_eq!(score(&rough, None, &cfg), 0);

        let tanked = UserOverrides {
            manual_adjustment: i32::MIN,
            ..Default::default()
        };
        assert_eq!(score(&goldendoodle(), Some(&tanked), &cfg), 0);
    }

    #[test]
    fn range_ages_take_the_better_end() {
        let cfg = ScoringConfig::default();
        let at = |age: &str| DogRecord {
            age_text: Some(age.into()),
            ..DogRecord::new("RescueA", "Ranger")
        };
        let range = score(&at("1-6 years"), None, &cfg);
        let one = score(&at("1 year"), None, &cfg);
        let six = score(&at("6 years"), None, &cfg);
        assert_eq!(range, one.max(six));
    }

    #[test]
    fn overrides_shadow_scraped_values() {
        let cfg = ScoringConfig::default();
        let ov = UserOverrides {
            weight_lbs: Some(30.0),
            shedding: Some(Shedding::High),
            ..Default::default()
        };

        let base = score(&goldendoodle(), Some(&ov), &cfg);

        // Scraped changes to overridden fields don't move the score...
        let heavier = DogRecord {
            weight: Some("80".into()),
            shedding: Shedding::None,
            ..goldendoodle()
        };
        assert_eq!(score(&heavier, Some(&ov), &cfg), base);

        // ...but changing the override does.
        let ov2 = UserOverrides {
            weight_lbs: Some(50.0),
            ..ov.clone()
        };
        assert_eq!(score(&goldendoodle(), Some(&ov2), &cfg), base + cfg.weight_bonus);
    }

    #[test]
    fn age_override_beats_age_text() {
        let cfg = ScoringConfig::default();
        let ov = UserOverrides {
            age_years: Some(9.0),
            ..Default::default()
        };
        let with = score(&goldendoodle(), Some(&ov), &cfg);
        assert_eq!(with, 11 - cfg.age_sweet_spot + cfg.age_senior);
    }

    #[test]
    fn compatibility_no_is_never_negative() {
        let cfg = ScoringConfig::default();
        let no = DogRecord {
            good_with_dogs: Compatibility::No,
            good_with_kids: Compatibility::No,
            good_with_cats: Compatibility::No,
            ..DogRecord::new("RescueA", "Solo")
        };
        let unknown = DogRecord::new("RescueA", "Solo");
        assert_eq!(score(&no, None, &cfg), score(&unknown, None, &cfg));
    }

    #[test]
    fn breed_match_is_case_insensitive() {
        let cfg = ScoringConfig::default();
        assert_eq!(breed_points(Some("Standard POODLE mix"), &cfg), cfg.breed_bonus);
        assert_eq!(breed_points(Some("Cockapoo"), &cfg), cfg.breed_bonus);
        assert_eq!(breed_points(Some("Labrador"), &cfg), 0);
        assert_eq!(breed_points(None, &cfg), 0);
    }

    #[test]
    fn breed_bonus_follows_configured_tokens() {
        let cfg: ScoringConfig =
            serde_json::from_str(r#"{ "breed_tokens": ["Bichon"], "breed_bonus": 3 }"#).unwrap();
        assert_eq!(breed_points(Some("bichon frise"), &cfg), 3);
        assert_eq!(breed_points(Some("Goldendoodle"), &cfg), 0);

        let none = ScoringConfig {
            breed_tokens: Vec::new(),
            ..ScoringConfig::default()
        };
        assert_eq!(breed_points(Some("Goldendoodle"), &none), 0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let cfg = ScoringConfig::default();
        let dog = goldendoodle();
        assert_eq!(score(&dog, None, &cfg), score(&dog, None, &cfg));
    }

    #[test]
    fn watch_list_and_good_fit() {
        let list = vec!["Freddy Faz".to_string(), "Zira".to_string()];
        assert!(on_watch_list(" freddy faz", &list));
        assert!(!on_watch_list("Fred", &list));
        assert!(is_good_fit(5, 5));
        assert!(!is_good_fit(4, 5));
    }
}
