pub mod age;
pub mod config;
pub mod engine;

pub use age::{parse_age, AgeBand, AgeYears};
pub use config::ScoringConfig;
pub use engine::{is_good_fit, on_watch_list, score, score_breakdown, ScoreRule, ScoreTerm};
