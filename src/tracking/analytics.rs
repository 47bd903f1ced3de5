// src/tracking/analytics.rs
//
// Read-only statistics over stored events and latest snapshots.

use crate::domain::{DogRecord, DogStatus};
use crate::events::{ChangeEvent, EventKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How far a similar dog's fit score may be from the target's.
const SIMILAR_SCORE_RANGE: i32 = 2;

/// Time one dog spent in `from` before moving to `to`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSpan {
    pub dog_id: String,
    pub from: DogStatus,
    pub to: DogStatus,
    pub days: f64,
    pub ended_at: DateTime<Utc>,
}

/// Replays each dog's first-seen and status-change events, oldest first.
/// A dog's earliest event only starts its clock.
pub fn status_spans(events: &[ChangeEvent]) -> Vec<StatusSpan> {
    let mut by_dog: BTreeMap<&str, Vec<&ChangeEvent>> = BTreeMap::new();
    for event in events {
        if matches!(event.kind, EventKind::FirstSeen | EventKind::StatusChange) {
            by_dog.entry(&event.dog_id).or_default().push(event);
        }
    }

    let mut spans = Vec::new();
    for (dog_id, mut history) in by_dog {
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let mut current: Option<(DogStatus, DateTime<Utc>)> = None;
        for event in history {
            let status = DogStatus::parse(event.new_value.as_deref().unwrap_or_default());
            if let (EventKind::StatusChange, Some((from, since))) = (event.kind, current) {
                spans.push(StatusSpan {
                    dog_id: dog_id.to_string(),
                    from,
                    to: status,
                    days: days_between(since, event.timestamp),
                    ended_at: event.timestamp,
                });
            }
            current = Some((status, event.timestamp));
        }
    }
    spans
}

fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 86_400.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Fit score ranges used to group adoption speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ScoreBucket {
    High,
    Medium,
    Low,
}

impl ScoreBucket {
    /// A dog that was never scored counts as Low.
    pub fn of(fit_score: Option<i32>) -> Self {
        match fit_score {
            Some(s) if s >= 7 => ScoreBucket::High,
            Some(s) if s >= 5 => ScoreBucket::Medium,
            _ => ScoreBucket::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBucket::High => "High (7+)",
            ScoreBucket::Medium => "Medium (5-6)",
            ScoreBucket::Low => "Low (<5)",
        }
    }
}

impl fmt::Display for ScoreBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub avg_days: f64,
    pub count: usize,
}

/// How long dogs stay listed before an application lands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdoptionStats {
    pub avg_days_to_pending: Option<f64>,
    pub by_rescue: BTreeMap<String, f64>,
    pub by_fit_score: BTreeMap<ScoreBucket, BucketStats>,
}

/// Averages the span before every move into Pending, overall and grouped by
/// the dog's rescue and current fit score bucket. Spans of dogs with no
/// stored record are counted overall only.
pub fn adoption_stats(records: &[DogRecord], events: &[ChangeEvent]) -> AdoptionStats {
    let by_id: BTreeMap<&str, &DogRecord> = records.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut all = Vec::new();
    let mut rescue_days: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut bucket_days: BTreeMap<ScoreBucket, Vec<f64>> = BTreeMap::new();

    for span in status_spans(events).into_iter().filter(|s| s.to == DogStatus::Pending) {
        all.push(span.days);
        if let Some(dog) = by_id.get(span.dog_id.as_str()) {
            rescue_days.entry(dog.source.clone()).or_default().push(span.days);
            bucket_days.entry(ScoreBucket::of(dog.fit_score)).or_default().push(span.days);
        }
    }

    AdoptionStats {
        avg_days_to_pending: mean(&all),
        by_rescue: rescue_days
            .into_iter()
            .filter_map(|(rescue, days)| mean(&days).map(|avg| (rescue, avg)))
            .collect(),
        by_fit_score: bucket_days
            .into_iter()
            .filter_map(|(bucket, days)| {
                mean(&days).map(|avg_days| (bucket, BucketStats { avg_days, count: days.len() }))
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    fn from_samples(n: usize) -> Self {
        match n {
            n if n >= 10 => Confidence::High,
            n if n >= 5 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Rounded to a tenth of a day; `None` without history to go on.
    pub predicted_days: Option<f64>,
    pub confidence: Confidence,
    pub similar: usize,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicted_days {
            Some(days) => write!(
                f,
                "~{days} days ({} confidence, based on {} similar dogs)",
                self.confidence.as_str(),
                self.similar
            ),
            None => f.write_str("Not enough historical data"),
        }
    }
}

/// Estimates how long `dog` will stay listed from dogs of the same rescue
/// whose fit score is within two points. Every span that ended in Pending
/// or Removed is one sample. An unscored target is treated as 0; unscored
/// candidates never match.
pub fn predict_time_to_adoption(dog: &DogRecord, records: &[DogRecord], events: &[ChangeEvent]) -> Prediction {
    let target = dog.fit_score.unwrap_or(0);
    let similar_ids: BTreeSet<&str> = records
        .iter()
        .filter(|r| r.source == dog.source)
        .filter(|r| r.fit_score.is_some_and(|s| (s - target).abs() <= SIMILAR_SCORE_RANGE))
        .map(|r| r.id.as_str())
        .collect();

    let samples: Vec<f64> = status_spans(events)
        .into_iter()
        .filter(|s| matches!(s.to, DogStatus::Pending | DogStatus::Removed))
        .filter(|s| similar_ids.contains(s.dog_id.as_str()))
        .map(|s| s.days)
        .collect();

    Prediction {
        predicted_days: mean(&samples).map(round1),
        confidence: Confidence::from_samples(samples.len()),
        similar: samples.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionStats {
    pub avg_days: f64,
    pub min_days: f64,
    pub max_days: f64,
    pub count: usize,
}

/// Per "From -> To" transition: how long the From status lasted.
pub fn transition_stats(events: &[ChangeEvent]) -> BTreeMap<String, TransitionStats> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for span in status_spans(events) {
        grouped
            .entry(format!("{} -> {}", span.from.as_str(), span.to.as_str()))
            .or_default()
            .push(span.days);
    }

    grouped
        .into_iter()
        .filter_map(|(key, days)| {
            let avg = mean(&days)?;
            let min = days.iter().copied().fold(f64::INFINITY, f64::min);
            let max = days.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some((
                key,
                TransitionStats {
                    avg_days: round1(avg),
                    min_days: round1(min),
                    max_days: round1(max),
                    count: days.len(),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{first_seen, status_change};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 6, 0, 0).unwrap()
    }

    fn dog(source: &str, name: &str, fit: Option<i32>) -> DogRecord {
        DogRecord {
            fit_score: fit,
            status: DogStatus::Available,
            ..DogRecord::new(source, name)
        }
    }

    /// First seen Available at `start`, Pending `days` later.
    fn went_pending(dog: &DogRecord, start: DateTime<Utc>, days: i64) -> Vec<ChangeEvent> {
        vec![
            first_seen(&dog.id, &dog.name, &dog.source, DogStatus::Available, dog.fit_score, start),
            status_change(
                &dog.id,
                &dog.name,
                &dog.source,
                DogStatus::Available,
                DogStatus::Pending,
                start + Duration::days(days),
            ),
        ]
    }

    #[test]
    fn spans_follow_each_dogs_history() {
        let rex = dog("RescueA", "Rex", Some(8));
        let mut events = went_pending(&rex, t0(), 4);
        events.push(status_change(
            &rex.id,
            "Rex",
            "RescueA",
            DogStatus::Pending,
            DogStatus::Removed,
            t0() + Duration::days(10),
        ));

        let spans = status_spans(&events);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].from, spans[0].to, spans[0].days), (DogStatus::Available, DogStatus::Pending, 4.0));
        assert_eq!((spans[1].from, spans[1].to, spans[1].days), (DogStatus::Pending, DogStatus::Removed, 6.0));
    }

    #[test]
    fn status_change_without_first_seen_has_no_span() {
        let rex = dog("RescueA", "Rex", None);
        let events = vec![status_change(&rex.id, "Rex", "RescueA", DogStatus::Available, DogStatus::Pending, t0())];
        assert!(status_spans(&events).is_empty());
    }

    #[test]
    fn stats_group_by_rescue_and_score() {
        let rex = dog("RescueA", "Rex", Some(8));
        let zira = dog("RescueA", "Zira", Some(5));
        let bo = dog("RescueB", "Bo", None);
        let records = vec![rex.clone(), zira.clone(), bo.clone()];

        let mut events = went_pending(&rex, t0(), 2);
        events.extend(went_pending(&zira, t0(), 4));
        events.extend(went_pending(&bo, t0(), 9));

        let stats = adoption_stats(&records, &events);
        assert_eq!(stats.avg_days_to_pending, Some(5.0));
        assert_eq!(stats.by_rescue["RescueA"], 3.0);
        assert_eq!(stats.by_rescue["RescueB"], 9.0);
        assert_eq!(stats.by_fit_score[&ScoreBucket::High], BucketStats { avg_days: 2.0, count: 1 });
        assert_eq!(stats.by_fit_score[&ScoreBucket::Medium], BucketStats { avg_days: 4.0, count: 1 });
        assert_eq!(stats.by_fit_score[&ScoreBucket::Low], BucketStats { avg_days: 9.0, count: 1 });
    }

    #[test]
    fn no_history_means_empty_stats() {
        let stats = adoption_stats(&[], &[]);
        assert_eq!(stats, AdoptionStats::default());
    }

    #[test]
    fn prediction_uses_similar_dogs_of_the_same_rescue() {
        let target = dog("RescueA", "Target", Some(7));
        let close = dog("RescueA", "Close", Some(9));
        let far = dog("RescueA", "Far", Some(3));
        let elsewhere = dog("RescueB", "Elsewhere", Some(7));
        let records = vec![target.clone(), close.clone(), far.clone(), elsewhere.clone()];

        let mut events = went_pending(&close, t0(), 3);
        events.push(status_change(
            &close.id,
            "Close",
            "RescueA",
            DogStatus::Pending,
            DogStatus::Removed,
            t0() + Duration::hours(3 * 24 + 28),
        ));
        events.extend(went_pending(&far, t0(), 30));
        events.extend(went_pending(&elsewhere, t0(), 30));

        let prediction = predict_time_to_adoption(&target, &records, &events);
        assert_eq!(prediction.similar, 2);
        // 3 days and 28 hours average to 2.0833...
        assert_eq!(prediction.predicted_days, Some(2.1));
        assert_eq!(prediction.confidence, Confidence::Low);
    }

    #[test]
    fn prediction_without_data() {
        let target = dog("RescueA", "Target", None);
        let prediction = predict_time_to_adoption(&target, &[target.clone()], &[]);
        assert_eq!(prediction.predicted_days, None);
        assert_eq!(prediction.confidence, Confidence::Low);
        assert_eq!(prediction.similar, 0);
        assert_eq!(prediction.to_string(), "Not enough historical data");
    }

    #[test]
    fn confidence_grows_with_samples() {
        assert_eq!(Confidence::from_samples(4), Confidence::Low);
        assert_eq!(Confidence::from_samples(5), Confidence::Medium);
        assert_eq!(Confidence::from_samples(10), Confidence::High);
    }

    #[test]
    fn transitions_report_spread() {
        let rex = dog("RescueA", "Rex", Some(8));
        let zira = dog("RescueA", "Zira", Some(8));
        let mut events = went_pending(&rex, t0(), 2);
        events.extend(went_pending(&zira, t0(), 6));

        let stats = transition_stats(&events);
        let pending = &stats["Available -> Pending"];
        assert_eq!(pending.count, 2);
        assert_eq!(pending.avg_days, 4.0);
        assert_eq!(pending.min_days, 2.0);
        assert_eq!(pending.max_days, 6.0);
    }
}
