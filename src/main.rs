use chrono::{DateTime, SubsecRound, Utc};
use clap::{Parser, Subcommand};
use rescue_tracker::db::{init_db, Database, SqliteStore};
use rescue_tracker::domain::dog_id;
use rescue_tracker::events::{timeline, EventKind};
use rescue_tracker::scoring::{is_good_fit, on_watch_list, score_breakdown, score};
use rescue_tracker::tracking::{
    adoption_stats, parse_batches, parse_dogs, predict_time_to_adoption, transition_stats, DogStore, Tracker,
};
use rescue_tracker::{Result, Settings, TrackerError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "rescue_tracker")]
#[command(about = "Scores adoptable dogs and tracks how their listings change")]
#[command(version)]
struct Args {
    /// Settings file (JSON); missing means defaults
    #[arg(short, long, default_value = "rescue_tracker.json", env = "RESCUE_TRACKER_SETTINGS")]
    settings: PathBuf,

    /// SQLite database path, overrides the settings file
    #[arg(long, env = "RESCUE_TRACKER_DB")]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one scrape file: a JSON list of {source, dogs} batches
    Ingest { file: PathBuf },
    /// Show recent events, newest first
    Timeline {
        /// Only this dog id (e.g. "doodle_rock_rescue:rex")
        #[arg(long)]
        dog: Option<String>,
        /// first_seen, status_change or attribute_update
        #[arg(long)]
        kind: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        /// Only events not yet acknowledged
        #[arg(long, conflicts_with_all = ["dog", "since"])]
        unseen: bool,
        /// Only events after this RFC 3339 time
        #[arg(long, conflicts_with = "dog")]
        since: Option<DateTime<Utc>>,
    },
    /// Mark events as seen
    Ack {
        /// Every event not yet acknowledged
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        ids: Vec<String>,
    },
    /// Adoption speed statistics, optionally with a prediction for one dog
    Stats {
        #[arg(long)]
        dog: Option<String>,
    },
    /// Print the fit score breakdown for a JSON list of dogs
    Score { file: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("❌ {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(&args.settings)?;
    if let Some(db) = args.db {
        settings.database_path = db;
    }

    match args.command {
        Command::Ingest { file } => ingest(&settings, &file),
        Command::Timeline {
            dog,
            kind,
            limit,
            unseen,
            since,
        } => show_timeline(&settings, TimelineFilter { dog, kind, limit, unseen, since }),
        Command::Ack { all, ids } => acknowledge(&settings, all, ids),
        Command::Stats { dog } => show_stats(&settings, dog),
        Command::Score { file } => show_scores(&settings, &file),
    }
}

fn ingest(settings: &Settings, file: &Path) -> Result<()> {
    let batches = parse_batches(&fs::read_to_string(file)?)?;
    // Stored timestamps carry microseconds; keep ids reproducible from them.
    let at = Utc::now().trunc_subsecs(6);

    let db = Database::new(settings.database_path.clone());
    init_db(&db)?;

    db.with_conn(|conn| {
        for batch in batches {
            if batch.rejected > 0 {
                warn!("{}: {} unreadable dog entries dropped", batch.source, batch.rejected);
            }
            let tx = conn.transaction()?;
            let summary = {
                let mut store = SqliteStore::new(&tx);
                let mut tracker = Tracker::new(&mut store, settings);
                tracker.process_source(&batch.source, batch.dogs, at)?
            };
            tx.commit()?;

            for dog in summary.good_fits(settings.min_fit_score) {
                println!(
                    "⭐ {} ({}) fit score {}",
                    dog.name,
                    dog.source,
                    dog.fit_score.unwrap_or_default()
                );
            }
            for event in summary.watched(&settings.watch_list) {
                println!("👀 {}: {}", event.dog_name, event.summary);
            }
            info!(
                "{} done: {} events, {} skipped",
                summary.source,
                summary.events.len(),
                summary.skipped
            );
        }
        Ok(())
    })
}

struct TimelineFilter {
    dog: Option<String>,
    kind: Option<String>,
    limit: Option<usize>,
    unseen: bool,
    since: Option<DateTime<Utc>>,
}

fn show_timeline(settings: &Settings, filter: TimelineFilter) -> Result<()> {
    let limit = filter.limit.unwrap_or(settings.timeline_limit);
    let kind = filter
        .kind
        .map(|k| EventKind::parse(&k).ok_or_else(|| TrackerError::Config(format!("unknown event kind '{k}'"))))
        .transpose()?;

    let db = Database::new(settings.database_path.clone());
    init_db(&db)?;

    let events = db.with_conn(|conn| {
        let store = SqliteStore::new(conn);
        let events = if let Some(id) = &filter.dog {
            store.events_for_dog(id)?
        } else if filter.unseen {
            match store.last_check()? {
                Some(at) => println!("Since last check ({}):", at.format("%Y-%m-%d %H:%M")),
                None => println!("Nothing acknowledged yet, showing everything:"),
            }
            store.unseen_events(usize::MAX)?
        } else if let Some(since) = filter.since {
            store.events_since(since, usize::MAX)?
        } else {
            store.recent_events(kind, limit)?
        };
        Ok(events
            .into_iter()
            .filter(|e| kind.map_or(true, |k| e.kind == k))
            .collect::<Vec<_>>())
    })?;

    let items = timeline(&events, limit);
    if items.is_empty() {
        println!("No events yet.");
    }
    for item in items {
        println!("{item}");
    }
    Ok(())
}

fn acknowledge(settings: &Settings, all: bool, ids: Vec<String>) -> Result<()> {
    let db = Database::new(settings.database_path.clone());
    init_db(&db)?;
    let at = Utc::now().trunc_subsecs(6);

    let added = db.with_conn(|conn| {
        let mut store = SqliteStore::new(conn);
        let ids = if all {
            store.unseen_events(usize::MAX)?.into_iter().map(|e| e.id).collect()
        } else {
            ids
        };
        store.acknowledge(&ids, at)
    })?;

    println!("✅ {added} events acknowledged");
    Ok(())
}

fn show_stats(settings: &Settings, dog: Option<String>) -> Result<()> {
    let db = Database::new(settings.database_path.clone());
    init_db(&db)?;

    let (records, events) = db.with_conn(|conn| {
        let store = SqliteStore::new(conn);
        Ok((store.latest_records()?, store.recent_events(None, usize::MAX)?))
    })?;

    let stats = adoption_stats(&records, &events);
    match stats.avg_days_to_pending {
        Some(avg) => println!("Average days to pending: {avg:.1}"),
        None => println!("No dog has gone pending yet."),
    }
    for (rescue, avg) in &stats.by_rescue {
        println!("    {rescue}: {avg:.1} days");
    }
    for (bucket, b) in &stats.by_fit_score {
        println!("    {bucket}: {:.1} days ({} dogs)", b.avg_days, b.count);
    }

    for (transition, t) in transition_stats(&events) {
        println!(
            "{transition}: avg {} days (min {}, max {}, n={})",
            t.avg_days, t.min_days, t.max_days, t.count
        );
    }

    if let Some(id) = dog {
        let target = records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.clone()))?;
        println!("{}: {}", target.name, predict_time_to_adoption(target, &records, &events));
    }
    Ok(())
}

fn show_scores(settings: &Settings, file: &Path) -> Result<()> {
    let dogs = parse_dogs(&fs::read_to_string(file)?)?;

    for mut dog in dogs {
        if dog.id.is_empty() {
            dog.id = dog_id(&dog.source, &dog.name);
        }
        let overrides = settings.overrides_for(&dog.id);
        let total = score(&dog, overrides, &settings.scoring);

        let mut flags = String::new();
        if is_good_fit(total, settings.min_fit_score) {
            flags.push_str(" ⭐");
        }
        if on_watch_list(&dog.name, &settings.watch_list) {
            flags.push_str(" 👀");
        }
        println!("{} ({}): {}{}", dog.name, dog.source, total, flags);
        for term in score_breakdown(&dog, overrides, &settings.scoring) {
            println!("    {term}");
        }
    }
    Ok(())
}
