//! Daily fact publication.

use super::catalog;
use super::rotation::{advance, RotationStore};
use crate::models::{DailyFactPublication, FactRecord, RotationState, CYCLE};
use crate::report::writer::write_json_atomic;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::Path;
use tracing::info;

/// Build the publication record for an already advanced cursor.
pub fn compose(
    state: &RotationState,
    fact: &FactRecord,
    now: DateTime<Utc>,
) -> DailyFactPublication {
    let next_index = (state.current_index + 1) % CYCLE.len();

    DailyFactPublication {
        date: now.date_naive(),
        timestamp: now,
        category: state.current_category,
        fact: fact.fact.to_string(),
        source: fact.source.to_string(),
        rotation_cycle: format!("{}/{}", state.current_index + 1, CYCLE.len()),
        next_category: CYCLE[next_index],
    }
}

/// Advance the rotation, pick a fact and write it to `output`.
///
/// The output file is replaced wholesale.
pub fn publish<R: Rng + ?Sized>(
    store: &dyn RotationStore,
    rng: &mut R,
    output: &Path,
    now: DateTime<Utc>,
) -> Result<DailyFactPublication> {
    let state = advance(store, now)?;

    let fact = catalog::pick(state.current_category, rng)
        .ok_or_else(|| anyhow!("No facts available for {}", state.current_category))?;

    let publication = compose(&state, fact, now);
    write_json_atomic(output, &publication)?;

    info!(
        "Published {} fact for {}: {}",
        publication.category, publication.date, publication.fact
    );
    Ok(publication)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::rotation::tests::MemoryStore;
    use crate::models::Category;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn test_compose_fields() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 6, 0, 0).unwrap();
        let state = RotationState {
            current_index: 2,
            current_category: Category::Tech,
            last_updated: now,
        };
        let fact = catalog::facts_for(Category::Tech)[0];

        let publication = compose(&state, &fact, now);

        assert_eq!(publication.date.to_string(), "2024-03-09");
        assert_eq!(publication.category, Category::Tech);
        assert_eq!(publication.rotation_cycle, "3/3");
        assert_eq!(publication.next_category, Category::Life);
        assert_eq!(publication.fact, fact.fact);
    }

    #[test]
    fn test_publish_writes_file_and_advances() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("daily-fact.json");
        let store = MemoryStore::default();
        let mut rng = StdRng::seed_from_u64(1);

        let first = publish(&store, &mut rng, &output, Utc::now()).unwrap();
        let second = publish(&store, &mut rng, &output, Utc::now()).unwrap();

        assert_eq!(first.category, Category::Life);
        assert_eq!(first.next_category, Category::People);
        assert_eq!(second.category, Category::People);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["category"], "PEOPLE");
        assert_eq!(written["next_category"], "TECH");
        assert_eq!(written["rotation_cycle"], "2/3");
        for key in ["date", "timestamp", "fact", "source"] {
            assert!(written.get(key).is_some(), "missing {}", key);
        }
    }
}
