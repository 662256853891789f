//! Snapshot and restore of engine state through the host `StateStore`.
//!
//! Tests, counters and assignments live in three independent documents so
//! that corruption of one never takes the others down with it. Loading
//! degrades per document to an empty initial state with a warning.

use crate::engine::{AssignmentMap, ExperimentEngine, ResultMap};
use crate::error::Result;
use crate::types::Experiment;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use siteiq_catalogue::StateStore;

pub const EXPERIMENT_SCHEMA_VERSION: u32 = 1;

pub const EXPERIMENTS_KEY: &str = "experiments";
pub const RESULTS_KEY: &str = "experiment_results";
pub const ASSIGNMENTS_KEY: &str = "user_assignments";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedExperiments {
    schema_version: u32,
    experiments: Vec<Experiment>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedResults {
    schema_version: u32,
    results: ResultMap,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedAssignments {
    schema_version: u32,
    assignments: AssignmentMap,
}

/// Write all three documents. Failures here do propagate; a host that cannot
/// persist should know about it.
pub async fn save_state(store: &dyn StateStore, engine: &ExperimentEngine) -> Result<()> {
    let experiments = PersistedExperiments {
        schema_version: EXPERIMENT_SCHEMA_VERSION,
        experiments: engine.experiments().cloned().collect(),
    };
    store
        .save(EXPERIMENTS_KEY, &serde_json::to_value(&experiments)?)
        .await?;

    let results = PersistedResults {
        schema_version: EXPERIMENT_SCHEMA_VERSION,
        results: engine.results_map().clone(),
    };
    store
        .save(RESULTS_KEY, &serde_json::to_value(&results)?)
        .await?;

    let assignments = PersistedAssignments {
        schema_version: EXPERIMENT_SCHEMA_VERSION,
        assignments: engine.assignments_map().clone(),
    };
    store
        .save(ASSIGNMENTS_KEY, &serde_json::to_value(&assignments)?)
        .await?;

    log::debug!("Persisted experiment state");
    Ok(())
}

/// Load all three documents into `engine`, replacing its in-memory state.
/// Missing, unreadable or schema-mismatched documents each fall back to
/// empty; the engine always comes up.
pub async fn load_state(store: &dyn StateStore, engine: &mut ExperimentEngine) {
    let experiments = load_doc::<PersistedExperiments>(store, EXPERIMENTS_KEY)
        .await
        .map(|doc| doc.experiments)
        .unwrap_or_default();
    let results = load_doc::<PersistedResults>(store, RESULTS_KEY)
        .await
        .map(|doc| doc.results)
        .unwrap_or_default();
    let assignments = load_doc::<PersistedAssignments>(store, ASSIGNMENTS_KEY)
        .await
        .map(|doc| doc.assignments)
        .unwrap_or_default();

    log::info!(
        "Loaded experiment state: {} tests, {} result sets, {} assignment sets",
        experiments.len(),
        results.len(),
        assignments.len()
    );
    engine.restore(experiments, results, assignments);
}

async fn load_doc<T>(store: &dyn StateStore, key: &str) -> Option<T>
where
    T: DeserializeOwned + HasSchemaVersion,
{
    let value = match store.load(key).await {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("Could not read persisted document {key}: {err}; starting empty");
            return None;
        }
    };
    let doc: T = match serde_json::from_value(value) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("Malformed persisted document {key}: {err}; starting empty");
            return None;
        }
    };
    if doc.schema_version() != EXPERIMENT_SCHEMA_VERSION {
        log::warn!(
            "Unsupported schema_version {} in document {key} (expected {EXPERIMENT_SCHEMA_VERSION}); starting empty",
            doc.schema_version()
        );
        return None;
    }
    Some(doc)
}

trait HasSchemaVersion {
    fn schema_version(&self) -> u32;
}

impl HasSchemaVersion for PersistedExperiments {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl HasSchemaVersion for PersistedResults {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl HasSchemaVersion for PersistedAssignments {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}
