//! Saving and loading trained predictors.
//!
//! A snapshot holds everything needed to continue training exactly where the
//! original left off: configuration, node arena, live context, and loss
//! totals. Loading re-checks every structural invariant and rejects anything
//! inconsistent with `SnapshotMismatch`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use cts_math::{PriorPolicy, SwitchRate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alphabet::{Alphabet, Symbol};
use crate::context::SequenceContext;
use crate::error::{Error, Result};
use crate::predictor::{LossTracker, SequentialPredictor};
use crate::tree::{ContextTree, NodeArena};

/// Snapshot format version.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0.0";

/// Serializable state of a [`SequentialPredictor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot<S> {
    pub schema_version: String,
    pub saved_at: DateTime<Utc>,
    /// Symbols in canonical order.
    pub alphabet: Vec<S>,
    pub max_context_length: usize,
    pub prior: PriorPolicy,
    pub switch_rate: SwitchRate,
    /// Completed updates.
    pub steps: u64,
    pub nodes: NodeArena,
    /// Live context, most recent symbol last.
    pub context: Vec<S>,
    #[serde(default)]
    pub loss: LossTracker,
}

impl<S: Symbol> SequentialPredictor<S> {
    /// Capture the full state.
    pub fn to_snapshot(&self) -> ModelSnapshot<S> {
        let tree = self.tree();
        ModelSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            saved_at: Utc::now(),
            alphabet: tree.alphabet().symbols().to_vec(),
            max_context_length: tree.max_depth(),
            prior: tree.prior(),
            switch_rate: tree.switch_rate(),
            steps: tree.steps(),
            nodes: tree.nodes().clone(),
            context: self.context().into_inner(),
            loss: self.loss().clone(),
        }
    }

    /// Rebuild a predictor from a snapshot.
    pub fn from_snapshot(snapshot: ModelSnapshot<S>) -> Result<Self> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(Error::SnapshotMismatch(format!(
                "unsupported schema version {} (expected {})",
                snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }

        let alphabet = Alphabet::new(snapshot.alphabet).map_err(mismatch)?;
        let size = alphabet.len();

        if snapshot.max_context_length as u64 > cts_config::MAX_CONTEXT_LENGTH as u64 {
            return Err(Error::SnapshotMismatch(format!(
                "max context length {} exceeds {}",
                snapshot.max_context_length,
                cts_config::MAX_CONTEXT_LENGTH
            )));
        }
        if snapshot.nodes.is_empty() {
            return Err(Error::SnapshotMismatch("arena has no root node".to_string()));
        }

        let root_total = snapshot.nodes.root().estimator().total();
        if root_total != snapshot.steps {
            return Err(Error::SnapshotMismatch(format!(
                "root saw {} symbols but {} updates were recorded",
                root_total, snapshot.steps
            )));
        }
        let baseline = snapshot.loss.baseline();
        if baseline.total() != snapshot.steps || baseline.counts().keys().any(|&s| s >= size) {
            return Err(Error::SnapshotMismatch(
                "loss totals do not match the recorded updates".to_string(),
            ));
        }

        let mut context = SequenceContext::new(snapshot.max_context_length);
        let indices = snapshot
            .context
            .iter()
            .map(|s| alphabet.require_index(s))
            .collect::<Result<Vec<_>>>()
            .map_err(mismatch)?;
        context.replace(indices);

        let tree = ContextTree::from_parts(
            alphabet,
            snapshot.max_context_length,
            snapshot.prior,
            snapshot.switch_rate,
            snapshot.nodes,
            snapshot.steps,
        )
        .map_err(mismatch)?;

        Ok(Self::from_parts(tree, context, snapshot.loss))
    }

    /// Write the model as JSON.
    pub fn save(&self, path: &Path) -> Result<()>
    where
        S: Serialize,
    {
        write_json(path, &self.to_snapshot())?;
        debug!(
            path = %path.display(),
            nodes = self.tree().node_count(),
            steps = self.tree().steps(),
            "saved model"
        );
        Ok(())
    }

    /// Read a model written by [`SequentialPredictor::save`].
    pub fn load(path: &Path) -> Result<Self>
    where
        S: DeserializeOwned,
    {
        let snapshot: ModelSnapshot<S> = read_json(path)?;
        let model = Self::from_snapshot(snapshot)?;
        debug!(
            path = %path.display(),
            nodes = model.tree().node_count(),
            steps = model.tree().steps(),
            "loaded model"
        );
        Ok(model)
    }
}

fn mismatch(err: Error) -> Error {
    match err {
        Error::SnapshotMismatch(_) => err,
        other => Error::SnapshotMismatch(other.to_string()),
    }
}

/// Write JSON through a temporary sibling file, then rename into place.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn trained() -> SequentialPredictor<char> {
        let mut p =
            SequentialPredictor::with_defaults(Alphabet::from_chars("abc").unwrap(), 3).unwrap();
        p.update_batch(&"abcabcaabbcc".chars().collect::<Vec<_>>())
            .unwrap();
        p
    }

    #[test]
    fn test_save_load_continues_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let mut original = trained();
        original.save(&path).unwrap();
        let mut loaded = SequentialPredictor::<char>::load(&path).unwrap();
        assert_eq!(loaded.context(), original.context());
        assert_eq!(loaded.tree().node_count(), original.tree().node_count());
        assert_eq!(loaded.tree().steps(), original.tree().steps());

        for s in "cabbage".chars().filter(|c| "abc".contains(*c)) {
            let a = original.update(&s).unwrap();
            let b = loaded.update(&s).unwrap();
            assert!((a - b).abs() < 1e-12);
        }
        let (a, b) = (original.stats(), loaded.stats());
        assert_eq!(a.steps, b.steps);
        assert!((a.total_log_loss - b.total_log_loss).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let mut snap = trained().to_snapshot();
        snap.schema_version = "0.1.0".to_string();
        let err = SequentialPredictor::from_snapshot(snap).unwrap_err();
        assert!(matches!(err, Error::SnapshotMismatch(_)));
    }

    #[test]
    fn test_rejects_duplicate_alphabet() {
        let mut snap = trained().to_snapshot();
        snap.alphabet = vec!['a', 'b', 'a'];
        assert!(matches!(
            SequentialPredictor::from_snapshot(snap),
            Err(Error::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_shrunk_alphabet() {
        let mut snap = trained().to_snapshot();
        snap.alphabet = vec!['a', 'b'];
        snap.context.retain(|c| *c != 'c');
        assert!(matches!(
            SequentialPredictor::from_snapshot(snap),
            Err(Error::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_step_count_mismatch() {
        let mut snap = trained().to_snapshot();
        snap.steps += 1;
        assert!(SequentialPredictor::from_snapshot(snap).is_err());
    }

    #[test]
    fn test_rejects_unknown_context_symbol() {
        let mut snap = trained().to_snapshot();
        snap.context.push('z');
        assert!(matches!(
            SequentialPredictor::from_snapshot(snap),
            Err(Error::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_empty_arena_and_oversized_depth() {
        let json = serde_json::to_value(trained().to_snapshot()).unwrap();

        let mut empty = json.clone();
        empty["nodes"] = serde_json::json!([]);
        let snap: ModelSnapshot<char> = serde_json::from_value(empty).unwrap();
        assert!(matches!(
            SequentialPredictor::from_snapshot(snap),
            Err(Error::SnapshotMismatch(_))
        ));

        let mut deep = json;
        deep["max_context_length"] = serde_json::json!(1_000_000_000u64);
        let snap: ModelSnapshot<char> = serde_json::from_value(deep).unwrap();
        assert!(matches!(
            SequentialPredictor::from_snapshot(snap),
            Err(Error::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_tampered_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let json = serde_json::to_value(trained().to_snapshot()).unwrap();
        let root_total = json["nodes"][0]["estimator"]["total"].as_u64().unwrap();

        // A count that disagrees with the node's own total never deserializes.
        let mut bad_count = json.clone();
        bad_count["nodes"][0]["estimator"]["counts"]["0"] = serde_json::json!(1000);
        fs::write(&path, serde_json::to_vec(&bad_count).unwrap()).unwrap();
        assert!(matches!(
            SequentialPredictor::<char>::load(&path),
            Err(Error::Json(_))
        ));

        // Consistent within the root, but no longer matching the step count.
        let mut inflated = json.clone();
        let extra = 1000 - inflated["nodes"][0]["estimator"]["counts"]["0"].as_u64().unwrap();
        inflated["nodes"][0]["estimator"]["counts"]["0"] = serde_json::json!(1000);
        inflated["nodes"][0]["estimator"]["total"] = serde_json::json!(root_total + extra);
        let snap: ModelSnapshot<char> = serde_json::from_value(inflated).unwrap();
        assert!(matches!(
            SequentialPredictor::from_snapshot(snap),
            Err(Error::SnapshotMismatch(_))
        ));

        // A child that saw more symbols than the root.
        let mut child = json;
        child["nodes"][1]["estimator"]["counts"] = serde_json::json!({ "0": root_total + 1 });
        child["nodes"][1]["estimator"]["total"] = serde_json::json!(root_total + 1);
        let snap: ModelSnapshot<char> = serde_json::from_value(child).unwrap();
        let err = SequentialPredictor::from_snapshot(snap).unwrap_err();
        assert!(matches!(err, Error::SnapshotMismatch(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SequentialPredictor::<char>::load(Path::new("/nonexistent/cts/model.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
