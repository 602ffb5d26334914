//! Artifact lifecycle
//!
//! The compiler writes its output to a file that the interpreter then reads. An [`ArtifactBatch`] owns every such
//! path handed out during a batch and removes them all when the batch ends, on success, on failure, and on unwind.
//!
//! ## Notes
//! - With [`ArtifactStrategy::Shared`] every scenario writes the same file, so scenarios must not overlap.
//! - Paths are cleared before they are handed out so the interpreter can never pick up a stale artifact from an
//!   earlier scenario or an earlier, crashed run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::HarnessError;
use super::case::TestCaseSpec;
use super::config::ArtifactStrategy;

/// Hands out artifact batches for one strategy.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    strategy: ArtifactStrategy,
}

impl ArtifactManager {
    pub fn new(strategy: ArtifactStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ArtifactStrategy {
        &self.strategy
    }

    /// Start a batch. Leftovers from an earlier run are removed first.
    pub fn acquire(&self) -> Result<ArtifactBatch, HarnessError> {
        let mut batch = ArtifactBatch {
            strategy: self.strategy.clone(),
            issued: Vec::new(),
        };
        match &self.strategy {
            ArtifactStrategy::Shared(path) => {
                remove_if_exists(path)?;
                batch.issued.push(path.clone());
            }
            ArtifactStrategy::PerScenario(dir) => {
                fs::create_dir_all(dir).map_err(|source| HarnessError::Io {
                    path: dir.clone(),
                    source,
                })?;
            }
        }
        Ok(batch)
    }
}

/// The artifact paths of one running batch.
///
/// Dropping the batch removes every path it issued; [`ArtifactBatch::finish`] does the same but reports failures.
#[derive(Debug)]
pub struct ArtifactBatch {
    strategy: ArtifactStrategy,
    issued: Vec<PathBuf>,
}

impl ArtifactBatch {
    /// Return a clean artifact path for `spec`.
    pub fn path_for(&mut self, spec: &TestCaseSpec) -> Result<PathBuf, HarnessError> {
        let path = match &self.strategy {
            ArtifactStrategy::Shared(path) => path.clone(),
            ArtifactStrategy::PerScenario(dir) => self.unique_path(dir, &sanitize(&spec.name)),
        };
        remove_if_exists(&path)?;
        if !self.issued.contains(&path) {
            self.issued.push(path.clone());
        }
        Ok(path)
    }

    /// Remove one scenario's artifact once the scenario is done with it.
    pub fn release(&self, path: &Path) -> Result<(), HarnessError> {
        remove_if_exists(path)
    }

    /// Paths issued so far.
    pub fn issued(&self) -> &[PathBuf] {
        &self.issued
    }

    /// End the batch, removing every issued artifact.
    pub fn finish(mut self) -> Result<(), HarnessError> {
        self.cleanup()
    }

    fn unique_path(&self, dir: &Path, stem: &str) -> PathBuf {
        let mut path = dir.join(format!("{}.vc", stem));
        let mut n = 2;
        while self.issued.contains(&path) {
            path = dir.join(format!("{}-{}.vc", stem, n));
            n += 1;
        }
        path
    }

    fn cleanup(&mut self) -> Result<(), HarnessError> {
        let mut first_error = None;
        for path in self.issued.drain(..) {
            if let Err(e) = remove_if_exists(&path) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for ArtifactBatch {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!(error = %e, "artifact cleanup failed");
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<(), HarnessError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HarnessError::ArtifactCleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "scenario".to_string() } else { cleaned }
}
