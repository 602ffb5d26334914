//! Batch runner
//!
//! Drives every scenario through the pipeline and the verifier in declared order, then removes the batch's
//! artifacts. A scenario can fail in any way the toolchain likes; the batch still runs to the end (or to the first
//! failure with `stop_on_fail`). Artifact paths that cannot be cleared fault the affected scenario, and a failed
//! final cleanup is recorded on the [`BatchReport`]; neither discards the results gathered so far.
//!
//! ## Concurrency
//!
//! Scenarios run one at a time unless the config asks for several jobs *and* uses per-scenario artifacts. In the
//! parallel case reporter callbacks are delivered in declared order once all scenarios have finished.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::HarnessError;
use super::artifact::{ArtifactBatch, ArtifactManager};
use super::case::TestCaseSpec;
use super::config::{HarnessConfig, ToolchainPaths};
use super::pipeline::{ObservedResult, Pipeline};
use super::reporter::BatchReporter;
use super::stage::{ProcessStage, StageExecutor, StageOutcome};
use super::verify::{CheckOutcome, verify};

/// Everything recorded about one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub observed: ObservedResult,
    pub checks: CheckOutcome,
    pub duration: Duration,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.checks.passed()
    }
}

/// Aggregated results of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Reports of the scenarios that ran, in declared order.
    pub scenarios: Vec<ScenarioReport>,
    pub duration: Duration,
    /// The batch stopped at the first failure and skipped the remaining scenarios.
    pub stopped_early: bool,
    /// Artifacts left behind because the final cleanup failed.
    pub cleanup_error: Option<String>,
}

impl BatchReport {
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    pub fn failed_checks(&self) -> usize {
        self.scenarios.iter().map(|s| s.checks.failed_count()).sum()
    }

    pub fn failed_scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed())
    }

    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_checks() == 0 && self.cleanup_error.is_none()
    }

    /// Process exit status: the number of failed checks, saturated so it never wraps to 0.
    ///
    /// A batch whose checks all passed but whose cleanup failed exits with 1.
    pub fn exit_status(&self) -> i32 {
        match self.failed_checks() {
            0 if self.cleanup_error.is_some() => 1,
            failed => failed.min(255) as i32,
        }
    }
}

/// Runs batches of scenarios against one toolchain.
pub struct Runner<'a, E: StageExecutor = ProcessStage> {
    paths: &'a ToolchainPaths,
    config: &'a HarnessConfig,
    executor: E,
}

impl<'a> Runner<'a, ProcessStage> {
    pub fn new(paths: &'a ToolchainPaths, config: &'a HarnessConfig) -> Self {
        Self::with_executor(paths, config, ProcessStage::default())
    }
}

impl<'a, E: StageExecutor + Sync> Runner<'a, E> {
    pub fn with_executor(paths: &'a ToolchainPaths, config: &'a HarnessConfig, executor: E) -> Self {
        Self {
            paths,
            config,
            executor,
        }
    }

    /// Check that every scenario's source fixture exists.
    pub fn check_fixtures(&self, specs: &[TestCaseSpec]) -> Result<(), HarnessError> {
        for spec in specs {
            let path = self.config.fixture_path(&spec.source_file);
            if !path.is_file() {
                return Err(HarnessError::MissingFixture(path));
            }
        }
        Ok(())
    }

    /// Run `specs` in order and aggregate the results.
    ///
    /// Only a batch that cannot start (the artifact directory cannot be created, a stale artifact cannot be
    /// removed) is returned as an error; once scenarios run, everything ends up in the report.
    #[tracing::instrument(skip_all, fields(scenarios = specs.len(), jobs = self.config.effective_jobs()))]
    pub fn run_all(
        &self,
        specs: &[TestCaseSpec],
        reporter: &mut dyn BatchReporter,
    ) -> Result<BatchReport, HarnessError> {
        if specs.is_empty() {
            return Err(HarnessError::NoScenarios);
        }
        if self.config.jobs > 1 && !self.config.artifact.allows_parallel() {
            tracing::warn!(jobs = self.config.jobs, "shared artifact path, running scenarios sequentially");
        }

        let start = Instant::now();
        let mut batch = ArtifactManager::new(self.config.artifact.clone()).acquire()?;
        let pipeline = Pipeline::with_executor(self.paths, self.config, &self.executor);

        reporter.on_batch_start(specs.len());
        let (scenarios, stopped_early) = if self.config.effective_jobs() > 1 {
            let (scenarios, stopped_early) = self.run_parallel(&pipeline, &mut batch, specs);
            for (spec, scenario) in specs.iter().zip(&scenarios) {
                reporter.on_scenario_start(spec);
                reporter.on_scenario_complete(scenario);
            }
            (scenarios, stopped_early)
        } else {
            self.run_sequential(&pipeline, &mut batch, specs, reporter)
        };
        let cleanup_error = batch.finish().err().map(|e| {
            tracing::warn!(error = %e, "artifact cleanup failed");
            e.to_string()
        });

        let report = BatchReport {
            scenarios,
            duration: start.elapsed(),
            stopped_early,
            cleanup_error,
        };
        tracing::info!(
            scenarios = report.scenario_count(),
            failed_checks = report.failed_checks(),
            "batch finished"
        );
        reporter.on_batch_complete(&report);
        Ok(report)
    }

    fn run_sequential(
        &self,
        pipeline: &Pipeline<'_, &E>,
        batch: &mut ArtifactBatch,
        specs: &[TestCaseSpec],
        reporter: &mut dyn BatchReporter,
    ) -> (Vec<ScenarioReport>, bool) {
        let mut scenarios = Vec::with_capacity(specs.len());
        for spec in specs {
            reporter.on_scenario_start(spec);
            let scenario = match batch.path_for(spec) {
                Ok(artifact) => {
                    let scenario = run_scenario(pipeline, spec, &artifact);
                    release(batch, &artifact);
                    scenario
                }
                Err(e) => artifact_unavailable(spec, &e.to_string()),
            };
            reporter.on_scenario_complete(&scenario);

            let failed = !scenario.passed();
            scenarios.push(scenario);
            if failed && self.config.stop_on_fail {
                return (scenarios, true);
            }
        }
        (scenarios, false)
    }

    fn run_parallel(
        &self,
        pipeline: &Pipeline<'_, &E>,
        batch: &mut ArtifactBatch,
        specs: &[TestCaseSpec],
    ) -> (Vec<ScenarioReport>, bool) {
        let artifacts: Vec<Result<PathBuf, String>> = specs
            .iter()
            .map(|spec| batch.path_for(spec).map_err(|e| e.to_string()))
            .collect();
        let batch = &*batch;
        let slots: Vec<Mutex<Option<ScenarioReport>>> = specs.iter().map(|_| Mutex::new(None)).collect();
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);

        thread::scope(|scope| {
            for _ in 0..self.config.effective_jobs().min(specs.len()) {
                scope.spawn(|| {
                    while !stop.load(Ordering::SeqCst) {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        let (Some(spec), Some(artifact)) = (specs.get(i), artifacts.get(i)) else {
                            break;
                        };
                        let scenario = match artifact {
                            Ok(artifact) => {
                                let scenario = run_scenario(pipeline, spec, artifact);
                                release(batch, artifact);
                                scenario
                            }
                            Err(reason) => artifact_unavailable(spec, reason),
                        };
                        if !scenario.passed() && self.config.stop_on_fail {
                            stop.store(true, Ordering::SeqCst);
                        }
                        *slots[i].lock().unwrap_or_else(PoisonError::into_inner) = Some(scenario);
                    }
                });
            }
        });

        let scenarios = slots
            .into_iter()
            .filter_map(|slot| slot.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect::<Vec<_>>();
        let stopped_early = stop.load(Ordering::SeqCst) && scenarios.len() < specs.len();
        (scenarios, stopped_early)
    }
}

fn run_scenario<E: StageExecutor>(pipeline: &Pipeline<'_, E>, spec: &TestCaseSpec, artifact: &Path) -> ScenarioReport {
    let start = Instant::now();
    let observed = pipeline.execute(spec, artifact);
    let checks = verify(spec, &observed);
    ScenarioReport {
        name: spec.name.clone(),
        observed,
        checks,
        duration: start.elapsed(),
    }
}

/// A scenario whose artifact path could not be cleared. The toolchain is never started, so a stale artifact
/// cannot be mistaken for fresh output.
fn artifact_unavailable(spec: &TestCaseSpec, reason: &str) -> ScenarioReport {
    tracing::warn!(scenario = %spec.name, error = %reason, "artifact path unavailable, skipping toolchain");
    let observed = ObservedResult {
        compile: StageOutcome::SpawnFailed {
            reason: format!("not started: {}", reason),
        },
        interpret: None,
    };
    let checks = verify(spec, &observed);
    ScenarioReport {
        name: spec.name.clone(),
        observed,
        checks,
        duration: Duration::ZERO,
    }
}

fn release(batch: &ArtifactBatch, artifact: &Path) {
    // The batch retries at the end; a failure here only delays removal.
    if let Err(e) = batch.release(artifact) {
        tracing::warn!(error = %e, "failed to remove scenario artifact");
    }
}
