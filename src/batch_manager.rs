//! Sequential run over a target list sharing one session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use log::{error, info, warn};

use crate::assembler::ProfileAssembler;
use crate::config::ScraperConfig;
use crate::delay_manager::{DelayPolicy, Sleeper};
use crate::error::{FailureKind, StoreError, TargetFailure};
use crate::input_loader::TargetRecord;
use crate::resume_manager::{BatchEntry, BatchResult, ResultStore, StopReason};

/// Batch-level stop signal, checked before each target.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchReport {
    pub result: BatchResult,
    /// Set when the run stopped on a failure that no target can recover from.
    pub fatal: Option<TargetFailure>,
}

pub struct BatchCoordinator {
    delay: DelayPolicy,
    sleeper: Arc<dyn Sleeper>,
    store: Option<ResultStore>,
    resume: bool,
    max_profiles: usize,
    cancel: CancelToken,
}

impl BatchCoordinator {
    pub fn new(config: &ScraperConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        BatchCoordinator {
            delay: DelayPolicy::new(config.inter_target_delay(), config.delay_jitter()),
            sleeper,
            store: None,
            resume: config.resume,
            max_profiles: config.max_profiles,
            cancel: CancelToken::new(),
        }
    }

    /// Persist the result after every target.
    pub fn with_store(mut self, store: ResultStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Successful entries of the stored document, in their stored order.
    fn previous_successes(&self) -> Vec<BatchEntry> {
        if !self.resume {
            return Vec::new();
        }
        let Some(previous) = self.store.as_ref().and_then(ResultStore::load) else {
            return Vec::new();
        };
        previous
            .entries
            .into_iter()
            .filter(BatchEntry::is_success)
            .collect()
    }

    fn persist(&self, result: &BatchResult) -> Result<(), StoreError> {
        match &self.store {
            Some(store) => store.save(result),
            None => Ok(()),
        }
    }

    pub fn run(
        &mut self,
        assembler: &mut ProfileAssembler,
        all_targets: &[TargetRecord],
    ) -> Result<BatchReport, StoreError> {
        let targets = if all_targets.len() > self.max_profiles {
            warn!(
                "Limiting run to {} of {} targets (max_profiles)",
                self.max_profiles,
                all_targets.len()
            );
            &all_targets[..self.max_profiles]
        } else {
            all_targets
        };

        let mut carried = self.previous_successes();
        let mut result = BatchResult::new();
        let mut fatal = None;
        let mut processed = 0;
        let total = targets.len();

        for (i, target) in targets.iter().enumerate() {
            if let Some(pos) = carried.iter().position(|e| e.target == target.url) {
                info!("Skipping {} / {} : {} (already done)", i + 1, total, target.url);
                result.entries.push(carried.remove(pos));
                continue;
            }
            if processed > 0 && !self.cancel.is_cancelled() {
                self.delay.wait(self.sleeper.as_ref());
            }
            if self.cancel.is_cancelled() {
                warn!("Run cancelled before {}", target.url);
                result.stopped_by = Some(StopReason::Cancelled);
                break;
            }
            processed += 1;
            info!("Processing {} / {} : {}", i + 1, total, target.url);

            match assembler.assemble(&target.url) {
                Ok(profile) => {
                    result.entries.push(BatchEntry::success(&target.url, profile));
                }
                Err(failure) if failure.kind == FailureKind::CredentialInvalid => {
                    error!("Credentials rejected: {}. Stopping the run.", failure.detail);
                    result.stopped_by = Some(StopReason::CredentialInvalid);
                    fatal = Some(failure);
                    break;
                }
                Err(failure) => {
                    warn!("{} failed: {}", target.url, failure);
                    result.entries.push(BatchEntry::failed(&target.url, &failure));
                }
            }
            self.persist(&with_unvisited(&result, &carried, all_targets))?;
        }

        result.finished_at = Some(Local::now());
        let result = with_unvisited(&result, &carried, all_targets);
        let scraped_nothing = fatal.is_some() && processed <= 1;
        match &self.store {
            Some(store) if scraped_nothing && store.path().exists() => {
                warn!("Nothing scraped. Leaving {:?} as it was.", store.path());
            }
            _ => self.persist(&result)?,
        }
        info!(
            "Run {} finished: {} profiles, {} failures.",
            result.run_id,
            result.successes().count(),
            result.failures()
        );
        Ok(BatchReport { result, fatal })
    }
}

/// `result` followed by the carried-over entries this run never reached, in
/// target order. Entries for targets outside the list go last.
fn with_unvisited(
    result: &BatchResult,
    carried: &[BatchEntry],
    targets: &[TargetRecord],
) -> BatchResult {
    let mut unvisited: Vec<&BatchEntry> = carried.iter().collect();
    unvisited.sort_by_key(|e| {
        targets
            .iter()
            .position(|t| t.url == e.target)
            .unwrap_or(usize::MAX)
    });
    let mut merged = result.clone();
    merged.entries.extend(unvisited.into_iter().cloned());
    merged
}
