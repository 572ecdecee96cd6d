//! Bounded fan-out of the pipeline over many addresses.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use thiserror::Error;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::mx::{MxLookup, MxResolver};
use crate::pipeline::{Label, Pipeline, VerificationResult};
use crate::smtp_verify::{MailboxProbe, SmtpProber};

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot start worker pool: {source}")]
    Pool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Shared stop signal for [`BatchExecutor::run_with`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a [`Pipeline`] over a list on a fixed-size worker pool. Output
/// position `i` always belongs to input position `i`.
pub struct BatchExecutor<M = MxResolver, P = SmtpProber> {
    pipeline: Pipeline<M, P>,
    pool: rayon::ThreadPool,
    workers: usize,
}

impl<M: MxLookup, P: MailboxProbe> BatchExecutor<M, P> {
    pub fn new(pipeline: Pipeline<M, P>, options: &BatchOptions) -> Result<Self, BatchError> {
        let workers = options.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("mailverdict-worker-{i}"))
            .build()?;
        Ok(Self {
            pipeline,
            pool,
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn pipeline(&self) -> &Pipeline<M, P> {
        &self.pipeline
    }

    pub fn run<S: AsRef<str> + Sync>(&self, addresses: &[S]) -> Vec<VerificationResult> {
        self.run_observed(addresses, |_, _| {})
    }

    /// [`run`](Self::run) with a per-address completion callback.
    pub fn run_observed<S, F>(&self, addresses: &[S], on_result: F) -> Vec<VerificationResult>
    where
        S: AsRef<str> + Sync,
        F: Fn(usize, &VerificationResult) + Sync,
    {
        self.run_with(addresses, &CancelFlag::new(), on_result)
            .into_iter()
            .zip(addresses)
            .map(|(result, address)| {
                result.unwrap_or_else(|| VerificationResult::new(address.as_ref(), Label::Unknown))
            })
            .collect()
    }

    /// Like [`run`](Self::run), but stops starting new addresses once `cancel`
    /// is raised; those come back as `None`. `on_result` sees every completed
    /// address with its input index, in completion order.
    pub fn run_with<S, F>(
        &self,
        addresses: &[S],
        cancel: &CancelFlag,
        on_result: F,
    ) -> Vec<Option<VerificationResult>>
    where
        S: AsRef<str> + Sync,
        F: Fn(usize, &VerificationResult) + Sync,
    {
        tracing::info!(count = addresses.len(), workers = self.workers, "batch started");
        let results: Vec<Option<VerificationResult>> = self.pool.install(|| {
            addresses
                .par_iter()
                .with_max_len(1)
                .enumerate()
                .map(|(index, address)| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let result = self.verify_isolated(address.as_ref());
                    on_result(index, &result);
                    Some(result)
                })
                .collect()
        });

        let completed = results.iter().filter(|r| r.is_some()).count();
        tracing::info!(
            completed,
            skipped = results.len() - completed,
            "batch finished"
        );
        results
    }

    fn verify_isolated(&self, address: &str) -> VerificationResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.pipeline.classify(address))) {
            Ok(label) => VerificationResult::new(address, label),
            Err(payload) => {
                tracing::error!(
                    address,
                    panic = panic_message(payload.as_ref()),
                    "classification panicked, reporting Unknown"
                );
                VerificationResult::new(address, Label::Unknown)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::pipeline::PipelineOptions;
    use crate::pipeline::tests::{StubMx, StubProbe, stub_pipeline};
    use crate::smtp_verify::ProbeOutcome;

    fn executor(probe: StubProbe, workers: usize) -> BatchExecutor<StubMx, StubProbe> {
        let mx = StubMx::default().with("valid.com", "mx.valid.com");
        let pipeline = stub_pipeline(mx, probe, PipelineOptions::default());
        BatchExecutor::new(pipeline, &BatchOptions { workers }).expect("pool")
    }

    fn labels(results: &[VerificationResult]) -> Vec<Label> {
        results.iter().map(|r| r.label).collect()
    }

    #[test]
    fn mixed_batch() {
        let batch = executor(StubProbe::default(), DEFAULT_WORKERS);
        let results = batch.run(&["a@valid.com", "bad", "b@mailinator.com"]);
        assert_eq!(labels(&results), [Label::Valid, Label::Invalid, Label::Risky]);
        assert_eq!(batch.pipeline().mx().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn order_survives_duplicates_and_empties() {
        let probe = StubProbe::default().answer("gone@valid.com", ProbeOutcome::Rejected);
        let batch = executor(probe, 3);
        let pattern = ["ok@valid.com", "", "gone@valid.com", "ok@valid.com", "x@nomx.example"];
        let input: Vec<String> = pattern.iter().cycle().take(50).map(|s| s.to_string()).collect();

        let results = batch.run(&input);
        assert_eq!(results.len(), input.len());
        for (result, address) in results.iter().zip(&input) {
            assert_eq!(result.address.as_str(), address);
            let expected = match address.as_str() {
                "ok@valid.com" => Label::Valid,
                _ => Label::Invalid,
            };
            assert_eq!(result.label, expected, "{address:?}");
        }
    }

    #[test]
    fn panic_is_isolated_to_one_address() {
        let probe = StubProbe::default().panic_on("boom@valid.com");
        let batch = executor(probe, 2);
        let input = ["a@valid.com", "b@valid.com", "boom@valid.com", "c@valid.com", "bad"];
        let results = batch.run(&input);
        assert_eq!(
            labels(&results),
            [Label::Valid, Label::Valid, Label::Unknown, Label::Valid, Label::Invalid]
        );
    }

    #[test]
    fn raised_flag_skips_everything() {
        let batch = executor(StubProbe::default(), 2);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let results = batch.run_with(&["a@valid.com", "b@valid.com"], &cancel, |_, _| {});
        assert_eq!(results, [None, None]);
        assert_eq!(batch.pipeline().mx().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancel_mid_batch_leaves_rest_unstarted() {
        let batch = executor(StubProbe::default(), 1);
        let cancel = CancelFlag::new();
        let input: Vec<String> = (0..10).map(|i| format!("u{i}@valid.com")).collect();
        let results = batch.run_with(&input, &cancel, |_, _| cancel.cancel());

        assert_eq!(results.len(), input.len());
        let done: Vec<&VerificationResult> = results.iter().flatten().collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].label, Label::Valid);
    }

    #[test]
    fn callback_sees_every_completed_index() {
        let batch = executor(StubProbe::default(), 4);
        let seen = AtomicUsize::new(0);
        let index_sum = AtomicUsize::new(0);
        let input = ["a@valid.com", "bad", "c@valid.com", "d@yopmail.com"];
        let results = batch.run_with(&input, &CancelFlag::new(), |i, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            index_sum.fetch_add(i, Ordering::SeqCst);
        });
        assert!(results.iter().all(Option::is_some));
        assert_eq!(seen.load(Ordering::SeqCst), 4);
        assert_eq!(index_sum.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn zero_workers_means_one() {
        let batch = executor(StubProbe::default(), 0);
        assert_eq!(batch.workers(), 1);
        assert!(batch.run::<&str>(&[]).is_empty());
    }
}
