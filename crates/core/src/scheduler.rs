//! Bounded-concurrency execution of build tasks.

use std::{
    sync::{
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use log::{error, info};
use rayon::{ThreadPoolBuilder, prelude::*};

use crate::{
    cache::BuildCache,
    context::RunContext,
    error::SchedulerError,
    report::{TaskOutcome, TaskRecord},
    task::BuildTask,
    toolkit::FontToolkit,
};

/// Runs every task exactly once on a pool of `pool_size` workers.
pub struct TaskScheduler<'a> {
    ctx: &'a RunContext,
}

impl<'a> TaskScheduler<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx }
    }

    /// Run `tasks`, returning one record per task in task order.
    ///
    /// Results land in slots indexed by task position, so completion order
    /// does not matter. Tasks not started once the run is cancelled are
    /// recorded as skipped.
    pub fn run(
        &self,
        tasks: &[BuildTask<'_>],
        toolkit: &dyn FontToolkit,
        cache: &BuildCache,
    ) -> Result<Vec<TaskRecord>, SchedulerError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.ctx.pool_size.max(1))
            .thread_name(|i| format!("maple-build-{i}"))
            .build()?;

        let total = tasks.len();
        let slots: Vec<OnceLock<TaskOutcome>> = (0..total).map(|_| OnceLock::new()).collect();
        let finished = AtomicUsize::new(0);

        pool.install(|| {
            tasks.par_iter().zip(slots.par_iter()).for_each(|(task, slot)| {
                let label = task.label();
                let start = Instant::now();
                let outcome = if self.ctx.is_cancelled() {
                    TaskOutcome::Skipped("cancelled".to_string())
                } else if let Some(reason) = task.skip_reason() {
                    TaskOutcome::Skipped(reason.to_string())
                } else {
                    match task.run(toolkit, cache) {
                        Ok(font) => TaskOutcome::Built(font),
                        Err(failure) => TaskOutcome::Failed(failure),
                    }
                };

                let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
                match &outcome {
                    TaskOutcome::Built(font) => info!(
                        "[{done}/{total}] {label} ({:.2}s{})",
                        start.elapsed().as_secs_f64(),
                        if font.cached { ", cached" } else { "" }
                    ),
                    TaskOutcome::Failed(failure) => {
                        error!("[{done}/{total}] {label}: {} failed: {}", failure.stage, failure.cause)
                    }
                    TaskOutcome::Skipped(reason) => info!("[{done}/{total}] {label}: skipped, {reason}"),
                }
                if slot.set(outcome).is_err() {
                    error!("{label}: outcome already recorded, keeping the first");
                }
            });
        });

        tasks
            .iter()
            .zip(slots)
            .map(|(task, slot)| {
                let outcome = slot
                    .into_inner()
                    .ok_or(SchedulerError::MissingResult { index: task.index })?;
                Ok(TaskRecord {
                    variant: task.variant.clone(),
                    label: task.label(),
                    group: task.group(),
                    outcome,
                })
            })
            .collect()
    }
}
