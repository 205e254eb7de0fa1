//! Plan executor module.
//!
//! Applies a plan against the filesystem one item at a time:
//! - move: rename into the planned destination
//! - transform: stage the original if needed, run the transform, roll back on failure
//! - delete: remove files, then directories deepest first, then the root
//!
//! Runs either synchronously through [`Executor::run`] or on a dedicated
//! worker thread through [`Executor::start`].

use crate::core::deletion;
use crate::core::progress::{self, ProgressEvent, ProgressReceiver, ProgressSender, ProgressTracker};
use crate::core::staging::{BackupRecord, StagingArea};
use crate::core::transform::{Transform, TransformRequest};
use crate::models::item::ItemKind;
use crate::models::outcome::{ExecutionOutcome, OutcomeStatus, Summary, TerminalEvent, TerminalStatus};
use crate::models::plan::{OperationKind, Plan, PlannedOperation};
use crate::models::rules::Job;
use crate::utils::format::format_size;
use crate::utils::fs::{ensure_parent, file_size, move_file, path_key, remove_file};
use crate::Result;
use chrono::Local;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Name of the hidden staging directory created next to staged originals.
    pub staging_dir_name: String,
    /// Minimum time between two progress events.
    pub progress_interval: Duration,
    /// Capacity of the progress channel.
    pub channel_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            staging_dir_name: ".temp".to_string(),
            progress_interval: Duration::from_millis(200),
            channel_capacity: 256,
        }
    }
}

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Idle,
            1 => RunState::Running,
            2 => RunState::Completed,
            3 => RunState::Cancelled,
            _ => RunState::Failed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Completed => 2,
            RunState::Cancelled => 3,
            RunState::Failed => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled | RunState::Failed)
    }
}

impl From<TerminalStatus> for RunState {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Completed => RunState::Completed,
            TerminalStatus::Cancelled => RunState::Cancelled,
            TerminalStatus::Failed => RunState::Failed,
        }
    }
}

/// Plan executor.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    /// Create a new executor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new executor with custom configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Start executing a plan on a dedicated worker thread.
    ///
    /// Deletion plans whose root is a filesystem root or the home directory
    /// are refused before anything is touched.
    pub fn start(
        &self,
        plan: Plan,
        transform: Box<dyn Transform>,
        log_sink: Box<dyn Write + Send>,
    ) -> Result<ExecutionHandle> {
        if matches!(plan.rules.job, Job::Delete) {
            deletion::check_root(&plan.root)?;
        }

        let (mut sender, receiver) = progress::channel(self.config.channel_capacity);
        let cancel = Arc::new(AtomicBool::new(false));
        let state = Arc::new(AtomicU8::new(RunState::Idle.as_u8()));

        let worker = {
            let executor = self.clone();
            let cancel = Arc::clone(&cancel);
            let state = Arc::clone(&state);
            let mut log_sink = log_sink;
            thread::Builder::new()
                .name("organizer-worker".to_string())
                .spawn(move || {
                    state.store(RunState::Running.as_u8(), Ordering::SeqCst);
                    let event = executor.execute(
                        &plan,
                        transform.as_ref(),
                        log_sink.as_mut(),
                        &cancel,
                        &mut sender,
                    );
                    state.store(RunState::from(event.status).as_u8(), Ordering::SeqCst);
                    sender.done(event);
                })?
        };

        Ok(ExecutionHandle {
            receiver,
            cancel,
            state,
            worker: Some(worker),
        })
    }

    /// Execute a plan on the calling thread.
    ///
    /// Events are collected rather than streamed, so nothing waits on a
    /// reader. Returns the terminal event and every event of the run, the
    /// last one being `Done`.
    pub fn run(
        &self,
        plan: &Plan,
        transform: &dyn Transform,
        log_sink: &mut dyn Write,
        cancel: &AtomicBool,
    ) -> (TerminalEvent, Vec<ProgressEvent>) {
        let mut progress = ProgressSender::buffered();
        let event = self.execute(plan, transform, log_sink, cancel, &mut progress);
        let events = progress.done(event.clone());
        (event, events)
    }

    fn execute(
        &self,
        plan: &Plan,
        transform: &dyn Transform,
        log_sink: &mut dyn Write,
        cancel: &AtomicBool,
        progress: &mut ProgressSender,
    ) -> TerminalEvent {
        let total = plan.included().count();
        let worker = Worker {
            plan,
            transform,
            log: log_sink,
            log_failed: false,
            cancel,
            progress,
            tracker: ProgressTracker::new(total, self.config.progress_interval, Instant::now()),
            staging: StagingArea::new(self.config.staging_dir_name.clone()),
            outcomes: Vec::new(),
            pending: HashSet::new(),
            parked: HashMap::new(),
            started: Instant::now(),
        };
        worker.run(total)
    }
}

/// Caller side of a run started with [`Executor::start`].
#[derive(Debug)]
pub struct ExecutionHandle {
    receiver: ProgressReceiver,
    cancel: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    worker: Option<JoinHandle<()>>,
}

impl ExecutionHandle {
    /// Request cancellation. Takes effect at the next item boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Poll for the next event without waiting.
    pub fn try_next(&mut self) -> Option<ProgressEvent> {
        self.receiver.try_next()
    }

    /// Wait for the next event from synchronous code.
    pub fn next_blocking(&mut self) -> Option<ProgressEvent> {
        self.receiver.next_blocking()
    }

    /// Wait for the next event from async code.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.receiver.next().await
    }

    /// Drain events until the terminal event and join the worker.
    ///
    /// Must not be called from inside an async runtime; use [`next`](Self::next) there.
    pub fn wait(mut self) -> Result<TerminalEvent> {
        while let Some(event) = self.receiver.next_blocking() {
            if let ProgressEvent::Done(event) = event {
                self.join();
                return Ok(*event);
            }
        }
        self.join();
        self.state.store(RunState::Failed.as_u8(), Ordering::SeqCst);
        Err(crate::Error::ExecuteError(
            "Worker stopped without a terminal event".to_string(),
        ))
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Executor worker panicked");
            }
        }
    }
}

/// Why a pass stopped early.
enum Stop {
    Cancelled,
    Fatal(crate::Error),
}

/// Result of attempting one operation.
enum Step {
    Done(ExecutionOutcome),
    /// The destination is still held by a pending source of this plan.
    Deferred,
    Fatal(crate::Error),
}

/// State of one run.
struct Worker<'a> {
    plan: &'a Plan,
    transform: &'a dyn Transform,
    log: &'a mut dyn Write,
    log_failed: bool,
    cancel: &'a AtomicBool,
    progress: &'a mut ProgressSender,
    tracker: ProgressTracker,
    staging: StagingArea,
    outcomes: Vec<ExecutionOutcome>,
    /// Case-insensitive keys of sources not yet processed.
    pending: HashSet<String>,
    /// Originals moved aside to break rename cycles.
    parked: HashMap<usize, BackupRecord>,
    started: Instant,
}

impl<'a> Worker<'a> {
    fn run(mut self, total: usize) -> TerminalEvent {
        let plan = self.plan;
        tracing::info!("Executing {} operations under {:?}", total, plan.root);
        self.log_line(format!(
            "Started {} run: {} item(s) under {}",
            job_label(&plan.rules.job),
            total,
            plan.root.display()
        ));

        self.pending = plan
            .included()
            .filter(|op| op.kind != OperationKind::Delete && !op.is_noop())
            .map(|op| path_key(&op.source))
            .collect();

        let mut result = Ok(());
        if matches!(plan.rules.job, Job::Delete) {
            if let Err(e) = deletion::check_root(&plan.root) {
                result = Err(Stop::Fatal(e));
            }
        }
        if result.is_ok() {
            result = self.main_pass();
        }

        let (status, error) = match result {
            Ok(()) => (TerminalStatus::Completed, None),
            Err(Stop::Cancelled) => (TerminalStatus::Cancelled, None),
            Err(Stop::Fatal(e)) => {
                tracing::error!("Run aborted: {}", e);
                self.log_line(format!("Aborted: {}", e));
                (TerminalStatus::Failed, Some(e.to_string()))
            }
        };

        if !self.parked.is_empty() {
            let reason = match status {
                TerminalStatus::Cancelled => "run cancelled".to_string(),
                _ => format!("run stopped: {}", error.as_deref().unwrap_or("unknown error")),
            };
            self.restore_parked(&reason);
        }

        // A cancelled run leaves the tree as it was after the last outcome.
        if status != TerminalStatus::Cancelled {
            self.remove_empty_staging();
        }
        if status == TerminalStatus::Completed
            && matches!(plan.rules.job, Job::Organize)
            && plan.rules.flatten.is_some()
        {
            self.cleanup_flattened();
        }
        self.finish(total, status, error)
    }

    fn main_pass(&mut self) -> std::result::Result<(), Stop> {
        let plan = self.plan;
        let mut deferred = Vec::new();
        for (index, op) in plan.operations.iter().enumerate() {
            if !op.included {
                continue;
            }
            self.check_cancel()?;
            match self.process(index, true) {
                Step::Done(outcome) => self.record(outcome),
                Step::Deferred => {
                    tracing::debug!("Deferred {:?}: destination still pending", op.source);
                    deferred.push(index);
                }
                Step::Fatal(e) => return Err(Stop::Fatal(e)),
            }
        }
        self.retry_deferred(deferred)
    }

    /// Retry operations whose destination was held by another pending source.
    ///
    /// Rounds repeat while they make progress. A round without progress means
    /// a rename cycle; one original is then parked in staging to open it.
    fn retry_deferred(&mut self, mut deferred: Vec<usize>) -> std::result::Result<(), Stop> {
        while !deferred.is_empty() {
            let before = deferred.len();
            let mut waiting = Vec::new();
            for index in deferred {
                self.check_cancel()?;
                match self.process(index, true) {
                    Step::Done(outcome) => self.record(outcome),
                    Step::Deferred => waiting.push(index),
                    Step::Fatal(e) => return Err(Stop::Fatal(e)),
                }
            }

            if !waiting.is_empty() && waiting.len() == before {
                match waiting.iter().copied().find(|i| !self.parked.contains_key(i)) {
                    Some(index) => {
                        if !self.park(index)? {
                            waiting.retain(|&i| i != index);
                        }
                    }
                    None => {
                        for index in waiting.drain(..) {
                            self.check_cancel()?;
                            match self.process(index, false) {
                                Step::Done(outcome) => self.record(outcome),
                                Step::Deferred => {}
                                Step::Fatal(e) => return Err(Stop::Fatal(e)),
                            }
                        }
                    }
                }
            }
            deferred = waiting;
        }
        Ok(())
    }

    /// Move the source of `index` into staging. Returns false if the item failed.
    fn park(&mut self, index: usize) -> std::result::Result<bool, Stop> {
        let plan = self.plan;
        let op = &plan.operations[index];
        match self.staging.stage(&op.source) {
            Ok(record) => {
                self.pending.remove(&path_key(&op.source));
                self.log_line(format!(
                    "Parked {} to resolve a rename cycle",
                    op.source.display()
                ));
                self.parked.insert(index, record);
                Ok(true)
            }
            Err(e) if e.is_fatal() => Err(Stop::Fatal(e)),
            Err(e) => {
                self.pending.remove(&path_key(&op.source));
                let outcome = outcome(index, op, OutcomeStatus::Failed { reason: e.to_string() }, 0);
                self.record(outcome);
                Ok(false)
            }
        }
    }

    /// Put originals parked for a rename cycle back in place, recording each.
    fn restore_parked(&mut self, reason: &str) {
        let plan = self.plan;
        let mut parked: Vec<(usize, BackupRecord)> = self.parked.drain().collect();
        parked.sort_by_key(|(index, _)| *index);
        for (index, record) in parked {
            let op = &plan.operations[index];
            let outcome = fail_with_restore(index, op, reason.to_string(), Some(record));
            self.record(outcome);
        }
    }

    fn check_cancel(&self) -> std::result::Result<(), Stop> {
        if self.cancel.load(Ordering::SeqCst) {
            tracing::info!("Cancellation requested, stopping");
            return Err(Stop::Cancelled);
        }
        Ok(())
    }

    fn process(&mut self, index: usize, allow_defer: bool) -> Step {
        let plan = self.plan;
        let op = &plan.operations[index];
        if op.kind == OperationKind::Delete {
            return Step::Done(self.delete(index, op));
        }
        if op.is_noop() {
            return Step::Done(outcome(
                index,
                op,
                OutcomeStatus::Skipped {
                    reason: "unchanged".to_string(),
                },
                op.size,
            ));
        }

        let parked = self.parked.remove(&index);
        let input = parked
            .as_ref()
            .map(|r| r.backup.clone())
            .unwrap_or_else(|| op.source.clone());
        if fs::symlink_metadata(&input).is_err() {
            self.pending.remove(&path_key(&op.source));
            return Step::Done(outcome(
                index,
                op,
                OutcomeStatus::Failed {
                    reason: format!("Source not found: {}", op.source.display()),
                },
                0,
            ));
        }

        if occupied_by_other(&op.source, &op.destination) {
            if allow_defer && self.pending.contains(&path_key(&op.destination)) {
                if let Some(record) = parked {
                    self.parked.insert(index, record);
                }
                return Step::Deferred;
            }
            self.pending.remove(&path_key(&op.source));
            let reason = crate::Error::DestinationExists(op.destination.display().to_string());
            return Step::Done(fail_with_restore(index, op, reason.to_string(), parked));
        }

        self.pending.remove(&path_key(&op.source));
        match op.kind {
            OperationKind::Transform => self.apply_transform(index, op, parked),
            _ => Step::Done(apply_move(index, op, &input, parked)),
        }
    }

    fn apply_transform(
        &mut self,
        index: usize,
        op: &PlannedOperation,
        parked: Option<BackupRecord>,
    ) -> Step {
        let record = match parked {
            Some(record) => Some(record),
            None if op.staged => match self.staging.stage(&op.source) {
                Ok(record) => Some(record),
                Err(e) if e.is_fatal() => return Step::Fatal(e),
                Err(e) => {
                    return Step::Done(outcome(
                        index,
                        op,
                        OutcomeStatus::Failed {
                            reason: e.to_string(),
                        },
                        0,
                    ))
                }
            },
            None => None,
        };
        let input = record
            .as_ref()
            .map(|r| r.backup.clone())
            .unwrap_or_else(|| op.source.clone());
        let bytes_before = file_size(&input);

        let transform = self.transform;
        let request = TransformRequest {
            source: &input,
            destination: &op.destination,
            cancel: self.cancel,
        };
        let progress = &mut *self.progress;
        let result = transform
            .apply(&request, &mut |fraction| progress.fraction(index, fraction))
            .and_then(|bytes| {
                if !op.destination.exists() || (bytes == 0 && bytes_before > 0) {
                    Err(crate::Error::EmptyOutput(op.destination.display().to_string()))
                } else {
                    Ok(bytes)
                }
            });

        match result {
            Ok(bytes_after) => Step::Done(ExecutionOutcome {
                index,
                kind: op.kind,
                source: op.source.clone(),
                destination: op.destination.clone(),
                status: OutcomeStatus::Success,
                backup: record.map(|r| r.backup),
                bytes_before,
                bytes_after,
            }),
            Err(e) => {
                // The destination was free before this item, so anything there is partial.
                if op.destination != input && op.destination.is_file() {
                    if let Err(remove_err) = fs::remove_file(&op.destination) {
                        tracing::warn!(
                            "Cannot remove partial output {:?}: {}",
                            op.destination,
                            remove_err
                        );
                    }
                }
                Step::Done(fail_with_restore(index, op, e.to_string(), record))
            }
        }
    }

    fn delete(&mut self, index: usize, op: &PlannedOperation) -> ExecutionOutcome {
        let path = &op.source;
        let result: Result<()> = match fs::symlink_metadata(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return outcome(
                    index,
                    op,
                    OutcomeStatus::Skipped {
                        reason: "already removed".to_string(),
                    },
                    0,
                );
            }
            Err(e) => Err(e.into()),
            Ok(meta) if meta.is_dir() => fs::remove_dir(path).map_err(crate::Error::from),
            Ok(_) => remove_file(path),
        };

        match result {
            Ok(()) => outcome(index, op, OutcomeStatus::Success, 0),
            Err(e) => outcome(index, op, OutcomeStatus::Failed { reason: e.to_string() }, 0),
        }
    }

    fn record(&mut self, outcome: ExecutionOutcome) {
        let line = describe(&outcome);
        match &outcome.status {
            OutcomeStatus::Success | OutcomeStatus::Skipped { .. } => tracing::debug!("{}", line),
            OutcomeStatus::Unrecoverable { .. } => tracing::error!("{}", line),
            _ => tracing::warn!("{}", line),
        }
        self.log_line(line);
        self.outcomes.push(outcome);

        if let Some(update) = self.tracker.update(self.outcomes.len(), Instant::now()) {
            self.progress.progress(&update);
        }
    }

    fn log_line(&mut self, message: String) {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
        if let Err(e) = writeln!(self.log, "{}", line) {
            if !self.log_failed {
                tracing::warn!("Cannot write run log: {}", e);
                self.log_failed = true;
            }
        }
        self.progress.log(line);
    }

    /// Remove staging directories that ended up empty.
    fn remove_empty_staging(&self) {
        for dir in self.staging.dirs() {
            if is_empty_dir(dir) && fs::remove_dir(dir).is_ok() {
                tracing::debug!("Removed empty staging directory: {:?}", dir);
            }
        }
    }

    /// Remove folders emptied by flattening, deepest first.
    fn cleanup_flattened(&mut self) {
        let plan = self.plan;
        let mut dirs: Vec<PathBuf> = plan
            .included()
            .filter(|op| op.item_kind == ItemKind::Directory && op.source != plan.root)
            .filter(|op| !self.staging.is_staging_dir(&op.source))
            .map(|op| op.source.clone())
            .collect();
        deletion::order_directories(&mut dirs);

        for dir in dirs {
            if !dir.is_dir() {
                continue;
            }
            if !is_empty_dir(&dir) {
                self.log_line(format!("Kept non-empty folder: {}", dir.display()));
                continue;
            }
            match fs::remove_dir(&dir) {
                Ok(()) => self.log_line(format!("Removed empty folder: {}", dir.display())),
                Err(e) => self.log_line(format!("Cannot remove folder {}: {}", dir.display(), e)),
            }
        }
    }

    fn finish(mut self, total: usize, status: TerminalStatus, error: Option<String>) -> TerminalEvent {
        let summary = Summary::from_outcomes(total, &self.outcomes, self.started.elapsed());
        let pending_staging_dirs: Vec<PathBuf> = self
            .staging
            .dirs()
            .iter()
            .filter(|d| d.exists())
            .cloned()
            .collect();

        self.log_line(format!(
            "Finished ({}): {} of {} succeeded, {} failed, {} skipped, {} -> {}",
            status,
            summary.succeeded,
            summary.total,
            summary.failed,
            summary.skipped,
            format_size(summary.bytes_before),
            format_size(summary.bytes_after)
        ));
        if summary.restored > 0 || summary.unrecoverable > 0 {
            self.log_line(format!(
                "Originals restored: {}, not restored: {}",
                summary.restored, summary.unrecoverable
            ));
        }
        for dir in &pending_staging_dirs {
            self.log_line(format!("Staging left for cleanup: {}", dir.display()));
        }
        if let Err(e) = self.log.flush() {
            tracing::warn!("Cannot flush run log: {}", e);
        }
        tracing::info!(
            "Run {}: {}/{} succeeded, {} failed",
            status,
            summary.succeeded,
            summary.total,
            summary.failed
        );

        TerminalEvent {
            status,
            summary,
            pending_staging_dirs,
            error,
            outcomes: self.outcomes,
        }
    }
}

fn apply_move(
    index: usize,
    op: &PlannedOperation,
    input: &Path,
    parked: Option<BackupRecord>,
) -> ExecutionOutcome {
    match ensure_parent(&op.destination).and_then(|_| move_file(input, &op.destination)) {
        Ok(()) => outcome(index, op, OutcomeStatus::Success, file_size(&op.destination)),
        Err(e) => fail_with_restore(index, op, e.to_string(), parked),
    }
}

/// Outcome of a failed item, moving a staged original back if there is one.
fn fail_with_restore(
    index: usize,
    op: &PlannedOperation,
    reason: String,
    record: Option<BackupRecord>,
) -> ExecutionOutcome {
    let Some(record) = record else {
        return outcome(index, op, OutcomeStatus::Failed { reason }, 0);
    };
    let status = match record.restore() {
        Ok(()) => OutcomeStatus::RolledBack { reason },
        Err(e) => OutcomeStatus::Unrecoverable {
            reason: format!("{}; restore failed: {}", reason, e),
            backup: record.backup.clone(),
        },
    };
    let mut outcome = outcome(index, op, status, 0);
    if matches!(outcome.status, OutcomeStatus::Unrecoverable { .. }) {
        outcome.backup = Some(record.backup);
    }
    outcome
}

fn outcome(
    index: usize,
    op: &PlannedOperation,
    status: OutcomeStatus,
    bytes_after: u64,
) -> ExecutionOutcome {
    ExecutionOutcome {
        index,
        kind: op.kind,
        source: op.source.clone(),
        destination: op.destination.clone(),
        status,
        backup: None,
        bytes_before: op.size,
        bytes_after,
    }
}

/// Whether `destination` is occupied by an entry other than `source`.
///
/// A case-only rename is not a conflict unless a distinct entry with the
/// exact destination name exists.
fn occupied_by_other(source: &Path, destination: &Path) -> bool {
    if source == destination || fs::symlink_metadata(destination).is_err() {
        return false;
    }
    if path_key(source) != path_key(destination) {
        return true;
    }
    let (Some(parent), Some(name)) = (destination.parent(), destination.file_name()) else {
        return false;
    };
    fs::read_dir(parent)
        .map(|entries| entries.flatten().any(|e| e.file_name() == name))
        .unwrap_or(false)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn job_label(job: &Job) -> &'static str {
    match job {
        Job::Organize => "organize",
        Job::Transform { .. } => "transform",
        Job::Delete => "delete",
    }
}

/// One run-log line for an outcome.
fn describe(outcome: &ExecutionOutcome) -> String {
    let source = outcome.source.display();
    match &outcome.status {
        OutcomeStatus::Success => match outcome.kind {
            OperationKind::Move => format!("Moved: {} -> {}", source, outcome.destination.display()),
            OperationKind::Transform => format!(
                "Converted: {} -> {} ({} -> {})",
                source,
                outcome.destination.display(),
                format_size(outcome.bytes_before),
                format_size(outcome.bytes_after)
            ),
            OperationKind::Delete => format!("Deleted: {}", source),
        },
        OutcomeStatus::Skipped { reason } => format!("Skipped: {} ({})", source, reason),
        OutcomeStatus::Failed { reason } => format!("Failed: {}: {}", source, reason),
        OutcomeStatus::RolledBack { reason } => {
            format!("Failed: {}: {}; original restored", source, reason)
        }
        OutcomeStatus::Unrecoverable { reason, backup } => format!(
            "UNRECOVERABLE: {}: {}; original kept at {}",
            source,
            reason,
            backup.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.staging_dir_name, ".temp");
        assert_eq!(config.progress_interval, Duration::from_millis(200));
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn test_run_state_round_trip() {
        for state in [
            RunState::Idle,
            RunState::Running,
            RunState::Completed,
            RunState::Cancelled,
            RunState::Failed,
        ] {
            assert_eq!(RunState::from_u8(state.as_u8()), state);
        }
        assert!(!RunState::Running.is_terminal());
        assert_eq!(RunState::from(TerminalStatus::Cancelled), RunState::Cancelled);
    }

    #[test]
    fn test_occupied_by_other() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.jpg");
        let b = tmp.path().join("b.jpg");
        fs::write(&a, b"a").unwrap();

        assert!(!occupied_by_other(&a, &a));
        assert!(!occupied_by_other(&a, &b));
        fs::write(&b, b"b").unwrap();
        assert!(occupied_by_other(&a, &b));
    }

    #[test]
    fn test_describe_unrecoverable() {
        let outcome = ExecutionOutcome {
            index: 0,
            kind: OperationKind::Transform,
            source: PathBuf::from("/r/a.png"),
            destination: PathBuf::from("/r/a.png"),
            status: OutcomeStatus::Unrecoverable {
                reason: "codec".to_string(),
                backup: PathBuf::from("/r/.temp/a.png"),
            },
            backup: None,
            bytes_before: 0,
            bytes_after: 0,
        };
        let line = describe(&outcome);
        assert!(line.starts_with("UNRECOVERABLE"));
        assert!(line.contains("/r/.temp/a.png"));
    }
}
