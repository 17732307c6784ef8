// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bounded pool of isolated worker processes.
//!
//! Each worker is a child process speaking the frame protocol on its
//! stdin/stdout. One supervisor thread per worker pulls input indexes from a
//! shared queue, ships the encoded input, and waits for the result. A worker
//! that dies mid-item costs only that item: it is recorded as
//! `WorkerCrashed` and the worker is respawned.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::error::{FrameError, TrialError, WorkError};
use crate::outcome::{skip_reason, OutcomeCollector};
use crate::protocol::{read_frame, write_frame, SupervisorMessage, WorkerMessage};
use crate::types::FailurePolicy;
use crate::work::{RemoteCodec, WorkUnit};

use super::{BatchRun, RemoteSetup, TrialSettings};

/// Timeout for waiting for a worker's Hello frame.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// How to launch a worker process.
///
/// The program must answer the frame protocol on stdin/stdout for the unit
/// it is asked to serve (see [`crate::registry::WorkerRegistry::serve`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<OsString>,
    handshake_timeout: Duration,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            handshake_timeout: HANDSHAKE_TIMEOUT,
        }
    }

    /// Re-execute the running binary.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// A running worker with its pipes.
struct WorkerProcess {
    child: Child,
    writer: BufWriter<ChildStdin>,
    reader: BufReader<ChildStdout>,
    pid: u32,
}

impl WorkerProcess {
    /// Spawn a worker and wait for its Hello frame.
    fn spawn(command: &WorkerCommand, unit: &str) -> Result<Self, TrialError> {
        let spawn_failed = |reason: String| TrialError::WorkerSpawnFailed {
            program: command.program.display().to_string(),
            reason,
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| spawn_failed(e.to_string()))?;

        let pid = child.id();
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(spawn_failed("worker pipes unavailable".to_string()));
        };

        // Read the Hello off-thread so a silent worker cannot stall the trial.
        let (tx, rx) = mpsc::channel();
        let mut reader = BufReader::new(stdout);
        thread::spawn(move || {
            let hello = read_frame::<_, WorkerMessage>(&mut reader);
            let _ = tx.send((hello, reader));
        });

        let (hello, reader) = match rx.recv_timeout(command.handshake_timeout) {
            Ok(received) => received,
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(TrialError::WorkerHandshake {
                    reason: format!(
                        "worker {} sent no Hello within {}ms",
                        pid,
                        command.handshake_timeout.as_millis()
                    ),
                });
            }
        };

        let mut worker = Self {
            child,
            writer: BufWriter::new(stdin),
            reader,
            pid,
        };

        match hello {
            Ok(WorkerMessage::Hello { unit: served, .. }) if served == unit => {
                tracing::debug!(pid, unit, "Worker process ready");
                Ok(worker)
            }
            Ok(WorkerMessage::Hello { unit: served, .. }) => Err(TrialError::WorkerHandshake {
                reason: format!("worker {} serves '{}', expected '{}'", pid, served, unit),
            }),
            Ok(other) => Err(TrialError::WorkerHandshake {
                reason: format!("worker {} sent {:?} before Hello", pid, other),
            }),
            Err(e) => {
                let reason = worker.reap(&e);
                Err(TrialError::WorkerHandshake { reason })
            }
        }
    }

    /// Send one task and wait for its result.
    fn round_trip(
        &mut self,
        id: u64,
        input: Value,
        timeout_ms: Option<u64>,
    ) -> Result<Result<Value, WorkError>, FrameError> {
        write_frame(
            &mut self.writer,
            &SupervisorMessage::Task {
                id,
                input,
                timeout_ms,
            },
        )?;

        match read_frame(&mut self.reader)? {
            WorkerMessage::Done { id: done, output } if done == id => Ok(output),
            other => Err(FrameError::InvalidFrame {
                reason: format!("expected result for task {}, got {:?}", id, other),
            }),
        }
    }

    /// Collect the exit status of a worker whose pipe failed.
    fn reap(&mut self, cause: &FrameError) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("worker {} exited ({}): {}", self.pid, status, cause),
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
                format!("worker {} killed after protocol failure: {}", self.pid, cause)
            }
        }
    }

    /// Ask the worker to exit and wait for it.
    fn shutdown(mut self) {
        if write_frame(&mut self.writer, &SupervisorMessage::Shutdown).is_err() {
            tracing::debug!(pid = self.pid, "Worker already gone at shutdown");
        }
        let _ = self.child.wait();
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        // Kill the process if it is still running
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// State shared by the supervisor threads of one trial.
struct Dispatch<'a, W: WorkUnit> {
    batch: &'a [W::Input],
    codec: RemoteCodec<W>,
    command: &'a WorkerCommand,
    unit: &'a str,
    timeout_ms: Option<u64>,
    fail_fast: bool,
    queue: Mutex<VecDeque<usize>>,
    collector: Mutex<OutcomeCollector<W::Output>>,
    abort: AtomicBool,
}

impl<W: WorkUnit> Dispatch<'_, W> {
    fn next_index(&self) -> Option<usize> {
        if self.abort.load(Ordering::Acquire) {
            return None;
        }
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    fn record(&self, index: usize, result: Result<W::Output, WorkError>) {
        if result.is_err() && self.fail_fast {
            self.abort.store(true, Ordering::Release);
        }
        self.collector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(index, &self.batch[index], result);
    }

    /// Feed one worker until the queue drains or no worker can be started.
    fn supervise(&self, mut worker: WorkerProcess) {
        while let Some(index) = self.next_index() {
            let input = match (self.codec.encode_input)(&self.batch[index]) {
                Ok(value) => value,
                Err(e) => {
                    self.record(index, Err(e));
                    continue;
                }
            };

            match worker.round_trip(index as u64, input, self.timeout_ms) {
                Ok(output) => {
                    let result = output.and_then(self.codec.decode_output);
                    self.record(index, result);
                }
                Err(e) => {
                    let reason = worker.reap(&e);
                    tracing::warn!(index, reason = %reason, "Worker crashed mid-item");
                    self.record(index, Err(WorkError::WorkerCrashed { reason }));

                    match WorkerProcess::spawn(self.command, self.unit) {
                        Ok(replacement) => worker = replacement,
                        Err(e) => {
                            tracing::warn!(error = %e, "Could not replace crashed worker");
                            return;
                        }
                    }
                }
            }
        }
        worker.shutdown();
    }
}

pub(super) fn run<W: WorkUnit>(
    settings: &TrialSettings,
    batch: &Arc<[W::Input]>,
    unit: &str,
    remote: RemoteSetup<'_, W>,
) -> Result<BatchRun<W::Output>, TrialError> {
    let width = settings
        .effective_width(batch.len())
        .map(|w| w.get())
        .unwrap_or(1);

    // Start the whole pool before dispatching; a failure here aborts the trial.
    let mut workers = Vec::with_capacity(width);
    for _ in 0..width {
        workers.push(WorkerProcess::spawn(remote.command, unit)?);
    }
    tracing::debug!(width, items = batch.len(), unit, "Process pool started");

    let dispatch = Dispatch {
        batch,
        codec: remote.codec,
        command: remote.command,
        unit,
        timeout_ms: settings.timeout.map(|t| t.as_millis() as u64),
        fail_fast: settings.policy == FailurePolicy::FailFast,
        queue: Mutex::new((0..batch.len()).collect()),
        collector: Mutex::new(OutcomeCollector::new(batch.len())),
        abort: AtomicBool::new(false),
    };

    thread::scope(|scope| {
        for worker in workers {
            let dispatch = &dispatch;
            scope.spawn(move || dispatch.supervise(worker));
        }
    });

    let aborted = dispatch.abort.load(Ordering::Acquire);
    let collector = dispatch
        .collector
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let reason = if aborted {
        skip_reason(batch, collector.first_failure())
    } else {
        "no live worker process remained".to_string()
    };
    let (outcomes, completion_order) = collector.finish(batch, &reason);
    Ok(BatchRun {
        outcomes,
        completion_order,
    })
}
