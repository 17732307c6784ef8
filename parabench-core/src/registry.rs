//! Worker-side registry of remotely callable work units.
//!
//! A worker process is told only a unit name. It looks the unit up here and
//! serves frames until the supervisor says to stop.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;

use crate::error::{FrameError, ParabenchError, ParabenchResult, WorkError};
use crate::protocol::{read_frame, write_frame, SupervisorMessage, WorkerMessage};
use crate::work::{guarded_call, CallContext, RemoteWorkUnit};

/// Type-erased unit taking and returning JSON values.
trait ErasedUnit: Send + Sync {
    fn call_value(&self, input: Value, ctx: &CallContext) -> Result<Value, WorkError>;
}

struct Erased<W>(W);

impl<W: RemoteWorkUnit> ErasedUnit for Erased<W> {
    fn call_value(&self, input: Value, ctx: &CallContext) -> Result<Value, WorkError> {
        let input = W::decode_input(input)?;
        let output = self.0.call(&input, ctx)?;
        W::encode_output(&output)
    }
}

/// Thread-safe name → unit table.
#[derive(Default)]
pub struct WorkerRegistry {
    units: DashMap<String, Arc<dyn ErasedUnit>>,
}

impl WorkerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            units: DashMap::new(),
        }
    }

    /// Register a unit under its own name.
    /// Returns an error if the name is taken.
    pub fn register<W: RemoteWorkUnit>(&self, unit: W) -> ParabenchResult<()> {
        let name = unit.name().to_string();

        if self.units.contains_key(&name) {
            return Err(ParabenchError::UnitAlreadyRegistered { name });
        }

        self.units.insert(name, Arc::new(Erased(unit)));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Run the worker loop for `name` over the given pipes.
    ///
    /// Sends Hello, then answers Task frames until Shutdown or end of stream.
    pub fn serve<R: Read, W: Write>(
        &self,
        name: &str,
        mut reader: R,
        mut writer: W,
    ) -> ParabenchResult<()> {
        let unit = self
            .units
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ParabenchError::UnitNotRegistered {
                name: name.to_string(),
            })?;

        write_frame(
            &mut writer,
            &WorkerMessage::Hello {
                unit: name.to_string(),
                pid: std::process::id(),
            },
        )?;

        loop {
            let message = match read_frame::<_, SupervisorMessage>(&mut reader) {
                Ok(message) => message,
                Err(FrameError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            };

            match message {
                SupervisorMessage::Task {
                    id,
                    input,
                    timeout_ms,
                } => {
                    let timeout = timeout_ms.map(Duration::from_millis);
                    let ctx = CallContext::new(timeout);
                    let output = guarded_call(timeout, || unit.call_value(input, &ctx));
                    write_frame(&mut writer, &WorkerMessage::Done { id, output })?;
                }
                SupervisorMessage::Shutdown => break,
            }
        }

        tracing::debug!(unit = name, "Worker loop finished");
        Ok(())
    }
}
