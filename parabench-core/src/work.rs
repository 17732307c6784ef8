// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The work unit contract.
//!
//! A [`WorkUnit`] is an opaque, pure function from one input to one output.
//! The harness never inspects it; it only decides where and when to call it.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::WorkError;

/// Boxed future returned by [`WorkUnit::call_async`].
///
/// Not `Send`: cooperative tasks never leave the trial's single thread.
pub type WorkFuture<'a, O> = Pin<Box<dyn Future<Output = Result<O, WorkError>> + 'a>>;

/// Per-call context handed to the work unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    timeout: Option<Duration>,
}

impl CallContext {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Deadline the unit should apply to its own blocking I/O, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A caller-supplied unit of work.
pub trait WorkUnit: Send + Sync + 'static {
    type Input: Clone + fmt::Debug + Send + Sync + 'static;
    type Output: Clone + fmt::Debug + Send + 'static;

    /// Stable name, used to look the unit up inside worker processes.
    fn name(&self) -> &str;

    /// Blocking invocation used by the sequential and pool strategies.
    fn call(&self, input: &Self::Input, ctx: &CallContext) -> Result<Self::Output, WorkError>;

    /// Suspendable invocation used by the cooperative strategy.
    ///
    /// The default runs [`WorkUnit::call`] inline, which blocks the event
    /// loop; I/O-bound units should override it.
    fn call_async<'a>(
        &'a self,
        input: &'a Self::Input,
        ctx: &'a CallContext,
    ) -> WorkFuture<'a, Self::Output> {
        Box::pin(async move { self.call(input, ctx) })
    }
}

/// A work unit whose inputs and outputs can cross a process boundary.
///
/// Implemented for every [`WorkUnit`] with serde-capable types, so the bound
/// is checked by the compiler wherever a process pool is configured.
pub trait RemoteWorkUnit: WorkUnit {
    fn encode_input(input: &Self::Input) -> Result<Value, WorkError>;
    fn decode_input(value: Value) -> Result<Self::Input, WorkError>;
    fn encode_output(output: &Self::Output) -> Result<Value, WorkError>;
    fn decode_output(value: Value) -> Result<Self::Output, WorkError>;
}

impl<W> RemoteWorkUnit for W
where
    W: WorkUnit,
    W::Input: Serialize + DeserializeOwned,
    W::Output: Serialize + DeserializeOwned,
{
    fn encode_input(input: &Self::Input) -> Result<Value, WorkError> {
        serde_json::to_value(input).map_err(codec_error)
    }

    fn decode_input(value: Value) -> Result<Self::Input, WorkError> {
        serde_json::from_value(value).map_err(codec_error)
    }

    fn encode_output(output: &Self::Output) -> Result<Value, WorkError> {
        serde_json::to_value(output).map_err(codec_error)
    }

    fn decode_output(value: Value) -> Result<Self::Output, WorkError> {
        serde_json::from_value(value).map_err(codec_error)
    }
}

fn codec_error(err: serde_json::Error) -> WorkError {
    WorkError::Codec {
        message: err.to_string(),
    }
}

/// Supervisor-side half of the serialization boundary, captured while the
/// `RemoteWorkUnit` bound is in scope.
pub struct RemoteCodec<W: WorkUnit> {
    pub(crate) encode_input: fn(&W::Input) -> Result<Value, WorkError>,
    pub(crate) decode_output: fn(Value) -> Result<W::Output, WorkError>,
}

impl<W: RemoteWorkUnit> RemoteCodec<W> {
    pub fn new() -> Self {
        Self {
            encode_input: W::encode_input,
            decode_output: W::decode_output,
        }
    }
}

impl<W: RemoteWorkUnit> Default for RemoteCodec<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WorkUnit> Clone for RemoteCodec<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: WorkUnit> Copy for RemoteCodec<W> {}

/// Run a blocking call with panic capture and post-hoc deadline enforcement.
///
/// A call that returns after its deadline is recorded as a timeout even if
/// it produced a value.
pub fn guarded_call<T, F>(timeout: Option<Duration>, f: F) -> Result<T, WorkError>
where
    F: FnOnce() -> Result<T, WorkError>,
{
    let start = Instant::now();
    let result = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(WorkError::Panic {
            message: panic_message(payload.as_ref()),
        }),
    };

    let already_timed_out = matches!(result, Err(WorkError::Timeout { .. }));
    match timeout {
        Some(limit) if start.elapsed() > limit && !already_timed_out => {
            Err(WorkError::timeout(limit))
        }
        _ => result,
    }
}

/// Extract a printable message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Doubler;

    impl WorkUnit for Doubler {
        type Input = i64;
        type Output = i64;

        fn name(&self) -> &str {
            "doubler"
        }

        fn call(&self, input: &i64, _ctx: &CallContext) -> Result<i64, WorkError> {
            Ok(input * 2)
        }
    }

    #[test]
    fn test_guarded_call_passes_value() {
        assert_eq!(guarded_call(None, || Ok::<_, WorkError>(7)), Ok(7));
    }

    #[test]
    fn test_guarded_call_catches_panic() {
        let result: Result<(), WorkError> = guarded_call(None, || panic!("boom"));
        match result {
            Err(WorkError::Panic { message }) => assert_eq!(message, "boom"),
            other => panic!("expected panic failure, got {:?}", other),
        }
    }

    #[test]
    fn test_guarded_call_enforces_deadline() {
        let result = guarded_call(Some(Duration::from_millis(5)), || {
            thread::sleep(Duration::from_millis(30));
            Ok::<_, WorkError>(1)
        });
        assert_eq!(result, Err(WorkError::Timeout { limit_ms: 5 }));
    }

    #[test]
    fn test_remote_codec_roundtrip_through_value() {
        let codec = RemoteCodec::<Doubler>::new();
        let value = (codec.encode_input)(&21).unwrap();
        assert_eq!(value, serde_json::json!(21));
        assert_eq!((codec.decode_output)(serde_json::json!(42)).unwrap(), 42);
        assert!(matches!(
            (codec.decode_output)(serde_json::json!("nope")),
            Err(WorkError::Codec { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_call_async_delegates() {
        let ctx = CallContext::default();
        assert_eq!(Doubler.call_async(&5, &ctx).await, Ok(10));
    }
}
