// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Synthetic I/O-shaped workload: wait for a number of milliseconds.
//!
//! Blocking strategies sleep the calling thread; the cooperative strategy
//! suspends on a timer, so it behaves like a network wait without a network.

use std::time::Duration;

use parabench_core::{CallContext, WorkError, WorkFuture, WorkUnit};

/// Default batch: 20 waits of 100ms.
pub fn batch() -> Vec<u64> {
    vec![100; 20]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SleepUnit;

impl WorkUnit for SleepUnit {
    type Input = u64;
    type Output = u64;

    fn name(&self) -> &str {
        "sleep"
    }

    fn call(&self, ms: &u64, _ctx: &CallContext) -> Result<u64, WorkError> {
        std::thread::sleep(Duration::from_millis(*ms));
        Ok(*ms)
    }

    fn call_async<'a>(&'a self, ms: &'a u64, _ctx: &'a CallContext) -> WorkFuture<'a, u64> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(*ms)
        })
    }
}
