// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-item outcomes and the execution result of one trial.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WorkError;

/// A failed item, identified by its position and rendered input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Position of the input in the batch
    pub index: usize,
    /// The input value, rendered with `Debug`
    pub input: String,
    /// What went wrong
    pub error: WorkError,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} generated an exception: {}", self.input, self.error)
    }
}

/// The single outcome every input produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<O> {
    Success(O),
    Failure(FailureRecord),
}

impl<O> ItemOutcome<O> {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success(_))
    }

    pub fn value(&self) -> Option<&O> {
        match self {
            ItemOutcome::Success(value) => Some(value),
            ItemOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        match self {
            ItemOutcome::Success(_) => None,
            ItemOutcome::Failure(record) => Some(record),
        }
    }
}

/// Outcomes of one batch run, stored in input order.
#[derive(Debug, Clone)]
pub struct ExecutionResult<O> {
    outcomes: Vec<ItemOutcome<O>>,
    completion_order: Vec<usize>,
    elapsed: Duration,
}

impl<O> ExecutionResult<O> {
    pub(crate) fn new(
        outcomes: Vec<ItemOutcome<O>>,
        completion_order: Vec<usize>,
        elapsed: Duration,
    ) -> Self {
        Self {
            outcomes,
            completion_order,
            elapsed,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcomes indexed like the input batch.
    pub fn outcomes(&self) -> &[ItemOutcome<O>] {
        &self.outcomes
    }

    pub fn outcome(&self, index: usize) -> Option<&ItemOutcome<O>> {
        self.outcomes.get(index)
    }

    /// Input indexes in the order their outcomes were recorded.
    pub fn completion_order(&self) -> &[usize] {
        &self.completion_order
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.outcomes.iter().filter_map(ItemOutcome::failure)
    }

    /// Success values paired with their input index.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &O)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.value().map(|value| (index, value)))
    }

    /// Success values in input order, `None` for failed items.
    pub fn values(&self) -> Vec<Option<&O>> {
        self.outcomes.iter().map(ItemOutcome::value).collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Slot table strategies fill as items complete.
///
/// Slots never filled (aborted tasks, dead workers) become `Skipped`
/// failures on [`OutcomeCollector::finish`], so every input ends with
/// exactly one outcome.
pub(crate) struct OutcomeCollector<O> {
    slots: Vec<Option<ItemOutcome<O>>>,
    completion_order: Vec<usize>,
    first_failure: Option<usize>,
}

impl<O> OutcomeCollector<O> {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            completion_order: Vec::with_capacity(len),
            first_failure: None,
        }
    }

    /// Record an item's result. Later records for the same slot are ignored.
    pub(crate) fn record<I: fmt::Debug>(
        &mut self,
        index: usize,
        input: &I,
        result: Result<O, WorkError>,
    ) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if slot.is_some() {
            return;
        }

        let outcome = match result {
            Ok(value) => ItemOutcome::Success(value),
            Err(error) => {
                if self.first_failure.is_none() && !matches!(error, WorkError::Skipped { .. }) {
                    self.first_failure = Some(index);
                }
                ItemOutcome::Failure(FailureRecord {
                    index,
                    input: format!("{:?}", input),
                    error,
                })
            }
        };
        *slot = Some(outcome);
        self.completion_order.push(index);
    }

    /// Index of the first non-skip failure recorded, if any.
    pub(crate) fn first_failure(&self) -> Option<usize> {
        self.first_failure
    }

    pub(crate) fn finish<I: fmt::Debug>(
        self,
        inputs: &[I],
        reason: &str,
    ) -> (Vec<ItemOutcome<O>>, Vec<usize>) {
        let mut completion_order = self.completion_order;
        let outcomes = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    completion_order.push(index);
                    ItemOutcome::Failure(FailureRecord {
                        index,
                        input: inputs
                            .get(index)
                            .map(|input| format!("{:?}", input))
                            .unwrap_or_default(),
                        error: WorkError::Skipped {
                            reason: reason.to_string(),
                        },
                    })
                })
            })
            .collect();
        (outcomes, completion_order)
    }
}

/// Reason recorded for items skipped after a fail-fast abort.
pub(crate) fn skip_reason<I: fmt::Debug>(inputs: &[I], first_failure: Option<usize>) -> String {
    match first_failure.and_then(|index| inputs.get(index)) {
        Some(input) => format!("batch aborted after {:?} failed", input),
        None => "batch did not reach this item".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_fills_missing_slots() {
        let inputs = [1, 2, 3];
        let mut collector = OutcomeCollector::new(inputs.len());
        collector.record(2, &inputs[2], Ok("c"));
        collector.record(0, &inputs[0], Err(WorkError::failed("bad")));

        assert_eq!(collector.first_failure(), Some(0));
        let reason = skip_reason(&inputs, collector.first_failure());
        let (outcomes, order) = collector.finish(&inputs, &reason);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(order, vec![2, 0, 1]);
        assert!(outcomes[2].is_success());
        match &outcomes[1] {
            ItemOutcome::Failure(record) => {
                assert_eq!(record.input, "2");
                assert!(matches!(record.error, WorkError::Skipped { .. }));
                assert!(record.error.to_string().contains("1 failed"));
            }
            other => panic!("expected skipped item, got {:?}", other),
        }
    }

    #[test]
    fn test_collector_ignores_duplicate_records() {
        let inputs = ["a"];
        let mut collector = OutcomeCollector::new(1);
        collector.record(0, &inputs[0], Ok(1));
        collector.record(0, &inputs[0], Ok(2));
        collector.record(5, &inputs[0], Ok(3));

        let (outcomes, order) = collector.finish(&inputs, "unused");
        assert_eq!(outcomes, vec![ItemOutcome::Success(1)]);
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn test_execution_result_counts() {
        let result = ExecutionResult::new(
            vec![
                ItemOutcome::Success(true),
                ItemOutcome::Failure(FailureRecord {
                    index: 1,
                    input: "\"http://x\"".to_string(),
                    error: WorkError::Timeout { limit_ms: 10 },
                }),
            ],
            vec![1, 0],
            Duration::from_millis(1500),
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.values(), vec![Some(&true), None]);
        assert_eq!(result.successes().collect::<Vec<_>>(), vec![(0, &true)]);
        assert!((result.elapsed_secs() - 1.5).abs() < 1e-9);
        let failure = result.failures().next().unwrap();
        assert_eq!(
            failure.to_string(),
            "\"http://x\" generated an exception: timed out after 10ms"
        );
    }
}
