//! Correlation between a blocked request and the next transcription event.

use crate::store::TranscriptionRecord;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};

#[derive(Debug, Error)]
pub enum CorrelateError {
    /// No record arrived within the wait budget.
    #[error("timed out waiting for the next transcription")]
    Timeout,

    /// Another request is already waiting for the next record.
    #[error("a transcription request is already in flight")]
    Busy,
}

/// Bridges a request that must block until the next transcription arrives.
///
/// At most one correlation may be outstanding per correlator. A second
/// concurrent `await_next` is refused with [`CorrelateError::Busy`] rather
/// than allowed to steal the event intended for the first caller.
pub struct EventCorrelator {
    slot: Mutex<Option<oneshot::Sender<TranscriptionRecord>>>,
}

impl EventCorrelator {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Wait for the next published record, up to `timeout`.
    ///
    /// Exactly one terminal outcome per call: the first qualifying record,
    /// or `Timeout` once the budget elapses. Early resolution drops the
    /// timer; on timeout the listener slot is cleared, so a later record
    /// cannot resolve a request that already gave up.
    pub async fn await_next(
        &self,
        timeout: Duration,
    ) -> Result<TranscriptionRecord, CorrelateError> {
        let rx = {
            let mut slot = self.slot.lock().await;
            if slot.is_some() {
                return Err(CorrelateError::Busy);
            }
            let (tx, rx) = oneshot::channel();
            *slot = Some(tx);
            rx
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(record)) => Ok(record),
            // Sender dropped without publishing; nothing left to wait for.
            Ok(Err(_)) => Err(CorrelateError::Timeout),
            Err(_) => {
                let mut slot = self.slot.lock().await;
                // Only clear our own expired sender. If a publish consumed
                // it between the deadline and this lock, a successor may
                // already occupy the slot.
                if slot.as_ref().is_some_and(|tx| tx.is_closed()) {
                    *slot = None;
                }
                Err(CorrelateError::Timeout)
            }
        }
    }

    /// Hand a freshly stored record to the outstanding correlation, if any.
    ///
    /// Returns whether a waiter consumed it.
    pub async fn publish(&self, record: TranscriptionRecord) -> bool {
        let tx = self.slot.lock().await.take();
        match tx {
            Some(tx) => tx.send(record).is_ok(),
            None => false,
        }
    }
}

impl Default for EventCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn publish_resolves_waiter_with_payload() {
        let correlator = Arc::new(EventCorrelator::new());

        let waiter = {
            let correlator = correlator.clone();
            tokio::spawn(async move { correlator.await_next(Duration::from_secs(30)).await })
        };
        tokio::task::yield_now().await;

        let consumed = correlator
            .publish(TranscriptionRecord::new("hello".into()))
            .await;
        assert!(consumed);

        let record = waiter.await.unwrap().unwrap();
        assert_eq!(record.text, "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_budget_and_forgets_listener() {
        let correlator = EventCorrelator::new();

        // Paused clock: the 30s budget elapses without wall time passing.
        let result = correlator.await_next(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(CorrelateError::Timeout)));

        // The expired listener was removed; a late record finds no waiter.
        let consumed = correlator
            .publish(TranscriptionRecord::new("too late".into()))
            .await;
        assert!(!consumed);
    }

    #[tokio::test]
    async fn concurrent_await_is_refused() {
        let correlator = Arc::new(EventCorrelator::new());

        let first = {
            let correlator = correlator.clone();
            tokio::spawn(async move { correlator.await_next(Duration::from_secs(30)).await })
        };
        tokio::task::yield_now().await;

        // The source behavior let a second waiter steal the first waiter's
        // event; here the conflict is surfaced instead.
        let second = correlator.await_next(Duration::from_secs(30)).await;
        assert!(matches!(second, Err(CorrelateError::Busy)));

        // The first waiter is unaffected.
        correlator
            .publish(TranscriptionRecord::new("for the first".into()))
            .await;
        let record = first.await.unwrap().unwrap();
        assert_eq!(record.text, "for the first");
    }

    #[tokio::test]
    async fn publish_without_waiter_is_dropped() {
        let correlator = EventCorrelator::new();
        let consumed = correlator
            .publish(TranscriptionRecord::new("nobody home".into()))
            .await;
        assert!(!consumed);
    }

    #[tokio::test]
    async fn only_first_event_is_consumed() {
        let correlator = Arc::new(EventCorrelator::new());

        let waiter = {
            let correlator = correlator.clone();
            tokio::spawn(async move { correlator.await_next(Duration::from_secs(30)).await })
        };
        tokio::task::yield_now().await;

        assert!(
            correlator
                .publish(TranscriptionRecord::new("first".into()))
                .await
        );
        assert!(
            !correlator
                .publish(TranscriptionRecord::new("second".into()))
                .await
        );

        let record = waiter.await.unwrap().unwrap();
        assert_eq!(record.text, "first");
    }
}
