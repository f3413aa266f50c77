//! # Confirmation Polling
//!
//! Polls the ledger until a submitted transaction reaches the requested
//! finality tier, fails, or the deadline elapses.

use crate::domain::{
    AttestationError, FinalityTier, Finalized, SubmissionHandle, TransactionStatus,
};
use crate::ports::LedgerQuery;
use std::time::Duration;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Lower bound on the poll period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Wait until `handle` has landed at `tier` or stronger.
///
/// The first poll happens immediately. Query failures are logged and
/// polling continues; the deadline bounds them. Dropping the returned
/// future abandons polling without side effects.
pub async fn await_finality(
    ledger: &dyn LedgerQuery,
    handle: &SubmissionHandle,
    tier: FinalityTier,
    deadline: Duration,
    poll_interval: Duration,
) -> Result<Finalized, AttestationError> {
    let started = Instant::now();

    let result = timeout(deadline, async {
        let mut ticker = interval(poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls: u32 = 0;

        loop {
            ticker.tick().await;
            polls += 1;

            match ledger.transaction_status(handle).await {
                Ok(TransactionStatus::Landed { slot, tier: landed }) if landed.satisfies(tier) => {
                    info!(handle = %handle, slot, tier = %landed, polls, "Transaction reached finality");
                    return Ok(Finalized {
                        handle: handle.clone(),
                        slot,
                        tier: landed,
                    });
                }
                Ok(TransactionStatus::Landed { slot, tier: landed }) => {
                    debug!(handle = %handle, slot, current = %landed, required = %tier, "Waiting for finality");
                }
                Ok(TransactionStatus::Pending) => {
                    debug!(handle = %handle, polls, "Transaction pending");
                }
                Ok(TransactionStatus::Failed { slot, reason }) => {
                    warn!(handle = %handle, slot, reason = %reason, "Transaction failed on ledger");
                    return Err(AttestationError::LedgerRejected(format!(
                        "failed in slot {slot}: {reason}"
                    )));
                }
                Ok(TransactionStatus::Dropped { reason }) => {
                    warn!(handle = %handle, reason = %reason, "Transaction dropped");
                    return Err(AttestationError::LedgerRejected(format!("dropped: {reason}")));
                }
                Err(e) => {
                    warn!(handle = %handle, error = %e, "Status query failed, will poll again");
                }
            }
        }
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(_) => {
            let waited_ms = started.elapsed().as_millis() as u64;
            warn!(handle = %handle, tier = %tier, waited_ms, "Confirmation deadline elapsed");
            Err(AttestationError::Timeout { tier, waited_ms })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionRecord, LedgerError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Returns scripted statuses in order, repeating the last one forever.
    struct ScriptedLedger {
        script: Mutex<VecDeque<Result<TransactionStatus, LedgerError>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedLedger {
        fn new(script: Vec<Result<TransactionStatus, LedgerError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: Mutex::new(0),
            }
        }

        fn polls(&self) -> u32 {
            *self.polls.lock()
        }
    }

    #[async_trait]
    impl LedgerQuery for ScriptedLedger {
        async fn transaction_status(
            &self,
            _handle: &SubmissionHandle,
        ) -> Result<TransactionStatus, LedgerError> {
            *self.polls.lock() += 1;
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }

        async fn execution_record(
            &self,
            _handle: &SubmissionHandle,
            _tier: FinalityTier,
        ) -> Result<Option<ExecutionRecord>, LedgerError> {
            Ok(None)
        }
    }

    fn landed(tier: FinalityTier) -> Result<TransactionStatus, LedgerError> {
        Ok(TransactionStatus::Landed { slot: 42, tier })
    }

    fn handle() -> SubmissionHandle {
        SubmissionHandle::new("sig")
    }

    const FAST: Duration = Duration::from_millis(2);

    #[tokio::test]
    async fn test_immediate_finality() {
        let ledger = ScriptedLedger::new(vec![landed(FinalityTier::Finalized)]);
        let finalized = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Confirmed,
            Duration::from_secs(1),
            FAST,
        )
        .await
        .unwrap();
        assert_eq!(finalized.slot, 42);
        assert_eq!(finalized.tier, FinalityTier::Finalized);
        assert_eq!(ledger.polls(), 1);
    }

    #[tokio::test]
    async fn test_progresses_through_tiers() {
        let ledger = ScriptedLedger::new(vec![
            Ok(TransactionStatus::Pending),
            landed(FinalityTier::Processed),
            landed(FinalityTier::Confirmed),
        ]);
        let finalized = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Confirmed,
            Duration::from_secs(1),
            FAST,
        )
        .await
        .unwrap();
        assert_eq!(finalized.tier, FinalityTier::Confirmed);
        assert_eq!(ledger.polls(), 3);
    }

    #[tokio::test]
    async fn test_timeout_when_never_final() {
        let ledger = ScriptedLedger::new(vec![landed(FinalityTier::Processed)]);
        let started = std::time::Instant::now();
        let result = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Finalized,
            Duration::from_millis(50),
            FAST,
        )
        .await;

        assert!(matches!(
            result,
            Err(AttestationError::Timeout {
                tier: FinalityTier::Finalized,
                ..
            })
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(ledger.polls() > 1);
    }

    #[tokio::test]
    async fn test_failed_transaction_is_terminal() {
        let ledger = ScriptedLedger::new(vec![Ok(TransactionStatus::Failed {
            slot: 7,
            reason: "InstructionError(0, InvalidInstructionData)".into(),
        })]);
        let result = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Confirmed,
            Duration::from_secs(1),
            FAST,
        )
        .await;
        match result {
            Err(AttestationError::LedgerRejected(detail)) => {
                assert!(detail.contains("InvalidInstructionData"))
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(ledger.polls(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_is_terminal() {
        let ledger = ScriptedLedger::new(vec![
            Ok(TransactionStatus::Pending),
            Ok(TransactionStatus::Dropped {
                reason: "blockhash expired".into(),
            }),
        ]);
        let result = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Confirmed,
            Duration::from_secs(1),
            FAST,
        )
        .await;
        assert!(matches!(result, Err(AttestationError::LedgerRejected(_))));
    }

    #[tokio::test]
    async fn test_transient_errors_keep_polling() {
        let ledger = ScriptedLedger::new(vec![
            Err(LedgerError::Transport("connection reset".into())),
            Err(LedgerError::Transport("connection reset".into())),
            landed(FinalityTier::Confirmed),
        ]);
        let result = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Confirmed,
            Duration::from_secs(1),
            FAST,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(ledger.polls(), 3);
    }

    #[tokio::test]
    async fn test_zero_poll_interval_does_not_panic() {
        let ledger = ScriptedLedger::new(vec![landed(FinalityTier::Confirmed)]);
        let result = await_finality(
            &ledger,
            &handle(),
            FinalityTier::Confirmed,
            Duration::from_secs(1),
            Duration::ZERO,
        )
        .await;
        assert!(result.is_ok());
    }
}
