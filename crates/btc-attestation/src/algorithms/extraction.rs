//! # Result Extraction
//!
//! The verification program reports its result only through log output, so
//! the outcome is read by scanning the execution logs for a fixed marker.
//! If the program's log wording changes, every result silently becomes
//! `NotVerified`; `SUCCESS_MARKER` is the single place to update.

use crate::domain::{
    AttestationError, ExecutionRecord, FinalityTier, SubmissionHandle, VerificationOutcome,
};
use crate::ports::LedgerQuery;
use tracing::{debug, info, warn};

/// Log text the program emits after a successful verification.
pub const SUCCESS_MARKER: &str = "Signature verified on-chain!";

/// Scan log lines for the success marker.
///
/// Lines are matched by containment: the ledger prefixes program output
/// (`Program log: ...`).
pub fn scan_logs<S: AsRef<str>>(logs: &[S]) -> VerificationOutcome {
    logs.iter()
        .any(|line| line.as_ref().contains(SUCCESS_MARKER))
        .into()
}

/// Derive the outcome from an execution record.
pub fn outcome_from_record(record: &ExecutionRecord) -> VerificationOutcome {
    scan_logs(record.logs())
}

/// Fetch the execution record for `handle` once and scan it.
pub async fn extract_result(
    ledger: &dyn LedgerQuery,
    handle: &SubmissionHandle,
    tier: FinalityTier,
) -> Result<VerificationOutcome, AttestationError> {
    let record = match ledger.execution_record(handle, tier).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!(handle = %handle, "Execution record not found");
            return Err(AttestationError::RecordUnavailable(format!(
                "no execution record for {handle}"
            )));
        }
        Err(e) => {
            warn!(handle = %handle, error = %e, "Execution record fetch failed");
            return Err(AttestationError::RecordUnavailable(e.to_string()));
        }
    };

    debug!(
        handle = %handle,
        slot = record.slot,
        lines = record.logs().len(),
        "Scanning execution logs"
    );

    let outcome = outcome_from_record(&record);
    info!(handle = %handle, outcome = %outcome, "Extracted verification result");
    Ok(outcome)
}
