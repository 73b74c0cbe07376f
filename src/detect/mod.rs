//! Resettlement detection.
//!
//! Two detectors share one result type: the transaction-log detector counts
//! credit operations, the ticket-detail detector inspects the settlement
//! history and processed inputs. [`detect`] routes an [`Input`] to the right one.

use serde_json::Value;
use tracing::{debug, info};

use crate::model::{Input, TicketDetail, TransactionRecord, as_integral, is_truthy};
use crate::status::BetStatus;

pub mod extract;

mod result;
pub use result::{
    CreditOperation, DetectionResult, INVALID_FORMAT_ERROR, Method, OperationEntry,
    SettlementDetail,
};

/// Route an input to the matching detector.
pub fn detect(input: &Input) -> DetectionResult {
    match input {
        Input::TransactionLog(records) => detect_from_transaction_log(records),
        Input::TicketDetail(detail) => detect_from_ticket_detail(detail),
        Input::Invalid => {
            debug!("input is neither a sequence nor a keyed record");
            DetectionResult::invalid()
        }
    }
}

/// Classify a raw JSON value and detect.
pub fn detect_value(value: &Value) -> DetectionResult {
    detect(&Input::from_value(value))
}

/// Detect from an ordered transaction log:
/// - no credit operation: not resettled
/// - one credit operation: resettled only if flagged in `reqparams`
/// - two or more credit operations: resettled
pub fn detect_from_transaction_log(records: &[TransactionRecord]) -> DetectionResult {
    let credits: Vec<&TransactionRecord> = records.iter().filter(|r| r.is_credit()).collect();

    match credits.as_slice() {
        [] => {
            debug!(records = records.len(), "no credit operations");
            DetectionResult::new(Method::NoCreditOperations)
        }
        [single] => {
            let flagged = single
                .reqparams
                .as_deref()
                .is_some_and(extract::resettlement_flag);

            if !flagged {
                debug!("single credit operation without resettlement flag");
                return DetectionResult {
                    credit_count: Some(1),
                    ..DetectionResult::new(Method::SingleCreditWithoutFlag)
                };
            }

            info!(id = ?single.id, "resettlement flag set on credit operation");
            DetectionResult {
                credit_count: Some(1),
                operations: Some(vec![OperationEntry::Record(single.to_value())]),
                ..DetectionResult::new(Method::ResettlementFlag)
            }
        }
        [first, ..] => {
            let operations: Vec<_> = credits
                .iter()
                .map(|record| OperationEntry::Credit(CreditOperation::from_record(record)))
                .collect();
            let purchase_id = first
                .op_log_purchase_id
                .as_ref()
                .filter(|id| is_truthy(id))
                .cloned()
                .or_else(|| {
                    first
                        .queryparams
                        .as_deref()
                        .and_then(extract::purchase_id)
                        .map(|id| Value::String(id.to_string()))
                });

            info!(
                credits = credits.len(),
                purchase_id = ?purchase_id,
                "multiple credit operations"
            );
            DetectionResult {
                credit_count: Some(credits.len()),
                operations: Some(operations),
                purchase_id,
                ..DetectionResult::new(Method::MultipleCreditOperations)
            }
        }
    }
}

/// Detect from a single ticket. Heuristics in order, first match wins:
/// 1. more than one settlement history entry
/// 2. a single entry leaving an already settled status (Won, Draw, Lost)
/// 3. a processed input group holding more than one input
pub fn detect_from_ticket_detail(detail: &TicketDetail) -> DetectionResult {
    let history = detail.settlement_history.as_deref().unwrap_or_default();

    if history.len() > 1 {
        info!(
            ticket = ?detail.ticket_id,
            entries = history.len(),
            "multiple settlement history entries"
        );
        return DetectionResult {
            settlement_count: Some(history.len()),
            settlements: Some(history.iter().map(SettlementDetail::from_entry).collect()),
            ticket_id: detail.ticket_id.clone(),
            purchase_id: detail.reserve_id.clone(),
            ..DetectionResult::new(Method::MultipleSettlementEntries)
        };
    }

    if let [entry] = history {
        let from_settled = entry
            .old_bet_status
            .as_ref()
            .and_then(as_integral)
            .and_then(BetStatus::from_code)
            .is_some_and(|status| status.is_settled());

        if from_settled {
            info!(
                ticket = ?detail.ticket_id,
                old_status = ?entry.old_bet_status,
                "status change from settled state"
            );
            return DetectionResult {
                settlement_count: Some(1),
                settlements: Some(vec![SettlementDetail::transition(entry)]),
                ticket_id: detail.ticket_id.clone(),
                ..DetectionResult::new(Method::StatusChangeFromSettled)
            };
        }
        debug!(old_status = ?entry.old_bet_status, "single settlement from unsettled state");
    }

    if let Some(inputs) = &detail.processed_inputs {
        let repeated = inputs.iter().find_map(|(key, group)| {
            group
                .as_array()
                .filter(|group| group.len() > 1)
                .map(|group| (key, group.len()))
        });

        if let Some((key, count)) = repeated {
            info!(ticket = ?detail.ticket_id, key = %key, count, "multiple processed inputs");
            return DetectionResult {
                input_count: Some(count),
                processed_inputs: Some(inputs.clone()),
                ticket_id: detail.ticket_id.clone(),
                ..DetectionResult::new(Method::MultipleProcessedInputs)
            };
        }
    }

    debug!(ticket = ?detail.ticket_id, "no resettlement in ticket detail");
    DetectionResult::new(Method::NoTicketResettlement)
}
