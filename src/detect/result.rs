//! The structured outcome of a detection.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{SettlementEntry, TransactionRecord};
use crate::status::status_name_of;

use super::extract;

/// Which heuristic decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    #[serde(rename = "No credit operations found")]
    NoCreditOperations,
    #[serde(rename = "Single credit operation without resettlement flag")]
    SingleCreditWithoutFlag,
    #[serde(rename = "IsResettlement flag in XML")]
    ResettlementFlag,
    #[serde(rename = "Multiple credit_customer operations")]
    MultipleCreditOperations,
    #[serde(rename = "Multiple settlement history entries")]
    MultipleSettlementEntries,
    #[serde(rename = "Status change from settled state")]
    StatusChangeFromSettled,
    #[serde(rename = "Multiple processed inputs")]
    MultipleProcessedInputs,
    #[serde(rename = "No resettlement detected in ticket detail")]
    NoTicketResettlement,
    #[serde(rename = "Invalid data format")]
    InvalidFormat,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCreditOperations => "No credit operations found",
            Self::SingleCreditWithoutFlag => "Single credit operation without resettlement flag",
            Self::ResettlementFlag => "IsResettlement flag in XML",
            Self::MultipleCreditOperations => "Multiple credit_customer operations",
            Self::MultipleSettlementEntries => "Multiple settlement history entries",
            Self::StatusChangeFromSettled => "Status change from settled state",
            Self::MultipleProcessedInputs => "Multiple processed inputs",
            Self::NoTicketResettlement => "No resettlement detected in ticket detail",
            Self::InvalidFormat => "Invalid data format",
        }
    }

    /// True exactly for the five heuristics that signal a resettlement.
    pub fn is_resettlement_method(&self) -> bool {
        matches!(
            self,
            Self::ResettlementFlag
                | Self::MultipleCreditOperations
                | Self::MultipleSettlementEntries
                | Self::StatusChangeFromSettled
                | Self::MultipleProcessedInputs
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message carried by [`DetectionResult::invalid`].
pub const INVALID_FORMAT_ERROR: &str = "Data must be an array or object";

/// Normalized view of one credit operation from a transaction log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditOperation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Value>,
    pub old_status: String,
    pub new_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,
}

impl CreditOperation {
    /// Statuses default to `"Unknown"` when `reqparams` carries no transition.
    pub fn from_record(record: &TransactionRecord) -> Self {
        let transition = record
            .reqparams
            .as_deref()
            .and_then(extract::status_transition);
        let (old_status, new_status) = match transition {
            Some(t) => (t.old_status.to_string(), t.new_status.to_string()),
            None => (extract::UNKNOWN_STATUS.into(), extract::UNKNOWN_STATUS.into()),
        };

        Self {
            id: record.id.clone(),
            date: record.creationdate.clone(),
            amount: record.amount.clone(),
            balance: record.balance.clone(),
            old_status,
            new_status,
            request_id: record.requestid.clone(),
        }
    }
}

/// An entry of `operations`: the normalized descriptor, or the record as
/// received when a single flagged credit is reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationEntry {
    Credit(CreditOperation),
    Record(Value),
}

impl OperationEntry {
    pub fn to_credit_operation(&self) -> CreditOperation {
        match self {
            Self::Credit(op) => op.clone(),
            Self::Record(raw) => {
                CreditOperation::from_record(&TransactionRecord::from_value(raw.clone()))
            }
        }
    }
}

/// Normalized view of one settlement history entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub old_status: String,
    pub new_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_balance: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_operation_id: Option<Value>,
}

impl SettlementDetail {
    pub fn from_entry(entry: &SettlementEntry) -> Self {
        Self {
            previous_balance: entry.previous_balance.clone(),
            account_operation_id: entry.account_operation_id.clone(),
            ..Self::transition(entry)
        }
    }

    /// Only the transition itself: time, statuses, gain and operator.
    pub fn transition(entry: &SettlementEntry) -> Self {
        Self {
            date: entry.date_updated.clone(),
            old_status: status_name_of(entry.old_bet_status.as_ref()),
            new_status: status_name_of(entry.new_bet_status.as_ref()),
            gain: entry.gain.clone(),
            previous_balance: None,
            employee_id: entry.employee_id.clone(),
            account_operation_id: None,
        }
    }

    /// A positive employee id means a human operator applied the settlement.
    pub fn manual_operator(&self) -> Option<&Value> {
        self.employee_id
            .as_ref()
            .filter(|id| id.as_f64().is_some_and(|n| n > 0.0))
    }
}

/// Outcome of running a detector over one input.
///
/// `is_resettlement` is derived from `method`, and only the positive
/// heuristics attach `operations` or `settlements`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_resettlement: bool,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<OperationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlements: Option<Vec<SettlementDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_inputs: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    pub fn new(method: Method) -> Self {
        Self {
            is_resettlement: method.is_resettlement_method(),
            method,
            credit_count: None,
            settlement_count: None,
            input_count: None,
            operations: None,
            settlements: None,
            ticket_id: None,
            purchase_id: None,
            processed_inputs: None,
            error: None,
        }
    }

    /// Result for an input that is neither a sequence nor a keyed record.
    pub fn invalid() -> Self {
        Self {
            error: Some(INVALID_FORMAT_ERROR.to_string()),
            ..Self::new(Method::InvalidFormat)
        }
    }

    /// Number of settlements (or credits) behind the detection, `0` if neither applies.
    pub fn count(&self) -> usize {
        self.settlement_count
            .filter(|&n| n > 0)
            .or(self.credit_count.filter(|&n| n > 0))
            .unwrap_or(0)
    }
}
