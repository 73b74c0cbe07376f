//! Input shapes accepted by the detector.
//!
//! Both shapes arrive as loosely typed JSON. Every field is optional and a
//! field holding the wrong JSON type reads as absent, so deserializing a
//! record from any JSON object never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `reqtypeid` of a credit operation.
pub const CREDIT_REQTYPE_ID: i64 = 12;

/// `operationType` of a credit operation.
pub const CREDIT_OPERATION_TYPE: &str = "credit_customer";

/// One entry in a transaction log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(
        rename = "operationType",
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_type: Option<String>,
    #[serde(
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub reqtypeid: Option<i64>,
    #[serde(
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub reqparams: Option<String>,
    #[serde(
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub queryparams: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Value>,
    #[serde(
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub creationdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requestid: Option<Value>,
    #[serde(rename = "opLogPurchaseId", skip_serializing_if = "Option::is_none")]
    pub op_log_purchase_id: Option<Value>,
    /// The record as received, unknown keys included. `Null` for records built in code.
    #[serde(skip)]
    pub raw: Value,
}

impl TransactionRecord {
    /// Read a record from JSON, keeping the original value alongside.
    pub fn from_value(value: Value) -> Self {
        Self {
            raw: value.clone(),
            ..record_or_default(value)
        }
    }

    /// The record as it should be reported: the original JSON when known.
    pub fn to_value(&self) -> Value {
        if self.raw.is_null() {
            serde_json::to_value(self).unwrap_or_default()
        } else {
            self.raw.clone()
        }
    }

    /// Whether this record pays out to the customer.
    ///
    /// Either discriminator is enough on its own.
    pub fn is_credit(&self) -> bool {
        self.operation_type.as_deref() == Some(CREDIT_OPERATION_TYPE)
            || self.reqtypeid == Some(CREDIT_REQTYPE_ID)
    }
}

/// One recorded status transition of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SettlementEntry {
    #[serde(
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_bet_status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_bet_status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<Value>,
    /// `Some(Value::Null)` when the key is present with a JSON null.
    #[serde(
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_balance: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_operation_id: Option<Value>,
}

/// A single ticket as returned by the ticket detail lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketDetail {
    #[serde(rename = "SQLTicketId", skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<Value>,
    #[serde(rename = "ReserveId", skip_serializing_if = "Option::is_none")]
    pub reserve_id: Option<Value>,
    /// Chronological; insertion order is preserved.
    #[serde(
        rename = "SettlementHistory",
        deserialize_with = "lenient::sequence",
        skip_serializing_if = "Option::is_none"
    )]
    pub settlement_history: Option<Vec<SettlementEntry>>,
    /// Input groups keyed by category, iterated in insertion order.
    #[serde(
        rename = "ProcessedInputs",
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub processed_inputs: Option<Map<String, Value>>,
}

/// A detector input, classified once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    TransactionLog(Vec<TransactionRecord>),
    TicketDetail(TicketDetail),
    /// Neither a sequence nor a keyed record.
    Invalid,
}

impl Input {
    pub fn from_value(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Input::TransactionLog(
                items.into_iter().map(TransactionRecord::from_value).collect(),
            ),
            value @ Value::Object(_) => Input::TicketDetail(record_or_default(value)),
            _ => Input::Invalid,
        }
    }
}

/// Deserialize a record, reading anything that is not an object as an empty record.
fn record_or_default<T: serde::de::DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Render a passthrough value the way it reads in a report: strings bare,
/// everything else as JSON text.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer reading of a JSON number, accepting integral floats such as `3.0`.
pub(crate) fn as_integral(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Loose truthiness: null, false, zero and the empty string are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Field deserializers that never fail on a type mismatch.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Value};

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(super::as_integral(&Value::deserialize(d)?))
    }

    pub fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
        Value::deserialize(d).map(Some)
    }

    pub fn sequence<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).unwrap_or_default())
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn object<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Map<String, Value>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => Some(map),
            _ => None,
        })
    }
}
