//! Bet status codes.

use std::fmt;

use serde_json::Value;

use crate::model::{as_integral, display_value};

/// Lifecycle stage of a ticket, as carried in `OldBetStatus`/`NewBetStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BetStatus {
    Opened,
    Pending,
    Won,
    Draw,
    Lost,
    Cancelled,
    Cashout,
}

impl BetStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Opened),
            1 => Some(Self::Pending),
            2 => Some(Self::Won),
            3 => Some(Self::Draw),
            4 => Some(Self::Lost),
            5 => Some(Self::Cancelled),
            6 => Some(Self::Cashout),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "Opened",
            Self::Pending => "Pending",
            Self::Won => "Won",
            Self::Draw => "Draw",
            Self::Lost => "Lost",
            Self::Cancelled => "Cancelled",
            Self::Cashout => "Cashout",
        }
    }

    /// Won, Draw and Lost. A first-ever settlement never starts from one of these.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Won | Self::Draw | Self::Lost)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name for a raw status code. Never fails: unknown codes render as
/// `Unknown(<code>)`.
pub fn status_name(code: &Value) -> String {
    match as_integral(code).and_then(BetStatus::from_code) {
        Some(status) => status.to_string(),
        None => format!("Unknown({})", display_value(code)),
    }
}

/// [`status_name`] for a field that may be absent; absent reads as `null`.
pub(crate) fn status_name_of(code: Option<&Value>) -> String {
    status_name(code.unwrap_or(&Value::Null))
}
