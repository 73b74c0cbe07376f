//! Pattern extraction from the attribute-style fragments embedded in
//! `reqparams` and `queryparams`.
//!
//! The fragments have no formal grammar, so these are plain pattern matches.
//! A fragment that does not match yields `None`, never an error.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder status when a fragment carries no transition.
pub const UNKNOWN_STATUS: &str = "Unknown";

const RESETTLEMENT_FLAG: &str = r#"IsResettlement="1""#;

static STATUS_TRANSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"OldStatus="([^"]+)" NewStatus="([^"]+)""#).expect("valid status pattern")
});

static PURCHASE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""purchase_id":"([^"]+)""#).expect("valid purchase pattern"));

/// Status names as written in the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition<'a> {
    pub old_status: &'a str,
    pub new_status: &'a str,
}

/// Whether `reqparams` carries `IsResettlement="1"`.
pub fn resettlement_flag(reqparams: &str) -> bool {
    reqparams.contains(RESETTLEMENT_FLAG)
}

/// The `OldStatus="X" NewStatus="Y"` pair in `reqparams`, if present.
pub fn status_transition(reqparams: &str) -> Option<StatusTransition<'_>> {
    let caps = STATUS_TRANSITION.captures(reqparams)?;
    Some(StatusTransition {
        old_status: caps.get(1)?.as_str(),
        new_status: caps.get(2)?.as_str(),
    })
}

/// The `"purchase_id":"<value>"` field in `queryparams`, if present.
pub fn purchase_id(queryparams: &str) -> Option<&str> {
    PURCHASE_ID
        .captures(queryparams)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
