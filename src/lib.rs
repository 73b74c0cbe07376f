//! Detection of resettled bets.
//!
//! A bet is resettled when it is settled a second time after its initial
//! settlement. Two input shapes are understood: a transaction log (an array
//! of account operations) and a ticket detail (a single ticket with its
//! settlement history). Detection only establishes that a resettlement
//! happened and surfaces the data; it never judges the amounts.

pub mod batch;
pub mod csv;
pub mod detect;
pub mod json;
pub mod model;
pub mod report;
pub mod status;

pub use batch::{BatchEntry, batch_detect, filter_resettled};
pub use detect::{
    DetectionResult, Method, detect, detect_from_ticket_detail, detect_from_transaction_log,
    detect_value,
};
pub use model::{Input, SettlementEntry, TicketDetail, TransactionRecord};
pub use report::{Locale, render_full, render_short};
pub use status::{BetStatus, status_name};
