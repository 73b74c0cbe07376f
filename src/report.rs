//! Human readable rendering of a [`DetectionResult`].
//!
//! Rendering never mutates the result and never fails: missing data renders
//! as `N/A`, unparseable timestamps render verbatim.

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::detect::{CreditOperation, DetectionResult, Method, SettlementDetail};
use crate::model::{display_value, is_truthy};

const BANNER: &str = "━━━━━━━━━━━━━━━━";
const DIVIDER: &str = "─────────────────";
const NOT_AVAILABLE: &str = "N/A";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Report language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// Traditional Chinese.
    #[default]
    Zh,
    En,
}

#[derive(Debug, Error)]
#[error("unsupported locale '{0}', expected 'zh' or 'en'")]
pub struct UnknownLocale(String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" => Ok(Self::Zh),
            "en" => Ok(Self::En),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

/// Localized description of a detection method. English keeps the raw tag,
/// and so does Chinese for tags without a translation.
pub fn method_description(method: Method, locale: Locale) -> &'static str {
    match (locale, method) {
        (Locale::Zh, Method::MultipleSettlementEntries) => "多次結算記錄",
        (Locale::Zh, Method::MultipleCreditOperations) => "多次信用操作",
        (Locale::Zh, Method::StatusChangeFromSettled) => "從已結算狀態變更",
        (Locale::Zh, Method::MultipleProcessedInputs) => "多次處理輸入",
        (Locale::Zh, Method::ResettlementFlag) => "XML重新結算標記",
        (_, method) => method.as_str(),
    }
}

/// Full multi-section report for `result`.
pub fn render_full(result: &DetectionResult, locale: Locale) -> String {
    FullReport { result, locale }.to_string()
}

/// One-line count summary.
pub fn render_short(result: &DetectionResult) -> String {
    if !result.is_resettlement {
        return "✅ 無重新結算".to_string();
    }
    format!("⚠️ 重新結算 ({}次)", result.count())
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS` in the process local time zone.
pub fn format_datetime(raw: Option<&str>) -> String {
    format_datetime_in(raw, &Local)
}

/// Like [`format_datetime`], in an explicit time zone.
///
/// Empty or absent input renders `N/A`; input that does not parse is
/// returned unchanged.
pub fn format_datetime_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return NOT_AVAILABLE.to_string(),
    };

    match parse_timestamp(raw.trim(), tz) {
        Some(timestamp) => timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => raw.to_string(),
    }
}

/// Zoned timestamps are converted into `tz`, naive date-times are read as
/// local to `tz`, bare dates as UTC midnight.
fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(tz));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return tz.from_local_datetime(&naive).earliest();
    }

    let midnight = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(tz))
}

fn value_or_na(value: Option<&Value>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), display_value)
}

/// Absent and falsy amounts both render as `N/A`.
fn truthy_or_na(value: Option<&Value>) -> String {
    value_or_na(value.filter(|v| is_truthy(v)))
}

struct FullReport<'a> {
    result: &'a DetectionResult,
    locale: Locale,
}

impl FullReport<'_> {
    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let (title, ticket_label, method_label) = match self.locale {
            Locale::Zh => ("⚠️ 偵測到重新結算", "📋 注單ID", "🔍 檢測方式"),
            Locale::En => ("⚠️ RESETTLEMENT DETECTED", "📋 Ticket ID", "🔍 Detection Method"),
        };

        writeln!(f, "{title}")?;
        writeln!(f, "{BANNER}")?;
        writeln!(f)?;
        if let Some(ticket_id) = result.ticket_id.as_ref().filter(|id| is_truthy(id)) {
            writeln!(f, "{ticket_label}: {}", display_value(ticket_id))?;
        }
        if let Some(purchase_id) = result.purchase_id.as_ref().filter(|id| is_truthy(id)) {
            writeln!(f, "🎫 Purchase ID: {}", display_value(purchase_id))?;
        }
        writeln!(
            f,
            "{method_label}: {}",
            method_description(result.method, self.locale)
        )?;
        writeln!(f)
    }

    fn write_settlements(
        &self,
        f: &mut fmt::Formatter<'_>,
        settlements: &[SettlementDetail],
    ) -> fmt::Result {
        match self.locale {
            Locale::Zh => writeln!(f, "📊 結算歷程 (共 {} 次):", settlements.len())?,
            Locale::En => writeln!(f, "📊 Settlement History ({} times):", settlements.len())?,
        }
        writeln!(f, "{BANNER}")?;

        for (index, settlement) in settlements.iter().enumerate() {
            let n = index + 1;
            let time = format_datetime(settlement.date.as_deref());
            let gain = truthy_or_na(settlement.gain.as_ref());
            let transition = format!("{} → {}", settlement.old_status, settlement.new_status);

            match self.locale {
                Locale::Zh => {
                    write!(f, "\n【第 {n} 次結算】\n")?;
                    writeln!(f, "⏰ 時間: {time}")?;
                    writeln!(f, "📍 狀態變化: {transition}")?;
                    writeln!(f, "💰 金額: {gain}")?;
                    if let Some(balance) = &settlement.previous_balance {
                        writeln!(f, "💵 前次餘額: {}", display_value(balance))?;
                    }
                    match settlement.manual_operator() {
                        Some(id) => writeln!(f, "👤 操作: 人工介入 (ID: {})", display_value(id))?,
                        None => writeln!(f, "👤 操作: 系統自動")?,
                    }
                }
                Locale::En => {
                    write!(f, "\n【Settlement #{n}】\n")?;
                    writeln!(f, "⏰ Time: {time}")?;
                    writeln!(f, "📍 Status: {transition}")?;
                    writeln!(f, "💰 Amount: {gain}")?;
                    if let Some(balance) = &settlement.previous_balance {
                        writeln!(f, "💵 Previous Balance: {}", display_value(balance))?;
                    }
                    match settlement.manual_operator() {
                        Some(id) => writeln!(f, "👤 Operation: Manual (ID: {})", display_value(id))?,
                        None => writeln!(f, "👤 Operation: Automatic")?,
                    }
                }
            }

            if n < settlements.len() {
                writeln!(f, "{DIVIDER}")?;
            }
        }
        Ok(())
    }

    fn write_operations(
        &self,
        f: &mut fmt::Formatter<'_>,
        operations: &[CreditOperation],
    ) -> fmt::Result {
        match self.locale {
            Locale::Zh => writeln!(f, "📊 交易記錄 (共 {} 次):", operations.len())?,
            Locale::En => writeln!(f, "📊 Transaction Log ({} times):", operations.len())?,
        }
        writeln!(f, "{BANNER}")?;

        for (index, op) in operations.iter().enumerate() {
            let n = index + 1;
            let time = format_datetime(op.date.as_deref());
            let transition = format!("{} → {}", op.old_status, op.new_status);
            let amount = value_or_na(op.amount.as_ref());
            let balance = value_or_na(op.balance.as_ref());

            match self.locale {
                Locale::Zh => {
                    write!(f, "\n【第 {n} 次】\n")?;
                    writeln!(f, "⏰ 時間: {time}")?;
                    writeln!(f, "📍 狀態: {transition}")?;
                    writeln!(f, "💰 金額: {amount}")?;
                    writeln!(f, "💵 餘額: {balance}")?;
                }
                Locale::En => {
                    write!(f, "\n【Transaction #{n}】\n")?;
                    writeln!(f, "⏰ Time: {time}")?;
                    writeln!(f, "📍 Status: {transition}")?;
                    writeln!(f, "💰 Amount: {amount}")?;
                    writeln!(f, "💵 Balance: {balance}")?;
                }
            }

            if n < operations.len() {
                writeln!(f, "{DIVIDER}")?;
            }
        }
        Ok(())
    }

    fn write_footer(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{BANNER}\n")?;
        match self.locale {
            Locale::Zh => write!(f, "⚠️ 請注意：此注單經過重新結算\n建議核對最終結算金額與狀態"),
            Locale::En => write!(
                f,
                "⚠️ Note: This bet has been resettled\nPlease verify the final settlement amount and status"
            ),
        }
    }
}

impl Display for FullReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        if !result.is_resettlement {
            return match self.locale {
                Locale::Zh => f.write_str("✅ 此注單無重新結算記錄"),
                Locale::En => f.write_str("✅ No resettlement detected for this bet"),
            };
        }

        self.write_header(f)?;

        let settlements = result.settlements.as_deref().unwrap_or_default();
        let operations = result.operations.as_deref().unwrap_or_default();
        if !settlements.is_empty() {
            self.write_settlements(f, settlements)?;
        } else if !operations.is_empty() {
            let operations: Vec<_> = operations
                .iter()
                .map(|entry| entry.to_credit_operation())
                .collect();
            self.write_operations(f, &operations)?;
        }

        self.write_footer(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_value;
    use chrono::FixedOffset;
    use serde_json::json;

    fn ticket_result() -> DetectionResult {
        detect_value(&json!({
            "SQLTicketId": 775089054982303744u64,
            "ReserveId": 775089056288182272u64,
            "SettlementHistory": [
                { "DateUpdated": "not a date", "OldBetStatus": 0, "NewBetStatus": 3,
                  "Gain": 1000, "PreviousBalance": 0, "EmployeeId": 0 },
                { "DateUpdated": "", "OldBetStatus": 3, "NewBetStatus": 2,
                  "Gain": 0, "PreviousBalance": 1000, "EmployeeId": 1266 },
            ],
        }))
    }

    fn log_result() -> DetectionResult {
        detect_value(&json!([
            { "operationType": "credit_customer", "amount": "1000.00", "balance": "1000.00",
              "creationdate": "bad", "opLogPurchaseId": "P-9",
              "reqparams": r#"IsResettlement="0" OldStatus="Opened" NewStatus="Draw""# },
            { "operationType": "credit_customer", "amount": "1060.00",
              "reqparams": r#"IsResettlement="1" OldStatus="Draw" NewStatus="Won""# },
        ]))
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("zh".parse::<Locale>().unwrap(), Locale::Zh);
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn method_description_is_total() {
        assert_eq!(
            method_description(Method::MultipleSettlementEntries, Locale::Zh),
            "多次結算記錄"
        );
        assert_eq!(
            method_description(Method::MultipleSettlementEntries, Locale::En),
            "Multiple settlement history entries"
        );
        assert_eq!(
            method_description(Method::InvalidFormat, Locale::Zh),
            "Invalid data format"
        );
    }

    #[test]
    fn negative_results_render_fixed_confirmation() {
        let result = detect_value(&json!({}));
        assert_eq!(render_full(&result, Locale::Zh), "✅ 此注單無重新結算記錄");
        assert_eq!(
            render_full(&result, Locale::En),
            "✅ No resettlement detected for this bet"
        );
        assert_eq!(render_short(&result), "✅ 無重新結算");
        assert_eq!(render_short(&DetectionResult::invalid()), "✅ 無重新結算");
    }

    #[test]
    fn short_summary_counts() {
        assert_eq!(render_short(&ticket_result()), "⚠️ 重新結算 (2次)");
        assert_eq!(render_short(&log_result()), "⚠️ 重新結算 (2次)");

        let inputs = detect_value(&json!({ "ProcessedInputs": { "k": [1, 2, 3] } }));
        assert_eq!(render_short(&inputs), "⚠️ 重新結算 (0次)");
    }

    #[test]
    fn full_chinese_settlement_report() {
        let report = render_full(&ticket_result(), Locale::Zh);
        let expected = "\
⚠️ 偵測到重新結算
━━━━━━━━━━━━━━━━

📋 注單ID: 775089054982303744
🎫 Purchase ID: 775089056288182272
🔍 檢測方式: 多次結算記錄

📊 結算歷程 (共 2 次):
━━━━━━━━━━━━━━━━

【第 1 次結算】
⏰ 時間: not a date
📍 狀態變化: Opened → Draw
💰 金額: 1000
💵 前次餘額: 0
👤 操作: 系統自動
─────────────────

【第 2 次結算】
⏰ 時間: N/A
📍 狀態變化: Draw → Won
💰 金額: N/A
💵 前次餘額: 1000
👤 操作: 人工介入 (ID: 1266)

━━━━━━━━━━━━━━━━
⚠️ 請注意：此注單經過重新結算
建議核對最終結算金額與狀態";
        assert_eq!(report, expected);
    }

    #[test]
    fn full_english_operation_report() {
        let report = render_full(&log_result(), Locale::En);
        let expected = "\
⚠️ RESETTLEMENT DETECTED
━━━━━━━━━━━━━━━━

🎫 Purchase ID: P-9
🔍 Detection Method: Multiple credit_customer operations

📊 Transaction Log (2 times):
━━━━━━━━━━━━━━━━

【Transaction #1】
⏰ Time: bad
📍 Status: Opened → Draw
💰 Amount: 1000.00
💵 Balance: 1000.00
─────────────────

【Transaction #2】
⏰ Time: N/A
📍 Status: Draw → Won
💰 Amount: 1060.00
💵 Balance: N/A

━━━━━━━━━━━━━━━━
⚠️ Note: This bet has been resettled
Please verify the final settlement amount and status";
        assert_eq!(report, expected);
    }

    #[test]
    fn status_change_report_omits_previous_balance() {
        let result = detect_value(&json!({
            "SQLTicketId": 0,
            "SettlementHistory": [{ "OldBetStatus": 2, "NewBetStatus": 4, "Gain": -50, "PreviousBalance": 10 }],
        }));
        let report = render_full(&result, Locale::En);
        assert!(!report.contains("Ticket ID"));
        assert!(!report.contains("Previous Balance"));
        assert!(report.contains("📍 Status: Won → Lost\n"));
        assert!(report.contains("💰 Amount: -50\n"));
        assert!(report.contains("👤 Operation: Automatic\n"));
        assert!(!report.contains(DIVIDER));
    }

    #[test]
    fn settlements_take_precedence_over_operations() {
        let mut result = ticket_result();
        result.operations = log_result().operations;
        let report = render_full(&result, Locale::En);
        assert!(report.contains("Settlement History (2 times)"));
        assert!(!report.contains("Transaction Log"));
    }

    #[test]
    fn flagged_record_renders_through_normalization() {
        let result = detect_value(&json!([
            { "operationType": "credit_customer", "amount": 5, "creationdate": "2025-01-02T03:04:05Z",
              "reqparams": r#"IsResettlement="1" OldStatus="Lost" NewStatus="Won""# },
        ]));
        let report = render_full(&result, Locale::Zh);
        assert!(report.contains("🔍 檢測方式: XML重新結算標記\n"));
        assert!(report.contains("📍 狀態: Lost → Won\n"));
        assert!(report.contains("💰 金額: 5\n"));
    }

    #[test]
    fn rendering_leaves_result_untouched() {
        let result = ticket_result();
        let before = result.clone();
        let _ = render_full(&result, Locale::Zh);
        let _ = render_short(&result);
        assert_eq!(result, before);
    }

    #[test]
    fn datetime_formats_in_zone() {
        let utc8 = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            format_datetime_in(Some("2025-11-08T20:22:22.8257767Z"), &Utc),
            "2025-11-08 20:22:22"
        );
        assert_eq!(
            format_datetime_in(Some("2025-11-08T20:22:22.894Z"), &utc8),
            "2025-11-09 04:22:22"
        );
        assert_eq!(
            format_datetime_in(Some("2025-11-08T20:22:22+02:00"), &Utc),
            "2025-11-08 18:22:22"
        );
    }

    #[test]
    fn naive_datetime_is_local_to_zone() {
        let utc8 = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            format_datetime_in(Some("2025-03-04T05:06:07"), &utc8),
            "2025-03-04 05:06:07"
        );
        assert_eq!(
            format_datetime_in(Some("2025-03-04 05:06:07.5"), &Utc),
            "2025-03-04 05:06:07"
        );
    }

    #[test]
    fn bare_date_is_utc_midnight() {
        let minus5 = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            format_datetime_in(Some("2025-03-04"), &minus5),
            "2025-03-03 19:00:00"
        );
    }

    #[test]
    fn unparseable_datetime_is_returned_raw() {
        assert_eq!(format_datetime_in(None, &Utc), "N/A");
        assert_eq!(format_datetime_in(Some(""), &Utc), "N/A");
        assert_eq!(format_datetime_in(Some("yesterday"), &Utc), "yesterday");
        assert_eq!(format_datetime_in(Some("2025-13-40"), &Utc), "2025-13-40");
    }
}
