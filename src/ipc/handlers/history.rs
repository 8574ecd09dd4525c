// Author: Dustin Pilgrim
// License: MIT

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::mpsc;

use crate::core::{manager_msg::ManagerMsg, utils::format_duration_ms};
use crate::services::records::{TimeRecord, totals_by_day, totals_by_url};

use super::request;

pub const REPORT_HELP_MESSAGE: &str = r#"Usage:
  tabtime report
  tabtime report <day>
  tabtime report <from> <to>

Dates are YYYY-MM-DD in UTC. <to> is exclusive.
With no dates, today is reported.
"#;

/// `history <url>`
pub async fn handle_history(args: &str, tx: &mpsc::Sender<ManagerMsg>) -> String {
    let url = args.trim();
    if url.is_empty() {
        return "ERROR: missing url\n\nUsage: tabtime history <url>".to_string();
    }

    let url_owned = url.to_string();
    match request(tx, |reply| ManagerMsg::History {
        url: url_owned,
        reply,
    })
    .await
    {
        Ok(Ok(records)) => format_history(url, &records),
        Ok(Err(e)) => format!("ERROR: {e}"),
        Err(e) => e,
    }
}

/// `report [<from> [<to>]]`
pub async fn handle_report(args: &str, tx: &mpsc::Sender<ManagerMsg>) -> String {
    let args = args.trim();
    if matches!(args, "help" | "-h" | "--help") {
        return REPORT_HELP_MESSAGE.to_string();
    }

    let (from, to) = match parse_range(args, Utc::now().date_naive()) {
        Ok(r) => r,
        Err(e) => return format!("{e}\n\n{REPORT_HELP_MESSAGE}"),
    };

    let (start, end) = (day_start(from), day_start(to));
    match request(tx, |reply| ManagerMsg::Report { start, end, reply }).await {
        Ok(Ok(records)) => format_report(from, to, &records),
        Ok(Err(e)) => format!("ERROR: {e}"),
        Err(e) => e,
    }
}

fn day_start(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("ERROR: invalid date '{s}'"))
}

fn next_day(d: NaiveDate) -> Result<NaiveDate, String> {
    d.succ_opt()
        .ok_or_else(|| format!("ERROR: date out of range '{d}'"))
}

/// Half-open day range `[from, to)`.
fn parse_range(args: &str, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), String> {
    let parts: Vec<&str> = args.split_whitespace().collect();

    let (from, to) = match parts.as_slice() {
        [] => (today, next_day(today)?),
        [day] => {
            let d = parse_date(day)?;
            (d, next_day(d)?)
        }
        [from, to] => (parse_date(from)?, parse_date(to)?),
        _ => return Err("ERROR: too many arguments".to_string()),
    };

    if to <= from {
        return Err(format!("ERROR: empty range {from} .. {to}"));
    }

    Ok((from, to))
}

fn format_history(url: &str, records: &[TimeRecord]) -> String {
    if records.is_empty() {
        return format!("No time recorded for {url}\n");
    }

    let total: u64 = records.iter().map(|r| r.duration_millis).sum();
    let mut out = format!(
        "{url}: {} over {} record(s)\n",
        format_duration_ms(total),
        records.len()
    );

    // most recent first
    let mut recent: Vec<&TimeRecord> = records.iter().collect();
    recent.sort_by_key(|r| std::cmp::Reverse((r.recorded_at(), r.id)));

    for r in recent {
        out.push_str(&format!(
            "  {}  {}\n",
            r.timestamp,
            format_duration_ms(r.duration_millis)
        ));
    }

    out
}

fn format_report(from: NaiveDate, to: NaiveDate, records: &[TimeRecord]) -> String {
    let mut out = format!("Report {from} .. {to} (exclusive)\n");

    if records.is_empty() {
        out.push_str("  nothing recorded\n");
        return out;
    }

    let total: u64 = records.iter().map(|r| r.duration_millis).sum();
    out.push_str(&format!("Total: {}\n", format_duration_ms(total)));

    out.push_str("\nBy day:\n");
    for (day, ms) in totals_by_day(records) {
        out.push_str(&format!("  {day}  {}\n", format_duration_ms(ms)));
    }

    out.push_str("\nBy url:\n");
    for (url, ms) in totals_by_url(records) {
        out.push_str(&format!("  {:>12}  {url}\n", format_duration_ms(ms)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(url: &str, ms: u64, ts: &str) -> TimeRecord {
        TimeRecord {
            id: ms,
            url: url.to_string(),
            duration_millis: ms,
            timestamp: ts.to_string(),
        }
    }

    #[test]
    fn range_defaults_to_today() {
        let today = date("2026-03-04");
        assert_eq!(
            parse_range("", today),
            Ok((date("2026-03-04"), date("2026-03-05")))
        );
        assert_eq!(
            parse_range("2026-01-31", today),
            Ok((date("2026-01-31"), date("2026-02-01")))
        );
        assert_eq!(
            parse_range("2026-01-01 2026-02-01", today),
            Ok((date("2026-01-01"), date("2026-02-01")))
        );
    }

    #[test]
    fn range_rejects_bad_input() {
        let today = date("2026-03-04");
        assert!(parse_range("2026-02-01 2026-01-01", today).is_err());
        assert!(parse_range("2026-02-01 2026-02-01", today).is_err());
        assert!(parse_range("yesterday", today).is_err());
        assert!(parse_range("a b c", today).is_err());
    }

    #[test]
    fn report_lists_days_and_urls() {
        let records = vec![
            record("https://a.example/", 60_000, "2026-03-04T10:00:00Z"),
            record("https://b.example/", 5_000, "2026-03-04T11:00:00Z"),
            record("https://a.example/", 1_000, "2026-03-05T09:00:00Z"),
        ];

        let out = format_report(date("2026-03-04"), date("2026-03-06"), &records);
        assert!(out.contains("Total: 1m 6s"));
        assert!(out.contains("2026-03-04  1m 5s"));
        assert!(out.contains("2026-03-05  1s"));

        let a = out.find("https://a.example/").expect("a listed");
        let b = out.find("https://b.example/").expect("b listed");
        assert!(a < b, "largest total first");
    }

    #[test]
    fn history_sums_records() {
        let records = vec![
            record("u", 10_000, "2026-03-04T10:00:00Z"),
            record("u", 5_000, "2026-03-04T10:00:10Z"),
        ];
        let out = format_history("u", &records);
        assert!(out.starts_with("u: 15s over 2 record(s)"));

        let newer = out.find("2026-03-04T10:00:10Z").expect("newer listed");
        let older = out.find("2026-03-04T10:00:00Z").expect("older listed");
        assert!(newer < older, "most recent first");
        assert_eq!(format_history("u", &[]), "No time recorded for u\n");
    }
}
