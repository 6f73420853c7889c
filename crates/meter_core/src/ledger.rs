//! Receipt hand-off and per-driver earnings bookkeeping.
//!
//! The engine never does I/O. Acknowledged receipts go to a [SummarySink];
//! [EarningsLedger] is the in-memory sink that keeps a running daily total and
//! a per-month ledger of closed days for each driver.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::summary::TripSummary;

/// Receives receipts once the operator acknowledges them.
pub trait SummarySink {
    fn record(&mut self, summary: &TripSummary);
}

impl SummarySink for Vec<TripSummary> {
    fn record(&mut self, summary: &TripSummary) {
        self.push(summary.clone());
    }
}

/// Full months of history an income certificate covers.
pub const CERTIFICATE_MONTHS: u32 = 3;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Renders as `<month name>_<year>`, e.g. `octubre_2026`.
impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        write!(f, "{}_{}", name, self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayEntry {
    pub day: u32,
    pub earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthReport {
    pub key: MonthKey,
    /// Sorted by day.
    pub days: Vec<DayEntry>,
    pub total: f64,
    pub has_data: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DriverLedger {
    daily_total: f64,
    months: BTreeMap<MonthKey, Vec<DayEntry>>,
}

impl DriverLedger {
    pub fn daily_total(&self) -> f64 {
        self.daily_total
    }

    /// Closes the working day: the running total is appended to `date`'s month
    /// (when positive) and reset to zero.
    pub fn close_day(&mut self, date: NaiveDate) -> Option<DayEntry> {
        let total = std::mem::take(&mut self.daily_total);
        if total <= 0.0 {
            return None;
        }
        let entry = DayEntry {
            day: date.day(),
            earnings: total,
        };
        self.months.entry(MonthKey::of(date)).or_default().push(entry);
        Some(entry)
    }

    pub fn month(&self, key: MonthKey) -> MonthReport {
        let mut days = self.months.get(&key).cloned().unwrap_or_default();
        days.sort_by_key(|d| d.day);
        MonthReport {
            key,
            total: days.iter().map(|d| d.earnings).sum(),
            has_data: !days.is_empty(),
            days,
        }
    }

    /// Months that have at least one closed day, newest first.
    pub fn months_with_data(&self) -> Vec<MonthKey> {
        self.months
            .iter()
            .filter(|(_, days)| !days.is_empty())
            .map(|(key, _)| *key)
            .rev()
            .collect()
    }

    /// The `count` full calendar months before `today`'s month, most recent first.
    pub fn trailing_months(&self, today: NaiveDate, count: u32) -> Vec<MonthReport> {
        let Some(first_of_month) = today.with_day(1) else {
            return Vec::new();
        };
        (1..=count)
            .filter_map(|back| first_of_month.checked_sub_months(Months::new(back)))
            .map(|date| self.month(MonthKey::of(date)))
            .collect()
    }

    /// Months an income certificate issued on `today` would cover, or `None`
    /// unless every one of them has closed days.
    pub fn certificate_window(&self, today: NaiveDate) -> Option<Vec<MonthReport>> {
        let window = self.trailing_months(today, CERTIFICATE_MONTHS);
        let complete = window.len() == CERTIFICATE_MONTHS as usize && window.iter().all(|m| m.has_data);
        complete.then_some(window)
    }
}

impl SummarySink for DriverLedger {
    fn record(&mut self, summary: &TripSummary) {
        self.daily_total += summary.cost;
    }
}

/// Ledgers keyed by driver id.
#[derive(Debug, Clone, Default)]
pub struct EarningsLedger {
    drivers: BTreeMap<String, DriverLedger>,
}

impl EarningsLedger {
    pub fn driver(&self, driver_id: &str) -> Option<&DriverLedger> {
        self.drivers.get(driver_id)
    }

    pub fn driver_mut(&mut self, driver_id: &str) -> &mut DriverLedger {
        self.drivers.entry(driver_id.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn receipt(cost: f64) -> TripSummary {
        crate::test_helpers::summary_with_cost(cost)
    }

    #[test]
    fn month_key_uses_spanish_names() {
        assert_eq!(MonthKey::of(date(2026, 10, 17)).to_string(), "octubre_2026");
        assert_eq!(MonthKey::of(date(2025, 1, 3)).to_string(), "enero_2025");
    }

    #[test]
    fn receipts_accumulate_until_day_is_closed() {
        let mut ledger = EarningsLedger::default();
        let driver = ledger.driver_mut("driver-1");
        driver.record(&receipt(71.0));
        driver.record(&receipt(120.0));
        assert_eq!(driver.daily_total(), 191.0);

        let entry = driver.close_day(date(2026, 10, 17)).expect("entry");
        assert_eq!(entry, DayEntry { day: 17, earnings: 191.0 });
        assert_eq!(driver.daily_total(), 0.0);
        assert_eq!(driver.close_day(date(2026, 10, 18)), None);

        let october = ledger
            .driver("driver-1")
            .expect("ledger")
            .month(MonthKey { year: 2026, month: 10 });
        assert_eq!(october.total, 191.0);
        assert!(ledger.driver("driver-2").is_none());
    }

    #[test]
    fn trailing_months_skip_the_current_month() {
        let mut driver = DriverLedger::default();
        for (d, cost) in [(date(2026, 7, 9), 300.0), (date(2026, 7, 2), 100.0), (date(2026, 9, 30), 50.0), (date(2026, 10, 1), 999.0)] {
            driver.record(&receipt(cost));
            driver.close_day(d);
        }

        let window = driver.trailing_months(date(2026, 10, 17), 3);
        let keys: Vec<String> = window.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["septiembre_2026", "agosto_2026", "julio_2026"]);
        assert_eq!(window[0].total, 50.0);
        assert!(!window[1].has_data);
        assert_eq!(window[2].days.iter().map(|d| d.day).collect::<Vec<_>>(), vec![2, 9]);
        assert_eq!(window[2].total, 400.0);

        assert_eq!(
            driver.months_with_data(),
            vec![
                MonthKey { year: 2026, month: 10 },
                MonthKey { year: 2026, month: 9 },
                MonthKey { year: 2026, month: 7 }
            ]
        );
    }

    #[test]
    fn certificate_needs_three_months_of_history() {
        let mut driver = DriverLedger::default();
        for d in [date(2026, 7, 15), date(2026, 9, 3), date(2026, 10, 2)] {
            driver.record(&receipt(200.0));
            driver.close_day(d);
        }
        // August is empty, and October is the current month.
        assert_eq!(driver.certificate_window(date(2026, 10, 17)), None);

        driver.record(&receipt(80.0));
        driver.close_day(date(2026, 8, 20));
        let window = driver.certificate_window(date(2026, 10, 17)).expect("complete window");
        let totals: Vec<f64> = window.iter().map(|m| m.total).collect();
        assert_eq!(totals, vec![200.0, 80.0, 200.0]);

        assert_eq!(DriverLedger::default().certificate_window(date(2026, 10, 17)), None);
    }

    #[test]
    fn trailing_months_cross_year_boundary() {
        let driver = DriverLedger::default();
        let keys: Vec<String> = driver
            .trailing_months(date(2026, 2, 10), 3)
            .iter()
            .map(|r| r.key.to_string())
            .collect();
        assert_eq!(keys, vec!["enero_2026", "diciembre_2025", "noviembre_2025"]);
    }
}
