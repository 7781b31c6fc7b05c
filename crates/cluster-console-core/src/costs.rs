// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cost monitoring view models and the reporting time window.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Length of the cost reporting window.
const REPORTING_WINDOW: Months = Months::new(12);

/// Body of the cost monitoring status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostMonitoringStatusResponse {
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostPeriod {
    pub start: String,
    pub end: String,
}

/// Cost of a cluster over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMonitoringData {
    pub amount: f64,
    pub period: CostPeriod,
    pub unit: String,
}

/// Body of the per-cluster cost query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMonitoringDataResponse {
    pub costs: Vec<CostMonitoringData>,
}

/// Calendar window covered by cost reports, as ISO-8601 UTC timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub from_date: String,
    pub to_date: String,
}

/// Builds the rolling twelve-month window ending at the start of `reference`'s UTC day.
///
/// The start is the same calendar day twelve months earlier. When that day
/// does not exist (29 February) it is clamped to the last day of the month.
pub fn compose_time_range(reference: DateTime<Utc>) -> TimeRange {
    let to_date = reference.date_naive();
    let from_date = to_date
        .checked_sub_months(REPORTING_WINDOW)
        .unwrap_or(NaiveDate::MIN);

    TimeRange {
        from_date: start_of_day(from_date),
        to_date: start_of_day(to_date),
    }
}

/// [`compose_time_range`] for the current instant.
pub fn compose_time_range_now() -> TimeRange {
    compose_time_range(Utc::now())
}

fn start_of_day(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `$` followed by the amount grouped in thousands, at most three decimals.
pub fn to_full_dollar_amount(value: f64) -> String {
    format!("${}", group_thousands(value))
}

/// Compact amount with a `K`/`M`/`G` suffix and one decimal, or two decimals below a thousand.
pub fn to_short_dollar_amount(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e9 {
        format!("{:.1}G", value / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (integer, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(rounded.len() + integer.len() / 3 + 1);
    if value < 0.0 && (integer != "0" || !fraction.is_empty()) {
        grouped.push('-');
    }
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if !fraction.is_empty() {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}
