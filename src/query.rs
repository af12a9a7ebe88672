use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde_json::Value;
use tracing::trace;

use crate::debt::{Column, Debt, compare_raw, is_falsy, number_text};

/// Committed search terms shorter than this (but not empty) leave the list unfiltered.
pub const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub column: Column,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            column: Column::Name,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortConfig {
    /// Header click: the active column flips from ascending to descending,
    /// every other case starts ascending.
    pub fn toggle(&mut self, column: Column) {
        self.direction = if self.column == column && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.column = column;
    }

    pub fn indicator(&self, column: Column) -> &'static str {
        if self.column != column {
            return "";
        }
        match self.direction {
            SortDirection::Ascending => " ▲",
            SortDirection::Descending => " ▼",
        }
    }
}

// Return indices of the debts that match the committed search term, in their original order
pub fn filter_rows(debts: &[Debt], search: &str) -> Vec<usize> {
    // Characters, not UTF-16 units. The two only differ outside the Basic Multilingual Plane.
    let len = search.chars().count();
    if len > 0 && len < MIN_SEARCH_LEN {
        trace!("Search term \"{search}\" is too short, not filtering");
        return (0..debts.len()).collect();
    }

    let term = search.to_lowercase();
    debts
        .par_iter()
        .enumerate()
        .filter(|(_, debt)| {
            debt.searchable(Column::Name).to_lowercase().contains(&term)
                || debt.searchable(Column::Nip).to_lowercase().contains(&term)
        })
        .map(|(idx, _)| idx)
        .collect()
}

pub fn sort_rows(debts: &[Debt], rows: &mut [usize], sort: SortConfig) {
    merge_sort(rows, |a, b| {
        let ord = compare_raw(debts[a].field(sort.column), debts[b].field(sort.column));
        match sort.direction {
            SortDirection::Ascending => ord == Ordering::Greater,
            SortDirection::Descending => ord == Ordering::Less,
        }
    });
}

/// Stable bottom-up merge sort that only asks whether `a` goes after `b`.
///
/// The comparator does not need to be a total order. The result is always a
/// permutation of the input.
fn merge_sort<F>(rows: &mut [usize], mut after: F)
where
    F: FnMut(usize, usize) -> bool,
{
    let len = rows.len();
    let mut buf = rows.to_vec();
    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j, mut k) = (start, mid, start);
            while i < mid && j < end {
                if after(rows[i], rows[j]) {
                    buf[k] = rows[j];
                    j += 1;
                } else {
                    buf[k] = rows[i];
                    i += 1;
                }
                k += 1;
            }
            buf[k..k + mid - i].copy_from_slice(&rows[i..mid]);
            k += mid - i;
            buf[k..k + end - j].copy_from_slice(&rows[j..end]);
            start = end;
        }
        rows.copy_from_slice(&buf);
        width *= 2;
    }
}

pub fn visible_rows(debts: &[Debt], search: &str, sort: SortConfig) -> Vec<usize> {
    let mut rows = filter_rows(debts, search);
    sort_rows(debts, &mut rows, sort);
    rows
}

/// Formats a date as `DD-MM-YYYY`.
///
/// Empty input gives an empty string, anything that does not parse as a date
/// is returned unchanged.
pub fn format_date(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }
    match parse_date(date) {
        Some(d) => format!("{:02}-{:02}-{}", d.day(), d.month(), d.year()),
        None => date.to_string(),
    }
}

pub fn format_date_value(value: &Value) -> String {
    if is_falsy(value) {
        return String::new();
    }
    match value {
        Value::String(s) => format_date(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|d| {
                let d = d.with_timezone(&Local);
                format!("{:02}-{:02}-{}", d.day(), d.month(), d.year())
            })
            .unwrap_or_else(|| number_text(n)),
        other => other.to_string(),
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(date) {
        return Some(d.with_timezone(&Local).date_naive());
    }
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .map(|d| d.date())
        .or_else(|| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn debt(name: &str, nip: &str, value: Value, date: &str) -> Debt {
        Debt {
            name: Some(json!(name)),
            nip: Some(json!(nip)),
            value: Some(value),
            date: Some(json!(date)),
            ..Debt::default()
        }
    }

    fn fixture() -> Vec<Debt> {
        vec![
            debt("Nowak Sp. z o.o.", "5260250274", json!(100), "2023-01-01"),
            debt("KOWALSKI Jan", "1132853869", json!(50), "2022-06-15"),
            debt("Abc", "7010003214", json!(2000), "2021-02-28"),
            debt("Wiśniewski", "5261009190", json!(50), "2020-12-31"),
        ]
    }

    #[test]
    fn empty_search_keeps_everything_in_order() {
        let debts = fixture();
        assert_eq!(filter_rows(&debts, ""), vec![0, 1, 2, 3]);
    }

    #[test]
    fn short_search_bypasses_the_filter() {
        let debts = fixture();
        assert_eq!(filter_rows(&debts, "q"), vec![0, 1, 2, 3]);
        assert_eq!(filter_rows(&debts, "zz"), vec![0, 1, 2, 3]);
        // Counted in characters, not bytes
        assert_eq!(filter_rows(&debts, "śń"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn search_matches_name_or_nip_case_insensitive() {
        let debts = fixture();
        assert_eq!(filter_rows(&debts, "kowal"), vec![1]);
        assert_eq!(filter_rows(&debts, "NOWAK"), vec![0]);
        assert_eq!(filter_rows(&debts, "526"), vec![0, 3]);
        assert_eq!(filter_rows(&debts, "WIŚ"), vec![3]);
        assert!(filter_rows(&debts, "xyz").is_empty());
    }

    #[test]
    fn search_coerces_numbers_and_skips_missing_fields() {
        let debts = vec![
            Debt {
                name: Some(Value::Null),
                nip: Some(json!(5260250274_u64)),
                ..Debt::default()
            },
            Debt::default(),
        ];
        assert_eq!(filter_rows(&debts, "0250"), vec![0]);
        assert!(filter_rows(&debts, "null").is_empty());
    }

    #[test]
    fn every_kept_row_matches_and_every_dropped_row_does_not() {
        let debts = fixture();
        let term = "an";
        let long_term = "ski";
        assert_eq!(filter_rows(&debts, term).len(), debts.len());
        let kept = filter_rows(&debts, long_term);
        for (idx, d) in debts.iter().enumerate() {
            let matches = d.searchable(Column::Name).to_lowercase().contains(long_term)
                || d.searchable(Column::Nip).to_lowercase().contains(long_term);
            assert_eq!(kept.contains(&idx), matches);
        }
    }

    #[test]
    fn default_sort_is_name_ascending() {
        let debts = fixture();
        let rows = visible_rows(&debts, "", SortConfig::default());
        assert_eq!(rows, vec![2, 1, 0, 3]);
    }

    #[test]
    fn sort_by_value_is_stable_and_reversible() {
        let debts = fixture();
        let mut sort = SortConfig::default();
        sort.toggle(Column::Value);
        assert_eq!(visible_rows(&debts, "", sort), vec![1, 3, 0, 2]);

        sort.toggle(Column::Value);
        assert_eq!(sort.direction, SortDirection::Descending);
        assert_eq!(visible_rows(&debts, "", sort), vec![2, 0, 1, 3]);
    }

    #[test]
    fn string_values_sort_lexicographically() {
        let debts = vec![
            debt("a", "", json!("100"), ""),
            debt("b", "", json!("50"), ""),
            debt("c", "", json!("9"), ""),
        ];
        let sort = SortConfig {
            column: Column::Value,
            direction: SortDirection::Ascending,
        };
        assert_eq!(visible_rows(&debts, "", sort), vec![0, 1, 2]);
    }

    #[test]
    fn null_values_sort_as_zero() {
        let debts = vec![
            debt("a", "", json!(100), ""),
            debt("b", "", Value::Null, ""),
            debt("c", "", json!(-5), ""),
        ];
        let sort = SortConfig {
            column: Column::Value,
            direction: SortDirection::Ascending,
        };
        assert_eq!(visible_rows(&debts, "", sort), vec![2, 1, 0]);
    }

    #[test]
    fn mixed_type_column_sorts_without_panicking() {
        let pool = [
            json!("abc"),
            json!(50),
            json!("100"),
            json!("zz"),
            json!(7),
            json!("3"),
            Value::Null,
            json!("Xy"),
        ];
        let mut debts: Vec<Debt> = (0..67)
            .map(|i| debt(&format!("d{i}"), "", pool[(i * 5 + i / 3) % pool.len()].clone(), ""))
            .collect();
        debts.push(Debt::default());

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let sort = SortConfig {
                column: Column::Value,
                direction,
            };
            let mut rows = visible_rows(&debts, "", sort);
            assert_eq!(rows.len(), debts.len());
            rows.sort_unstable();
            assert_eq!(rows, (0..debts.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn merge_sort_is_stable() {
        let mut rows: Vec<usize> = (0..40).collect();
        merge_sort(&mut rows, |a, b| a % 3 > b % 3);
        let expected: Vec<usize> = (0..40)
            .filter(|i| i % 3 == 0)
            .chain((0..40).filter(|i| i % 3 == 1))
            .chain((0..40).filter(|i| i % 3 == 2))
            .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn sorting_is_a_permutation() {
        let debts = fixture();
        let sort = SortConfig {
            column: Column::Date,
            direction: SortDirection::Descending,
        };
        let mut rows = visible_rows(&debts, "", sort);
        assert_eq!(rows, vec![0, 1, 2, 3]);
        rows.sort_unstable();
        assert_eq!(rows, filter_rows(&debts, ""));
    }

    #[test]
    fn toggle_rules() {
        let mut sort = SortConfig::default();
        sort.toggle(Column::Name);
        assert_eq!(sort.direction, SortDirection::Descending);
        sort.toggle(Column::Name);
        assert_eq!(sort.direction, SortDirection::Ascending);

        sort.toggle(Column::Name);
        sort.toggle(Column::Nip);
        assert_eq!(
            sort,
            SortConfig {
                column: Column::Nip,
                direction: SortDirection::Ascending
            }
        );
    }

    #[test]
    fn indicator_only_on_active_column() {
        let mut sort = SortConfig::default();
        assert_eq!(sort.indicator(Column::Name), " ▲");
        assert_eq!(sort.indicator(Column::Value), "");
        sort.toggle(Column::Name);
        assert_eq!(sort.indicator(Column::Name), " ▼");
    }

    #[test]
    fn format_dates() {
        assert_eq!(format_date("2024-03-05"), "05-03-2024");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("not-a-date"), "not-a-date");
        assert_eq!(format_date("2016-10-25T00:00:00"), "25-10-2016");
        assert_eq!(format_date("2016-10-25T13:45:10.123"), "25-10-2016");
        assert_eq!(format_date("0987-01-09"), "09-01-987");
    }

    #[test]
    fn format_date_values() {
        assert_eq!(format_date_value(&json!("2022-06-15")), "15-06-2022");
        assert_eq!(format_date_value(&Value::Null), "");
        assert_eq!(format_date_value(&json!(0)), "");
        assert_eq!(format_date_value(&json!("garbage")), "garbage");
    }
}
