use std::cmp::Ordering;

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use crate::query::format_date_value;

/// One entry of the top debts list.
///
/// The remote side does not promise any types, so every field is kept as the
/// raw JSON value. A missing key is `None`, an explicit `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Debt {
    #[serde(default, deserialize_with = "present")]
    pub number: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub date: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
    #[serde(rename = "NIP", default, deserialize_with = "present")]
    pub nip: Option<Value>,
}

// Only called for keys that exist, so `null` stays a value
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Number,
    Name,
    Date,
    Value,
    Nip,
}

impl Column {
    /// Columns rendered in the table, in display order. `Number` is loaded but never shown.
    pub const SHOWN: [Column; 4] = [Column::Name, Column::Nip, Column::Value, Column::Date];

    pub fn key(self) -> &'static str {
        match self {
            Column::Number => "Number",
            Column::Name => "Name",
            Column::Date => "Date",
            Column::Value => "Value",
            Column::Nip => "NIP",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::Number => "Numer sprawy",
            Column::Name => "Dłużnik",
            Column::Date => "Data powstania zobowiązania",
            Column::Value => "Kwota zadłużenia",
            Column::Nip => "NIP",
        }
    }

    pub fn position(self) -> Option<usize> {
        Column::SHOWN.iter().position(|&c| c == self)
    }
}

impl Debt {
    pub fn field(&self, column: Column) -> Option<&Value> {
        match column {
            Column::Number => self.number.as_ref(),
            Column::Name => self.name.as_ref(),
            Column::Date => self.date.as_ref(),
            Column::Value => self.value.as_ref(),
            Column::Nip => self.nip.as_ref(),
        }
    }

    pub fn cell_text(&self, column: Column) -> String {
        let Some(value) = self.field(column) else {
            return String::new();
        };
        match column {
            Column::Date => format_date_value(value),
            _ => display_raw(value),
        }
    }

    /// Text the search term is matched against. Missing fields match as empty.
    pub fn searchable(&self, column: Column) -> String {
        self.field(column).map(search_text).unwrap_or_default()
    }
}

/// Text for a raw cell. Nothing is rendered for `null` and booleans.
pub fn display_raw(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(_) => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

/// Whole numbers are written without a fraction, so `1250.00` reads `1250`.
pub fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

/// String form used for matching. Falsy values (null, false, 0, "") match as empty.
pub fn search_text(value: &Value) -> String {
    if is_falsy(value) {
        return String::new();
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Relational comparison on raw values.
///
/// Strings compare by UTF-16 code units. Anything else is compared numerically
/// with `null` counting as 0. A pair with no numeric meaning (missing fields,
/// arrays, objects, non-numeric strings against numbers) is reported as `Equal`.
/// The result is not a total order for mixed columns.
pub fn compare_raw(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    if let (Some(Value::String(a)), Some(Value::String(b))) = (a, b) {
        return a.encode_utf16().cmp(b.encode_utf16());
    }
    match (a.and_then(as_number), b.and_then(as_number)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|f| !f.is_nan())
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_with_missing_and_extra_fields() {
        let debts: Vec<Debt> = serde_json::from_value(json!([
            {"Number": "A/1", "Name": "Kowalski", "NIP": "123", "Value": 100, "Date": "2023-01-01", "Id": 7},
            {"Name": "Nowak"}
        ]))
        .unwrap();

        assert_eq!(debts[0].name, Some(json!("Kowalski")));
        assert_eq!(debts[0].value, Some(json!(100)));
        assert_eq!(debts[1].nip, None);
        assert_eq!(debts[1].cell_text(Column::Nip), "");
        assert_eq!(debts[1].cell_text(Column::Date), "");
    }

    #[test]
    fn cell_text_formats_only_the_date() {
        let debt = Debt {
            name: Some(json!("Kowalski")),
            value: Some(json!(1250.5)),
            date: Some(json!("2024-03-05")),
            ..Debt::default()
        };
        assert_eq!(debt.cell_text(Column::Name), "Kowalski");
        assert_eq!(debt.cell_text(Column::Value), "1250.5");
        assert_eq!(debt.cell_text(Column::Date), "05-03-2024");
    }

    #[test]
    fn labels_and_shown_columns() {
        let labels: Vec<&str> = Column::SHOWN.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec!["Dłużnik", "NIP", "Kwota zadłużenia", "Data powstania zobowiązania"]
        );
        assert_eq!(Column::Number.label(), "Numer sprawy");
        assert_eq!(Column::Number.position(), None);
        assert_eq!(Column::Date.position(), Some(3));
    }

    #[test]
    fn falsy_values_search_as_empty() {
        assert_eq!(search_text(&json!(0)), "");
        assert_eq!(search_text(&json!(false)), "");
        assert_eq!(search_text(&Value::Null), "");
        assert_eq!(search_text(&json!(5261009190_u64)), "5261009190");
        assert_eq!(search_text(&json!("Nowak")), "Nowak");
    }

    #[test]
    fn explicit_null_is_kept_apart_from_a_missing_key() {
        let debts: Vec<Debt> =
            serde_json::from_value(json!([{"Name": null, "Value": null}, {}])).unwrap();
        assert_eq!(debts[0].name, Some(Value::Null));
        assert_eq!(debts[0].value, Some(Value::Null));
        assert_eq!(debts[1].value, None);
        assert_eq!(debts[0].cell_text(Column::Name), "");
        assert_eq!(debts[0].searchable(Column::Name), "");
        assert_eq!(debts[1].searchable(Column::Name), "");
    }

    #[test]
    fn whole_floats_are_written_without_a_fraction() {
        let debts: Vec<Debt> = serde_json::from_str(
            r#"[{"Value": 1250.00, "NIP": 5261009190.0}, {"Value": -0.0}, {"Value": 15230.45}]"#,
        )
        .unwrap();
        assert_eq!(debts[0].cell_text(Column::Value), "1250");
        assert_eq!(debts[0].searchable(Column::Nip), "5261009190");
        assert_eq!(debts[1].cell_text(Column::Value), "0");
        assert_eq!(debts[2].cell_text(Column::Value), "15230.45");
        assert_eq!(display_raw(&json!(42)), "42");
    }

    #[test]
    fn compare_numbers_numerically_and_strings_lexicographically() {
        let cmp = |a: Value, b: Value| compare_raw(Some(&a), Some(&b));
        assert_eq!(cmp(json!(50), json!(100)), Ordering::Less);
        assert_eq!(cmp(json!("50"), json!("100")), Ordering::Greater);
        assert_eq!(cmp(json!("100"), json!(50)), Ordering::Greater);
        assert_eq!(cmp(json!("abc"), json!(50)), Ordering::Equal);
        assert_eq!(cmp(json!("Nowak"), json!("Kowalski")), Ordering::Greater);
        // Upper case sorts before lower case, as with code unit order.
        assert_eq!(cmp(json!("Zet"), json!("abc")), Ordering::Less);
    }

    #[test]
    fn null_compares_as_zero_and_missing_compares_equal() {
        let null = Value::Null;
        assert_eq!(compare_raw(Some(&null), Some(&json!(100))), Ordering::Less);
        assert_eq!(compare_raw(Some(&null), Some(&json!(-5))), Ordering::Greater);
        assert_eq!(compare_raw(Some(&null), Some(&json!("7"))), Ordering::Less);
        assert_eq!(compare_raw(None, Some(&json!(100))), Ordering::Equal);
        assert_eq!(compare_raw(Some(&json!(-5)), None), Ordering::Equal);
    }
}
