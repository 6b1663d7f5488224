use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single scalar cell as it arrives from a sheet or a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Missing values and blank strings carry no information for a column.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

/// Renders a number the way it reads in a sheet: integers without a
/// fractional part, everything else in shortest round-trip form.
/// Magnitudes at or above `1e21` or below `1e-6` use exponent form (`1e+21`).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // covers -0.0
        "0".to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => formatted,
        }
    } else {
        format!("{}", n)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Empty => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> Visitor<'de> for CellVisitor {
            type Value = CellValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a scalar cell value (string, number, boolean or null)")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<CellValue, E> {
                Ok(v.into())
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CellValue, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellValue, E> {
                Ok(CellValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<CellValue, E> {
                Ok(CellValue::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CellValue, E> {
                Ok(CellValue::text(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<CellValue, E> {
                Ok(CellValue::Text(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
                Ok(CellValue::Empty)
            }

            fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
                Ok(CellValue::Empty)
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

/// One input row: a flat, insertion-ordered mapping of column name to cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    cells: Vec<(String, CellValue)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Sets `key` to `value`, keeping the original position if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((key, value)),
        }
    }

    /// Appends without checking for an existing key; callers guarantee uniqueness.
    pub(crate) fn push(&mut self, key: String, value: CellValue) {
        self.cells.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    /// Cells in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Collects cells with last-write-wins on repeated keys in one pass.
struct RowBuilder {
    positions: HashMap<String, usize>,
    cells: Vec<(String, CellValue)>,
}

impl RowBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: HashMap::with_capacity(capacity),
            cells: Vec::with_capacity(capacity),
        }
    }

    fn set(&mut self, key: String, value: CellValue) {
        match self.positions.get(&key) {
            Some(&slot) => self.cells[slot].1 = value,
            None => {
                self.positions.insert(key.clone(), self.cells.len());
                self.cells.push((key, value));
            }
        }
    }

    fn finish(self) -> RowRecord {
        RowRecord { cells: self.cells }
    }
}

impl<K, V> FromIterator<(K, V)> for RowRecord
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut builder = RowBuilder::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            builder.set(k.into(), v.into());
        }
        builder.finish()
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RowRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = RowRecord;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a flat object of column name to scalar value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RowRecord, A::Error> {
                let mut builder = RowBuilder::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, CellValue>()? {
                    builder.set(key, value);
                }
                Ok(builder.finish())
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}
