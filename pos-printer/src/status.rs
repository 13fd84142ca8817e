//! Printer status value
//!
//! A status is a flat mapping of named fields (`notOpen`, `offline`, plus
//! whatever the driver decodes). Field order is stable so snapshots serialize
//! deterministically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field set whenever the device could not be opened or was force-closed
pub const NOT_OPEN: &str = "notOpen";
/// Field reported by every driver's printer-status decoding
pub const OFFLINE: &str = "offline";

/// A single status field value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Bool(bool),
    Number(f64),
}

impl From<bool> for StatusValue {
    fn from(v: bool) -> Self {
        StatusValue::Bool(v)
    }
}

impl From<f64> for StatusValue {
    fn from(v: f64) -> Self {
        StatusValue::Number(v)
    }
}

/// Named status fields of one printer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrinterStatus {
    fields: BTreeMap<String, StatusValue>,
}

impl PrinterStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, name: &str, value: impl Into<StatusValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<StatusValue>) -> &mut Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> &mut Self {
        self.set(name, on)
    }

    pub fn get(&self, name: &str) -> Option<StatusValue> {
        self.fields.get(name).copied()
    }

    /// Boolean field value; missing or numeric fields read as `false`
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(StatusValue::Bool(true)))
    }

    pub fn not_open(&self) -> bool {
        self.flag(NOT_OPEN)
    }

    pub fn offline(&self) -> bool {
        self.flag(OFFLINE)
    }

    /// Copy every field of `other` into `self`, overwriting duplicates
    pub fn merge(&mut self, other: PrinterStatus) -> &mut Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, StatusValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field-by-field change check; no previous status always counts as changed
    pub fn differs_from(&self, previous: Option<&PrinterStatus>) -> bool {
        match previous {
            Some(prev) => prev != self,
            None => true,
        }
    }
}

impl FromIterator<(String, StatusValue)> for PrinterStatus {
    fn from_iter<I: IntoIterator<Item = (String, StatusValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
