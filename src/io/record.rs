//! Host-facing tiling record: named unsigned fields plus the winning case key

use crate::io::error::{Result, invalid_input};
use std::collections::BTreeMap;
use std::fmt;

/// Named tiling parameters handed back to the host
///
/// Fields are kept in name order so the rendered record is stable across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TilingRecord {
    fields: BTreeMap<String, u64>,
    tiling_key: Option<u64>,
}

impl TilingRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field
    pub fn get(&self, name: &str) -> Option<u64> {
        self.fields.get(name).copied()
    }

    /// Write a field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: u64) {
        self.fields.insert(name.into(), value);
    }

    /// Read a field the host stores as 32 bits
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the field is missing or does not fit in 32 bits
    pub fn get_u32(&self, name: &str) -> Result<u32> {
        let value = self
            .get(name)
            .ok_or_else(|| invalid_input("field", &name, &"not present in the record"))?;
        u32::try_from(value).map_err(|_overflow| {
            invalid_input("field", &format!("{name} = {value}"), &"exceeds 32 bits")
        })
    }

    /// Write a 32-bit field
    pub fn set_u32(&mut self, name: impl Into<String>, value: u32) {
        self.set(name, u64::from(value));
    }

    /// Identifier of the case that produced the record
    pub const fn tiling_key(&self) -> Option<u64> {
        self.tiling_key
    }

    /// Tag the record with the case that produced it
    pub const fn set_tiling_key(&mut self, key: u64) {
        self.tiling_key = Some(key);
    }

    /// Fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.fields
            .iter()
            .map(|(name, &value)| (name.as_str(), value))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Test if no field is set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for TilingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = self.tiling_key {
            writeln!(f, "tiling_key = {key}")?;
        }
        for (name, value) in self.iter() {
            writeln!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}
