use std::collections::{BTreeMap, BTreeSet};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::error::StateError;

/// Field name -> new value, for every field that is part of one send
pub type StateDiff = BTreeMap<String, Value>;

/// The named bag of serializable fields describing one Component.
///
/// Writes only record which fields were touched; nothing is retransmitted
/// unless a later `pending_diff` finds that a touched field's value differs
/// from what was last committed as sent. The first send of a State always
/// carries every field.
#[derive(Clone, Debug, Default)]
pub struct SharedState {
    fields: BTreeMap<String, Value>,
    sent: BTreeMap<String, Value>,
    touched: BTreeSet<String>,
    version: u64,
    ever_sent: bool,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a State with initial field values. Nothing is touched yet, the
    /// whole bag goes out with the first send.
    pub fn with_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    // Reading

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Missing or non-boolean fields read as `false`
    pub fn get_bool(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Reads a field back into a typed value. A missing field is `Ok(None)`.
    pub fn try_get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StateError> {
        let Some(value) = self.fields.get(name) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| StateError::FieldType {
                field: name.to_string(),
                expected: std::any::type_name::<T>(),
                message: err.to_string(),
            })
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    // Writing

    /// Sets a field. Marking the owning Component dirty is left to the caller.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.fields.insert(name.clone(), value.into());
        self.touched.insert(name);
    }

    /// Sets a field from any serializable value
    pub fn try_set<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), StateError> {
        let value = serde_json::to_value(value).map_err(|err| StateError::Serialize {
            field: name.to_string(),
            message: err.to_string(),
        })?;
        self.set(name, value);
        Ok(())
    }

    /// Removes a field; the removal is sent to the client as `null`
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let old = self.fields.remove(name);
        if old.is_some() {
            self.touched.insert(name.to_string());
        }
        old
    }

    // Diffing

    pub fn has_been_sent(&self) -> bool {
        self.ever_sent
    }

    /// Incremented every time a non-empty diff is committed
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_touched_fields(&self) -> bool {
        !self.touched.is_empty()
    }

    /// Computes what the next send would carry, without recording anything.
    ///
    /// Returns `None` when nothing differs from the last committed send. A
    /// State that was never sent always yields the full field bag, even when
    /// that bag is empty.
    pub fn pending_diff(&self) -> Option<StateDiff> {
        if !self.ever_sent {
            return Some(self.fields.clone());
        }

        let mut diff = StateDiff::new();
        for name in &self.touched {
            let current = self.fields.get(name);
            if current == self.sent.get(name) {
                continue;
            }
            diff.insert(name.clone(), current.cloned().unwrap_or(Value::Null));
        }

        if diff.is_empty() {
            None
        } else {
            Some(diff)
        }
    }

    /// Records the current fields as delivered to the client
    pub fn commit_sent(&mut self) {
        if self.pending_diff().is_some() {
            self.version += 1;
        }
        self.sent = self.fields.clone();
        self.touched.clear();
        self.ever_sent = true;
    }

    /// Forgets the last send so that the next one carries every field again,
    /// e.g. after the client lost its copy
    pub fn mark_for_full_resend(&mut self) {
        self.sent.clear();
        self.ever_sent = false;
    }
}
