//! Per-widget property storage.
//!
//! [`PropertyMap`] is the data half of the property store: a string-keyed map
//! of [`Value`]s that remembers which widget type owns it so cast failures can
//! say where they happened. The mutation half (comparison, change notification,
//! dirty marking) lives on [`Screen::set`](crate::screen::Screen::set), which
//! needs access to the rest of the tree.

use std::collections::HashMap;

use super::value::{PropertyType, Value};
use crate::error::{Error, Result};

/// Outcome of comparing a candidate value against what is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assessment {
    /// Null or structurally equal: nothing to do.
    Unchanged,
    Changed,
}

/// String-keyed property values for one widget.
#[derive(Debug, Clone)]
pub struct PropertyMap {
    owner: String,
    values: HashMap<String, Value>,
}

impl PropertyMap {
    /// Create an empty map owned by a widget of type `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            values: HashMap::new(),
        }
    }

    /// Widget type name of the owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Return the stored value, inserting `default` first if the property is absent.
    pub fn get_or_insert<T: PropertyType + Clone>(&mut self, name: &str, default: T) -> Result<T> {
        match self.values.get(name) {
            Some(stored) => self.cast(name, stored),
            None => {
                self.values.insert(name.to_owned(), default.clone().into_value());
                Ok(default)
            }
        }
    }

    /// Read a property without inserting anything.
    pub fn value<T: PropertyType>(&self, name: &str) -> Result<Option<T>> {
        self.values.get(name).map(|stored| self.cast(name, stored)).transpose()
    }

    /// Read a property, returning `default` when it is absent.
    pub fn value_or<T: PropertyType>(&self, name: &str, default: T) -> Result<T> {
        Ok(self.value(name)?.unwrap_or(default))
    }

    /// The untyped stored value.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Property names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Seed a value without any comparison. Used while a widget is being built.
    pub(crate) fn insert_initial<T: PropertyType>(&mut self, name: &str, value: T) {
        self.values.insert(name.to_owned(), value.into_value());
    }

    /// Compare `candidate` with the stored value.
    ///
    /// Fails with a cast error when both exist and differ in kind.
    pub(crate) fn assess(&self, name: &str, candidate: &Value) -> Result<Assessment> {
        if candidate.is_null() {
            return Ok(Assessment::Unchanged);
        }
        match self.values.get(name) {
            Some(stored) if !stored.same_kind(candidate) => Err(self.cast_error(name, candidate.kind(), stored)),
            Some(stored) if stored == candidate => Ok(Assessment::Unchanged),
            _ => Ok(Assessment::Changed),
        }
    }

    /// Store `value`, returning the previous one.
    pub(crate) fn replace(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.insert(name.to_owned(), value)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub(crate) fn cast_error(&self, name: &str, expected: &'static str, stored: &Value) -> Error {
        Error::Cast {
            widget_type: self.owner.clone(),
            property: name.to_owned(),
            expected,
            found: stored.kind(),
        }
    }

    fn cast<T: PropertyType>(&self, name: &str, stored: &Value) -> Result<T> {
        T::from_value(stored).ok_or_else(|| self.cast_error(name, T::KIND, stored))
    }
}
