use serde::Serialize;
use std::collections::BTreeMap;

pub const VARIADIC: &str = "...";

/// Declared functions keyed by their qualified name (or a synthesized label
/// for anonymous functions), each with its parameter names in order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FunctionTable {
    functions: BTreeMap<String, Vec<String>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh, empty parameter list for `name`. Returns `true` when the
    /// name was already declared; the earlier entry is replaced either way.
    pub fn declare(&mut self, name: &str) -> bool {
        self.functions
            .insert(name.to_string(), Vec::new())
            .is_some()
    }

    pub fn add_params(&mut self, name: &str, params: impl IntoIterator<Item = String>) {
        if let Some(list) = self.functions.get_mut(name) {
            list.extend(params);
        }
    }

    pub fn mark_variadic(&mut self, name: &str) {
        self.add_params(name, [VARIADIC.to_string()]);
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.functions.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.functions.iter()
    }
}
