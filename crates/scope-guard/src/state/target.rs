// Per-destination policy record
//
// A target exists implicitly for every address: until an administrator touches
// it, every flag is false and both allow-lists are empty. Records are never
// deleted, only toggled. Parameter allow-lists are flattened to a single set
// keyed by (selector, index, value), which keeps growth unbounded and free of
// eviction while making membership a single lookup.
use serde::Serialize;
use std::collections::HashSet;

use crate::types::{Selector, Word};

/// Composite key of one allowed parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParameterKey {
    pub selector: Selector,
    pub index: usize,
    pub value: Word,
}

/// Policy for a single destination address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Destination may be called at all
    pub allowed: bool,

    /// Calls are restricted to the function and parameter allow-lists
    pub scoped: bool,

    /// Destination may be invoked with delegate call
    pub delegate_call_allowed: bool,

    /// Destination may be called with an empty payload while scoped
    pub fallback_allowed: bool,

    /// Destination may receive a non-zero value transfer
    pub value_allowed: bool,

    /// Selectors permitted when scoped
    pub allowed_functions: HashSet<Selector>,

    /// Parameter values permitted per selector and slot
    pub allowed_parameters: HashSet<ParameterKey>,
}

impl Target {
    pub fn is_function_allowed(&self, selector: &Selector) -> bool {
        self.allowed_functions.contains(selector)
    }

    pub fn is_parameter_allowed(&self, selector: Selector, index: usize, value: Word) -> bool {
        self.allowed_parameters
            .contains(&ParameterKey { selector, index, value })
    }

    /// Add or remove a selector from the function allow-list
    pub fn set_function(&mut self, selector: Selector, allow: bool) {
        if allow {
            self.allowed_functions.insert(selector);
        } else {
            self.allowed_functions.remove(&selector);
        }
    }

    /// Add or remove a value from a parameter allow-list
    pub fn set_parameter(&mut self, selector: Selector, index: usize, value: Word, allow: bool) {
        let key = ParameterKey { selector, index, value };
        if allow {
            self.allowed_parameters.insert(key);
        } else {
            self.allowed_parameters.remove(&key);
        }
    }
}
