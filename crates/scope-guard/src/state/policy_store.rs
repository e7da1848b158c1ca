// Keyed store of per-destination policy records
//
// The store never rejects a read or a write. Deciding who may write is the
// administration layer's job; the store only keeps records.
use std::collections::HashMap;

use super::target::Target;
use crate::types::{Address, Selector, Word};

/// Process-wide policy state owned by one guard instance
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    targets: HashMap<Address, Target>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `address`, or the all-false default if it was never touched
    pub fn get(&self, address: &Address) -> Target {
        self.targets.get(address).cloned().unwrap_or_default()
    }

    /// Borrowing lookup; `None` means the default record applies
    pub fn lookup(&self, address: &Address) -> Option<&Target> {
        self.targets.get(address)
    }

    /// Number of destinations that have been configured at least once
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn entry(&mut self, address: Address) -> &mut Target {
        self.targets.entry(address).or_default()
    }

    // ================================
    // Mutators
    // ================================

    pub fn set_allowed(&mut self, address: Address, allow: bool) {
        self.entry(address).allowed = allow;
    }

    pub fn set_scoped(&mut self, address: Address, scoped: bool) {
        self.entry(address).scoped = scoped;
    }

    pub fn set_delegate_call_allowed(&mut self, address: Address, allow: bool) {
        self.entry(address).delegate_call_allowed = allow;
    }

    pub fn set_fallback_allowed(&mut self, address: Address, allow: bool) {
        self.entry(address).fallback_allowed = allow;
    }

    pub fn set_value_allowed(&mut self, address: Address, allow: bool) {
        self.entry(address).value_allowed = allow;
    }

    pub fn set_function_allowed(&mut self, address: Address, selector: Selector, allow: bool) {
        self.entry(address).set_function(selector, allow);
    }

    pub fn set_parameter_allowed(
        &mut self,
        address: Address,
        selector: Selector,
        index: usize,
        value: Word,
        allow: bool,
    ) {
        self.entry(address).set_parameter(selector, index, value, allow);
    }

    // ================================
    // Queries
    // ================================

    pub fn is_allowed(&self, address: &Address) -> bool {
        self.lookup(address).is_some_and(|t| t.allowed)
    }

    pub fn is_scoped(&self, address: &Address) -> bool {
        self.lookup(address).is_some_and(|t| t.scoped)
    }

    pub fn is_delegate_call_allowed(&self, address: &Address) -> bool {
        self.lookup(address).is_some_and(|t| t.delegate_call_allowed)
    }

    pub fn is_fallback_allowed(&self, address: &Address) -> bool {
        self.lookup(address).is_some_and(|t| t.fallback_allowed)
    }

    pub fn is_value_allowed(&self, address: &Address) -> bool {
        self.lookup(address).is_some_and(|t| t.value_allowed)
    }

    pub fn is_function_allowed(&self, address: &Address, selector: &Selector) -> bool {
        self.lookup(address)
            .is_some_and(|t| t.is_function_allowed(selector))
    }

    pub fn is_parameter_allowed(
        &self,
        address: &Address,
        selector: Selector,
        index: usize,
        value: Word,
    ) -> bool {
        self.lookup(address)
            .is_some_and(|t| t.is_parameter_allowed(selector, index, value))
    }
}
