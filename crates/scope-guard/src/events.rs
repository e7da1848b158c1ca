use serde::Serialize;

use crate::types::{Address, Selector, Word};

// ================================
// Guard Events
// ================================

/// Notifications emitted by the guard; together they form the policy audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum GuardEvent {
    /// Emitted once when the guard is set up
    ScopeGuardSetup {
        initiator: Address,
        owner: Address,
    },

    OwnershipTransferred {
        previous_owner: Option<Address>,
        new_owner: Option<Address>,
    },

    SetTargetAllowed {
        target: Address,
        allowed: bool,
    },

    SetTargetScoped {
        target: Address,
        scoped: bool,
    },

    SetDelegateCallAllowedOnTarget {
        target: Address,
        allowed: bool,
    },

    SetFallbackAllowedOnTarget {
        target: Address,
        allowed: bool,
    },

    SetValueAllowedOnTarget {
        target: Address,
        allowed: bool,
    },

    SetFunctionAllowedOnTarget {
        target: Address,
        function_sig: Selector,
        allowed: bool,
    },

    SetParameterAllowedOnFunction {
        target: Address,
        function_sig: Selector,
        parameter_index: usize,
        value: Word,
        allowed: bool,
    },
}

impl GuardEvent {
    /// Destination the event concerns, if it is a policy change
    pub fn target(&self) -> Option<Address> {
        match self {
            Self::ScopeGuardSetup { .. } | Self::OwnershipTransferred { .. } => None,
            Self::SetTargetAllowed { target, .. }
            | Self::SetTargetScoped { target, .. }
            | Self::SetDelegateCallAllowedOnTarget { target, .. }
            | Self::SetFallbackAllowedOnTarget { target, .. }
            | Self::SetValueAllowedOnTarget { target, .. }
            | Self::SetFunctionAllowedOnTarget { target, .. }
            | Self::SetParameterAllowedOnFunction { target, .. } => Some(*target),
        }
    }
}

/// Ordered journal of emitted events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GuardEvent>,
}

impl EventLog {
    pub fn emit(&mut self, event: GuardEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GuardEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<GuardEvent> {
        std::mem::take(&mut self.events)
    }
}
