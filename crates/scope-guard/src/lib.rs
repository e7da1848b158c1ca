// Scope Guard - transaction guard for smart accounts
//
// Before a host account executes a transaction it hands the full description to
// the guard. The guard checks the destination, the call mode, the value and the
// payload against a per-destination policy and either returns normally or
// aborts with a fixed denial reason. The owner maintains the policy through an
// administration API whose every change is journaled as an event.

// ================================
// Module Declarations
// ================================

pub mod admin;
pub mod config;
pub mod errors;
pub mod events;
pub mod guard;
pub mod interface;
pub mod ownership;
pub mod payload;
pub mod state;
pub mod types;
pub mod validation;

// ================================
// Public API Exports
// ================================

pub use config::PolicyConfig;
pub use errors::{GuardError, Result};
pub use events::GuardEvent;
pub use guard::{Guard, ScopeGuard};
pub use interface::{encode_check_after_execution, encode_check_transaction, GuardCall, GuardQuery};
pub use ownership::{OwnerCapability, SingleOwner};
pub use payload::{encode_bytes, encode_call, PayloadDecoder, PayloadShape};
pub use state::{PolicyStore, Target};
pub use types::{Address, Operation, Selector, Word};
pub use validation::{TransactionRequest, TransactionValidator};

// ================================
// Encoding Constants
// ================================

/// Width of a function selector in bytes
pub const SELECTOR_LEN: usize = 4;

/// Width of one parameter word in bytes
pub const WORD_LEN: usize = 32;

/// Number of leading parameter slots checked on scoped calls.
///
/// Only slot 0 is checked, regardless of how many parameters the function
/// takes. Allow-list entries for higher indices are stored and queryable but
/// never consulted during validation.
pub const CHECKED_PARAMETER_SLOTS: usize = 1;
