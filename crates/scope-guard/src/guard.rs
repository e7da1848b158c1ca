// The scope guard: policy state, owner capability and the host-facing hooks
//
// Host accounts hold the guard behind the `Guard` trait and call it before and
// after executing a transaction. Validation borrows the guard immutably, while
// every administrative change needs `&mut self`, so a validation can never
// observe a half-applied policy change.
use tracing::{debug, warn};

use crate::errors::Result;
use crate::events::{EventLog, GuardEvent};
use crate::interface::{erc165_interface_id, guard_interface_id, GuardCall, GuardQuery};
use crate::ownership::{OwnerCapability, SingleOwner};
use crate::state::{PolicyStore, Target};
use crate::types::{Address, Selector, Word};
use crate::validation::{TransactionRequest, TransactionValidator};

// ================================
// Host Hooks
// ================================

/// Hooks a host account invokes around every transaction it executes
pub trait Guard {
    /// Approve the transaction or abort it with a denial
    fn check_transaction(&self, tx: &TransactionRequest) -> Result<()>;

    /// Called after execution with the transaction hash and its outcome
    fn check_after_execution(&self, tx_hash: [u8; 32], success: bool) -> Result<()>;
}

// ================================
// Scope Guard
// ================================

/// Guard restricting a host account to allow-listed targets, functions,
/// parameter values, value transfers and call modes
#[derive(Debug, Clone)]
pub struct ScopeGuard<O = SingleOwner> {
    pub(crate) store: PolicyStore,
    pub(crate) owner: O,
    pub(crate) events: EventLog,
}

impl ScopeGuard<SingleOwner> {
    /// Set up a guard owned by `owner`; `initiator` is whoever deployed it
    pub fn new(initiator: Address, owner: Address) -> Self {
        Self::with_owner_capability(initiator, SingleOwner::new(owner))
    }
}

impl<O: OwnerCapability> ScopeGuard<O> {
    /// Set up a guard around an externally supplied owner capability
    pub fn with_owner_capability(initiator: Address, owner: O) -> Self {
        let mut events = EventLog::default();
        let current = owner.owner().unwrap_or(Address::ZERO);
        events.emit(GuardEvent::ScopeGuardSetup { initiator, owner: current });
        debug!(%initiator, owner = %current, "scope guard set up");

        Self {
            store: PolicyStore::new(),
            owner,
            events,
        }
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.owner()
    }

    /// Events emitted so far, oldest first
    pub fn events(&self) -> &[GuardEvent] {
        self.events.events()
    }

    /// Take all emitted events, leaving the journal empty
    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        self.events.drain()
    }

    // ================================
    // Policy Queries
    // ================================

    /// Snapshot of a destination's policy
    pub fn target(&self, target: &Address) -> Target {
        self.store.get(target)
    }

    pub fn is_allowed_target(&self, target: &Address) -> bool {
        self.store.is_allowed(target)
    }

    pub fn is_scoped(&self, target: &Address) -> bool {
        self.store.is_scoped(target)
    }

    pub fn is_allowed_to_delegate_call(&self, target: &Address) -> bool {
        self.store.is_delegate_call_allowed(target)
    }

    pub fn is_fallback_allowed(&self, target: &Address) -> bool {
        self.store.is_fallback_allowed(target)
    }

    pub fn is_value_allowed(&self, target: &Address) -> bool {
        self.store.is_value_allowed(target)
    }

    pub fn is_allowed_function(&self, target: &Address, selector: &Selector) -> bool {
        self.store.is_function_allowed(target, selector)
    }

    pub fn is_allowed_parameter(
        &self,
        target: &Address,
        selector: Selector,
        index: usize,
        value: Word,
    ) -> bool {
        self.store.is_parameter_allowed(target, selector, index, value)
    }

    // ================================
    // Introspection and Catch-all
    // ================================

    /// ERC-165 support check
    pub fn supports_interface(&self, interface_id: Selector) -> bool {
        interface_id == erc165_interface_id() || interface_id == guard_interface_id()
    }

    /// Raw ABI entry point.
    ///
    /// Hook calls run through the same checks as the [`Guard`] trait, so a
    /// denial or undecodable hook arguments come back as an error. Recognized
    /// queries return their ABI-encoded result word. Everything else falls
    /// through to [`Self::fallback`] and yields an empty result without failing.
    pub fn dispatch(&self, calldata: &[u8]) -> Result<Vec<u8>> {
        let call = match GuardCall::decode(calldata) {
            Ok(Some(call)) => call,
            Ok(None) => {
                self.fallback(calldata);
                return Ok(Vec::new());
            }
            Err(err) => {
                warn!(len = calldata.len(), code = err.code(), "undecodable guard hook call");
                return Err(err);
            }
        };

        debug!(call = call.signature(), "guard call dispatched");
        match call {
            GuardCall::CheckTransaction(tx) => {
                self.check_transaction(&tx)?;
                Ok(Vec::new())
            }
            GuardCall::CheckAfterExecution { tx_hash, success } => {
                self.check_after_execution(tx_hash, success)?;
                Ok(Vec::new())
            }
            GuardCall::Query(query) => Ok(self.answer(query).0.to_vec()),
        }
    }

    fn answer(&self, query: GuardQuery) -> Word {
        match query {
            GuardQuery::SupportsInterface(id) => Word::from_bool(self.supports_interface(id)),
            GuardQuery::Owner => self.owner().unwrap_or(Address::ZERO).to_word(),
            GuardQuery::IsAllowedTarget(t) => Word::from_bool(self.is_allowed_target(&t)),
            GuardQuery::IsScoped(t) => Word::from_bool(self.is_scoped(&t)),
            GuardQuery::IsAllowedToDelegateCall(t) => {
                Word::from_bool(self.is_allowed_to_delegate_call(&t))
            }
            GuardQuery::IsFallbackAllowed(t) => Word::from_bool(self.is_fallback_allowed(&t)),
            GuardQuery::IsValueAllowed(t) => Word::from_bool(self.is_value_allowed(&t)),
            GuardQuery::IsAllowedFunction(t, selector) => {
                Word::from_bool(self.is_allowed_function(&t, &selector))
            }
            GuardQuery::IsAllowedParameter(t, selector, index, value) => {
                Word::from_bool(self.is_allowed_parameter(&t, selector, index, value))
            }
        }
    }

    /// Catch-all for calls the guard does not recognize: no effect, no failure
    pub fn fallback(&self, calldata: &[u8]) {
        debug!(len = calldata.len(), "unrecognized guard call ignored");
    }
}

impl<O: OwnerCapability> Guard for ScopeGuard<O> {
    fn check_transaction(&self, tx: &TransactionRequest) -> Result<()> {
        TransactionValidator::new(&self.store).check_transaction(tx)
    }

    fn check_after_execution(&self, tx_hash: [u8; 32], success: bool) -> Result<()> {
        debug!(tx_hash = %hex::encode(tx_hash), success, "post-execution hook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GuardError;
    use crate::interface::{encode_check_after_execution, encode_check_transaction};
    use crate::payload::encode_call;

    fn owner() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn target() -> Address {
        Address::repeat_byte(0x7a)
    }

    #[test]
    fn test_setup_event() {
        let initiator = Address::repeat_byte(0x01);
        let guard = ScopeGuard::new(initiator, owner());
        assert_eq!(guard.owner(), Some(owner()));
        assert_eq!(
            guard.events(),
            &[GuardEvent::ScopeGuardSetup { initiator, owner: owner() }]
        );
    }

    #[test]
    fn test_supports_interface() {
        let guard = ScopeGuard::new(owner(), owner());
        assert!(guard.supports_interface(Selector::from_u32(0x01ff_c9a7)));
        assert!(guard.supports_interface(Selector::from_u32(0xe6d7_a83a)));
        assert!(!guard.supports_interface(Selector::from_u32(0xffff_ffff)));
    }

    #[test]
    fn test_after_execution_always_succeeds() {
        let guard = ScopeGuard::new(owner(), owner());
        assert_eq!(guard.check_after_execution([0; 32], true), Ok(()));
        assert_eq!(guard.check_after_execution([0xff; 32], false), Ok(()));
    }

    #[test]
    fn test_dispatch_queries() {
        let mut guard = ScopeGuard::new(owner(), owner());
        guard.set_target_allowed(&owner(), target(), true).unwrap();

        let query = encode_call(
            Selector::from_signature("isAllowedTarget(address)"),
            &[target().to_word()],
        );
        assert_eq!(guard.dispatch(&query), Ok(Word::from_bool(true).0.to_vec()));

        let query = encode_call(Selector::from_signature("isScoped(address)"), &[target().to_word()]);
        assert_eq!(guard.dispatch(&query), Ok(Word::from_bool(false).0.to_vec()));

        let query = encode_call(Selector::from_signature("owner()"), &[]);
        assert_eq!(guard.dispatch(&query), Ok(owner().to_word().0.to_vec()));

        let query = encode_call(
            Selector::from_signature("supportsInterface(bytes4)"),
            &[Word::from_selector(Selector::from_u32(0xe6d7_a83a))],
        );
        assert_eq!(guard.dispatch(&query), Ok(Word::from_bool(true).0.to_vec()));
    }

    #[test]
    fn test_dispatch_catch_all_never_fails() {
        let guard = ScopeGuard::new(owner(), owner());
        assert_eq!(guard.dispatch(&[]), Ok(vec![]));
        assert_eq!(guard.dispatch(&[0x12]), Ok(vec![]));
        assert_eq!(guard.dispatch(&[0xde, 0xad, 0xbe, 0xef, 0x00]), Ok(vec![]));
        // Known query selector with missing arguments
        assert_eq!(
            guard.dispatch(&Selector::from_signature("isScoped(address)").0),
            Ok(vec![])
        );
        // Catch-all leaves the journal untouched
        assert_eq!(guard.events().len(), 1);
    }

    #[test]
    fn test_dispatch_check_transaction_enforces_policy() {
        let mut guard = ScopeGuard::new(owner(), owner());
        let tx = TransactionRequest::call(target(), 1, vec![0xa9, 0x05, 0x9c, 0xbb]);
        let calldata = encode_check_transaction(&tx);

        // Destination never allowed: the raw hook call is denied, not ignored
        assert_eq!(guard.dispatch(&calldata), Err(GuardError::TargetNotAllowed));
        assert_eq!(
            guard.dispatch(&calldata).unwrap_err().to_string(),
            "Target address is not allowed"
        );

        guard.set_target_allowed(&owner(), target(), true).unwrap();
        assert_eq!(guard.dispatch(&calldata), Err(GuardError::ValueNotAllowed));

        guard.set_value_allowed_on_target(&owner(), target(), true).unwrap();
        assert_eq!(guard.dispatch(&calldata), Ok(vec![]));
    }

    #[test]
    fn test_dispatch_rejects_truncated_hook_call() {
        let guard = ScopeGuard::new(owner(), owner());
        let selector = Selector::from_signature(crate::interface::CHECK_TRANSACTION_SIGNATURE);
        let calldata = encode_call(
            selector,
            &[target().to_word(), Word::from_uint(1), Word::from_uint(0x160)],
        );
        assert_eq!(guard.dispatch(&calldata), Err(GuardError::InvalidCallData));
    }

    #[test]
    fn test_dispatch_after_execution() {
        let guard = ScopeGuard::new(owner(), owner());
        assert_eq!(guard.dispatch(&encode_check_after_execution([1; 32], false)), Ok(vec![]));
    }
}
