// Owner-gated administration of the guard's policy
//
// Every mutator follows the same three steps: reject non-owners before touching
// anything, apply exactly one idempotent change to one target field or set, then
// emit a notification carrying the target and the resulting value. Inputs are
// never validated beyond their types; any address, selector or word is legal.
use tracing::info;

use crate::errors::{GuardError, Result};
use crate::events::GuardEvent;
use crate::guard::ScopeGuard;
use crate::ownership::OwnerCapability;
use crate::types::{Address, Selector, Word};

impl<O: OwnerCapability> ScopeGuard<O> {
    fn only_owner(&self, caller: &Address) -> Result<()> {
        if self.owner.is_owner(caller) {
            Ok(())
        } else {
            Err(GuardError::NotOwner { caller: *caller })
        }
    }

    // ================================
    // Target Flags
    // ================================

    /// Allow or disallow calls to `target`
    pub fn set_target_allowed(&mut self, caller: &Address, target: Address, allow: bool) -> Result<()> {
        self.only_owner(caller)?;
        self.store.set_allowed(target, allow);
        info!(%target, allow, "target allowed updated");
        self.events.emit(GuardEvent::SetTargetAllowed { target, allowed: allow });
        Ok(())
    }

    /// Allow or disallow delegate calls to `target`
    pub fn set_delegate_call_allowed_on_target(
        &mut self,
        caller: &Address,
        target: Address,
        allow: bool,
    ) -> Result<()> {
        self.only_owner(caller)?;
        self.store.set_delegate_call_allowed(target, allow);
        info!(%target, allow, "delegate call permission updated");
        self.events.emit(GuardEvent::SetDelegateCallAllowedOnTarget { target, allowed: allow });
        Ok(())
    }

    /// Restrict `target` to its function and parameter allow-lists, or lift the restriction
    pub fn set_scoped(&mut self, caller: &Address, target: Address, scoped: bool) -> Result<()> {
        self.only_owner(caller)?;
        self.store.set_scoped(target, scoped);
        info!(%target, scoped, "target scope updated");
        self.events.emit(GuardEvent::SetTargetScoped { target, scoped });
        Ok(())
    }

    /// Allow or disallow empty-payload calls to a scoped `target`
    pub fn set_fallback_allowed_on_target(
        &mut self,
        caller: &Address,
        target: Address,
        allow: bool,
    ) -> Result<()> {
        self.only_owner(caller)?;
        self.store.set_fallback_allowed(target, allow);
        info!(%target, allow, "fallback permission updated");
        self.events.emit(GuardEvent::SetFallbackAllowedOnTarget { target, allowed: allow });
        Ok(())
    }

    /// Allow or disallow non-zero value transfers to `target`
    pub fn set_value_allowed_on_target(
        &mut self,
        caller: &Address,
        target: Address,
        allow: bool,
    ) -> Result<()> {
        self.only_owner(caller)?;
        self.store.set_value_allowed(target, allow);
        info!(%target, allow, "value permission updated");
        self.events.emit(GuardEvent::SetValueAllowedOnTarget { target, allowed: allow });
        Ok(())
    }

    // ================================
    // Allow-lists
    // ================================

    /// Add or remove `selector` from the function allow-list of `target`
    pub fn set_allowed_function(
        &mut self,
        caller: &Address,
        target: Address,
        selector: Selector,
        allow: bool,
    ) -> Result<()> {
        self.only_owner(caller)?;
        self.store.set_function_allowed(target, selector, allow);
        info!(%target, %selector, allow, "function permission updated");
        self.events.emit(GuardEvent::SetFunctionAllowedOnTarget {
            target,
            function_sig: selector,
            allowed: allow,
        });
        Ok(())
    }

    /// Add or remove `value` from the allow-list of parameter slot `index` of
    /// `selector` on `target`. Values are compared byte for byte, so register
    /// them in the same encoding the payload carries (addresses left-padded).
    pub fn set_parameter_allowed_on_function(
        &mut self,
        caller: &Address,
        target: Address,
        selector: Selector,
        index: usize,
        value: Word,
        allow: bool,
    ) -> Result<()> {
        self.only_owner(caller)?;
        self.store
            .set_parameter_allowed(target, selector, index, value, allow);
        info!(%target, %selector, index, %value, allow, "parameter permission updated");
        self.events.emit(GuardEvent::SetParameterAllowedOnFunction {
            target,
            function_sig: selector,
            parameter_index: index,
            value,
            allowed: allow,
        });
        Ok(())
    }

    // ================================
    // Ownership
    // ================================

    /// Hand the guard to `new_owner`
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        self.only_owner(caller)?;
        self.move_ownership(Some(new_owner));
        Ok(())
    }

    /// Give up ownership; no further policy changes are possible afterwards
    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<()> {
        self.only_owner(caller)?;
        self.move_ownership(None);
        Ok(())
    }

    fn move_ownership(&mut self, new_owner: Option<Address>) {
        let previous_owner = self.owner.owner();
        self.owner.transfer(new_owner);
        info!(?previous_owner, ?new_owner, "ownership transferred");
        self.events.emit(GuardEvent::OwnershipTransferred { previous_owner, new_owner });
    }
}
