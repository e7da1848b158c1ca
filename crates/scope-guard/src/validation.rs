// Transaction validation against the policy store
//
// The validator is a pure function of the store and the proposed transaction.
// Checks run in a fixed order and the first failure aborts with its denial:
//
//   1. delegate call to a target without delegate call permission
//   2. target not allowed
//   3. non-zero value to a target without value permission
//   4. payload with a selector: function allow-list, then parameter allow-list
//      (scoped targets only)
//   5. payload without a selector: too short unless empty, then fallback
//      permission (scoped targets only)
//
// Nothing is written while validating, so a denial leaves no trace behind.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{GuardError, Result};
use crate::payload::{PayloadDecoder, PayloadShape};
use crate::state::{PolicyStore, Target};
use crate::types::{Address, Operation, Selector};
use crate::CHECKED_PARAMETER_SLOTS;

// ================================
// Transaction Request
// ================================

/// Full description of an operation the host account is about to execute.
///
/// Gas, gas price, fee token and refund receiver are carried for interface
/// compatibility with the host account and are not consulted by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub operation: Operation,
    pub safe_tx_gas: u128,
    pub base_gas: u128,
    pub gas_price: u128,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub signatures: Vec<u8>,
    pub msg_sender: Address,
}

impl TransactionRequest {
    /// Plain call with no compatibility fields set
    pub fn call(to: Address, value: u128, data: Vec<u8>) -> Self {
        Self {
            to,
            value,
            data,
            ..Self::default()
        }
    }

    /// Delegate call with no compatibility fields set
    pub fn delegate_call(to: Address, data: Vec<u8>) -> Self {
        Self {
            to,
            data,
            operation: Operation::DelegateCall,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sender(mut self, msg_sender: Address) -> Self {
        self.msg_sender = msg_sender;
        self
    }
}

// ================================
// Validator
// ================================

/// Stateless decision procedure over a borrowed policy store
#[derive(Debug, Clone, Copy)]
pub struct TransactionValidator<'a> {
    store: &'a PolicyStore,
}

impl<'a> TransactionValidator<'a> {
    pub const fn new(store: &'a PolicyStore) -> Self {
        Self { store }
    }

    /// Approve the transaction or return the first denial that applies
    pub fn check_transaction(&self, tx: &TransactionRequest) -> Result<()> {
        let default_target = Target::default();
        let target = self.store.lookup(&tx.to).unwrap_or(&default_target);

        let outcome = Self::evaluate(target, tx);
        match &outcome {
            Ok(()) => debug!(to = %tx.to, value = tx.value, "transaction approved"),
            Err(err) => warn!(to = %tx.to, code = err.code(), reason = %err, "transaction denied"),
        }
        outcome
    }

    fn evaluate(target: &Target, tx: &TransactionRequest) -> Result<()> {
        if tx.operation.is_delegate_call() && !target.delegate_call_allowed {
            return Err(GuardError::DelegateCallNotAllowed);
        }

        if !target.allowed {
            return Err(GuardError::TargetNotAllowed);
        }

        if tx.value > 0 && !target.value_allowed {
            return Err(GuardError::ValueNotAllowed);
        }

        let payload = PayloadDecoder::new(&tx.data);
        match payload.shape() {
            PayloadShape::Function(selector) => {
                if target.scoped {
                    if !target.is_function_allowed(&selector) {
                        return Err(GuardError::FunctionNotAllowed);
                    }
                    Self::check_parameters(target, selector, &payload)?;
                }
            }
            PayloadShape::Truncated(_) => return Err(GuardError::FunctionSignatureTooShort),
            PayloadShape::Empty => {
                if target.scoped && !target.fallback_allowed {
                    return Err(GuardError::FallbackNotAllowed);
                }
            }
        }

        Ok(())
    }

    /// Check the leading parameter words of a scoped call.
    ///
    /// Only `CHECKED_PARAMETER_SLOTS` slots are inspected, whatever the arity
    /// of the function. A payload too short to hold a checked slot is denied.
    pub fn check_parameters(
        target: &Target,
        selector: Selector,
        payload: &PayloadDecoder<'_>,
    ) -> Result<()> {
        for index in 0..CHECKED_PARAMETER_SLOTS {
            let value = payload.word(index).ok_or(GuardError::ParameterNotAllowed)?;
            if !target.is_parameter_allowed(selector, index, value) {
                return Err(GuardError::ParameterNotAllowed);
            }
        }
        Ok(())
    }
}
