// Shared fixtures for the scope-guard integration tests
#![allow(dead_code)]

use scope_guard::{
    encode_call, Address, Guard, GuardError, ScopeGuard, Selector, TransactionRequest, Word,
};

pub const OWNER: Address = Address::repeat_byte(0x0a);
pub const STRANGER: Address = Address::repeat_byte(0x0b);
pub const DEST: Address = Address::repeat_byte(0xd0);

pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Guard owned by `OWNER` with the setup event already drained
pub fn new_guard() -> ScopeGuard {
    init_tracing();
    let mut guard = ScopeGuard::new(OWNER, OWNER);
    guard.drain_events();
    guard
}

pub fn transfer_selector() -> Selector {
    Selector::from_signature(TRANSFER_SIGNATURE)
}

/// `transfer(recipient, amount)` payload
pub fn transfer_payload(recipient: Address, amount: u128) -> Vec<u8> {
    encode_call(transfer_selector(), &[recipient.to_word(), Word::from_uint(amount)])
}

/// Why a host account refused to execute
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("insufficient balance: have {balance}, need {value}")]
    InsufficientBalance { balance: u128, value: u128 },
}

/// Minimal host account: consults the guard, then applies the transfer to its
/// own ledger only if the guard approved and the balance covers it. Any failure
/// leaves the ledger untouched.
pub struct HostAccount<'g, G: Guard> {
    pub guard: &'g G,
    pub executed: Vec<TransactionRequest>,
    pub balance: u128,
}

impl<'g, G: Guard> HostAccount<'g, G> {
    pub fn new(guard: &'g G, balance: u128) -> Self {
        Self {
            guard,
            executed: Vec::new(),
            balance,
        }
    }

    pub fn exec_transaction(&mut self, tx: TransactionRequest) -> Result<(), HostError> {
        self.guard.check_transaction(&tx)?;
        let remaining = self
            .balance
            .checked_sub(tx.value)
            .ok_or(HostError::InsufficientBalance { balance: self.balance, value: tx.value })?;
        self.balance = remaining;
        self.executed.push(tx);
        self.guard.check_after_execution([0u8; 32], true)?;
        Ok(())
    }
}
