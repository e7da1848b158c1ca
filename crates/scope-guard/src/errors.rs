// Error taxonomy for the transaction guard
//
// Authorization errors reject an administrative call made by anyone other than
// the owner, before any state is touched. Policy denials name exactly one failed
// check of the transaction validator; their messages are fixed strings that
// integrators match on, so they must never be reformatted. Data errors reject a
// raw hook call whose arguments cannot be decoded.
//
// Numeric codes follow the kernel convention of grouping errors in ranges:
// authorization in the 6100s, policy denials in the 6300s, data in the 6500s.
use thiserror::Error;

use crate::types::Address;

// ================================
// Guard Errors
// ================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    // ===== Authorization Errors (6100-6199) =====
    #[error("Ownable: caller is not the owner")]
    NotOwner { caller: Address }, // 6100

    // ===== Policy Denials (6300-6399) =====
    #[error("Delegate call not allowed to this address")]
    DelegateCallNotAllowed, // 6300

    #[error("Target address is not allowed")]
    TargetNotAllowed, // 6301

    #[error("Cannot send ETH to this target")]
    ValueNotAllowed, // 6302

    #[error("Target function is not allowed")]
    FunctionNotAllowed, // 6303

    #[error("Parameter value is not allowed")]
    ParameterNotAllowed, // 6304

    #[error("Function signature too short")]
    FunctionSignatureTooShort, // 6305

    #[error("Fallback not allowed for this address")]
    FallbackNotAllowed, // 6306

    // ===== Data Errors (6500-6599) =====
    #[error("Invalid guard call data")]
    InvalidCallData, // 6500
}

impl GuardError {
    /// Stable numeric code for the error
    pub const fn code(&self) -> u32 {
        match self {
            Self::NotOwner { .. } => 6100,
            Self::DelegateCallNotAllowed => 6300,
            Self::TargetNotAllowed => 6301,
            Self::ValueNotAllowed => 6302,
            Self::FunctionNotAllowed => 6303,
            Self::ParameterNotAllowed => 6304,
            Self::FunctionSignatureTooShort => 6305,
            Self::FallbackNotAllowed => 6306,
            Self::InvalidCallData => 6500,
        }
    }

    /// Whether this error is a policy denial of a guarded transaction
    pub const fn is_denial(&self) -> bool {
        !matches!(self, Self::NotOwner { .. } | Self::InvalidCallData)
    }
}

/// Guard result type
pub type Result<T> = std::result::Result<T, GuardError>;
