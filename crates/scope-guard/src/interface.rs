// Guard interface identifiers and the raw call ABI
//
// Host accounts query a guard with ERC-165 `supportsInterface` before installing
// it. The guard interface id is the XOR of the two hook selectors. Hosts that
// speak the raw ABI send the hooks and the read-only policy queries as calldata,
// decoded here with the same word reader the validator uses.
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::{GuardError, Result};
use crate::payload::{encode_bytes, encode_call, PayloadDecoder};
use crate::types::{Address, Operation, Selector, Word};
use crate::validation::TransactionRequest;
use crate::WORD_LEN;

// ================================
// Interface Ids
// ================================

pub const SUPPORTS_INTERFACE_SIGNATURE: &str = "supportsInterface(bytes4)";

pub const CHECK_TRANSACTION_SIGNATURE: &str =
    "checkTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes,address)";

pub const CHECK_AFTER_EXECUTION_SIGNATURE: &str = "checkAfterExecution(bytes32,bool)";

/// Head words of a `checkTransaction` call
const CHECK_TRANSACTION_HEAD_WORDS: usize = 11;

/// ERC-165 interface id
pub fn erc165_interface_id() -> Selector {
    Selector::from_signature(SUPPORTS_INTERFACE_SIGNATURE)
}

/// Transaction guard interface id
pub fn guard_interface_id() -> Selector {
    let check = Selector::from_signature(CHECK_TRANSACTION_SIGNATURE);
    let after = Selector::from_signature(CHECK_AFTER_EXECUTION_SIGNATURE);
    Selector::from_u32(check.to_u32() ^ after.to_u32())
}

// ================================
// Call Table
// ================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    CheckTransaction,
    CheckAfterExecution,
    SupportsInterface,
    Owner,
    IsAllowedTarget,
    IsScoped,
    IsAllowedToDelegateCall,
    IsFallbackAllowed,
    IsValueAllowed,
    IsAllowedFunction,
    IsAllowedParameter,
}

const CALL_SIGNATURES: [(&str, CallKind); 11] = [
    (CHECK_TRANSACTION_SIGNATURE, CallKind::CheckTransaction),
    (CHECK_AFTER_EXECUTION_SIGNATURE, CallKind::CheckAfterExecution),
    (SUPPORTS_INTERFACE_SIGNATURE, CallKind::SupportsInterface),
    ("owner()", CallKind::Owner),
    ("isAllowedTarget(address)", CallKind::IsAllowedTarget),
    ("isScoped(address)", CallKind::IsScoped),
    ("isAllowedToDelegateCall(address)", CallKind::IsAllowedToDelegateCall),
    ("isfallbackAllowed(address)", CallKind::IsFallbackAllowed),
    ("isValueAllowed(address)", CallKind::IsValueAllowed),
    ("isAllowedFunction(address,bytes4)", CallKind::IsAllowedFunction),
    ("isAllowedParameter(address,bytes4,uint256,bytes32)", CallKind::IsAllowedParameter),
];

fn call_table() -> &'static HashMap<Selector, CallKind> {
    static TABLE: OnceLock<HashMap<Selector, CallKind>> = OnceLock::new();
    TABLE.get_or_init(|| {
        CALL_SIGNATURES
            .iter()
            .map(|(signature, kind)| (Selector::from_signature(signature), *kind))
            .collect()
    })
}

fn lookup(payload: &PayloadDecoder<'_>) -> Option<CallKind> {
    call_table().get(&payload.selector()?).copied()
}

fn signature_of(kind: CallKind) -> &'static str {
    CALL_SIGNATURES
        .iter()
        .find(|(_, k)| *k == kind)
        .map_or("", |(signature, _)| signature)
}

// ================================
// Query ABI
// ================================

/// A decoded read-only call on the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardQuery {
    SupportsInterface(Selector),
    Owner,
    IsAllowedTarget(Address),
    IsScoped(Address),
    IsAllowedToDelegateCall(Address),
    IsFallbackAllowed(Address),
    IsValueAllowed(Address),
    IsAllowedFunction(Address, Selector),
    IsAllowedParameter(Address, Selector, usize, Word),
}

impl GuardQuery {
    /// Decode calldata addressed to the guard.
    ///
    /// Returns `None` for unknown selectors, hook calls, missing arguments and
    /// arguments whose padding is not canonical.
    pub fn decode(calldata: &[u8]) -> Option<Self> {
        let payload = PayloadDecoder::new(calldata);
        Self::decode_kind(lookup(&payload)?, &payload)
    }

    fn decode_kind(kind: CallKind, payload: &PayloadDecoder<'_>) -> Option<Self> {
        let address = || payload.word(0)?.as_address();

        let query = match kind {
            CallKind::CheckTransaction | CallKind::CheckAfterExecution => return None,
            CallKind::SupportsInterface => Self::SupportsInterface(payload.word(0)?.as_selector()?),
            CallKind::Owner => Self::Owner,
            CallKind::IsAllowedTarget => Self::IsAllowedTarget(address()?),
            CallKind::IsScoped => Self::IsScoped(address()?),
            CallKind::IsAllowedToDelegateCall => Self::IsAllowedToDelegateCall(address()?),
            CallKind::IsFallbackAllowed => Self::IsFallbackAllowed(address()?),
            CallKind::IsValueAllowed => Self::IsValueAllowed(address()?),
            CallKind::IsAllowedFunction => {
                Self::IsAllowedFunction(address()?, payload.word(1)?.as_selector()?)
            }
            CallKind::IsAllowedParameter => Self::IsAllowedParameter(
                address()?,
                payload.word(1)?.as_selector()?,
                payload.word(2)?.as_index()?,
                payload.word(3)?,
            ),
        };
        Some(query)
    }

    /// Canonical signature of the query's function
    pub fn signature(&self) -> &'static str {
        let kind = match self {
            Self::SupportsInterface(_) => CallKind::SupportsInterface,
            Self::Owner => CallKind::Owner,
            Self::IsAllowedTarget(_) => CallKind::IsAllowedTarget,
            Self::IsScoped(_) => CallKind::IsScoped,
            Self::IsAllowedToDelegateCall(_) => CallKind::IsAllowedToDelegateCall,
            Self::IsFallbackAllowed(_) => CallKind::IsFallbackAllowed,
            Self::IsValueAllowed(_) => CallKind::IsValueAllowed,
            Self::IsAllowedFunction(..) => CallKind::IsAllowedFunction,
            Self::IsAllowedParameter(..) => CallKind::IsAllowedParameter,
        };
        signature_of(kind)
    }
}

// ================================
// Raw Calls
// ================================

/// Any call the guard recognizes on its raw entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardCall {
    CheckTransaction(Box<TransactionRequest>),
    CheckAfterExecution { tx_hash: [u8; 32], success: bool },
    Query(GuardQuery),
}

impl GuardCall {
    /// Decode raw calldata addressed to the guard.
    ///
    /// `Ok(None)` means the call is not one the guard answers and belongs to the
    /// catch-all. A hook call that cannot be decoded is an error, never a
    /// catch-all: it must not read as an approval.
    pub fn decode(calldata: &[u8]) -> Result<Option<Self>> {
        let payload = PayloadDecoder::new(calldata);
        let Some(kind) = lookup(&payload) else {
            return Ok(None);
        };

        match kind {
            CallKind::CheckTransaction => decode_check_transaction(&payload)
                .map(|tx| Some(Self::CheckTransaction(Box::new(tx))))
                .ok_or(GuardError::InvalidCallData),
            CallKind::CheckAfterExecution => {
                let decoded = payload
                    .word(0)
                    .zip(payload.word(1).and_then(|w| w.as_bool()));
                let (hash, success) = decoded.ok_or(GuardError::InvalidCallData)?;
                Ok(Some(Self::CheckAfterExecution { tx_hash: hash.0, success }))
            }
            _ => Ok(GuardQuery::decode_kind(kind, &payload).map(Self::Query)),
        }
    }

    /// Canonical signature of the call's function
    pub fn signature(&self) -> &'static str {
        match self {
            Self::CheckTransaction(_) => CHECK_TRANSACTION_SIGNATURE,
            Self::CheckAfterExecution { .. } => CHECK_AFTER_EXECUTION_SIGNATURE,
            Self::Query(query) => query.signature(),
        }
    }
}

fn decode_check_transaction(payload: &PayloadDecoder<'_>) -> Option<TransactionRequest> {
    let address = |index| payload.word(index)?.as_address();
    let uint = |index| payload.word(index)?.as_u128();
    let operation = u8::try_from(payload.word(3)?.as_u128()?).ok()?;

    Some(TransactionRequest {
        to: address(0)?,
        value: uint(1)?,
        data: payload.bytes(2)?.to_vec(),
        operation: Operation::from_u8(operation)?,
        safe_tx_gas: uint(4)?,
        base_gas: uint(5)?,
        gas_price: uint(6)?,
        gas_token: address(7)?,
        refund_receiver: address(8)?,
        signatures: payload.bytes(9)?.to_vec(),
        msg_sender: address(10)?,
    })
}

/// ABI-encode a `checkTransaction` call for `tx`
pub fn encode_check_transaction(tx: &TransactionRequest) -> Vec<u8> {
    let data_tail = encode_bytes(&tx.data);
    let data_offset = CHECK_TRANSACTION_HEAD_WORDS * WORD_LEN;
    let signatures_offset = data_offset + data_tail.len();
    let operation = match tx.operation {
        Operation::Call => 0,
        Operation::DelegateCall => 1,
    };

    let head = [
        tx.to.to_word(),
        Word::from_uint(tx.value),
        Word::from_uint(data_offset as u128),
        Word::from_uint(operation),
        Word::from_uint(tx.safe_tx_gas),
        Word::from_uint(tx.base_gas),
        Word::from_uint(tx.gas_price),
        tx.gas_token.to_word(),
        tx.refund_receiver.to_word(),
        Word::from_uint(signatures_offset as u128),
        tx.msg_sender.to_word(),
    ];

    let mut calldata = encode_call(Selector::from_signature(CHECK_TRANSACTION_SIGNATURE), &head);
    calldata.extend(data_tail);
    calldata.extend(encode_bytes(&tx.signatures));
    calldata
}

/// ABI-encode a `checkAfterExecution` call
pub fn encode_check_after_execution(tx_hash: [u8; 32], success: bool) -> Vec<u8> {
    encode_call(
        Selector::from_signature(CHECK_AFTER_EXECUTION_SIGNATURE),
        &[Word(tx_hash), Word::from_bool(success)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_ids() {
        assert_eq!(erc165_interface_id().to_u32(), 0x01ff_c9a7);
        assert_eq!(guard_interface_id().to_u32(), 0xe6d7_a83a);
    }

    #[test]
    fn test_decode_queries() {
        let target = Address::repeat_byte(0x42);
        let selector = Selector([1, 2, 3, 4]);

        let data = encode_call(Selector::from_signature("isScoped(address)"), &[target.to_word()]);
        assert_eq!(GuardQuery::decode(&data), Some(GuardQuery::IsScoped(target)));

        let data = encode_call(
            Selector::from_signature("isAllowedParameter(address,bytes4,uint256,bytes32)"),
            &[target.to_word(), Word::from_selector(selector), Word::from_uint(0), Word([7; 32])],
        );
        assert_eq!(
            GuardQuery::decode(&data),
            Some(GuardQuery::IsAllowedParameter(target, selector, 0, Word([7; 32])))
        );

        let owner = encode_call(Selector::from_signature("owner()"), &[]);
        assert_eq!(GuardQuery::decode(&owner), Some(GuardQuery::Owner));
        assert_eq!(GuardQuery::Owner.signature(), "owner()");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let is_scoped = Selector::from_signature("isScoped(address)");

        // Missing argument
        assert_eq!(GuardQuery::decode(&is_scoped.0), None);

        // Dirty address padding
        assert_eq!(GuardQuery::decode(&encode_call(is_scoped, &[Word([0xff; 32])])), None);

        // Unknown selector and short calldata
        assert_eq!(GuardQuery::decode(&[0xde, 0xad, 0xbe, 0xef]), None);
        assert_eq!(GuardQuery::decode(&[0x01]), None);
        assert_eq!(GuardQuery::decode(&[]), None);
    }

    #[test]
    fn test_decode_check_transaction() {
        let tx = TransactionRequest {
            to: Address::repeat_byte(0xd0),
            value: 5,
            data: vec![0xa9, 0x05, 0x9c, 0xbb, 0x01],
            operation: Operation::DelegateCall,
            safe_tx_gas: 1,
            base_gas: 2,
            gas_price: 3,
            gas_token: Address::repeat_byte(4),
            refund_receiver: Address::repeat_byte(5),
            signatures: vec![6; 65],
            msg_sender: Address::repeat_byte(7),
        };
        let calldata = encode_check_transaction(&tx);
        assert_eq!(
            PayloadDecoder::new(&calldata).word(2),
            Some(Word::from_uint(0x160))
        );
        assert_eq!(
            GuardCall::decode(&calldata),
            Ok(Some(GuardCall::CheckTransaction(Box::new(tx))))
        );
        assert_eq!(GuardQuery::decode(&calldata), None);
    }

    #[test]
    fn test_malformed_hook_calls_are_errors() {
        let check = Selector::from_signature(CHECK_TRANSACTION_SIGNATURE);

        // Head truncated after the data offset
        let truncated = encode_call(
            check,
            &[Address::repeat_byte(0xd0).to_word(), Word::from_uint(1), Word::from_uint(0x160)],
        );
        assert_eq!(GuardCall::decode(&truncated), Err(GuardError::InvalidCallData));
        assert_eq!(GuardCall::decode(&check.0), Err(GuardError::InvalidCallData));

        // Operation outside the two known modes
        let mut calldata = encode_check_transaction(&TransactionRequest::call(Address::ZERO, 0, vec![]));
        calldata[4 + 3 * WORD_LEN + 31] = 2;
        assert_eq!(GuardCall::decode(&calldata), Err(GuardError::InvalidCallData));

        // Non-canonical boolean
        let mut after = encode_check_after_execution([9; 32], true);
        after[4 + WORD_LEN + 31] = 2;
        assert_eq!(GuardCall::decode(&after), Err(GuardError::InvalidCallData));
    }

    #[test]
    fn test_decode_other_calls() {
        let after = encode_check_after_execution([9; 32], true);
        assert_eq!(
            GuardCall::decode(&after),
            Ok(Some(GuardCall::CheckAfterExecution { tx_hash: [9; 32], success: true }))
        );

        let owner = encode_call(Selector::from_signature("owner()"), &[]);
        assert_eq!(GuardCall::decode(&owner), Ok(Some(GuardCall::Query(GuardQuery::Owner))));

        // Unknown calls and malformed queries belong to the catch-all
        assert_eq!(GuardCall::decode(&[0xde, 0xad, 0xbe, 0xef]), Ok(None));
        assert_eq!(GuardCall::decode(&[]), Ok(None));
        let is_scoped = Selector::from_signature("isScoped(address)");
        assert_eq!(GuardCall::decode(&is_scoped.0), Ok(None));
    }
}
