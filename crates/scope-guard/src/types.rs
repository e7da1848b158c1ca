// Primitive value types shared by the guard's policy store, decoder and validator
//
// The guard speaks the host account's call encoding: destinations are 20-byte
// addresses, functions are identified by a 4-byte selector and every positional
// parameter occupies one 32-byte word. These newtypes keep the three widths
// apart at compile time and give each one a canonical hex form for logs,
// configuration files and serialized events.
use anchor_lang::solana_program::keccak;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{SELECTOR_LEN, WORD_LEN};

/// Width of an account address in bytes
pub const ADDRESS_LEN: usize = 20;

// ================================
// Hex Helpers
// ================================

/// Error returned when a hex literal cannot be parsed into a fixed-width value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> std::result::Result<[u8; N], HexParseError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| HexParseError::InvalidHex(e.to_string()))?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| HexParseError::InvalidLength {
        expected: N,
        actual: bytes.len(),
    })
}

macro_rules! hex_newtype {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Raw bytes of the value
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = HexParseError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                decode_fixed::<{ $len }>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

// ================================
// Address
// ================================

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

hex_newtype!(Address, ADDRESS_LEN);

impl Address {
    /// The all-zero address
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Address with every byte set to `byte`
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_LEN])
    }

    /// Canonical word encoding: the address left-padded with zeros
    pub fn to_word(&self) -> Word {
        let mut word = [0u8; WORD_LEN];
        word[WORD_LEN - ADDRESS_LEN..].copy_from_slice(&self.0);
        Word(word)
    }
}

// ================================
// Selector
// ================================

/// Leading 4 bytes of a call payload identifying the invoked function
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Selector(pub [u8; SELECTOR_LEN]);

hex_newtype!(Selector, SELECTOR_LEN);

impl Selector {
    /// Derive a selector from a canonical function signature such as
    /// `transfer(address,uint256)`: the first four bytes of its keccak-256 hash.
    pub fn from_signature(signature: &str) -> Self {
        let digest = keccak::hash(signature.as_bytes()).to_bytes();
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(&digest[..SELECTOR_LEN]);
        Self(selector)
    }

    /// Big-endian integer form, used for interface id arithmetic
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Selector from its big-endian integer form
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

// ================================
// Word
// ================================

/// One 32-byte positional parameter slot
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Word(pub [u8; WORD_LEN]);

hex_newtype!(Word, WORD_LEN);

impl Word {
    /// Big-endian, left-padded encoding of an unsigned integer
    pub fn from_uint(value: u128) -> Self {
        let mut word = [0u8; WORD_LEN];
        word[WORD_LEN - 16..].copy_from_slice(&value.to_be_bytes());
        Self(word)
    }

    /// Boolean encoding: zero or one in the last byte
    pub fn from_bool(value: bool) -> Self {
        Self::from_uint(u128::from(value))
    }

    /// `bytes4` encoding: the selector right-padded with zeros
    pub fn from_selector(selector: Selector) -> Self {
        let mut word = [0u8; WORD_LEN];
        word[..SELECTOR_LEN].copy_from_slice(&selector.0);
        Self(word)
    }

    /// Interpret the word as a left-padded address, if the padding is clean
    pub fn as_address(&self) -> Option<Address> {
        let (padding, tail) = self.0.split_at(WORD_LEN - ADDRESS_LEN);
        if padding.iter().any(|b| *b != 0) {
            return None;
        }
        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(tail);
        Some(Address(address))
    }

    /// Interpret the word as a right-padded `bytes4`, if the padding is clean
    pub fn as_selector(&self) -> Option<Selector> {
        let (head, padding) = self.0.split_at(SELECTOR_LEN);
        if padding.iter().any(|b| *b != 0) {
            return None;
        }
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(head);
        Some(Selector(selector))
    }

    /// Interpret the word as an index, if it fits in `usize`
    pub fn as_index(&self) -> Option<usize> {
        self.as_u128().and_then(|value| usize::try_from(value).ok())
    }

    /// Interpret the word as an unsigned integer, if it fits in `u128`
    pub fn as_u128(&self) -> Option<u128> {
        let (high, low) = self.0.split_at(WORD_LEN - 16);
        if high.iter().any(|b| *b != 0) {
            return None;
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(low);
        Some(u128::from_be_bytes(bytes))
    }

    /// Interpret the word as a boolean; only zero and one are valid
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_u128()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

// ================================
// Execution Mode
// ================================

/// How the host account would execute the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Regular call into the destination
    #[default]
    Call,
    /// Destination code runs in the host account's own context
    DelegateCall,
}

impl Operation {
    /// Wire discriminant used by the host account (`0` call, `1` delegate call)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Call),
            1 => Some(Self::DelegateCall),
            _ => None,
        }
    }

    pub const fn is_delegate_call(self) -> bool {
        matches!(self, Self::DelegateCall)
    }
}
