// Bounds-checked decoding of opaque call payloads
//
// A payload is a 4-byte selector followed by 32-byte parameter words. Word `i`
// lives at bytes [4 + 32*i, 4 + 32*i + 32). A dynamic `bytes` argument keeps an
// offset in its head word, counted from the end of the selector, pointing at a
// length word followed by the bytes themselves. Every read is checked against
// the buffer length; a read past the end yields `None` and never touches memory
// outside the payload.
use crate::types::{Selector, Word};
use crate::{SELECTOR_LEN, WORD_LEN};

/// Coarse classification of a payload, in the order the validator needs it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// No bytes at all: a plain transfer or fallback call
    Empty,
    /// Between one and three bytes: not enough for a selector
    Truncated(usize),
    /// At least four bytes, led by this selector
    Function(Selector),
}

/// Read-only view over a call payload
#[derive(Debug, Clone, Copy)]
pub struct PayloadDecoder<'a> {
    data: &'a [u8],
}

impl<'a> PayloadDecoder<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> PayloadShape {
        match self.selector() {
            Some(selector) => PayloadShape::Function(selector),
            None if self.data.is_empty() => PayloadShape::Empty,
            None => PayloadShape::Truncated(self.data.len()),
        }
    }

    /// Leading four bytes, if present
    pub fn selector(&self) -> Option<Selector> {
        let head = self.data.get(..SELECTOR_LEN)?;
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(head);
        Some(Selector(selector))
    }

    /// Byte offset of parameter word `index`, if it does not overflow
    pub fn word_offset(index: usize) -> Option<usize> {
        index.checked_mul(WORD_LEN)?.checked_add(SELECTOR_LEN)
    }

    /// Parameter word `index`, if the payload is long enough to hold it
    pub fn word(&self, index: usize) -> Option<Word> {
        read_word(self.data, Self::word_offset(index)?)
    }

    /// Dynamic `bytes` argument whose offset is stored in head word `index`
    pub fn bytes(&self, index: usize) -> Option<&'a [u8]> {
        let args = self.data.get(SELECTOR_LEN..)?;
        let offset = self.word(index)?.as_index()?;
        let len = read_word(args, offset)?.as_index()?;
        let start = offset.checked_add(WORD_LEN)?;
        args.get(start..start.checked_add(len)?)
    }
}

fn read_word(data: &[u8], start: usize) -> Option<Word> {
    let slice = data.get(start..start.checked_add(WORD_LEN)?)?;
    let mut word = [0u8; WORD_LEN];
    word.copy_from_slice(slice);
    Some(Word(word))
}

/// Build a payload from a selector and parameter words
pub fn encode_call(selector: Selector, words: &[Word]) -> Vec<u8> {
    let mut data = Vec::with_capacity(SELECTOR_LEN + WORD_LEN * words.len());
    data.extend_from_slice(&selector.0);
    for word in words {
        data.extend_from_slice(&word.0);
    }
    data
}

/// Tail encoding of a dynamic `bytes` argument: length word, then the bytes
/// right-padded to a whole number of words
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD_LEN) * WORD_LEN;
    let mut tail = Vec::with_capacity(WORD_LEN + padded);
    tail.extend_from_slice(&Word::from_uint(bytes.len() as u128).0);
    tail.extend_from_slice(bytes);
    tail.resize(WORD_LEN + padded, 0);
    tail
}
