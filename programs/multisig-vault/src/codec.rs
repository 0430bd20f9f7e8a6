//! Fixed-layout little-endian encoding shared by records and instruction payloads.

use core::fmt;

use solana_program::pubkey::Pubkey;
use thiserror::Error;

use crate::{
    constants::{DESCRIPTION_LEN, NAME_LEN},
    error::VaultError,
};

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum CodecError {
    #[error("needed {needed} bytes at offset {offset}, only {remaining} left")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("label at offset {offset} has bytes after its NUL padding")]
    MalformedLabel { offset: usize },
}

/// Sequential reader over a byte slice.
pub struct Decoder<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::Truncated {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn u32(&mut self) -> Result<u32, CodecError> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn u64(&mut self) -> Result<u64, CodecError> {
        self.array().map(u64::from_le_bytes)
    }

    pub fn i64(&mut self) -> Result<i64, CodecError> {
        self.array().map(i64::from_le_bytes)
    }

    pub fn pubkey(&mut self) -> Result<Pubkey, CodecError> {
        self.array().map(Pubkey::new_from_array)
    }

    pub fn label<const N: usize>(&mut self) -> Result<Label<N>, CodecError> {
        let offset = self.offset;
        let raw = self.array::<N>()?;
        Label::from_padded(raw).ok_or(CodecError::MalformedLabel { offset })
    }
}

/// Append-only writer producing a fixed-layout buffer.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn with_capacity(len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(len),
        }
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn pubkey(&mut self, key: &Pubkey) -> &mut Self {
        self.bytes(key.as_ref())
    }

    pub fn label<const N: usize>(&mut self, label: &Label<N>) -> &mut Self {
        self.bytes(&label.to_padded())
    }

    pub fn finish(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.buf)
    }
}

/// Human-readable text stored in a fixed `N`-byte field, NUL padded.
///
/// Content may fill the whole field; it never contains a NUL byte, so the
/// padded form always decodes back to the same label.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label<const N: usize>([u8; N]);

pub type Name = Label<NAME_LEN>;
pub type Description = Label<DESCRIPTION_LEN>;

impl<const N: usize> Label<N> {
    pub fn new(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.len() > N {
            return Err(VaultError::FieldTooLong);
        }
        if bytes.contains(&0) {
            return Err(VaultError::InvalidLabel);
        }
        let mut raw = [0u8; N];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    /// Accepts a padded field only if everything after the first NUL is NUL too.
    pub fn from_padded(raw: [u8; N]) -> Option<Self> {
        let len = raw.iter().position(|&b| b == 0).unwrap_or(N);
        raw[len..].iter().all(|&b| b == 0).then_some(Self(raw))
    }

    pub fn len(&self) -> usize {
        self.0.iter().position(|&b| b == 0).unwrap_or(N)
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..self.len()]
    }

    pub fn to_padded(&self) -> [u8; N] {
        self.0
    }
}

impl<const N: usize> Default for Label<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> TryFrom<&str> for Label<N> {
    type Error = VaultError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.as_bytes())
    }
}

impl<const N: usize> fmt::Display for Label<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<const N: usize> fmt::Debug for Label<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}
