//! Records owned by the vault program.
//!
//! Every record starts with a one-byte [`AccountKind`] discriminator. A record
//! is read only after its discriminator is checked, so one kind can never be
//! passed where another is expected.

pub mod proposal;
pub mod treasury;
pub mod vault_config;

pub use proposal::*;
pub use treasury::*;
pub use vault_config::*;

use solana_program::program_error::ProgramError;

use crate::codec::{CodecError, Decoder};

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccountKind {
    Uninitialized = 0,
    VaultConfig = 1,
    Treasury = 2,
    Proposal = 3,
}

/// True once any record has been written into `data`.
pub fn is_initialized(data: &[u8]) -> bool {
    data.first().is_some_and(|&kind| kind != AccountKind::Uninitialized as u8)
}

/// Checks size and discriminator, then hands back a decoder positioned after it.
pub(crate) fn open_record(
    data: &[u8],
    kind: AccountKind,
    len: usize,
) -> Result<Decoder<'_>, ProgramError> {
    if data.len() < len {
        return Err(ProgramError::AccountDataTooSmall);
    }
    if data[0] != kind as u8 {
        return Err(ProgramError::InvalidAccountData);
    }
    let mut decoder = Decoder::new(&data[..len]);
    decoder.u8().map_err(record_error)?;
    Ok(decoder)
}

/// Writes a packed record into account data.
pub(crate) fn write_record(packed: &[u8], dst: &mut [u8]) -> Result<(), ProgramError> {
    if dst.len() < packed.len() {
        return Err(ProgramError::AccountDataTooSmall);
    }
    dst[..packed.len()].copy_from_slice(packed);
    Ok(())
}

pub(crate) fn record_error(_: CodecError) -> ProgramError {
    ProgramError::InvalidAccountData
}
