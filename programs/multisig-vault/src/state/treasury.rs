use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use super::{open_record, record_error, write_record, AccountKind};
use crate::codec::Encoder;

/// The balance a vault holds in one asset type.
///
/// Only the disbursement side moves `balance`; this program creates the record
/// at zero and binds it to its vault and mint.
///
/// Layout:
/// - Byte 0: Discriminator (2)
/// - Bytes 1-32: Vault config address
/// - Bytes 33-64: Mint (asset type)
/// - Bytes 65-72: Balance (u64)
/// - Byte 73: Bump
///
/// Total: 74 bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreasuryAccount {
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub balance: u64,
    pub bump: u8,
}

impl TreasuryAccount {
    pub const LEN: usize = 1 + 32 + 32 + 8 + 1;
    pub const DISCRIMINATOR: u8 = AccountKind::Treasury as u8;

    pub fn pack(&self) -> Vec<u8> {
        Encoder::with_capacity(Self::LEN)
            .u8(Self::DISCRIMINATOR)
            .pubkey(&self.vault)
            .pubkey(&self.mint)
            .u64(self.balance)
            .u8(self.bump)
            .finish()
    }

    pub fn serialize(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        write_record(&self.pack(), dst)
    }

    pub fn deserialize(src: &[u8]) -> Result<Self, ProgramError> {
        let mut d = open_record(src, AccountKind::Treasury, Self::LEN)?;
        Ok(Self {
            vault: d.pubkey().map_err(record_error)?,
            mint: d.pubkey().map_err(record_error)?,
            balance: d.u64().map_err(record_error)?,
            bump: d.u8().map_err(record_error)?,
        })
    }

    /// Balance that may leave the treasury without breaching the vault floor.
    pub fn spendable(&self, minimum_balance: u64) -> u64 {
        self.balance.saturating_sub(minimum_balance)
    }
}
