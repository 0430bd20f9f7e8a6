//! Deterministic addressing for every record the vault program owns.
//!
//! Each address is a program-derived address over `[tag, key, id_le]`. The tag
//! namespaces the record type, so a vault config and a treasury built from the
//! same `(owner, id)` never land on the same address.

use solana_program::pubkey::Pubkey;

use crate::{
    constants::{PROPOSAL_SEED, TREASURY_SEED, VAULT_CONFIG_SEED},
    error::VaultError,
};

/// Finds the canonical address and bump for `(tag, key, id)` under `program_id`.
pub fn derive(
    tag: &[u8],
    key: &Pubkey,
    id: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VaultError> {
    let id_bytes = id.to_le_bytes();
    Pubkey::try_find_program_address(&[tag, key.as_ref(), &id_bytes], program_id)
        .ok_or(VaultError::DerivationExhausted)
}

/// Seeds, bump included, that sign for an address found by [`derive`].
pub fn signer_seeds(tag: &[u8], key: &Pubkey, id: u64, bump: u8) -> Vec<Vec<u8>> {
    vec![
        tag.to_vec(),
        key.to_bytes().to_vec(),
        id.to_le_bytes().to_vec(),
        vec![bump],
    ]
}

pub fn find_vault_config_address(
    owner: &Pubkey,
    vault_id: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VaultError> {
    derive(VAULT_CONFIG_SEED, owner, vault_id, program_id)
}

pub fn find_treasury_address(
    owner: &Pubkey,
    vault_id: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VaultError> {
    derive(TREASURY_SEED, owner, vault_id, program_id)
}

/// Proposals are keyed by the vault config address, which already folds in the
/// owner and vault id.
pub fn find_proposal_address(
    vault_config: &Pubkey,
    proposal_id: u64,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VaultError> {
    derive(PROPOSAL_SEED, vault_config, proposal_id, program_id)
}
