//! Instruction dispatch and the checks every handler shares.

mod add_member;
mod create_proposal;
mod init_vault;
mod vote_on_proposal;

pub use add_member::process_add_member;
pub use create_proposal::process_create_proposal;
pub use init_vault::process_init_vault;
pub use vote_on_proposal::process_vote_on_proposal;

use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::{
    account::{AccountSlot, InvokeContext},
    error::VaultError,
    instruction::VaultInstruction,
    pda,
    state::{self, VaultConfig},
};

/// How a failed instruction leaves its accounts.
///
/// `Rollback` discards every write the instruction made. `Commit` keeps them
/// and still fails; a proposal discovered to have lapsed is persisted as
/// Expired while the vote that discovered it is refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstructionFailure {
    Rollback(ProgramError),
    Commit(ProgramError),
}

impl InstructionFailure {
    pub fn error(&self) -> &ProgramError {
        match self {
            Self::Rollback(error) | Self::Commit(error) => error,
        }
    }

    pub fn into_error(self) -> ProgramError {
        match self {
            Self::Rollback(error) | Self::Commit(error) => error,
        }
    }

    pub fn keeps_writes(&self) -> bool {
        matches!(self, Self::Commit(_))
    }

    pub fn vault_error(&self) -> Option<VaultError> {
        VaultError::from_program_error(self.error())
    }
}

impl From<ProgramError> for InstructionFailure {
    fn from(error: ProgramError) -> Self {
        Self::Rollback(error)
    }
}

impl From<VaultError> for InstructionFailure {
    fn from(error: VaultError) -> Self {
        Self::Rollback(error.into())
    }
}

pub type ProcessResult = Result<(), InstructionFailure>;

pub fn process_instruction(
    ctx: &mut InvokeContext,
    accounts: &mut [AccountSlot],
    instruction_data: &[u8],
) -> ProcessResult {
    if ctx.program_id != crate::ID {
        return Err(ProgramError::IncorrectProgramId.into());
    }

    match VaultInstruction::unpack(instruction_data)? {
        VaultInstruction::InitVault(args) => process_init_vault(ctx, accounts, args),
        VaultInstruction::AddMember(args) => process_add_member(ctx, accounts, args),
        VaultInstruction::CreateProposal(args) => process_create_proposal(ctx, accounts, args),
        VaultInstruction::VoteOnProposal(args) => process_vote_on_proposal(ctx, accounts, args),
    }
}

/// Loads the vault config in `slot` and checks it sits at its canonical
/// address for `vault_id`.
fn load_vault_config(
    slot: &AccountSlot,
    vault_id: u64,
    program_id: &Pubkey,
) -> Result<VaultConfig, InstructionFailure> {
    if !slot.is_owned_by(program_id) || !state::is_initialized(slot.data()) {
        return Err(VaultError::VaultNotFound.into());
    }
    let config = VaultConfig::deserialize(slot.data())?;
    if config.id != vault_id {
        return Err(ProgramError::InvalidSeeds.into());
    }
    let (expected, bump) = pda::find_vault_config_address(&config.owner, vault_id, program_id)?;
    if slot.key != expected || config.bump != bump {
        return Err(ProgramError::InvalidSeeds.into());
    }
    Ok(config)
}

fn require_signer(slot: &AccountSlot) -> Result<(), ProgramError> {
    if !slot.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    Ok(())
}

fn require_writable(slot: &AccountSlot) -> Result<(), ProgramError> {
    if !slot.is_writable {
        return Err(ProgramError::InvalidArgument);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use solana_program::{
        clock::Clock, program_option::COption, program_pack::Pack, rent::Rent, system_program,
    };
    use spl_token::state::Mint;

    use super::*;
    use crate::{account::StoredAccount, codec::Name};

    pub const ADMIN: Pubkey = Pubkey::new_from_array([1u8; 32]);
    pub const M1: Pubkey = Pubkey::new_from_array([2u8; 32]);
    pub const M2: Pubkey = Pubkey::new_from_array([3u8; 32]);
    pub const OUTSIDER: Pubkey = Pubkey::new_from_array([4u8; 32]);
    pub const MINT: Pubkey = Pubkey::new_from_array([5u8; 32]);
    pub const VAULT_ID: u64 = 206;
    pub const NOW: i64 = 1_700_000_000;

    pub fn ctx() -> InvokeContext {
        let clock = Clock {
            unix_timestamp: NOW,
            ..Clock::default()
        };
        InvokeContext::new(crate::ID, clock, Rent::default())
    }

    pub fn wallet(key: Pubkey, is_signer: bool, is_writable: bool) -> AccountSlot {
        AccountSlot::new(
            key,
            is_signer,
            is_writable,
            StoredAccount::new(10_000_000_000, system_program::ID, vec![]),
        )
    }

    pub fn empty(key: Pubkey, is_writable: bool) -> AccountSlot {
        AccountSlot::new(key, false, is_writable, StoredAccount::default())
    }

    pub fn mint() -> AccountSlot {
        let mut data = vec![0u8; Mint::LEN];
        let state = Mint {
            mint_authority: COption::Some(ADMIN),
            supply: 0,
            decimals: 6,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        Mint::pack(state, &mut data).unwrap();
        AccountSlot::new(
            MINT,
            false,
            false,
            StoredAccount::new(1_461_600, spl_token::ID, data),
        )
    }

    pub fn config_address() -> Pubkey {
        pda::find_vault_config_address(&ADMIN, VAULT_ID, &crate::ID)
            .unwrap()
            .0
    }

    /// Vault 206 owned by ADMIN with threshold 2, expiry one day, and the
    /// given extra members.
    pub fn vault(members: &[Pubkey], is_writable: bool) -> AccountSlot {
        let (address, bump) = pda::find_vault_config_address(&ADMIN, VAULT_ID, &crate::ID).unwrap();
        let mut config = VaultConfig::new(ADMIN, VAULT_ID, NOW - 100);
        config.name = Name::try_from("Ops").unwrap();
        config.threshold = 2;
        config.proposal_expiry = 86_400;
        config.minimum_balance = 1_000_000;
        config.bump = bump;
        for member in members {
            config.add_member(*member).unwrap();
        }
        let mut slot = AccountSlot::new(
            address,
            false,
            is_writable,
            StoredAccount::new(5_000_000, crate::ID, vec![0u8; VaultConfig::LEN]),
        );
        config.serialize(&mut slot.account.data).unwrap();
        slot
    }

    pub fn fails(error: impl Into<InstructionFailure>) -> ProcessResult {
        Err(error.into())
    }

    pub fn config_of(slot: &AccountSlot) -> VaultConfig {
        VaultConfig::deserialize(slot.data()).unwrap()
    }
}
