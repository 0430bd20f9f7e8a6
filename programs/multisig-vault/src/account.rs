//! The records an instruction sees and the environment it runs in.
//!
//! The ledger owns every account. For each instruction it hands the program a
//! fresh [`AccountSlot`] per listed key, built from committed state, and
//! decides afterwards whether the slots' contents are written back.

use solana_program::{
    clock::Clock, program_error::ProgramError, pubkey::Pubkey, rent::Rent, system_program,
};

/// An account as the ledger persists it. Missing keys read as the default:
/// no lamports, system owned, no data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredAccount {
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

impl StoredAccount {
    pub fn new(lamports: u64, owner: Pubkey, data: Vec<u8>) -> Self {
        Self {
            lamports,
            owner,
            data,
        }
    }

    /// Nothing has ever been allocated here.
    pub fn is_unallocated(&self) -> bool {
        self.owner == system_program::ID && self.data.is_empty()
    }
}

/// One entry of an instruction's account list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSlot {
    pub key: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
    pub account: StoredAccount,
}

impl AccountSlot {
    pub fn new(key: Pubkey, is_signer: bool, is_writable: bool, account: StoredAccount) -> Self {
        Self {
            key,
            is_signer,
            is_writable,
            account,
        }
    }

    pub fn owner(&self) -> &Pubkey {
        &self.account.owner
    }

    pub fn is_owned_by(&self, program_id: &Pubkey) -> bool {
        self.account.owner == *program_id
    }

    pub fn data(&self) -> &[u8] {
        &self.account.data
    }

    /// Mutable access to the record bytes, only for writable slots.
    pub fn data_mut(&mut self) -> Result<&mut [u8], ProgramError> {
        if !self.is_writable {
            return Err(ProgramError::InvalidArgument);
        }
        Ok(self.account.data.as_mut_slice())
    }
}

/// A record the program allocated during the instruction, with the seeds
/// that let the program sign for its address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub payer: Pubkey,
    pub account: Pubkey,
    pub lamports: u64,
    pub space: u64,
    pub owner: Pubkey,
    pub seeds: Vec<Vec<u8>>,
}

/// Per-instruction environment: the invoked program, sysvars and log sink.
#[derive(Clone, Debug)]
pub struct InvokeContext {
    pub program_id: Pubkey,
    pub clock: Clock,
    pub rent: Rent,
    logs: Vec<String>,
    allocations: Vec<Allocation>,
}

impl InvokeContext {
    pub fn new(program_id: Pubkey, clock: Clock, rent: Rent) -> Self {
        Self {
            program_id,
            clock,
            rent,
            logs: Vec::new(),
            allocations: Vec::new(),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp
    }

    pub fn log(&mut self, line: String) {
        self.logs.push(line);
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn take_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }
}

/// Logs through `msg!` and keeps the line on the context for the caller.
#[macro_export]
macro_rules! vault_log {
    ($ctx:expr, $($arg:tt)+) => {{
        let line = format!($($arg)+);
        $crate::solana_program::msg!("{}", line);
        $ctx.log(line);
    }};
}

/// Allocates `space` zeroed bytes at `new_account` for the invoked program,
/// funded with the rent-exempt minimum taken from `payer`.
///
/// `seeds` derive `new_account`; they are kept on the context so the
/// entrypoint can sign the matching system `CreateAccount`.
pub fn create_account(
    ctx: &mut InvokeContext,
    payer: &mut AccountSlot,
    new_account: &mut AccountSlot,
    space: usize,
    seeds: Vec<Vec<u8>>,
) -> Result<(), ProgramError> {
    // Verify payer can authorize and be debited
    if !payer.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if !payer.is_writable || !new_account.is_writable {
        return Err(ProgramError::InvalidArgument);
    }
    if !new_account.account.is_unallocated() {
        return Err(ProgramError::AccountAlreadyInitialized);
    }

    let lamports = ctx.rent.minimum_balance(space);
    payer.account.lamports = payer
        .account
        .lamports
        .checked_sub(lamports)
        .ok_or(ProgramError::InsufficientFunds)?;
    new_account.account = StoredAccount {
        lamports: new_account
            .account
            .lamports
            .checked_add(lamports)
            .ok_or(ProgramError::ArithmeticOverflow)?,
        owner: ctx.program_id,
        data: vec![0u8; space],
    };

    ctx.allocations.push(Allocation {
        payer: payer.key,
        account: new_account.key,
        lamports,
        space: space as u64,
        owner: ctx.program_id,
        seeds,
    });
    Ok(())
}
