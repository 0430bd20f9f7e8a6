//! Runtime entrypoint.
//!
//! The runtime hands in `AccountInfo`s; the processor works on owned
//! [`AccountSlot`] copies. After a successful instruction every recorded
//! allocation is replayed as a PDA-signed system `CreateAccount` and the
//! changed record bytes are written back.

use solana_program::{
    account_info::AccountInfo,
    clock::Clock,
    entrypoint::ProgramResult,
    program::invoke_signed,
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    account::{AccountSlot, Allocation, InvokeContext, StoredAccount},
    processor,
};

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    process_with_sysvars(
        program_id,
        accounts,
        instruction_data,
        Clock::get()?,
        Rent::get()?,
    )
}

fn process_with_sysvars(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
    clock: Clock,
    rent: Rent,
) -> ProgramResult {
    let mut ctx = InvokeContext::new(*program_id, clock, rent);
    let mut slots = accounts
        .iter()
        .map(load_slot)
        .collect::<Result<Vec<_>, ProgramError>>()?;

    // A failed instruction never persists on chain, kept writes included
    processor::process_instruction(&mut ctx, &mut slots, instruction_data)
        .map_err(|failure| failure.into_error())?;

    for allocation in ctx.allocations() {
        allocate(allocation, accounts)?;
    }
    store(program_id, &slots, accounts)
}

fn load_slot(info: &AccountInfo) -> Result<AccountSlot, ProgramError> {
    let data = info.try_borrow_data()?.to_vec();
    Ok(AccountSlot::new(
        *info.key,
        info.is_signer,
        info.is_writable,
        StoredAccount::new(info.lamports(), *info.owner, data),
    ))
}

fn find<'a, 'info>(
    accounts: &'a [AccountInfo<'info>],
    key: &Pubkey,
) -> Result<&'a AccountInfo<'info>, ProgramError> {
    accounts
        .iter()
        .find(|info| info.key == key)
        .ok_or(ProgramError::NotEnoughAccountKeys)
}

fn allocate(allocation: &Allocation, accounts: &[AccountInfo]) -> ProgramResult {
    let payer = find(accounts, &allocation.payer)?;
    let account = find(accounts, &allocation.account)?;
    let system = find(accounts, &system_program::ID)?;
    let seeds: Vec<&[u8]> = allocation.seeds.iter().map(Vec::as_slice).collect();

    invoke_signed(
        &system_instruction::create_account(
            &allocation.payer,
            &allocation.account,
            allocation.lamports,
            allocation.space,
            &allocation.owner,
        ),
        &[payer.clone(), account.clone(), system.clone()],
        &[seeds.as_slice()],
    )
}

/// Copies record bytes back into the writable accounts this program owns.
fn store(program_id: &Pubkey, slots: &[AccountSlot], accounts: &[AccountInfo]) -> ProgramResult {
    for (slot, info) in slots.iter().zip(accounts) {
        if !slot.is_writable || info.owner != program_id {
            continue;
        }
        let mut data = info.try_borrow_mut_data()?;
        if data.len() != slot.account.data.len() {
            return Err(ProgramError::InvalidAccountData);
        }
        data.copy_from_slice(&slot.account.data);
    }
    Ok(())
}
