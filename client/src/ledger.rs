//! In-process ledger: an account store, a clock and the programs vaults
//! depend on, behind the [`Transport`] contract.
//!
//! Transactions run one at a time under a single lock. Each instruction gets
//! fresh slots built from committed state plus the writes of earlier
//! instructions in the same transaction; nothing reaches the store until the
//! whole transaction succeeds. The one exception is an instruction that fails
//! while keeping its writes: those writes, and only those, are stored.

use std::collections::{HashMap, VecDeque};

use multisig_vault::{
    account::{AccountSlot, InvokeContext, StoredAccount},
    process_instruction, InstructionFailure, ProcessResult,
};
use parking_lot::Mutex;
use solana_program::{
    clock::Clock,
    hash::hashv,
    instruction::Instruction,
    program_error::ProgramError,
    program_option::COption,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction::{self, SystemInstruction},
    system_program,
};
use spl_token::{instruction::TokenInstruction, state::Mint};
use tracing::{debug, info, warn};

use crate::{
    error::TransportError,
    transport::{Receipt, Transaction, Transport},
};

#[derive(Debug)]
struct LedgerState {
    accounts: HashMap<Pubkey, StoredAccount>,
    clock: Clock,
    rent: Rent,
    transaction_count: u64,
    injected_failures: VecDeque<TransportError>,
}

impl LedgerState {
    fn load(&self, staged: &HashMap<Pubkey, StoredAccount>, key: &Pubkey) -> StoredAccount {
        staged
            .get(key)
            .or_else(|| self.accounts.get(key))
            .cloned()
            .unwrap_or_default()
    }

    fn commit(&mut self, writes: HashMap<Pubkey, StoredAccount>) {
        for (key, account) in writes {
            if account == StoredAccount::default() {
                self.accounts.remove(&key);
            } else {
                self.accounts.insert(key, account);
            }
        }
    }

    fn execute(
        &self,
        instruction: &Instruction,
        slots: &mut [AccountSlot],
        logs: &mut Vec<String>,
    ) -> ProcessResult {
        let program_id = instruction.program_id;
        logs.push(format!("Program {} invoke [1]", program_id));

        let result = if program_id == multisig_vault::ID {
            let mut ctx = InvokeContext::new(program_id, self.clock.clone(), self.rent.clone());
            let result = process_instruction(&mut ctx, slots, &instruction.data);
            logs.extend(
                ctx.take_logs()
                    .into_iter()
                    .map(|line| format!("Program log: {}", line)),
            );
            result
        } else if program_id == spl_token::ID {
            process_token(slots, &instruction.data).map_err(InstructionFailure::from)
        } else {
            process_system(slots, &instruction.data).map_err(InstructionFailure::from)
        };

        match &result {
            Ok(()) => logs.push(format!("Program {} success", program_id)),
            Err(failure) => logs.push(format!("Program {} failed: {}", program_id, failure.error())),
        }
        result
    }
}

fn is_known_program(program_id: &Pubkey) -> bool {
    *program_id == multisig_vault::ID
        || *program_id == spl_token::ID
        || *program_id == system_program::ID
}

/// The system program, `CreateAccount` only.
fn process_system(slots: &mut [AccountSlot], data: &[u8]) -> Result<(), ProgramError> {
    let instruction: SystemInstruction =
        bincode::deserialize(data).map_err(|_| ProgramError::InvalidInstructionData)?;
    let SystemInstruction::CreateAccount {
        lamports,
        space,
        owner,
    } = instruction
    else {
        return Err(ProgramError::InvalidInstructionData);
    };

    let [from, to, ..] = slots else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    if !from.is_signer || !to.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if !from.is_writable || !to.is_writable {
        return Err(ProgramError::InvalidArgument);
    }
    if !to.account.is_unallocated() {
        return Err(ProgramError::AccountAlreadyInitialized);
    }
    let space = usize::try_from(space).map_err(|_| ProgramError::InvalidInstructionData)?;

    from.account.lamports = from
        .account
        .lamports
        .checked_sub(lamports)
        .ok_or(ProgramError::InsufficientFunds)?;
    to.account.lamports = to
        .account
        .lamports
        .checked_add(lamports)
        .ok_or(ProgramError::ArithmeticOverflow)?;
    to.account.owner = owner;
    to.account.data = vec![0u8; space];
    Ok(())
}

/// The token program, mint initialization only.
fn process_token(slots: &mut [AccountSlot], data: &[u8]) -> Result<(), ProgramError> {
    let (decimals, mint_authority, freeze_authority) = match TokenInstruction::unpack(data)? {
        TokenInstruction::InitializeMint {
            decimals,
            mint_authority,
            freeze_authority,
        }
        | TokenInstruction::InitializeMint2 {
            decimals,
            mint_authority,
            freeze_authority,
        } => (decimals, mint_authority, freeze_authority),
        _ => return Err(ProgramError::InvalidInstructionData),
    };

    let [mint, ..] = slots else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    if !mint.is_writable {
        return Err(ProgramError::InvalidArgument);
    }
    if mint.account.owner != spl_token::ID {
        return Err(ProgramError::IncorrectProgramId);
    }

    let mut state = Mint::unpack_unchecked(&mint.account.data)?;
    if state.is_initialized {
        return Err(ProgramError::AccountAlreadyInitialized);
    }
    state.mint_authority = COption::Some(mint_authority);
    state.decimals = decimals;
    state.freeze_authority = freeze_authority;
    state.is_initialized = true;
    Mint::pack(state, &mut mint.account.data)
}

/// Account store and clock that execute transactions in-process.
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// An empty ledger whose clock starts at `unix_timestamp`.
    pub fn new(unix_timestamp: i64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                accounts: HashMap::new(),
                clock: Clock {
                    unix_timestamp,
                    ..Clock::default()
                },
                rent: Rent::default(),
                transaction_count: 0,
                injected_failures: VecDeque::new(),
            }),
        }
    }

    /// Credits `lamports` to `key` outside of any transaction.
    pub fn airdrop(&self, key: &Pubkey, lamports: u64) {
        let mut state = self.state.lock();
        let account = state.accounts.entry(*key).or_default();
        account.lamports = account.lamports.saturating_add(lamports);
        debug!("Airdropped {} lamports to {}", lamports, key);
    }

    /// Overwrites an account directly. Intended for setting up test fixtures.
    pub fn set_account(&self, key: Pubkey, account: StoredAccount) {
        self.state.lock().accounts.insert(key, account);
    }

    pub fn account(&self, key: &Pubkey) -> Option<StoredAccount> {
        self.state.lock().accounts.get(key).cloned()
    }

    pub fn lamports(&self, key: &Pubkey) -> u64 {
        self.account(key).map_or(0, |account| account.lamports)
    }

    pub fn rent(&self) -> Rent {
        self.state.lock().rent.clone()
    }

    pub fn now(&self) -> i64 {
        self.state.lock().clock.unix_timestamp
    }

    pub fn warp_to(&self, unix_timestamp: i64) {
        self.state.lock().clock.unix_timestamp = unix_timestamp;
    }

    pub fn advance(&self, seconds: i64) {
        let mut state = self.state.lock();
        state.clock.unix_timestamp = state.clock.unix_timestamp.saturating_add(seconds);
    }

    pub fn slot(&self) -> u64 {
        self.state.lock().clock.slot
    }

    /// Makes the next submission fail with `error` without executing it.
    pub fn queue_failure(&self, error: TransportError) {
        self.state.lock().injected_failures.push_back(error);
    }

    /// Creates and initializes a mint at `mint`, paid for by `payer`.
    pub fn create_mint(
        &self,
        payer: &Pubkey,
        mint: &Pubkey,
        authority: &Pubkey,
        decimals: u8,
    ) -> Result<Receipt, TransportError> {
        let lamports = self.rent().minimum_balance(Mint::LEN);
        let initialize =
            spl_token::instruction::initialize_mint2(&spl_token::ID, mint, authority, None, decimals)
                .map_err(|error| TransportError::InstructionFailed {
                    index: 1,
                    error,
                    logs: Vec::new(),
                })?;
        let transaction = Transaction::new(
            vec![
                system_instruction::create_account(
                    payer,
                    mint,
                    lamports,
                    Mint::LEN as u64,
                    &spl_token::ID,
                ),
                initialize,
            ],
            &[*payer, *mint],
        );
        self.submit(&transaction)
    }
}

impl Transport for Ledger {
    fn submit(&self, transaction: &Transaction) -> Result<Receipt, TransportError> {
        let mut state = self.state.lock();

        if let Some(error) = state.injected_failures.pop_front() {
            warn!("Submission dropped: {}", error);
            return Err(error);
        }

        // Verify every program exists and every signer flag is backed
        for instruction in &transaction.instructions {
            if !is_known_program(&instruction.program_id) {
                return Err(TransportError::UnknownProgram(instruction.program_id));
            }
            for meta in &instruction.accounts {
                if meta.is_signer && !transaction.is_signed_by(&meta.pubkey) {
                    return Err(TransportError::MissingSignature(meta.pubkey));
                }
            }
        }

        let mut staged: HashMap<Pubkey, StoredAccount> = HashMap::new();
        let mut logs = Vec::new();

        for (index, instruction) in transaction.instructions.iter().enumerate() {
            let mut slots: Vec<AccountSlot> = instruction
                .accounts
                .iter()
                .map(|meta| {
                    AccountSlot::new(
                        meta.pubkey,
                        meta.is_signer,
                        meta.is_writable,
                        state.load(&staged, &meta.pubkey),
                    )
                })
                .collect();
            let before: Vec<StoredAccount> =
                slots.iter().map(|slot| slot.account.clone()).collect();

            let result = state.execute(instruction, &mut slots, &mut logs);

            let keeps_writes = match &result {
                Ok(()) => true,
                Err(failure) => failure.keeps_writes(),
            };
            let mut writes = HashMap::new();
            if keeps_writes {
                for (slot, prior) in slots.iter().zip(&before) {
                    if slot.account == *prior {
                        continue;
                    }
                    if !slot.is_writable {
                        warn!("Instruction {} modified read-only {}", index, slot.key);
                        return Err(TransportError::ReadonlyModified {
                            index,
                            key: slot.key,
                        });
                    }
                    writes.insert(slot.key, slot.account.clone());
                }
            }

            if let Err(failure) = result {
                // Kept writes persist alone; earlier instructions still roll back
                if failure.keeps_writes() {
                    debug!("Instruction {} keeps {} write(s)", index, writes.len());
                    state.commit(writes);
                }
                warn!("Instruction {} failed: {}", index, failure.error());
                return Err(TransportError::InstructionFailed {
                    index,
                    error: failure.into_error(),
                    logs,
                });
            }
            staged.extend(writes);
        }

        state.commit(staged);
        state.transaction_count += 1;
        state.clock.slot += 1;

        let signature = hashv(&[
            transaction.message_hash().as_ref(),
            &state.transaction_count.to_le_bytes(),
        ]);
        info!(
            "Committed transaction {} at slot {} ({} instruction(s))",
            signature,
            state.clock.slot,
            transaction.instructions.len()
        );

        Ok(Receipt {
            signature,
            slot: state.clock.slot,
            logs,
        })
    }

    fn get_account(&self, key: &Pubkey) -> Result<Option<StoredAccount>, TransportError> {
        Ok(self.account(key))
    }

    fn unix_timestamp(&self) -> Result<i64, TransportError> {
        Ok(self.now())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(0)
    }
}
