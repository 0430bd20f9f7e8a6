//! M-of-N multi-signature treasury vault.
//!
//! A vault is a member list, an approval threshold and a treasury bound to
//! one asset type. Members open time-boxed proposals and vote on them; a
//! proposal is Approved once its yes votes reach the threshold it captured
//! when it was opened, or Expired if its deadline passes first.
//!
//! Records live in an external key-value store under program-derived
//! addresses. [`processor::process_instruction`] reads them from the
//! [`account::AccountSlot`]s the store hands in, validates, and mutates those
//! copies; the store decides whether to commit them. On chain,
//! [`entrypoint::process_instruction`] builds the slots from `AccountInfo`s
//! and writes the result back.

pub use solana_program;

pub mod account;
pub mod asset;
pub mod codec;
pub mod constants;
pub mod entrypoint;
pub mod error;
pub mod instruction;
pub mod pda;
pub mod processor;
pub mod state;

pub use error::{ErrorCategory, VaultError};
pub use processor::{process_instruction, InstructionFailure, ProcessResult};

solana_program::declare_id!("6CtnigyVJii6CrgG5G4PD99yaxgKpkB8aTxwGT96QMSu");
