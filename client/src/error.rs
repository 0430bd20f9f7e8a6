//! Error types for submitting vault transactions and reading records back.

use multisig_vault::VaultError;
use solana_program::{hash::Hash, program_error::ProgramError, pubkey::Pubkey};
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::transport::Transport).
///
/// `Unavailable` and `ConfirmationTimeout` say nothing about the transaction
/// itself and may be retried. Every other variant is a verdict on the
/// transaction and will repeat if it is resubmitted unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The ledger could not be reached
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// Submitted but not confirmed in time
    #[error("Confirmation timed out for transaction {0}")]
    ConfirmationTimeout(Hash),

    /// An instruction failed; nothing from the transaction was committed
    /// unless the failure kept its writes
    #[error("Instruction {index} failed: {error}")]
    InstructionFailed {
        index: usize,
        error: ProgramError,
        logs: Vec<String>,
    },

    /// An account is marked signer but the transaction carries no signature for it
    #[error("Missing signature for {0}")]
    MissingSignature(Pubkey),

    /// An instruction changed an account it listed as read-only
    #[error("Instruction {index} modified read-only account {key}")]
    ReadonlyModified { index: usize, key: Pubkey },

    /// No program is deployed at this address
    #[error("Unknown program {0}")]
    UnknownProgram(Pubkey),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Unavailable(_) | TransportError::ConfirmationTimeout(_)
        )
    }

    /// The vault error carried by a failed instruction, if any.
    pub fn vault_error(&self) -> Option<VaultError> {
        match self {
            TransportError::InstructionFailed { error, .. } => {
                VaultError::from_program_error(error)
            }
            _ => None,
        }
    }

    pub fn program_error(&self) -> Option<&ProgramError> {
        match self {
            TransportError::InstructionFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Execution log lines collected up to the failure.
    pub fn logs(&self) -> &[String] {
        match self {
            TransportError::InstructionFailed { logs, .. } => logs,
            _ => &[],
        }
    }
}

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Rejected before submission, e.g. an over-long label
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    /// A record could not be decoded
    #[error("Program error: {0}")]
    Program(ProgramError),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transient failures outlasted the retry budget
    #[error("Max retries ({retries}) exceeded, last error: {last}")]
    MaxRetriesExceeded {
        retries: usize,
        last: TransportError,
    },
}

impl From<ProgramError> for ClientError {
    fn from(error: ProgramError) -> Self {
        ClientError::Program(error)
    }
}

impl ClientError {
    /// The vault error behind this failure, whether raised locally or on the ledger.
    pub fn vault_error(&self) -> Option<VaultError> {
        match self {
            ClientError::Vault(error) => Some(*error),
            ClientError::Transport(error) => error.vault_error(),
            ClientError::Program(error) => VaultError::from_program_error(error),
            _ => None,
        }
    }

    pub fn logs(&self) -> &[String] {
        match self {
            ClientError::Transport(error) => error.logs(),
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
