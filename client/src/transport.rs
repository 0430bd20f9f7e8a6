//! The submission contract between a client and whatever ledger executes
//! its transactions.

use std::sync::Arc;

use multisig_vault::account::StoredAccount;
use solana_program::{
    hash::{hashv, Hash},
    instruction::Instruction,
    pubkey::Pubkey,
};

use crate::error::TransportError;

/// Instructions that commit together or not at all.
///
/// `signers` lists the keys that authorized the transaction. Key custody and
/// signature production belong to the wallet layer; the ledger only checks
/// that every account marked signer appears here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub instructions: Vec<Instruction>,
    pub signers: Vec<Pubkey>,
}

impl Transaction {
    pub fn new(instructions: Vec<Instruction>, signers: &[Pubkey]) -> Self {
        Self {
            instructions,
            signers: signers.to_vec(),
        }
    }

    pub fn single(instruction: Instruction, signers: &[Pubkey]) -> Self {
        Self::new(vec![instruction], signers)
    }

    pub fn is_signed_by(&self, key: &Pubkey) -> bool {
        self.signers.contains(key)
    }

    /// Digest of the signers and every instruction's program, accounts and data.
    pub fn message_hash(&self) -> Hash {
        let mut parts: Vec<Vec<u8>> = Vec::new();
        for signer in &self.signers {
            parts.push(signer.to_bytes().to_vec());
        }
        for instruction in &self.instructions {
            parts.push(instruction.program_id.to_bytes().to_vec());
            for meta in &instruction.accounts {
                let mut entry = meta.pubkey.to_bytes().to_vec();
                entry.push(u8::from(meta.is_signer) | (u8::from(meta.is_writable) << 1));
                parts.push(entry);
            }
            parts.push(instruction.data.clone());
        }
        let slices: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        hashv(&slices)
    }
}

/// Proof of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub signature: Hash,
    pub slot: u64,
    pub logs: Vec<String>,
}

/// Submit-and-confirm plus reads of committed state.
///
/// `submit` returns only once the transaction is committed or known to have
/// failed. A transient error leaves the outcome unknown to the caller.
pub trait Transport {
    fn submit(&self, transaction: &Transaction) -> Result<Receipt, TransportError>;

    fn get_account(&self, key: &Pubkey) -> Result<Option<StoredAccount>, TransportError>;

    /// Ledger clock, unix seconds.
    fn unix_timestamp(&self) -> Result<i64, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn submit(&self, transaction: &Transaction) -> Result<Receipt, TransportError> {
        (**self).submit(transaction)
    }

    fn get_account(&self, key: &Pubkey) -> Result<Option<StoredAccount>, TransportError> {
        (**self).get_account(key)
    }

    fn unix_timestamp(&self) -> Result<i64, TransportError> {
        (**self).unix_timestamp()
    }
}
