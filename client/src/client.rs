//! Typed entry points for each vault operation and record reads.

use multisig_vault::{
    account::StoredAccount,
    codec::{Description, Name},
    instruction::{self, CreateProposalArgs, InitVaultArgs, VoteArgs},
    pda,
    state::{Proposal, ProposalKind, ProposalStatus, TreasuryAccount, VaultConfig, VoteChoice},
};
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use tracing::{debug, info};

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    retry::RetryPolicy,
    transport::{Receipt, Transaction, Transport},
};

/// Parameters of a new vault. Labels are checked against their field widths
/// before anything is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewVault<'a> {
    pub id: u64,
    pub threshold: u64,
    pub proposal_expiry: u64,
    pub minimum_balance: u64,
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewProposal<'a> {
    pub proposal_id: u64,
    pub vault_id: u64,
    pub kind: ProposalKind,
    pub required_threshold: u8,
    /// Voting window, counted from submission
    pub deadline_seconds: u64,
    pub name: &'a str,
    pub description: &'a str,
}

/// Builds, submits and reads back vault operations over any [`Transport`].
pub struct VaultClient<T> {
    transport: T,
    config: ClientConfig,
    retry: RetryPolicy,
}

impl<T: Transport> VaultClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        info!("Vault client targeting program {}", config.program_id);
        let retry = RetryPolicy::from_config(&config);
        Ok(Self {
            transport,
            config,
            retry,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.config.program_id
    }

    /// Submits `instructions` as one atomic transaction, retrying transient
    /// transport failures.
    pub fn send(&self, instructions: Vec<Instruction>, signers: &[Pubkey]) -> Result<Receipt> {
        let transaction = Transaction::new(instructions, signers);
        let receipt = self.retry.run(|| self.transport.submit(&transaction))?;
        debug!("Transaction {} landed in slot {}", receipt.signature, receipt.slot);
        Ok(receipt)
    }

    pub fn init_vault(&self, admin: &Pubkey, mint: &Pubkey, vault: &NewVault<'_>) -> Result<Receipt> {
        let args = InitVaultArgs {
            id: vault.id,
            threshold: vault.threshold,
            proposal_expiry: vault.proposal_expiry,
            minimum_balance: vault.minimum_balance,
            name: Name::try_from(vault.name)?,
            description: Description::try_from(vault.description)?,
        };
        let ix = instruction::init_vault(self.program_id(), admin, mint, args)?;
        self.send(vec![ix], &[*admin])
    }

    /// `signer` must be the vault owner for the addition to succeed.
    pub fn add_member(
        &self,
        signer: &Pubkey,
        vault_owner: &Pubkey,
        candidate: &Pubkey,
        vault_id: u64,
    ) -> Result<Receipt> {
        let ix =
            instruction::add_member(self.program_id(), signer, vault_owner, candidate, vault_id)?;
        self.send(vec![ix], &[*signer])
    }

    pub fn create_proposal(
        &self,
        proposer: &Pubkey,
        vault_owner: &Pubkey,
        proposal: &NewProposal<'_>,
    ) -> Result<Receipt> {
        let args = CreateProposalArgs {
            proposal_id: proposal.proposal_id,
            vault_id: proposal.vault_id,
            kind: proposal.kind as u8,
            required_threshold: proposal.required_threshold,
            deadline_seconds: proposal.deadline_seconds,
            name: Name::try_from(proposal.name)?,
            description: Description::try_from(proposal.description)?,
        };
        let ix = instruction::create_proposal(self.program_id(), proposer, vault_owner, args)?;
        self.send(vec![ix], &[*proposer])
    }

    pub fn vote(
        &self,
        voter: &Pubkey,
        vault_owner: &Pubkey,
        vault_id: u64,
        proposal_id: u64,
        choice: VoteChoice,
    ) -> Result<Receipt> {
        let args = VoteArgs {
            proposal_id,
            vault_id,
            choice: choice as u64,
        };
        let ix = instruction::vote_on_proposal(self.program_id(), voter, vault_owner, args)?;
        self.send(vec![ix], &[*voter])
    }

    pub fn vault_config_address(&self, vault_owner: &Pubkey, vault_id: u64) -> Result<Pubkey> {
        Ok(pda::find_vault_config_address(vault_owner, vault_id, self.program_id())?.0)
    }

    pub fn treasury_address(&self, vault_owner: &Pubkey, vault_id: u64) -> Result<Pubkey> {
        Ok(pda::find_treasury_address(vault_owner, vault_id, self.program_id())?.0)
    }

    pub fn proposal_address(
        &self,
        vault_owner: &Pubkey,
        vault_id: u64,
        proposal_id: u64,
    ) -> Result<Pubkey> {
        let config = self.vault_config_address(vault_owner, vault_id)?;
        Ok(pda::find_proposal_address(&config, proposal_id, self.program_id())?.0)
    }

    pub fn vault_config(&self, vault_owner: &Pubkey, vault_id: u64) -> Result<VaultConfig> {
        let address = self.vault_config_address(vault_owner, vault_id)?;
        let account = self.fetch_program_account(&address)?;
        Ok(VaultConfig::deserialize(&account.data)?)
    }

    pub fn treasury(&self, vault_owner: &Pubkey, vault_id: u64) -> Result<TreasuryAccount> {
        let address = self.treasury_address(vault_owner, vault_id)?;
        let account = self.fetch_program_account(&address)?;
        Ok(TreasuryAccount::deserialize(&account.data)?)
    }

    /// Treasury balance above the vault's configured floor.
    pub fn spendable_balance(&self, vault_owner: &Pubkey, vault_id: u64) -> Result<u64> {
        let config = self.vault_config(vault_owner, vault_id)?;
        let treasury = self.treasury(vault_owner, vault_id)?;
        Ok(treasury.spendable(config.minimum_balance))
    }

    /// The proposal record as last written.
    pub fn proposal(
        &self,
        vault_owner: &Pubkey,
        vault_id: u64,
        proposal_id: u64,
    ) -> Result<Proposal> {
        let address = self.proposal_address(vault_owner, vault_id, proposal_id)?;
        let account = self.fetch_program_account(&address)?;
        Ok(Proposal::deserialize(&account.data)?)
    }

    /// Status as of the ledger clock. A Pending proposal past its deadline
    /// reads as Expired even before a vote persists that.
    pub fn proposal_status(
        &self,
        vault_owner: &Pubkey,
        vault_id: u64,
        proposal_id: u64,
    ) -> Result<ProposalStatus> {
        let proposal = self.proposal(vault_owner, vault_id, proposal_id)?;
        let now = self.retry.run(|| self.transport.unix_timestamp())?;
        Ok(proposal.effective_status(now))
    }

    fn fetch_program_account(&self, address: &Pubkey) -> Result<StoredAccount> {
        match self.retry.run(|| self.transport.get_account(address))? {
            Some(account) if account.owner == self.config.program_id => Ok(account),
            _ => Err(ClientError::AccountNotFound(*address)),
        }
    }
}
