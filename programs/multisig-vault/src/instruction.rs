//! Instruction wire format and builders.
//!
//! Every instruction is a one-byte discriminant followed by a fixed-size
//! little-endian payload. Bytes after the payload are ignored.

use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    codec::{CodecError, Decoder, Description, Encoder, Name},
    constants::{
        ADD_MEMBER_PAYLOAD_LEN, CREATE_PROPOSAL_PAYLOAD_LEN, DESCRIPTION_LEN,
        INIT_VAULT_PAYLOAD_LEN, NAME_LEN, VOTE_PAYLOAD_LEN,
    },
    error::VaultError,
    pda,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitVaultArgs {
    pub id: u64,
    pub threshold: u64,
    pub proposal_expiry: u64,
    pub minimum_balance: u64,
    pub name: Name,
    pub description: Description,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddMemberArgs {
    pub vault_id: u64,
}

/// `kind` stays a raw tag here; the handler rejects unknown tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateProposalArgs {
    pub proposal_id: u64,
    pub vault_id: u64,
    pub kind: u8,
    pub required_threshold: u8,
    pub deadline_seconds: u64,
    pub name: Name,
    pub description: Description,
}

/// `choice` stays raw: 0 is yes, 1 is no.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteArgs {
    pub proposal_id: u64,
    pub vault_id: u64,
    pub choice: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultInstruction {
    /// Creates a vault owned by the signer, with the signer as member #0, and
    /// its empty treasury for the given asset type.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Admin, pays for both records
    /// 1. `[]` Mint of the treasury asset
    /// 2. `[writable]` Vault config, `["vault_config", admin, id]`
    /// 3. `[writable]` Treasury, `["treasury", admin, id]`
    /// 4. `[]` System program
    InitVault(InitVaultArgs),

    /// Appends a member to the admin's vault.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Admin, must be the vault owner
    /// 1. `[]` Candidate member
    /// 2. `[writable]` Vault config
    AddMember(AddMemberArgs),

    /// Opens a proposal for voting and counts it on the vault.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Proposer, a member, pays for the record
    /// 1. `[writable]` Proposal, `["proposal", vault_config, proposal_id]`
    /// 2. `[writable]` Vault config
    /// 3. `[]` System program
    CreateProposal(CreateProposalArgs),

    /// Casts a member's vote.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Voter
    /// 1. `[writable]` Proposal
    /// 2. `[]` Vault config
    VoteOnProposal(VoteArgs),
}

impl VaultInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let (&tag, payload) = data
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;
        let mut d = Decoder::new(payload);
        let decoded = match tag {
            0 => decode_init_vault(&mut d).map(Self::InitVault),
            1 => d
                .u64()
                .map(|vault_id| Self::AddMember(AddMemberArgs { vault_id })),
            2 => decode_create_proposal(&mut d).map(Self::CreateProposal),
            3 => decode_vote(&mut d).map(Self::VoteOnProposal),
            _ => return Err(VaultError::UnknownInstruction.into()),
        };
        decoded.map_err(|_| ProgramError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::InitVault(args) => Encoder::with_capacity(1 + INIT_VAULT_PAYLOAD_LEN)
                .u8(0)
                .u64(args.id)
                .u64(args.threshold)
                .u64(args.proposal_expiry)
                .u64(args.minimum_balance)
                .label(&args.name)
                .label(&args.description)
                .finish(),
            Self::AddMember(args) => Encoder::with_capacity(1 + ADD_MEMBER_PAYLOAD_LEN)
                .u8(1)
                .u64(args.vault_id)
                .finish(),
            Self::CreateProposal(args) => Encoder::with_capacity(1 + CREATE_PROPOSAL_PAYLOAD_LEN)
                .u8(2)
                .u64(args.proposal_id)
                .u64(args.vault_id)
                .u8(args.kind)
                .u8(args.required_threshold)
                .u64(args.deadline_seconds)
                .label(&args.name)
                .label(&args.description)
                .finish(),
            Self::VoteOnProposal(args) => Encoder::with_capacity(1 + VOTE_PAYLOAD_LEN)
                .u8(3)
                .u64(args.proposal_id)
                .u64(args.vault_id)
                .u64(args.choice)
                .finish(),
        }
    }
}

fn decode_init_vault(d: &mut Decoder<'_>) -> Result<InitVaultArgs, CodecError> {
    Ok(InitVaultArgs {
        id: d.u64()?,
        threshold: d.u64()?,
        proposal_expiry: d.u64()?,
        minimum_balance: d.u64()?,
        name: d.label::<NAME_LEN>()?,
        description: d.label::<DESCRIPTION_LEN>()?,
    })
}

fn decode_create_proposal(d: &mut Decoder<'_>) -> Result<CreateProposalArgs, CodecError> {
    Ok(CreateProposalArgs {
        proposal_id: d.u64()?,
        vault_id: d.u64()?,
        kind: d.u8()?,
        required_threshold: d.u8()?,
        deadline_seconds: d.u64()?,
        name: d.label::<NAME_LEN>()?,
        description: d.label::<DESCRIPTION_LEN>()?,
    })
}

fn decode_vote(d: &mut Decoder<'_>) -> Result<VoteArgs, CodecError> {
    Ok(VoteArgs {
        proposal_id: d.u64()?,
        vault_id: d.u64()?,
        choice: d.u64()?,
    })
}

pub fn init_vault(
    program_id: &Pubkey,
    admin: &Pubkey,
    mint: &Pubkey,
    args: InitVaultArgs,
) -> Result<Instruction, VaultError> {
    let (vault_config, _) = pda::find_vault_config_address(admin, args.id, program_id)?;
    let (treasury, _) = pda::find_treasury_address(admin, args.id, program_id)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(vault_config, false),
            AccountMeta::new(treasury, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: VaultInstruction::InitVault(args).pack(),
    })
}

/// `signer` should be the vault owner; any other signer fails `NotAdmin`.
pub fn add_member(
    program_id: &Pubkey,
    signer: &Pubkey,
    vault_owner: &Pubkey,
    candidate: &Pubkey,
    vault_id: u64,
) -> Result<Instruction, VaultError> {
    let (vault_config, _) = pda::find_vault_config_address(vault_owner, vault_id, program_id)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*signer, true),
            AccountMeta::new_readonly(*candidate, false),
            AccountMeta::new(vault_config, false),
        ],
        data: VaultInstruction::AddMember(AddMemberArgs { vault_id }).pack(),
    })
}

/// `vault_owner` is the admin that created the vault, needed to locate it.
pub fn create_proposal(
    program_id: &Pubkey,
    proposer: &Pubkey,
    vault_owner: &Pubkey,
    args: CreateProposalArgs,
) -> Result<Instruction, VaultError> {
    let (vault_config, _) = pda::find_vault_config_address(vault_owner, args.vault_id, program_id)?;
    let (proposal, _) = pda::find_proposal_address(&vault_config, args.proposal_id, program_id)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*proposer, true),
            AccountMeta::new(proposal, false),
            AccountMeta::new(vault_config, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: VaultInstruction::CreateProposal(args).pack(),
    })
}

pub fn vote_on_proposal(
    program_id: &Pubkey,
    voter: &Pubkey,
    vault_owner: &Pubkey,
    args: VoteArgs,
) -> Result<Instruction, VaultError> {
    let (vault_config, _) = pda::find_vault_config_address(vault_owner, args.vault_id, program_id)?;
    let (proposal, _) = pda::find_proposal_address(&vault_config, args.proposal_id, program_id)?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*voter, true),
            AccountMeta::new(proposal, false),
            AccountMeta::new_readonly(vault_config, false),
        ],
        data: VaultInstruction::VoteOnProposal(args).pack(),
    })
}
