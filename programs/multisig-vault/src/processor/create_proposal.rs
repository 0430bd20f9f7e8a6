use solana_program::{program_error::ProgramError, system_program};

use super::{load_vault_config, require_signer, require_writable, ProcessResult};
use crate::{
    account::{create_account, AccountSlot, InvokeContext},
    constants::PROPOSAL_SEED,
    error::VaultError,
    instruction::CreateProposalArgs,
    pda,
    state::{Proposal, ProposalKind, ProposalStatus, VaultConfig},
    vault_log,
};

/// Opens a Pending proposal with an empty vote set.
///
/// `deadline_seconds` counts from the current clock and may not exceed the
/// vault's proposal expiry. The proposal keeps its own copy of the required
/// threshold; later membership changes do not touch it. The vault counts
/// every proposal opened on it.
pub fn process_create_proposal(
    ctx: &mut InvokeContext,
    accounts: &mut [AccountSlot],
    args: CreateProposalArgs,
) -> ProcessResult {
    let [proposer, proposal, vault_config, system_program] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys.into());
    };

    require_signer(proposer)?;
    require_writable(proposer)?;
    require_writable(proposal)?;
    require_writable(vault_config)?;
    if system_program.key != system_program::ID {
        return Err(ProgramError::IncorrectProgramId.into());
    }

    let kind = ProposalKind::try_from(args.kind)?;
    let mut config = load_vault_config(vault_config, args.vault_id, &ctx.program_id)?;

    if !config.is_member(&proposer.key) {
        vault_log!(ctx, "{} is not a member of vault {}", proposer.key, config.id);
        return Err(VaultError::ProposerNotMember.into());
    }

    let (proposal_address, bump) =
        pda::find_proposal_address(&vault_config.key, args.proposal_id, &ctx.program_id)?;
    if proposal.key != proposal_address {
        return Err(ProgramError::InvalidSeeds.into());
    }
    if !proposal.account.is_unallocated() {
        return Err(VaultError::ProposalIdCollision.into());
    }

    check_threshold(&config, args.required_threshold)?;

    let now = ctx.now();
    let voting_deadline = voting_deadline(&config, now, args.deadline_seconds)?;

    create_account(
        ctx,
        proposer,
        proposal,
        Proposal::LEN,
        pda::signer_seeds(PROPOSAL_SEED, &vault_config.key, args.proposal_id, bump),
    )?;

    let record = Proposal {
        proposal_id: args.proposal_id,
        vault: vault_config.key,
        vault_id: config.id,
        proposer: proposer.key,
        kind,
        required_threshold: args.required_threshold,
        status: ProposalStatus::Pending,
        created_at: now,
        voting_deadline,
        name: args.name,
        description: args.description,
        bump,
        votes: Vec::new(),
    };
    record.serialize(proposal.data_mut()?)?;

    let total = config.record_proposal()?;
    config.serialize(vault_config.data_mut()?)?;

    vault_log!(
        ctx,
        "Proposal {} ({:?}) opened on vault {} by {}",
        record.proposal_id,
        record.kind,
        config.id,
        record.proposer
    );
    vault_log!(
        ctx,
        "Needs {} yes vote(s) before {}; {} proposal(s) opened on this vault",
        record.required_threshold,
        record.voting_deadline,
        total
    );

    Ok(())
}

/// `1 <= required <= member_count`, and the vault's own threshold must be
/// reachable by its current members.
fn check_threshold(config: &VaultConfig, required: u8) -> Result<(), VaultError> {
    let required = u64::from(required);
    if required > config.member_count || config.threshold > config.member_count {
        return Err(VaultError::ThresholdExceedsMembership);
    }
    if required == 0 {
        return Err(VaultError::InvalidThreshold);
    }
    Ok(())
}

fn voting_deadline(config: &VaultConfig, now: i64, seconds: u64) -> Result<i64, VaultError> {
    if seconds == 0 || seconds > config.proposal_expiry {
        return Err(VaultError::InvalidDeadline);
    }
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| now.checked_add(seconds))
        .ok_or(VaultError::InvalidDeadline)
}
