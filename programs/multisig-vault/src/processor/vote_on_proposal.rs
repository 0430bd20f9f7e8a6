use solana_program::program_error::ProgramError;

use super::{
    load_vault_config, require_signer, require_writable, InstructionFailure, ProcessResult,
};
use crate::{
    account::{AccountSlot, InvokeContext},
    error::VaultError,
    instruction::VoteArgs,
    pda,
    state::{self, Proposal, ProposalStatus, VoteChoice},
    vault_log,
};

/// Records one member's vote.
///
/// Votes after the deadline are refused with `VotingClosed` whatever the
/// status. Expiry is discovered here: the first of them to reach a Pending
/// proposal moves it to Expired and keeps that write.
pub fn process_vote_on_proposal(
    ctx: &mut InvokeContext,
    accounts: &mut [AccountSlot],
    args: VoteArgs,
) -> ProcessResult {
    let [voter, proposal, vault_config] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys.into());
    };

    require_signer(voter)?;
    require_writable(proposal)?;

    let choice = VoteChoice::try_from(args.choice)?;
    let config = load_vault_config(vault_config, args.vault_id, &ctx.program_id)?;

    let (proposal_address, _) =
        pda::find_proposal_address(&vault_config.key, args.proposal_id, &ctx.program_id)?;
    if proposal.key != proposal_address {
        return Err(ProgramError::InvalidSeeds.into());
    }
    if !proposal.is_owned_by(&ctx.program_id) || !state::is_initialized(proposal.data()) {
        return Err(VaultError::ProposalNotFound.into());
    }
    let mut record = Proposal::deserialize(proposal.data())?;
    if record.vault != vault_config.key || record.proposal_id != args.proposal_id {
        return Err(ProgramError::InvalidAccountData.into());
    }

    if !config.is_member(&voter.key) {
        vault_log!(ctx, "{} is not a member of vault {}", voter.key, config.id);
        return Err(VaultError::VoterNotMember.into());
    }

    let now = ctx.now();
    if record.deadline_passed(now) {
        if record.status != ProposalStatus::Pending {
            return Err(VaultError::VotingClosed.into());
        }
        record.expire_if_lapsed(now);
        record.serialize(proposal.data_mut()?)?;
        vault_log!(
            ctx,
            "Proposal {} expired at {} with {} of {} yes vote(s)",
            record.proposal_id,
            record.voting_deadline,
            record.yes_votes(),
            record.required_threshold
        );
        return Err(InstructionFailure::Commit(VaultError::VotingClosed.into()));
    }

    let status = record.cast_vote(voter.key, choice, now)?;
    record.serialize(proposal.data_mut()?)?;

    vault_log!(
        ctx,
        "{} voted {:?} on proposal {}: {} yes, {} no",
        voter.key,
        choice,
        record.proposal_id,
        record.yes_votes(),
        record.no_votes()
    );
    if status == ProposalStatus::Approved {
        vault_log!(ctx, "Proposal {} approved", record.proposal_id);
    }

    Ok(())
}
