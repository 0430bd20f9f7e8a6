use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use super::{open_record, record_error, write_record, AccountKind};
use crate::{
    codec::{Description, Encoder, Name},
    constants::{DESCRIPTION_LEN, MAX_MEMBERS, NAME_LEN},
    error::VaultError,
};

/// What an approved proposal would do once executed.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProposalKind {
    BatchPayment = 0,
    TokenSwap = 1,
    TokenTransfer = 2,
    PaymentStream = 3,
    Vesting = 4,
    OneTimePayment = 5,
}

impl TryFrom<u8> for ProposalKind {
    type Error = VaultError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::BatchPayment),
            1 => Ok(Self::TokenSwap),
            2 => Ok(Self::TokenTransfer),
            3 => Ok(Self::PaymentStream),
            4 => Ok(Self::Vesting),
            5 => Ok(Self::OneTimePayment),
            _ => Err(VaultError::InvalidProposalKind),
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProposalStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
    Expired = 3,
}

impl ProposalStatus {
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

impl TryFrom<u8> for ProposalStatus {
    type Error = ProgramError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Approved),
            2 => Ok(Self::Rejected),
            3 => Ok(Self::Expired),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteChoice {
    Yes = 0,
    No = 1,
}

impl TryFrom<u64> for VoteChoice {
    type Error = VaultError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Yes),
            1 => Ok(Self::No),
            _ => Err(VaultError::InvalidChoice),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Vote {
    pub member: Pubkey,
    pub choice: VoteChoice,
    pub cast_at: i64,
}

impl Vote {
    pub const LEN: usize = 32 + 1 + 8;
}

/// A time-boxed request for member approval.
///
/// Layout:
/// - Byte 0: Discriminator (3)
/// - Bytes 1-8: Proposal id (u64)
/// - Bytes 9-40: Vault config address
/// - Bytes 41-48: Vault id (u64)
/// - Bytes 49-80: Proposer
/// - Byte 81: Proposal kind
/// - Byte 82: Required threshold
/// - Byte 83: Status
/// - Bytes 84-91: Created at (i64)
/// - Bytes 92-99: Voting deadline (i64, absolute unix seconds)
/// - Bytes 100-131: Name
/// - Bytes 132-259: Description
/// - Byte 260: Vote count
/// - Byte 261: Bump
/// - Bytes 262-671: Votes, 10 slots of member(32) + choice(1) + cast_at(8)
///
/// Total: 672 bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub proposal_id: u64,
    pub vault: Pubkey,
    pub vault_id: u64,
    pub proposer: Pubkey,
    pub kind: ProposalKind,
    pub required_threshold: u8,
    pub status: ProposalStatus,
    pub created_at: i64,
    pub voting_deadline: i64,
    pub name: Name,
    pub description: Description,
    pub bump: u8,
    pub votes: Vec<Vote>,
}

impl Proposal {
    pub const LEN: usize = 1
        + 8
        + 32
        + 8
        + 32
        + 1
        + 1
        + 1
        + 8
        + 8
        + NAME_LEN
        + DESCRIPTION_LEN
        + 1
        + 1
        + Vote::LEN * MAX_MEMBERS;
    pub const DISCRIMINATOR: u8 = AccountKind::Proposal as u8;

    pub fn has_voted(&self, member: &Pubkey) -> bool {
        self.votes.iter().any(|vote| vote.member == *member)
    }

    pub fn yes_votes(&self) -> usize {
        self.count(VoteChoice::Yes)
    }

    pub fn no_votes(&self) -> usize {
        self.count(VoteChoice::No)
    }

    fn count(&self, choice: VoteChoice) -> usize {
        self.votes.iter().filter(|vote| vote.choice == choice).count()
    }

    pub fn deadline_passed(&self, now: i64) -> bool {
        now > self.voting_deadline
    }

    /// Status as an observer at `now` should read it. A lapsed Pending
    /// proposal reads as Expired before any vote rewrites it.
    pub fn effective_status(&self, now: i64) -> ProposalStatus {
        match self.status {
            ProposalStatus::Pending if self.deadline_passed(now) => ProposalStatus::Expired,
            status => status,
        }
    }

    /// Moves a lapsed Pending proposal to Expired. Returns true if it changed.
    pub fn expire_if_lapsed(&mut self, now: i64) -> bool {
        if self.status == ProposalStatus::Pending && self.deadline_passed(now) {
            self.status = ProposalStatus::Expired;
            return true;
        }
        false
    }

    /// Records a vote from `member` and finalizes on reaching the threshold.
    ///
    /// The caller has already checked membership and the deadline.
    pub fn cast_vote(
        &mut self,
        member: Pubkey,
        choice: VoteChoice,
        now: i64,
    ) -> Result<ProposalStatus, VaultError> {
        if self.has_voted(&member) {
            return Err(VaultError::DuplicateVote);
        }
        if self.status.is_terminal() {
            return Err(VaultError::ProposalFinalized);
        }
        if self.votes.len() >= MAX_MEMBERS {
            return Err(VaultError::MembershipFull);
        }
        self.votes.push(Vote {
            member,
            choice,
            cast_at: now,
        });
        if self.yes_votes() >= self.required_threshold as usize {
            self.status = ProposalStatus::Approved;
        }
        Ok(self.status)
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut encoder = Encoder::with_capacity(Self::LEN);
        encoder
            .u8(Self::DISCRIMINATOR)
            .u64(self.proposal_id)
            .pubkey(&self.vault)
            .u64(self.vault_id)
            .pubkey(&self.proposer)
            .u8(self.kind as u8)
            .u8(self.required_threshold)
            .u8(self.status as u8)
            .i64(self.created_at)
            .i64(self.voting_deadline)
            .label(&self.name)
            .label(&self.description)
            .u8(self.votes.len() as u8)
            .u8(self.bump);
        for vote in &self.votes {
            encoder
                .pubkey(&vote.member)
                .u8(vote.choice as u8)
                .i64(vote.cast_at);
        }
        for _ in self.votes.len()..MAX_MEMBERS {
            encoder.bytes(&[0u8; Vote::LEN]);
        }
        encoder.finish()
    }

    pub fn serialize(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        write_record(&self.pack(), dst)
    }

    pub fn deserialize(src: &[u8]) -> Result<Self, ProgramError> {
        let mut d = open_record(src, AccountKind::Proposal, Self::LEN)?;
        let proposal_id = d.u64().map_err(record_error)?;
        let vault = d.pubkey().map_err(record_error)?;
        let vault_id = d.u64().map_err(record_error)?;
        let proposer = d.pubkey().map_err(record_error)?;
        let kind = ProposalKind::try_from(d.u8().map_err(record_error)?)
            .map_err(|_| ProgramError::InvalidAccountData)?;
        let required_threshold = d.u8().map_err(record_error)?;
        let status = ProposalStatus::try_from(d.u8().map_err(record_error)?)?;
        let created_at = d.i64().map_err(record_error)?;
        let voting_deadline = d.i64().map_err(record_error)?;
        let name = d.label::<NAME_LEN>().map_err(record_error)?;
        let description = d.label::<DESCRIPTION_LEN>().map_err(record_error)?;
        let vote_count = d.u8().map_err(record_error)? as usize;
        let bump = d.u8().map_err(record_error)?;

        if vote_count > MAX_MEMBERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let mut votes = Vec::with_capacity(vote_count);
        for _ in 0..vote_count {
            let member = d.pubkey().map_err(record_error)?;
            let choice = VoteChoice::try_from(d.u8().map_err(record_error)? as u64)
                .map_err(|_| ProgramError::InvalidAccountData)?;
            let cast_at = d.i64().map_err(record_error)?;
            votes.push(Vote {
                member,
                choice,
                cast_at,
            });
        }

        Ok(Self {
            proposal_id,
            vault,
            vault_id,
            proposer,
            kind,
            required_threshold,
            status,
            created_at,
            voting_deadline,
            name,
            description,
            bump,
            votes,
        })
    }
}
