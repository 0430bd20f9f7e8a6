use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use super::{open_record, record_error, write_record, AccountKind};
use crate::{
    codec::{Description, Encoder, Name},
    constants::{DESCRIPTION_LEN, MAX_MEMBERS, NAME_LEN},
    error::VaultError,
};

/// A vault's configuration and member list, one per `(owner, id)`.
///
/// Layout:
/// - Byte 0: Discriminator (1)
/// - Bytes 1-32: Owner (admin, always member #0)
/// - Bytes 33-40: Vault id (u64)
/// - Bytes 41-72: Name (32 bytes, NUL padded)
/// - Bytes 73-200: Description (128 bytes, NUL padded)
/// - Bytes 201-208: Member count (u64)
/// - Bytes 209-216: Approval threshold (u64)
/// - Bytes 217-224: Proposal expiry in seconds (u64)
/// - Bytes 225-232: Minimum treasury balance (u64)
/// - Bytes 233-264: Treasury address
/// - Bytes 265-272: Created at (i64 unix seconds)
/// - Bytes 273-280: Last updated (i64 unix seconds)
/// - Byte 281: Config bump
/// - Byte 282: Treasury bump
/// - Bytes 283-602: Members, 10 slots of 32 bytes, unused slots zeroed
/// - Bytes 603-610: Proposals ever opened on this vault (u64)
///
/// Total: 611 bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    pub owner: Pubkey,
    pub id: u64,
    pub name: Name,
    pub description: Description,
    pub member_count: u64,
    pub threshold: u64,
    pub proposal_expiry: u64,
    pub minimum_balance: u64,
    pub treasury: Pubkey,
    pub created_at: i64,
    pub last_updated: i64,
    pub bump: u8,
    pub treasury_bump: u8,
    pub members: [Pubkey; MAX_MEMBERS],
    pub total_proposals: u64,
}

/// A member identity together with its position in the vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    pub key: Pubkey,
    pub index: u64,
}

impl VaultConfig {
    pub const LEN: usize =
        1 + 32 + 8 + NAME_LEN + DESCRIPTION_LEN + 8 * 4 + 32 + 8 * 2 + 1 + 1 + 32 * MAX_MEMBERS + 8;
    pub const DISCRIMINATOR: u8 = AccountKind::VaultConfig as u8;

    /// A fresh vault whose only member is its owner.
    pub fn new(owner: Pubkey, id: u64, created_at: i64) -> Self {
        let mut members = [Pubkey::default(); MAX_MEMBERS];
        members[0] = owner;
        Self {
            owner,
            id,
            name: Name::default(),
            description: Description::default(),
            member_count: 1,
            threshold: 1,
            proposal_expiry: 0,
            minimum_balance: 0,
            treasury: Pubkey::default(),
            created_at,
            last_updated: created_at,
            bump: 0,
            treasury_bump: 0,
            members,
            total_proposals: 0,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.members[..self.member_count as usize]
            .iter()
            .enumerate()
            .map(|(index, key)| Member {
                key: *key,
                index: index as u64,
            })
    }

    pub fn member(&self, key: &Pubkey) -> Option<Member> {
        self.members().find(|member| member.key == *key)
    }

    pub fn is_member(&self, key: &Pubkey) -> bool {
        self.member(key).is_some()
    }

    /// Appends `key` at index `member_count`.
    pub fn add_member(&mut self, key: Pubkey) -> Result<Member, VaultError> {
        if self.is_member(&key) {
            return Err(VaultError::DuplicateMember);
        }
        let index = self.member_count as usize;
        if index >= MAX_MEMBERS {
            return Err(VaultError::MembershipFull);
        }
        self.members[index] = key;
        self.member_count += 1;
        Ok(Member {
            key,
            index: index as u64,
        })
    }

    /// Counts a newly opened proposal.
    pub fn record_proposal(&mut self) -> Result<u64, ProgramError> {
        self.total_proposals = self
            .total_proposals
            .checked_add(1)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        Ok(self.total_proposals)
    }

    /// Enough members exist for the vault threshold to be reachable.
    pub fn is_operational(&self) -> bool {
        self.threshold <= self.member_count
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut encoder = Encoder::with_capacity(Self::LEN);
        encoder
            .u8(Self::DISCRIMINATOR)
            .pubkey(&self.owner)
            .u64(self.id)
            .label(&self.name)
            .label(&self.description)
            .u64(self.member_count)
            .u64(self.threshold)
            .u64(self.proposal_expiry)
            .u64(self.minimum_balance)
            .pubkey(&self.treasury)
            .i64(self.created_at)
            .i64(self.last_updated)
            .u8(self.bump)
            .u8(self.treasury_bump);
        for member in &self.members {
            encoder.pubkey(member);
        }
        encoder.u64(self.total_proposals);
        encoder.finish()
    }

    pub fn serialize(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        write_record(&self.pack(), dst)
    }

    pub fn deserialize(src: &[u8]) -> Result<Self, ProgramError> {
        let mut d = open_record(src, AccountKind::VaultConfig, Self::LEN)?;
        let owner = d.pubkey().map_err(record_error)?;
        let id = d.u64().map_err(record_error)?;
        let name = d.label::<NAME_LEN>().map_err(record_error)?;
        let description = d.label::<DESCRIPTION_LEN>().map_err(record_error)?;
        let member_count = d.u64().map_err(record_error)?;
        let threshold = d.u64().map_err(record_error)?;
        let proposal_expiry = d.u64().map_err(record_error)?;
        let minimum_balance = d.u64().map_err(record_error)?;
        let treasury = d.pubkey().map_err(record_error)?;
        let created_at = d.i64().map_err(record_error)?;
        let last_updated = d.i64().map_err(record_error)?;
        let bump = d.u8().map_err(record_error)?;
        let treasury_bump = d.u8().map_err(record_error)?;
        let mut members = [Pubkey::default(); MAX_MEMBERS];
        for member in members.iter_mut() {
            *member = d.pubkey().map_err(record_error)?;
        }
        let total_proposals = d.u64().map_err(record_error)?;

        if member_count == 0 || member_count > MAX_MEMBERS as u64 {
            return Err(ProgramError::InvalidAccountData);
        }

        Ok(Self {
            owner,
            id,
            name,
            description,
            member_count,
            threshold,
            proposal_expiry,
            minimum_balance,
            treasury,
            created_at,
            last_updated,
            bump,
            treasury_bump,
            members,
            total_proposals,
        })
    }
}
