use solana_program::program_error::ProgramError;
use thiserror::Error;

/// Errors raised by the vault program.
///
/// Every variant maps to `ProgramError::Custom(code)` with a stable code, so a
/// failure that crossed the transport boundary can be decoded again with
/// [`VaultError::from_code`].
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum VaultError {
    // validation
    #[error("Unknown instruction discriminant")]
    UnknownInstruction = 6000,
    #[error("Field exceeds its fixed byte bound")]
    FieldTooLong = 6001,
    #[error("Threshold must be at least one and not below the vault threshold")]
    InvalidThreshold = 6002,
    #[error("Proposal expiry must be positive")]
    InvalidExpiry = 6003,
    #[error("Voting deadline must be in the future and within the vault expiry")]
    InvalidDeadline = 6004,
    #[error("Unknown proposal kind")]
    InvalidProposalKind = 6005,
    #[error("Vote choice must be 0 (yes) or 1 (no)")]
    InvalidChoice = 6006,
    #[error("Threshold exceeds the current member count")]
    ThresholdExceedsMembership = 6007,
    #[error("Asset account is not an initialized mint")]
    InvalidAsset = 6008,
    #[error("Labels cannot contain NUL bytes")]
    InvalidLabel = 6009,

    // authorization
    #[error("Signer is not the vault admin")]
    NotAdmin = 6010,
    #[error("Proposer is not a member of the vault")]
    ProposerNotMember = 6011,
    #[error("Voter is not a member of the vault")]
    VoterNotMember = 6012,

    // state
    #[error("Record already initialized")]
    AlreadyInitialized = 6020,
    #[error("Vault not found")]
    VaultNotFound = 6021,
    #[error("Proposal not found")]
    ProposalNotFound = 6022,
    #[error("Candidate is already a member")]
    DuplicateMember = 6023,
    #[error("Vault membership is full")]
    MembershipFull = 6024,
    #[error("A proposal with this id already exists")]
    ProposalIdCollision = 6025,
    #[error("Member has already voted on this proposal")]
    DuplicateVote = 6026,
    #[error("Proposal is no longer pending")]
    ProposalFinalized = 6027,
    #[error("No canonical derived address for these seeds")]
    DerivationExhausted = 6028,

    // temporal
    #[error("Voting period has closed")]
    VotingClosed = 6030,
}

/// Broad failure classes, used by callers to decide how to react.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// Malformed payload, out-of-bound field, bad threshold or deadline.
    Validation,
    /// Signer does not hold the required role.
    Authorization,
    /// Record missing, duplicated or already final.
    State,
    /// Deadline passed.
    Temporal,
}

impl VaultError {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        use VaultError::*;
        let error = match code {
            6000 => UnknownInstruction,
            6001 => FieldTooLong,
            6002 => InvalidThreshold,
            6003 => InvalidExpiry,
            6004 => InvalidDeadline,
            6005 => InvalidProposalKind,
            6006 => InvalidChoice,
            6007 => ThresholdExceedsMembership,
            6008 => InvalidAsset,
            6009 => InvalidLabel,
            6010 => NotAdmin,
            6011 => ProposerNotMember,
            6012 => VoterNotMember,
            6020 => AlreadyInitialized,
            6021 => VaultNotFound,
            6022 => ProposalNotFound,
            6023 => DuplicateMember,
            6024 => MembershipFull,
            6025 => ProposalIdCollision,
            6026 => DuplicateVote,
            6027 => ProposalFinalized,
            6028 => DerivationExhausted,
            6030 => VotingClosed,
            _ => return None,
        };
        Some(error)
    }

    /// Decodes a vault error out of a generic program error, if it carries one.
    pub fn from_program_error(error: &ProgramError) -> Option<Self> {
        match error {
            ProgramError::Custom(code) => Self::from_code(*code),
            _ => None,
        }
    }

    pub fn category(self) -> ErrorCategory {
        match self.code() {
            6000..=6009 => ErrorCategory::Validation,
            6010..=6019 => ErrorCategory::Authorization,
            6020..=6029 => ErrorCategory::State,
            _ => ErrorCategory::Temporal,
        }
    }
}

impl From<VaultError> for ProgramError {
    fn from(e: VaultError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
