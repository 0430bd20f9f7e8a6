/// Seed prefix for a vault's configuration record: `[VAULT_CONFIG_SEED, owner, id]`
pub const VAULT_CONFIG_SEED: &[u8] = b"vault_config";

/// Seed prefix for a vault's treasury record: `[TREASURY_SEED, owner, id]`
pub const TREASURY_SEED: &[u8] = b"treasury";

/// Seed prefix for a proposal record: `[PROPOSAL_SEED, vault_config, proposal_id]`
pub const PROPOSAL_SEED: &[u8] = b"proposal";

/// Fixed width of every name field.
pub const NAME_LEN: usize = 32;

/// Fixed width of every description field.
pub const DESCRIPTION_LEN: usize = 128;

/// Members a single vault can hold, admin included.
pub const MAX_MEMBERS: usize = 10;

/// Payload bytes after the discriminant, per instruction.
pub const INIT_VAULT_PAYLOAD_LEN: usize = 8 * 4 + NAME_LEN + DESCRIPTION_LEN;
pub const ADD_MEMBER_PAYLOAD_LEN: usize = 8;
pub const CREATE_PROPOSAL_PAYLOAD_LEN: usize = 8 + 8 + 1 + 1 + 8 + NAME_LEN + DESCRIPTION_LEN;
pub const VOTE_PAYLOAD_LEN: usize = 8 + 8 + 8;
