//! The part of the token program a vault depends on: its asset type must be
//! an initialized mint owned by the token program.

use solana_program::program_pack::Pack;
use spl_token::state::Mint;

use crate::account::StoredAccount;

/// True when `account` is an initialized mint of the token program.
pub fn is_initialized_mint(account: &StoredAccount) -> bool {
    account.owner == spl_token::ID && Mint::unpack(&account.data).is_ok()
}
