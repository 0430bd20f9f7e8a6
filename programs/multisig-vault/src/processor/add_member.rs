use solana_program::program_error::ProgramError;

use super::{load_vault_config, require_signer, require_writable, ProcessResult};
use crate::{
    account::{AccountSlot, InvokeContext},
    error::VaultError,
    instruction::AddMemberArgs,
    vault_log,
};

pub fn process_add_member(
    ctx: &mut InvokeContext,
    accounts: &mut [AccountSlot],
    args: AddMemberArgs,
) -> ProcessResult {
    let [admin, candidate, vault_config] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys.into());
    };

    require_signer(admin)?;
    require_writable(vault_config)?;

    let mut config = load_vault_config(vault_config, args.vault_id, &ctx.program_id)?;

    // Only the owner grows the member list
    if config.owner != admin.key {
        vault_log!(ctx, "{} is not the admin of vault {}", admin.key, config.id);
        return Err(VaultError::NotAdmin.into());
    }

    let member = config.add_member(candidate.key)?;
    config.last_updated = ctx.now();
    config.serialize(vault_config.data_mut()?)?;

    vault_log!(
        ctx,
        "Member #{} added to vault {}: {}",
        member.index,
        config.id,
        member.key
    );
    if config.member_count == config.threshold {
        vault_log!(ctx, "Vault {} can now reach its threshold of {}", config.id, config.threshold);
    }

    Ok(())
}
