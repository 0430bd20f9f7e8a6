use solana_program::{program_error::ProgramError, system_program};

use super::{require_signer, require_writable, ProcessResult};
use crate::{
    account::{create_account, AccountSlot, InvokeContext},
    asset,
    constants::{TREASURY_SEED, VAULT_CONFIG_SEED},
    error::VaultError,
    instruction::InitVaultArgs,
    pda,
    state::{TreasuryAccount, VaultConfig},
    vault_log,
};

/// Creates the vault config and its treasury in one step.
///
/// The admin becomes member #0. The threshold only has to be positive here;
/// it is checked against the member count once proposals are opened.
pub fn process_init_vault(
    ctx: &mut InvokeContext,
    accounts: &mut [AccountSlot],
    args: InitVaultArgs,
) -> ProcessResult {
    let [admin, mint, vault_config, treasury, system_program] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys.into());
    };

    // Verify admin co-signs and can pay for both records
    require_signer(admin)?;
    require_writable(admin)?;
    require_writable(vault_config)?;
    require_writable(treasury)?;
    if system_program.key != system_program::ID {
        return Err(ProgramError::IncorrectProgramId.into());
    }

    if args.threshold < 1 {
        return Err(VaultError::InvalidThreshold.into());
    }
    if args.proposal_expiry == 0 {
        return Err(VaultError::InvalidExpiry.into());
    }
    if !asset::is_initialized_mint(&mint.account) {
        return Err(VaultError::InvalidAsset.into());
    }

    let program_id = ctx.program_id;
    let (config_address, bump) = pda::find_vault_config_address(&admin.key, args.id, &program_id)?;
    let (treasury_address, treasury_bump) =
        pda::find_treasury_address(&admin.key, args.id, &program_id)?;
    if vault_config.key != config_address || treasury.key != treasury_address {
        return Err(ProgramError::InvalidSeeds.into());
    }

    // A vault is created once per (admin, id)
    if !vault_config.account.is_unallocated() || !treasury.account.is_unallocated() {
        vault_log!(ctx, "Vault {} already exists for {}", args.id, admin.key);
        return Err(VaultError::AlreadyInitialized.into());
    }

    create_account(
        ctx,
        admin,
        vault_config,
        VaultConfig::LEN,
        pda::signer_seeds(VAULT_CONFIG_SEED, &admin.key, args.id, bump),
    )?;
    create_account(
        ctx,
        admin,
        treasury,
        TreasuryAccount::LEN,
        pda::signer_seeds(TREASURY_SEED, &admin.key, args.id, treasury_bump),
    )?;

    let now = ctx.now();
    let mut config = VaultConfig::new(admin.key, args.id, now);
    config.name = args.name;
    config.description = args.description;
    config.threshold = args.threshold;
    config.proposal_expiry = args.proposal_expiry;
    config.minimum_balance = args.minimum_balance;
    config.treasury = treasury_address;
    config.bump = bump;
    config.treasury_bump = treasury_bump;
    config.serialize(vault_config.data_mut()?)?;

    TreasuryAccount {
        vault: config_address,
        mint: mint.key,
        balance: 0,
        bump: treasury_bump,
    }
    .serialize(treasury.data_mut()?)?;

    vault_log!(ctx, "Vault {} initialized: {}", args.id, config_address);
    vault_log!(
        ctx,
        "Threshold {} of {} member(s), proposals expire after {}s",
        config.threshold,
        config.member_count,
        config.proposal_expiry
    );
    if !config.is_operational() {
        vault_log!(ctx, "Add members until the threshold is reachable");
    }

    Ok(())
}
