//! Host-side companion to the multisig vault program.
//!
//! - [`transport`]: the transaction model and the [`Transport`] contract a
//!   ledger implements
//! - [`ledger`]: an in-process [`Transport`] with an account store, a
//!   warpable clock and the system and asset programs vaults rely on
//! - [`retry`]: backoff over transient transport failures
//! - [`client`]: typed builders and readers for every vault operation
//!
//! # Example
//!
//! ```rust
//! use multisig_vault::state::{ProposalKind, ProposalStatus, VoteChoice};
//! use multisig_vault_client::{ClientConfig, Ledger, NewProposal, NewVault, VaultClient};
//! use solana_program::pubkey::Pubkey;
//!
//! let admin = Pubkey::new_unique();
//! let member = Pubkey::new_unique();
//! let mint = Pubkey::new_unique();
//!
//! let ledger = Ledger::new(1_700_000_000);
//! ledger.airdrop(&admin, 10_000_000_000);
//! ledger.airdrop(&member, 10_000_000_000);
//! ledger.create_mint(&admin, &mint, &admin, 6)?;
//!
//! let client = VaultClient::new(ledger, ClientConfig::local())?;
//! client.init_vault(&admin, &mint, &NewVault {
//!     id: 1,
//!     threshold: 2,
//!     proposal_expiry: 86_400,
//!     minimum_balance: 0,
//!     name: "Ops",
//!     description: "",
//! })?;
//! client.add_member(&admin, &admin, &member, 1)?;
//! client.create_proposal(&member, &admin, &NewProposal {
//!     proposal_id: 1,
//!     vault_id: 1,
//!     kind: ProposalKind::OneTimePayment,
//!     required_threshold: 2,
//!     deadline_seconds: 3_600,
//!     name: "Pay auditor",
//!     description: "",
//! })?;
//! client.vote(&admin, &admin, 1, 1, VoteChoice::Yes)?;
//! client.vote(&member, &admin, 1, 1, VoteChoice::Yes)?;
//! assert_eq!(client.proposal_status(&admin, 1, 1)?, ProposalStatus::Approved);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod retry;
pub mod transport;

pub use client::{NewProposal, NewVault, VaultClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result, TransportError};
pub use ledger::Ledger;
pub use retry::RetryPolicy;
pub use transport::{Receipt, Transaction, Transport};
