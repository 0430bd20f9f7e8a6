//! End-to-end vault scenarios against the in-process ledger.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use assert_matches::assert_matches;
use multisig_vault::{
    account::StoredAccount,
    instruction::{self, AddMemberArgs, CreateProposalArgs, VaultInstruction, VoteArgs},
    state::{ProposalKind, ProposalStatus, VoteChoice},
    VaultError,
};
use multisig_vault_client::{
    ClientConfig, ClientError, Ledger, NewProposal, NewVault, Receipt, Transaction, Transport,
    TransportError, VaultClient,
};
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use test_case::test_case;
use tracing_subscriber::EnvFilter;

const VAULT_ID: u64 = 206;
const PROPOSAL_ID: u64 = 11;
const GENESIS: i64 = 1_700_000_000;
const FUNDS: u64 = 10_000_000_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    ledger: Arc<Ledger>,
    client: VaultClient<Arc<Ledger>>,
    admin: Pubkey,
    mint: Pubkey,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let ledger = Arc::new(Ledger::new(GENESIS));
        let admin = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        ledger.airdrop(&admin, FUNDS);
        ledger.create_mint(&admin, &mint, &admin, 6).unwrap();
        let client = VaultClient::new(Arc::clone(&ledger), ClientConfig::local()).unwrap();
        Self {
            ledger,
            client,
            admin,
            mint,
        }
    }

    fn member(&self) -> Pubkey {
        let key = Pubkey::new_unique();
        self.ledger.airdrop(&key, FUNDS);
        key
    }

    fn init_vault(&self, threshold: u64) -> Receipt {
        self.client
            .init_vault(
                &self.admin,
                &self.mint,
                &NewVault {
                    id: VAULT_ID,
                    threshold,
                    proposal_expiry: 86_400,
                    minimum_balance: 1_000_000,
                    name: "Operations",
                    description: "Monthly vendor payments",
                },
            )
            .unwrap()
    }

    fn add(&self, candidate: &Pubkey) {
        self.client
            .add_member(&self.admin, &self.admin, candidate, VAULT_ID)
            .unwrap();
    }

    fn propose(&self, proposer: &Pubkey, required_threshold: u8, deadline_seconds: u64) {
        self.client
            .create_proposal(
                proposer,
                &self.admin,
                &NewProposal {
                    proposal_id: PROPOSAL_ID,
                    vault_id: VAULT_ID,
                    kind: ProposalKind::TokenTransfer,
                    required_threshold,
                    deadline_seconds,
                    name: "Pay auditor",
                    description: "Q3 audit invoice",
                },
            )
            .unwrap();
    }

    fn vote(&self, voter: &Pubkey, choice: VoteChoice) -> Result<Receipt, ClientError> {
        self.client
            .vote(voter, &self.admin, VAULT_ID, PROPOSAL_ID, choice)
    }

    fn status(&self) -> ProposalStatus {
        self.client
            .proposal_status(&self.admin, VAULT_ID, PROPOSAL_ID)
            .unwrap()
    }
}

#[test]
fn threshold_approval_then_finalized() {
    let f = Fixture::new();
    let (m1, m2) = (f.member(), f.member());

    f.init_vault(2);
    let config = f.client.vault_config(&f.admin, VAULT_ID).unwrap();
    assert_eq!(config.member_count, 1);
    assert_eq!(config.threshold, 2);
    assert_eq!(f.client.treasury(&f.admin, VAULT_ID).unwrap().balance, 0);

    f.add(&m1);
    assert_eq!(
        f.client.vault_config(&f.admin, VAULT_ID).unwrap().member_count,
        2
    );

    f.propose(&f.admin, 2, 86_400);
    let proposal = f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Pending);
    assert_eq!(proposal.voting_deadline, GENESIS + 86_400);
    assert_eq!(
        f.client.vault_config(&f.admin, VAULT_ID).unwrap().total_proposals,
        1
    );

    // Joins after the proposal opened; the captured threshold still applies
    f.add(&m2);

    f.vote(&f.admin, VoteChoice::Yes).unwrap();
    let proposal = f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID).unwrap();
    assert_eq!(proposal.yes_votes(), 1);
    assert_eq!(proposal.status, ProposalStatus::Pending);

    let receipt = f.vote(&m1, VoteChoice::Yes).unwrap();
    assert!(receipt
        .logs
        .iter()
        .any(|line| line == &format!("Program log: Proposal {} approved", PROPOSAL_ID)));
    assert_eq!(f.status(), ProposalStatus::Approved);

    let error = f.vote(&m2, VoteChoice::Yes).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::ProposalFinalized));
    assert_eq!(
        f.client
            .proposal(&f.admin, VAULT_ID, PROPOSAL_ID)
            .unwrap()
            .votes
            .len(),
        2
    );
}

#[test]
fn no_votes_never_reject() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(1);
    f.add(&m1);
    f.propose(&m1, 2, 600);

    f.vote(&f.admin, VoteChoice::No).unwrap();
    f.vote(&m1, VoteChoice::No).unwrap();

    let proposal = f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID).unwrap();
    assert_eq!(proposal.no_votes(), 2);
    assert_eq!(proposal.status, ProposalStatus::Pending);
}

#[test]
fn lapsed_proposal_is_persisted_as_expired() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(1);
    f.add(&m1);
    f.propose(&m1, 1, 60);

    f.ledger.advance(61);
    // Readers see the lapse before any vote records it
    assert_eq!(f.status(), ProposalStatus::Expired);
    assert_eq!(
        f.client
            .proposal(&f.admin, VAULT_ID, PROPOSAL_ID)
            .unwrap()
            .status,
        ProposalStatus::Pending
    );

    let error = f.vote(&f.admin, VoteChoice::Yes).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::VotingClosed));
    assert!(error.logs().iter().any(|line| line.contains("expired")));

    let proposal = f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Expired);
    assert!(proposal.votes.is_empty());

    let error = f.vote(&m1, VoteChoice::Yes).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::VotingClosed));
}

#[test]
fn late_vote_on_approved_proposal_is_closed() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(1);
    f.add(&m1);
    f.propose(&f.admin, 1, 60);
    f.vote(&f.admin, VoteChoice::Yes).unwrap();
    assert_eq!(f.status(), ProposalStatus::Approved);

    f.ledger.advance(61);
    let error = f.vote(&m1, VoteChoice::Yes).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::VotingClosed));

    let proposal = f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Approved);
    assert_eq!(proposal.votes.len(), 1);
}

#[test]
fn kept_expiry_leaves_earlier_instructions_uncommitted() {
    let f = Fixture::new();
    let (m1, m2) = (f.member(), f.member());
    f.init_vault(1);
    f.add(&m1);
    f.propose(&m1, 1, 60);
    f.ledger.advance(61);

    let program_id = *f.client.program_id();
    let add = instruction::add_member(&program_id, &f.admin, &f.admin, &m2, VAULT_ID).unwrap();
    let late_vote = instruction::vote_on_proposal(
        &program_id,
        &m1,
        &f.admin,
        VoteArgs {
            proposal_id: PROPOSAL_ID,
            vault_id: VAULT_ID,
            choice: VoteChoice::Yes as u64,
        },
    )
    .unwrap();
    let error = f
        .client
        .send(vec![add, late_vote], &[f.admin, m1])
        .unwrap_err();
    assert_matches!(
        error,
        ClientError::Transport(TransportError::InstructionFailed { index: 1, .. })
    );
    assert_eq!(error.vault_error(), Some(VaultError::VotingClosed));

    let config = f.client.vault_config(&f.admin, VAULT_ID).unwrap();
    assert_eq!(config.member_count, 2);
    assert!(!config.is_member(&m2));
    assert_eq!(
        f.client
            .proposal(&f.admin, VAULT_ID, PROPOSAL_ID)
            .unwrap()
            .status,
        ProposalStatus::Expired
    );
}

#[test]
fn vote_exactly_at_deadline_counts() {
    let f = Fixture::new();
    f.init_vault(1);
    f.propose(&f.admin, 1, 60);
    f.ledger.advance(60);
    f.vote(&f.admin, VoteChoice::Yes).unwrap();
    assert_eq!(f.status(), ProposalStatus::Approved);
}

#[test]
fn only_the_admin_adds_members() {
    let f = Fixture::new();
    let (m1, outsider) = (f.member(), f.member());
    f.init_vault(2);
    f.add(&m1);

    let error = f
        .client
        .add_member(&m1, &f.admin, &outsider, VAULT_ID)
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::NotAdmin));
    let config = f.client.vault_config(&f.admin, VAULT_ID).unwrap();
    assert_eq!(config.member_count, 2);
    assert!(!config.is_member(&outsider));
}

#[test]
fn membership_caps_at_ten() {
    let f = Fixture::new();
    f.init_vault(1);
    for _ in 0..9 {
        f.add(&Pubkey::new_unique());
    }
    assert_eq!(
        f.client.vault_config(&f.admin, VAULT_ID).unwrap().member_count,
        10
    );

    let error = f
        .client
        .add_member(&f.admin, &f.admin, &Pubkey::new_unique(), VAULT_ID)
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::MembershipFull));
}

#[test]
fn duplicate_member_and_duplicate_vault() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(1);
    f.add(&m1);

    let error = f
        .client
        .add_member(&f.admin, &f.admin, &m1, VAULT_ID)
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::DuplicateMember));

    let error = f
        .client
        .init_vault(
            &f.admin,
            &f.mint,
            &NewVault {
                id: VAULT_ID,
                threshold: 1,
                proposal_expiry: 10,
                minimum_balance: 0,
                name: "Again",
                description: "",
            },
        )
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::AlreadyInitialized));
}

#[test]
fn vault_requires_an_existing_asset() {
    let f = Fixture::new();
    let error = f
        .client
        .init_vault(
            &f.admin,
            &Pubkey::new_unique(),
            &NewVault {
                id: VAULT_ID,
                threshold: 1,
                proposal_expiry: 10,
                minimum_balance: 0,
                name: "No asset",
                description: "",
            },
        )
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::InvalidAsset));
    assert_matches!(
        f.client.vault_config(&f.admin, VAULT_ID),
        Err(ClientError::AccountNotFound(_))
    );
}

#[test]
fn outsiders_cannot_propose_or_vote() {
    let f = Fixture::new();
    let outsider = f.member();
    f.init_vault(1);

    let error = f
        .client
        .create_proposal(
            &outsider,
            &f.admin,
            &NewProposal {
                proposal_id: PROPOSAL_ID,
                vault_id: VAULT_ID,
                kind: ProposalKind::Vesting,
                required_threshold: 1,
                deadline_seconds: 60,
                name: "Sneaky",
                description: "",
            },
        )
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::ProposerNotMember));

    f.propose(&f.admin, 1, 60);
    let before = f.ledger.account(
        &f.client
            .proposal_address(&f.admin, VAULT_ID, PROPOSAL_ID)
            .unwrap(),
    );
    let error = f.vote(&outsider, VoteChoice::Yes).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::VoterNotMember));
    assert_eq!(
        f.ledger.account(
            &f.client
                .proposal_address(&f.admin, VAULT_ID, PROPOSAL_ID)
                .unwrap()
        ),
        before
    );
}

#[test]
fn proposal_ids_are_unique_per_vault() {
    let f = Fixture::new();
    f.init_vault(1);
    f.propose(&f.admin, 1, 60);
    let error = f
        .client
        .create_proposal(
            &f.admin,
            &f.admin,
            &NewProposal {
                proposal_id: PROPOSAL_ID,
                vault_id: VAULT_ID,
                kind: ProposalKind::BatchPayment,
                required_threshold: 1,
                deadline_seconds: 60,
                name: "Again",
                description: "",
            },
        )
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::ProposalIdCollision));
}

#[test_case(0, 60 => Some(VaultError::InvalidThreshold) ; "zero threshold")]
#[test_case(1, 60 => None ; "below vault threshold")]
#[test_case(2, 86_400 => None ; "full window")]
#[test_case(3, 60 => Some(VaultError::ThresholdExceedsMembership) ; "above member count")]
#[test_case(2, 0 => Some(VaultError::InvalidDeadline) ; "zero window")]
#[test_case(2, 86_401 => Some(VaultError::InvalidDeadline) ; "beyond vault expiry")]
fn proposal_bounds(required_threshold: u8, deadline_seconds: u64) -> Option<VaultError> {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(2);
    f.add(&m1);
    let error = f
        .client
        .create_proposal(
            &m1,
            &f.admin,
            &NewProposal {
                proposal_id: PROPOSAL_ID,
                vault_id: VAULT_ID,
                kind: ProposalKind::PaymentStream,
                required_threshold,
                deadline_seconds,
                name: "Bounds",
                description: "",
            },
        )
        .err()?;
    Some(error.vault_error().unwrap())
}

#[test_case(3 ; "required above member count")]
#[test_case(0 ; "zero required")]
fn membership_is_checked_before_threshold_validity(required_threshold: u8) {
    let f = Fixture::new();
    f.init_vault(5);
    let error = f
        .client
        .create_proposal(
            &f.admin,
            &f.admin,
            &NewProposal {
                proposal_id: PROPOSAL_ID,
                vault_id: VAULT_ID,
                kind: ProposalKind::Vesting,
                required_threshold,
                deadline_seconds: 60,
                name: "Early",
                description: "",
            },
        )
        .unwrap_err();
    assert_eq!(
        error.vault_error(),
        Some(VaultError::ThresholdExceedsMembership)
    );
}

#[test]
fn failed_transaction_commits_nothing() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(1);
    let program_id = *f.client.program_id();

    // A valid addition followed by a duplicate of it
    let add = || {
        instruction::add_member(&program_id, &f.admin, &f.admin, &m1, VAULT_ID).unwrap()
    };
    let error = f.client.send(vec![add(), add()], &[f.admin]).unwrap_err();
    assert_matches!(
        error,
        ClientError::Transport(TransportError::InstructionFailed { index: 1, .. })
    );
    assert_eq!(error.vault_error(), Some(VaultError::DuplicateMember));
    assert!(!f.client.vault_config(&f.admin, VAULT_ID).unwrap().is_member(&m1));

    // A funded proposal creation followed by a vote the vault refuses
    let lamports = f.ledger.lamports(&f.admin);
    let create = instruction::create_proposal(
        &program_id,
        &f.admin,
        &f.admin,
        CreateProposalArgs {
            proposal_id: PROPOSAL_ID,
            vault_id: VAULT_ID,
            kind: ProposalKind::TokenSwap as u8,
            required_threshold: 1,
            deadline_seconds: 60,
            name: Default::default(),
            description: Default::default(),
        },
    )
    .unwrap();
    let bad_vote = instruction::vote_on_proposal(
        &program_id,
        &f.admin,
        &f.admin,
        VoteArgs {
            proposal_id: PROPOSAL_ID,
            vault_id: VAULT_ID,
            choice: 7,
        },
    )
    .unwrap();
    let error = f
        .client
        .send(vec![create, bad_vote], &[f.admin])
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::InvalidChoice));
    assert_eq!(f.ledger.lamports(&f.admin), lamports);
    assert_matches!(
        f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID),
        Err(ClientError::AccountNotFound(_))
    );
}

#[test]
fn instructions_in_one_transaction_see_earlier_writes() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(2);
    let program_id = *f.client.program_id();

    let add = instruction::add_member(&program_id, &f.admin, &f.admin, &m1, VAULT_ID).unwrap();
    let create = instruction::create_proposal(
        &program_id,
        &m1,
        &f.admin,
        CreateProposalArgs {
            proposal_id: PROPOSAL_ID,
            vault_id: VAULT_ID,
            kind: ProposalKind::OneTimePayment as u8,
            required_threshold: 2,
            deadline_seconds: 3_600,
            name: Default::default(),
            description: Default::default(),
        },
    )
    .unwrap();
    f.client.send(vec![add, create], &[f.admin, m1]).unwrap();
    assert_eq!(f.status(), ProposalStatus::Pending);
}

#[test]
fn unsigned_and_malformed_submissions() {
    let f = Fixture::new();
    let m1 = f.member();
    f.init_vault(1);
    let program_id = *f.client.program_id();

    let add = instruction::add_member(&program_id, &f.admin, &f.admin, &m1, VAULT_ID).unwrap();
    assert_matches!(
        f.client.send(vec![add], &[m1]),
        Err(ClientError::Transport(TransportError::MissingSignature(key))) if key == f.admin
    );

    let mut unknown = instruction::add_member(&program_id, &f.admin, &f.admin, &m1, VAULT_ID)
        .unwrap();
    unknown.data = vec![9];
    let error = f.client.send(vec![unknown], &[f.admin]).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::UnknownInstruction));

    let empty = Instruction {
        program_id,
        accounts: vec![],
        data: VaultInstruction::AddMember(AddMemberArgs { vault_id: VAULT_ID }).pack(),
    };
    assert_matches!(
        f.client.send(vec![empty], &[]),
        Err(ClientError::Transport(TransportError::InstructionFailed {
            error: solana_program::program_error::ProgramError::NotEnoughAccountKeys,
            ..
        }))
    );
}

#[test]
fn forged_vault_record_is_rejected() {
    let f = Fixture::new();
    f.init_vault(1);
    let address = f.client.vault_config_address(&f.admin, VAULT_ID).unwrap();
    let account = f.ledger.account(&address).unwrap();

    // Same bytes under a foreign owner no longer count as a vault
    f.ledger.set_account(
        address,
        StoredAccount::new(account.lamports, Pubkey::new_unique(), account.data.clone()),
    );
    let error = f
        .client
        .add_member(&f.admin, &f.admin, &Pubkey::new_unique(), VAULT_ID)
        .unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::VaultNotFound));
}

/// Counts submissions and fails the first `failures` of them with `error`.
struct FlakyTransport {
    inner: Ledger,
    calls: AtomicUsize,
    failures: usize,
    error: TransportError,
}

impl Transport for FlakyTransport {
    fn submit(&self, transaction: &Transaction) -> Result<Receipt, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(self.error.clone());
        }
        self.inner.submit(transaction)
    }

    fn get_account(&self, key: &Pubkey) -> Result<Option<StoredAccount>, TransportError> {
        self.inner.get_account(key)
    }

    fn unix_timestamp(&self) -> Result<i64, TransportError> {
        self.inner.unix_timestamp()
    }
}

fn flaky_client(failures: usize, error: TransportError) -> (VaultClient<FlakyTransport>, Pubkey, Pubkey) {
    init_tracing();
    let ledger = Ledger::new(GENESIS);
    let admin = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    ledger.airdrop(&admin, FUNDS);
    ledger.create_mint(&admin, &mint, &admin, 0).unwrap();
    let transport = FlakyTransport {
        inner: ledger,
        calls: AtomicUsize::new(0),
        failures,
        error,
    };
    let client = VaultClient::new(transport, ClientConfig::local().with_max_retries(3)).unwrap();
    (client, admin, mint)
}

fn small_vault() -> NewVault<'static> {
    NewVault {
        id: 1,
        threshold: 1,
        proposal_expiry: 60,
        minimum_balance: 0,
        name: "Flaky",
        description: "",
    }
}

#[test]
fn transient_failures_are_retried() {
    let (client, admin, mint) =
        flaky_client(2, TransportError::Unavailable("connection reset".to_string()));
    client.init_vault(&admin, &mint, &small_vault()).unwrap();
    assert_eq!(client.transport().calls.load(Ordering::SeqCst), 3);
    assert_eq!(client.vault_config(&admin, 1).unwrap().member_count, 1);
}

#[test]
fn retry_budget_is_bounded() {
    let (client, admin, mint) = flaky_client(
        10,
        TransportError::ConfirmationTimeout(Default::default()),
    );
    assert_matches!(
        client.init_vault(&admin, &mint, &small_vault()),
        Err(ClientError::MaxRetriesExceeded { retries: 3, .. })
    );
    assert_eq!(client.transport().calls.load(Ordering::SeqCst), 4);
}

#[test]
fn logical_failures_are_not_retried() {
    let (client, admin, mint) = flaky_client(0, TransportError::Unavailable(String::new()));
    client.init_vault(&admin, &mint, &small_vault()).unwrap();
    let error = client.init_vault(&admin, &mint, &small_vault()).unwrap_err();
    assert_eq!(error.vault_error(), Some(VaultError::AlreadyInitialized));
    assert_eq!(client.transport().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_votes_are_serialized() {
    let f = Fixture::new();
    let members: Vec<Pubkey> = (0..4).map(|_| f.member()).collect();
    f.init_vault(5);
    for member in &members {
        f.add(member);
    }
    f.propose(&f.admin, 5, 3_600);

    let handles: Vec<_> = members
        .iter()
        .chain(std::iter::once(&f.admin))
        .map(|voter| {
            let voter = *voter;
            let admin = f.admin;
            let ledger = Arc::clone(&f.ledger);
            std::thread::spawn(move || {
                let client = VaultClient::new(ledger, ClientConfig::local()).unwrap();
                client.vote(&voter, &admin, VAULT_ID, PROPOSAL_ID, VoteChoice::Yes)
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let proposal = f.client.proposal(&f.admin, VAULT_ID, PROPOSAL_ID).unwrap();
    assert_eq!(proposal.yes_votes(), 5);
    assert_eq!(proposal.status, ProposalStatus::Approved);
}
