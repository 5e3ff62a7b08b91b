use assert_matches::assert_matches;
use ibc_solana_submitter::advanced::builders::unsigned_transaction;
use ibc_solana_submitter::{ConfirmationLevel, DynSigner, SubmitterConfig, SubmitterError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use std::time::Duration;

mod common;
use common::{
    invokes, setup_submitter, setup_submitter_with, tagged_ix, test_config, MockChain, Outcome,
};

#[tokio::test(start_paused = true)]
async fn test_finalized_satisfies_confirmed_on_first_poll() {
    let chain = MockChain::new().with_landing_level(ConfirmationLevel::Finalized);
    let (submitter, chain) = setup_submitter(chain);
    let program = Pubkey::new_unique();

    let signature = submitter
        .send_instructions(&[tagged_ix(program, 1, &submitter.payer())])
        .await
        .unwrap();

    assert_eq!(chain.send_attempts(), 1);
    assert_eq!(chain.status_queries(), 1);
    assert_eq!(chain.landed()[0].signature, signature);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_timeout_plus_one_attempts() {
    let chain = MockChain::new();
    chain.on(|_| true, Outcome::Reject, None);
    let config = SubmitterConfig {
        tx_timeout_secs: 30,
        ..test_config()
    };
    let (submitter, chain) = setup_submitter_with(chain, config);
    let program = Pubkey::new_unique();

    let start = tokio::time::Instant::now();
    let err = submitter
        .send_instructions(&[tagged_ix(program, 1, &submitter.payer())])
        .await
        .unwrap_err();

    assert_matches!(err, SubmitterError::RetriesExhausted { .. });
    assert_matches!(err.root_cause(), SubmitterError::Connection(_));
    assert_eq!(chain.send_attempts(), 31);
    assert_eq!(start.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_on_chain_failure_is_retried_with_fresh_blockhash() {
    let chain = MockChain::new();
    let program = Pubkey::new_unique();
    chain.on(invokes(program), Outcome::FailOnChain, Some(1));
    let (submitter, chain) = setup_submitter(chain);

    let signature = submitter
        .send_instructions(&[tagged_ix(program, 1, &submitter.payer())])
        .await
        .unwrap();

    let sent = chain.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].outcome, Outcome::FailOnChain);
    assert_eq!(sent[1].outcome, Outcome::Land);
    assert_ne!(sent[0].blockhash, sent[1].blockhash);
    assert_ne!(sent[0].signature, signature);
    assert_eq!(sent[1].signature, signature);
}

#[tokio::test(start_paused = true)]
async fn test_status_window_is_capped_by_remaining_budget() {
    let chain = MockChain::new();
    chain.on(|_| true, Outcome::Drop, None);
    let config = SubmitterConfig {
        tx_timeout_secs: 5,
        status_timeout_secs: 2,
        ..test_config()
    };
    let (submitter, chain) = setup_submitter_with(chain, config);
    let program = Pubkey::new_unique();

    let err = submitter
        .send_instructions(&[tagged_ix(program, 1, &submitter.payer())])
        .await
        .unwrap_err();

    // t=0 polls until t=2, sleeps to t=3, polls until t=5 and stops
    assert_eq!(chain.send_attempts(), 2);
    assert_matches!(
        err.root_cause(),
        SubmitterError::StatusTimeout {
            level: ConfirmationLevel::Confirmed,
            ..
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_signer_list_is_rejected() {
    let (submitter, chain) = setup_submitter(MockChain::new());
    let program = Pubkey::new_unique();
    let payer = submitter.payer();
    let mut tx = unsigned_transaction(&[tagged_ix(program, 1, &payer)], &payer);

    let err = submitter
        .send_with_retry(&mut tx, ConfirmationLevel::Confirmed, 5, &[])
        .await
        .unwrap_err();

    assert_matches!(err, SubmitterError::NoSigners);
    assert_eq!(chain.send_attempts(), 0);
}

#[tokio::test(start_paused = true)]
#[should_panic(expected = "not found among provided keys")]
async fn test_missing_signer_panics() {
    let (submitter, _chain) = setup_submitter(MockChain::new());
    let program = Pubkey::new_unique();
    let stranger = Keypair::new();
    let payer = submitter.payer();
    let mut tx = unsigned_transaction(&[tagged_ix(program, 1, &payer)], &payer);

    let signer: &DynSigner = &stranger;
    let _ = submitter
        .send_with_retry(&mut tx, ConfirmationLevel::Confirmed, 5, &[signer])
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_extra_signers_are_ignored() {
    let (submitter, chain) = setup_submitter(MockChain::new());
    let program = Pubkey::new_unique();
    let owner = Keypair::new();
    let bystander = Keypair::new();
    let mut tx = unsigned_transaction(&[tagged_ix(program, 7, &owner.pubkey())], &owner.pubkey());

    let signers: [&DynSigner; 2] = [&bystander, &owner];
    let signature = submitter
        .send_with_retry(&mut tx, ConfirmationLevel::Confirmed, 5, &signers)
        .await
        .unwrap();

    assert_eq!(tx.signatures, vec![signature]);
    assert_eq!(chain.landed().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_unknown_signature_times_out() {
    let (submitter, chain) = setup_submitter(MockChain::new());

    let err = submitter
        .wait_for_status(&Signature::new_unique(), ConfirmationLevel::Processed)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        SubmitterError::StatusTimeout { waited, .. } if waited == Duration::from_secs(5)
    );
    assert_eq!(chain.status_queries(), 6);
}
