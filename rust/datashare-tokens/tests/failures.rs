//! How ledger failures surface through the credential services.

use datashare_ledger::{Address, Fault, GatewayError, MemoryGateway, MemoryLedger, revert};
use datashare_tokens::{
    CredentialError, Datashare, FailureKind, InvalidInput, ServiceConfig, StateEffect,
};
use pretty_assertions::assert_eq;
use testresult::TestResult;

const ADMIN: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";
const ALICE: &str = "0xffcf8fdee72ac11b5c542428b35eef5769c409f0";
const MALLORY: &str = "0x1df62f291b2e969fb0849d99d9ce41e2f137006e";

fn ledger() -> MemoryLedger {
    let admin: Address = ADMIN.parse().unwrap();
    MemoryLedger::new(admin)
}

fn datashare(ledger: &MemoryLedger) -> Datashare<MemoryGateway> {
    Datashare::new(ledger.connect(), ServiceConfig::default())
}

#[tokio::test]
async fn it_rejects_issuance_by_non_owners() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    let error = datashare
        .credentials
        .authorize_provider(MALLORY, ALICE)
        .await
        .expect_err("only the owner may issue");

    assert_eq!(error.kind(), FailureKind::Unauthorized);
    assert!(matches!(
        error.cause(),
        Some(GatewayError::Reverted { reason: Some(reason) }) if reason == revert::NOT_OWNER
    ));
    assert!(datashare.credentials.get_provider_token_id(ALICE).await.is_err());

    Ok(())
}

#[tokio::test]
async fn it_rejects_malformed_identities_before_sending() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    // A queued fault stays queued when nothing reaches the ledger
    ledger.inject(Fault::Unreachable).await;

    let error = datashare
        .credentials
        .authorize_provider(ADMIN, "0xnot-an-address")
        .await
        .expect_err("malformed subject");
    assert!(matches!(
        error,
        CredentialError::InvalidInput(InvalidInput::MalformedAddress { field: "subject", .. })
    ));

    let error = datashare
        .credentials
        .get_analyzer_token_id("0x0000000000000000000000000000000000000000")
        .await
        .expect_err("zero subject");
    assert!(matches!(
        error,
        CredentialError::InvalidInput(InvalidInput::ZeroAddress { field: "subject" })
    ));

    let error = datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data", ""])
        .await
        .expect_err("empty policy label");
    assert_eq!(error.kind(), FailureKind::InvalidInput);

    assert!(matches!(
        datashare.credentials.authorize_provider(ADMIN, ALICE).await,
        Err(CredentialError::Transport {
            effect: StateEffect::Unchanged,
            ..
        })
    ));

    Ok(())
}

#[tokio::test]
async fn it_retries_safely_after_an_unreachable_ledger() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    ledger.inject(Fault::Unreachable).await;
    let error = datashare
        .credentials
        .authorize_provider(ADMIN, ALICE)
        .await
        .expect_err("ledger is offline");

    assert_eq!(error.kind(), FailureKind::TransportError);
    assert!(error.is_retryable());

    let issued = datashare.credentials.authorize_provider(ADMIN, ALICE).await?;
    assert_eq!(issued.token_id.get(), 1);

    Ok(())
}

#[tokio::test]
async fn it_reports_insufficient_gas_as_retryable() -> TestResult {
    let ledger = ledger();
    let starved = Datashare::new(
        ledger.connect(),
        ServiceConfig::default().with_gas_limit(10_000),
    );

    let error = starved
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data"])
        .await
        .expect_err("gas ceiling is too low");

    assert_eq!(error.kind(), FailureKind::TransportError);
    assert_eq!(error.effect(), StateEffect::Unchanged);
    assert!(matches!(
        error.cause(),
        Some(GatewayError::OutOfGas { limit: 10_000, .. })
    ));
    assert!(datashare(&ledger).policies.get_all_access_policies().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn it_does_not_report_success_for_pending_transactions() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    ledger.inject(Fault::Pending).await;
    let error = datashare
        .credentials
        .authorize_provider(ADMIN, ALICE)
        .await
        .expect_err("receipt is not final");

    assert_eq!(error.kind(), FailureKind::TransportError);
    assert_eq!(error.effect(), StateEffect::Unknown);
    assert!(!error.is_retryable());

    Ok(())
}

#[tokio::test]
async fn it_treats_timeouts_as_inconclusive() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    datashare.credentials.authorize_provider(ADMIN, ALICE).await?;
    ledger.inject(Fault::Timeout).await;

    let error = datashare
        .credentials
        .unauthorize_provider(ADMIN, ALICE)
        .await
        .expect_err("receipt never arrived");

    assert_eq!(error.effect(), StateEffect::Unknown);
    assert!(!error.is_retryable());

    // Reads after the fact establish what happened
    assert!(matches!(
        datashare.credentials.get_provider_token_id(ALICE).await,
        Err(CredentialError::NoCredential { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn it_flags_receipts_without_a_minted_token() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    ledger.inject(Fault::DropEvents).await;
    let error = datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data"])
        .await
        .expect_err("no transfer event");

    assert!(matches!(
        &error,
        CredentialError::Transport { reason, effect: StateEffect::Unknown, .. }
            if reason.contains("malformed response")
    ));

    Ok(())
}

#[tokio::test]
async fn it_never_marks_failed_reads_as_state_changing() -> TestResult {
    let ledger = ledger();
    let datashare = datashare(&ledger);

    ledger.inject(Fault::Timeout).await;
    let error = datashare
        .policies
        .get_all_access_policies()
        .await
        .expect_err("read timed out");

    assert!(error.is_retryable());

    Ok(())
}
