use std::collections::BTreeSet;

use datashare_ledger::{
    Address, LedgerGateway, MemoryGateway, MemoryLedger, RegistryName, Transaction,
    TransactionOptions,
};
use datashare_tokens::{AccessPolicy, CredentialError, Datashare, ServiceConfig};
use pretty_assertions::assert_eq;
use testresult::TestResult;

const ADMIN: &str = "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1";
const ALICE: &str = "0xffcf8fdee72ac11b5c542428b35eef5769c409f0";
const BOB: &str = "0x22d491bde2303f2f43325b2108d26f1eaba1e32b";
const CAROL: &str = "0xe11ba2b4d45eaed5996cd0823791e0c93114882d";

fn datashare() -> Datashare<MemoryGateway> {
    let admin: Address = ADMIN.parse().unwrap();
    Datashare::new(MemoryLedger::new(admin).connect(), ServiceConfig::default())
}

fn labels(policies: &BTreeSet<AccessPolicy>) -> Vec<&str> {
    policies.iter().map(AccessPolicy::as_str).collect()
}

#[tokio::test]
async fn it_reports_exactly_the_granted_policies() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data"])
        .await?;
    let grant = datashare.policies.get_access_policies(ALICE).await?;

    assert_eq!(grant.subject.as_str(), ALICE);
    assert_eq!(labels(&grant.policies), vec!["health_data"]);

    Ok(())
}

#[tokio::test]
async fn it_collects_every_granted_policy_in_the_catalog() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data", "mobility"])
        .await?;
    datashare
        .credentials
        .authorize_analyzer(ADMIN, BOB, ["mobility", "energy"])
        .await?;

    let catalog = datashare.policies.get_all_access_policies().await?;

    assert_eq!(labels(&catalog), vec!["energy", "health_data", "mobility"]);

    Ok(())
}

#[tokio::test]
async fn it_answers_empty_for_identities_without_policies() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, Vec::<&str>::new())
        .await?;

    assert!(datashare.policies.get_access_policies(ALICE).await?.policies.is_empty());
    assert!(datashare.policies.get_access_policies(BOB).await?.policies.is_empty());
    assert!(datashare.policies.get_all_access_policies().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn it_empties_the_catalog_on_reset() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data"])
        .await?;
    datashare
        .credentials
        .authorize_analyzer(ADMIN, BOB, ["mobility", "energy"])
        .await?;
    datashare
        .credentials
        .authorize_analyzer(ADMIN, CAROL, ["health_data", "energy"])
        .await?;

    let reset = datashare.policies.remove_all_access_policies(ADMIN).await?;

    assert!(!reset.transaction_hash.is_empty());
    assert!(datashare.policies.get_all_access_policies().await?.is_empty());
    for analyzer in [ALICE, BOB, CAROL] {
        assert!(
            datashare
                .policies
                .get_access_policies(analyzer)
                .await?
                .policies
                .is_empty()
        );

        // The credential itself survives the reset
        let held = datashare.credentials.get_analyzer_token_id(analyzer).await?;
        assert!(held.policies.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn it_keeps_caller_labels_verbatim() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, [" health_data", "health_data"])
        .await?;

    assert_eq!(
        labels(&datashare.policies.get_access_policies(ALICE).await?.policies),
        vec![" health_data", "health_data"]
    );

    Ok(())
}

#[tokio::test]
async fn it_reads_whatever_labels_the_ledger_holds() -> TestResult {
    let admin: Address = ADMIN.parse()?;
    let ledger = MemoryLedger::new(admin.clone());
    let datashare = Datashare::new(ledger.connect(), ServiceConfig::default());

    // Another client of the ledger stored labels this layer would never send
    ledger
        .connect()
        .send(
            RegistryName::DataAnalyzers,
            Transaction::AuthorizeAnalyzer {
                recipient: BOB.parse()?,
                access_policies: vec!["".into(), " x".into()],
            },
            TransactionOptions::new(admin, 1_000_000),
        )
        .await?;

    assert_eq!(
        labels(&datashare.policies.get_all_access_policies().await?),
        vec!["", " x"]
    );
    assert_eq!(
        labels(&datashare.credentials.get_analyzer_token_id(BOB).await?.policies),
        vec!["", " x"]
    );
    assert_eq!(
        labels(&datashare.policies.get_access_policies(BOB).await?.policies),
        vec!["", " x"]
    );

    Ok(())
}

#[tokio::test]
async fn it_drops_grants_but_keeps_the_catalog_on_revocation() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data"])
        .await?;
    datashare.credentials.unauthorize_analyzer(ADMIN, ALICE).await?;

    assert!(datashare.policies.get_access_policies(ALICE).await?.policies.is_empty());
    assert_eq!(
        labels(&datashare.policies.get_all_access_policies().await?),
        vec!["health_data"]
    );

    Ok(())
}

#[tokio::test]
async fn it_leaves_the_catalog_alone_when_a_reset_is_refused() -> TestResult {
    let datashare = datashare();

    datashare
        .credentials
        .authorize_analyzer(ADMIN, ALICE, ["health_data"])
        .await?;
    let refused = datashare.policies.remove_all_access_policies(BOB).await;

    assert!(matches!(
        refused,
        Err(CredentialError::Unauthorized { ref initiator, .. }) if initiator.as_str() == BOB
    ));
    assert_eq!(
        labels(&datashare.policies.get_all_access_policies().await?),
        vec!["health_data"]
    );

    Ok(())
}
