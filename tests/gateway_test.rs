//! Chain gateway behaviour against an in-memory chain

mod common;

use alloy::primitives::U256;

use common::{MockChain, FUNDED_ADDRESS, FUNDED_KEY, ONE_ETHER, OTHER_ADDRESS};
use testwallet::domain::validate::ValidationError;
use testwallet::domain::{Direction, NetworkKey, NetworkTable, UnknownNetwork};
use testwallet::infrastructure::ethereum::{
    ChainGateway, TransferError, TransferOutcome, TRANSFER_GAS_LIMIT,
};

const THIRD: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

fn gateway(chain: &MockChain) -> ChainGateway<MockChain> {
    ChainGateway::with_connector(NetworkTable::default(), chain.clone())
}

#[test]
fn test_starts_on_default_network() {
    let chain = MockChain::new();
    let gateway = gateway(&chain);
    assert_eq!(gateway.current_network().key, NetworkKey::EthereumGoerli);
    assert_eq!(gateway.available_networks().count(), 2);
}

#[test]
fn test_select_network() {
    let chain = MockChain::new();
    let mut gateway = gateway(&chain);

    let network = gateway.select_network("POLYGON_MUMBAI").unwrap();
    assert_eq!(network.name, "Polygon Mumbai");
    assert_eq!(network.symbol, "MATIC");
    assert_eq!(gateway.current_network().chain_id, 80001);

    let network = gateway.select_network("ETHEREUM_GOERLI").unwrap();
    assert_eq!(network.name, "Ethereum Goerli");
    assert_eq!(network.symbol, "ETH");
}

#[test]
fn test_select_unknown_network_keeps_selection() {
    let chain = MockChain::new();
    let mut gateway = gateway(&chain);
    gateway.select(NetworkKey::PolygonMumbai);

    let err = gateway.select_network("BITCOIN_TESTNET").unwrap_err();
    assert_eq!(err, UnknownNetwork("BITCOIN_TESTNET".to_string()));
    assert_eq!(gateway.current_network().key, NetworkKey::PolygonMumbai);
}

#[test]
fn test_gateways_do_not_share_selection() {
    let chain = MockChain::new();
    let mut first = gateway(&chain);
    let second = gateway(&chain);
    first.select(NetworkKey::PolygonMumbai);
    assert_eq!(second.current_network().key, NetworkKey::EthereumGoerli);
}

#[tokio::test]
async fn test_fresh_connection_per_call() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, ONE_ETHER);
    let mut gateway = gateway(&chain);

    gateway.balance(FUNDED_ADDRESS).await.unwrap();
    gateway.select(NetworkKey::PolygonMumbai);
    gateway.balance(FUNDED_ADDRESS).await.unwrap();

    let connections = chain.state().connections.clone();
    assert_eq!(
        connections,
        vec![
            "https://goerli.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161".to_string(),
            "https://rpc-mumbai.maticvigil.com".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_balance_in_display_units() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, ONE_ETHER + ONE_ETHER / 2);
    let gateway = gateway(&chain);

    assert_eq!(gateway.balance(FUNDED_ADDRESS).await.unwrap(), "1.5");
    // lowercase input resolves to the same account
    assert_eq!(
        gateway.balance(&FUNDED_ADDRESS.to_lowercase()).await.unwrap(),
        "1.5"
    );
    assert_eq!(gateway.balance(OTHER_ADDRESS).await.unwrap(), "0");
}

#[tokio::test]
async fn test_balance_rejects_bad_address() {
    let chain = MockChain::new();
    let gateway = gateway(&chain);
    assert!(gateway.balance("not-an-address").await.is_err());
    assert_eq!(chain.connection_count(), 0);
}

#[tokio::test]
async fn test_transfer_submitted() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, 2 * ONE_ETHER);
    let gateway = gateway(&chain);

    let outcome = gateway
        .submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "0.25")
        .await;
    assert!(outcome.is_success(), "unexpected outcome {outcome:?}");

    let receipt = outcome.receipt().unwrap();
    assert_eq!(receipt.hash, format!("0x{}", "ab".repeat(32)));
    assert_eq!(
        receipt.explorer_url,
        format!("https://goerli.etherscan.io/tx/{}", receipt.hash)
    );

    let sent = chain.state().sent.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from.to_checksum(None), FUNDED_ADDRESS);
    assert_eq!(sent[0].to.to_checksum(None), OTHER_ADDRESS);
    assert_eq!(sent[0].value, U256::from(ONE_ETHER / 4));
    assert_eq!(sent[0].gas_limit, TRANSFER_GAS_LIMIT);
}

#[tokio::test]
async fn test_transfer_explorer_follows_network() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, ONE_ETHER);
    let mut gateway = gateway(&chain);
    gateway.select(NetworkKey::PolygonMumbai);

    let outcome = gateway.submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "0.1").await;
    let receipt = outcome.receipt().unwrap();
    assert!(receipt
        .explorer_url
        .starts_with("https://mumbai.polygonscan.com/tx/0x"));
}

#[tokio::test]
async fn test_transfer_over_balance_never_submits() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, ONE_ETHER);
    let gateway = gateway(&chain);

    let outcome = gateway.submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "1.5").await;
    assert!(!outcome.is_success());
    assert_eq!(
        outcome.error(),
        Some(&TransferError::InsufficientBalance {
            balance: "1".to_string(),
            requested: "1.5".to_string(),
            symbol: "ETH".to_string(),
        })
    );
    assert!(chain.state().sent.is_empty());
}

#[tokio::test]
async fn test_transfer_recipient_without_prefix_rejected_before_rpc() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, ONE_ETHER);
    let gateway = gateway(&chain);

    let outcome = gateway
        .submit_transfer(FUNDED_KEY, &OTHER_ADDRESS[2..], "0.1")
        .await;
    assert_eq!(
        outcome,
        TransferOutcome::Failed(TransferError::Validation(ValidationError::MissingHexPrefix))
    );
    assert_eq!(
        outcome.error().unwrap().to_string(),
        "recipient address must start with 0x"
    );
    assert_eq!(chain.connection_count(), 0);
}

#[tokio::test]
async fn test_transfer_missing_parameters() {
    let chain = MockChain::new();
    let gateway = gateway(&chain);

    let cases = [
        ("", OTHER_ADDRESS, "1", "private key"),
        (FUNDED_KEY, " ", "1", "recipient address"),
        (FUNDED_KEY, OTHER_ADDRESS, "", "amount"),
    ];
    for (key, to, amount, field) in cases {
        let outcome = gateway.submit_transfer(key, to, amount).await;
        assert_eq!(
            outcome.error(),
            Some(&TransferError::Validation(ValidationError::Missing(field)))
        );
    }
    assert_eq!(chain.connection_count(), 0);
}

#[tokio::test]
async fn test_transfer_rejects_bad_amount_and_key() {
    let chain = MockChain::new();
    let gateway = gateway(&chain);

    let outcome = gateway.submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "0").await;
    assert_eq!(
        outcome.error(),
        Some(&TransferError::Validation(ValidationError::NonPositiveAmount))
    );

    let outcome = gateway.submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "abc").await;
    assert!(matches!(
        outcome.error(),
        Some(TransferError::Validation(ValidationError::InvalidAmount(_)))
    ));

    let outcome = gateway.submit_transfer("0x1234", OTHER_ADDRESS, "1").await;
    assert_eq!(outcome.error(), Some(&TransferError::InvalidPrivateKey));

    assert_eq!(chain.connection_count(), 0);
}

#[tokio::test]
async fn test_transfer_failures_are_categorised() {
    let cases = [
        (
            "insufficient funds for gas * price + value",
            TransferError::InsufficientFunds,
        ),
        ("nonce too low", TransferError::NonceConflict),
        ("request timed out", TransferError::Timeout),
        ("user rejected transaction", TransferError::Rejected),
        (
            "execution reverted",
            TransferError::Rpc("execution reverted".to_string()),
        ),
    ];

    for (message, expected) in cases {
        let chain = MockChain::new();
        chain.fund(FUNDED_ADDRESS, ONE_ETHER);
        chain.state().send_error = Some(message.to_string());
        let gateway = gateway(&chain);

        let outcome = gateway.submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "0.1").await;
        assert_eq!(outcome, TransferOutcome::Failed(expected));
    }
}

#[tokio::test]
async fn test_transfer_without_fee_data() {
    let chain = MockChain::new();
    chain.fund(FUNDED_ADDRESS, ONE_ETHER);
    chain.state().gas_price = None;
    let gateway = gateway(&chain);

    let outcome = gateway.submit_transfer(FUNDED_KEY, OTHER_ADDRESS, "0.1").await;
    assert!(outcome.is_success());
}

#[test]
fn test_outcome_json_shape() {
    let ok = TransferOutcome::Submitted(testwallet::infrastructure::ethereum::TransferReceipt {
        hash: "0xabc".to_string(),
        explorer_url: "https://goerli.etherscan.io/tx/0xabc".to_string(),
    });
    let value = serde_json::to_value(&ok).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["hash"], "0xabc");
    assert_eq!(value["blockExplorer"], "https://goerli.etherscan.io/tx/0xabc");
    assert!(value.get("error").is_none());

    let failed = TransferOutcome::Failed(TransferError::NonceConflict);
    let value = serde_json::to_value(&failed).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["errorKind"], "nonce_conflict");
    assert!(value.get("hash").is_none());
}

fn seeded_chain() -> MockChain {
    let chain = MockChain::new();
    let me = FUNDED_ADDRESS;
    let me_lower = FUNDED_ADDRESS.to_lowercase();
    chain.push_block(&[(me, Some(OTHER_ADDRESS), ONE_ETHER)]); // 0
    chain.push_block(&[(THIRD, Some(OTHER_ADDRESS), ONE_ETHER)]); // 1
    chain.push_block(&[(OTHER_ADDRESS, Some(me_lower.as_str()), ONE_ETHER / 2)]); // 2
    chain.push_block(&[]); // 3
    chain.push_block(&[
        (me, Some(THIRD), 3 * ONE_ETHER),
        (THIRD, None, 0),
        (THIRD, Some(me), ONE_ETHER / 10),
    ]); // 4
    chain.push_block(&[(THIRD, Some(OTHER_ADDRESS), ONE_ETHER)]); // 5
    chain
}

#[tokio::test]
async fn test_scan_newest_first_and_bounded() {
    let chain = seeded_chain();
    let gateway = gateway(&chain);

    let txs = gateway
        .scan_recent_transactions(FUNDED_ADDRESS, 3)
        .await
        .unwrap();

    assert_eq!(txs.len(), 3);
    let blocks: Vec<u64> = txs.iter().map(|tx| tx.block_number).collect();
    assert_eq!(blocks, vec![4, 4, 2]);

    assert_eq!(txs[0].direction, Direction::Sent);
    assert_eq!(txs[0].display_amount(), "-3");
    assert_eq!(txs[1].direction, Direction::Received);
    assert_eq!(txs[1].display_amount(), "+0.1");
    assert_eq!(txs[2].direction, Direction::Received);
    assert_eq!(txs[2].value, "0.5");
    assert!(txs[2].timestamp.is_some());

    for tx in &txs {
        let matches = tx.from.eq_ignore_ascii_case(FUNDED_ADDRESS)
            || tx
                .to
                .as_deref()
                .is_some_and(|to| to.eq_ignore_ascii_case(FUNDED_ADDRESS));
        assert!(matches, "{tx:?} does not touch the address");
    }

    // stopped as soon as the limit was hit
    assert_eq!(chain.state().fetched_blocks, vec![5, 4, 3, 2]);
}

#[tokio::test]
async fn test_scan_walks_to_genesis() {
    let chain = seeded_chain();
    let gateway = gateway(&chain);

    let txs = gateway
        .scan_recent_transactions(&FUNDED_ADDRESS.to_uppercase().replacen("0X", "0x", 1), 10)
        .await
        .unwrap();

    let blocks: Vec<u64> = txs.iter().map(|tx| tx.block_number).collect();
    assert_eq!(blocks, vec![4, 4, 2, 0]);
    assert_eq!(chain.state().fetched_blocks, vec![5, 4, 3, 2, 1, 0]);
}

#[tokio::test]
async fn test_scan_quiet_address() {
    let chain = seeded_chain();
    let gateway = gateway(&chain);

    let quiet = "0x0000000000000000000000000000000000000001";
    let txs = gateway.scan_recent_transactions(quiet, 10).await.unwrap();
    assert!(txs.is_empty());
    assert_eq!(chain.state().fetched_blocks.len(), 6);
}

#[tokio::test]
async fn test_scan_zero_limit_skips_rpc() {
    let chain = seeded_chain();
    let gateway = gateway(&chain);

    let txs = gateway
        .scan_recent_transactions(FUNDED_ADDRESS, 0)
        .await
        .unwrap();
    assert!(txs.is_empty());
    assert_eq!(chain.connection_count(), 0);
}

#[tokio::test]
async fn test_transaction_lookup() {
    let chain = seeded_chain();
    let gateway = gateway(&chain);

    let hash = chain.state().blocks[2].transactions[0].hash.clone();
    let details = gateway.transaction(&hash).await.unwrap().unwrap();
    assert_eq!(details.value, "0.5");
    assert_eq!(details.block_number, Some(2));
    assert_eq!(
        details.explorer_url,
        format!("https://goerli.etherscan.io/tx/{hash}")
    );

    let missing = format!("0x{}", "11".repeat(32));
    assert!(gateway.transaction(&missing).await.unwrap().is_none());
    assert!(gateway.transaction("0xnothex").await.is_err());
}
