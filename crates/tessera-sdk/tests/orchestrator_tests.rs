//! Orchestrator integration tests
//!
//! Drives the confirmation loop against the mock node with a paused clock, so
//! block-time waits complete instantly but still advance `Instant::now()`.

use std::time::Duration;

use serde_json::{json, Value};
use tessera_sdk::abi::{selector_of, Token};
use tessera_sdk::types::format_address;
use tessera_sdk::{
    Address, CallOrchestrator, Contract, MockTransport, OrchestratorConfig, RpcClient, SdkError,
    U256,
};
use tokio::time::Instant;

const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

const DOCUMENT: &str = r#"[
    {"name": "set(uint256)", "type": "function"},
    {"name": "set(int256)", "type": "function"},
    {"name": "get()", "type": "function", "outputs": [{"name": "", "type": "uint256"}]},
    {"name": "label(string)", "type": "function"}
]"#;

fn setup(config: OrchestratorConfig) -> (CallOrchestrator, MockTransport) {
    let mock = MockTransport::new();
    let orchestrator = CallOrchestrator::new(RpcClient::new(mock.clone()), config);
    (orchestrator, mock)
}

fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        block_time: Duration::from_secs(1),
        max_tries: 3,
        max_resubmissions: Some(2),
        ..Default::default()
    }
}

fn receipt(contract: Option<Address>) -> Value {
    json!({
        "transactionHash": TX_HASH,
        "blockNumber": "0x10",
        "contractAddress": contract.map(|a| format_address(&a)),
        "status": "0x1"
    })
}

fn contract() -> Contract {
    Contract::from_signature_document(Some(Address::repeat_byte(0xcc)), DOCUMENT).unwrap()
}

/// Paused-clock waits land on millisecond ticks
fn assert_elapsed(start: Instant, secs: u64) {
    let elapsed = start.elapsed();
    let expected = Duration::from_secs(secs);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(10),
        "elapsed {:?}, expected {:?}",
        elapsed,
        expected
    );
}

/// Init code wrapping the runtime code `60aa60bb`
const BYTECODE: [u8; 9] = [0x60, 0x60, 0x60, 0x40, 0x52, 0x60, 0xaa, 0x60, 0xbb];

// ==================== Deployment ====================

#[tokio::test(start_paused = true)]
async fn test_deploy_confirmed_after_one_block() {
    let (mut orchestrator, mock) = setup(OrchestratorConfig::default());
    let installed = Address::repeat_byte(0x42);
    mock.set_response("eth_getTransactionReceipt", receipt(Some(installed)));
    mock.set_response("eth_getCode", json!("0x60aa60bb"));

    let start = Instant::now();
    let deployment = orchestrator.deploy(&BYTECODE).await.unwrap();

    assert_eq!(deployment.address, installed);
    assert_eq!(format!("{:?}", deployment.tx_hash), TX_HASH);
    assert_elapsed(start, 12);

    let sent = mock.requests_for("eth_sendTransaction");
    assert_eq!(sent.len(), 1);
    let tx = &sent[0].params[0];
    assert!(tx.get("to").is_none());
    assert_eq!(tx["gas"], "0x2fefd8");
    assert_eq!(tx["from"], "0x407d73d8a49eeb85d32cf465507dd71d507100c1");
    assert_eq!(tx["data"], format!("0x{}", hex::encode(BYTECODE)));
}

#[tokio::test(start_paused = true)]
async fn test_deploy_never_observed_resubmits_identical_payload() {
    let (mut orchestrator, mock) = setup(fast_config());

    let start = Instant::now();
    let err = orchestrator.deploy(&BYTECODE).await.unwrap_err();

    match err {
        SdkError::ConfirmationExhausted { target, resubmissions } => {
            assert_eq!(target, TX_HASH);
            assert_eq!(resubmissions, 2);
        }
        other => panic!("unexpected {:?}", other),
    }

    // One initial send plus one resend per exhaustion, all identical
    let sends = mock.requests_for("eth_sendTransaction");
    assert_eq!(sends.len(), 3);
    assert!(sends.iter().all(|s| s.params == sends[0].params));
    assert_eq!(mock.requests_for("eth_getTransactionReceipt").len(), 9);
    assert_elapsed(start, 9);
}

#[tokio::test(start_paused = true)]
async fn test_deploy_mismatched_code_is_not_confirmed() {
    let config = OrchestratorConfig {
        max_resubmissions: Some(0),
        ..fast_config()
    };
    let (mut orchestrator, mock) = setup(config);
    mock.set_response("eth_getTransactionReceipt", receipt(Some(Address::repeat_byte(1))));
    mock.set_response("eth_getCode", json!("0xdeadbeef"));

    let err = orchestrator.deploy(&BYTECODE).await.unwrap_err();
    assert!(matches!(err, SdkError::ConfirmationExhausted { resubmissions: 0, .. }));
    assert_eq!(mock.requests_for("eth_sendTransaction").len(), 1);
    assert_eq!(mock.requests_for("eth_getCode").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_receipt_without_contract_address_keeps_waiting() {
    let (mut orchestrator, mock) = setup(fast_config());
    mock.push_response("eth_getTransactionReceipt", receipt(None));
    mock.set_response("eth_getTransactionReceipt", receipt(Some(Address::repeat_byte(2))));
    mock.set_response("eth_getCode", json!("0x60bb"));

    let deployment = orchestrator.deploy(&BYTECODE).await.unwrap();
    assert_eq!(deployment.address, Address::repeat_byte(2));
    assert_eq!(mock.requests_for("eth_getTransactionReceipt").len(), 2);
}

// ==================== Transactions ====================

#[tokio::test(start_paused = true)]
async fn test_transact_waits_for_receipt() {
    let (mut orchestrator, mock) = setup(fast_config());
    mock.push_response("eth_getTransactionReceipt", Value::Null);
    mock.push_response("eth_getTransactionReceipt", Value::Null);
    mock.set_response("eth_getTransactionReceipt", receipt(None));

    let start = Instant::now();
    let result = orchestrator
        .transact(&contract(), "label", &[Token::string("hi")])
        .await
        .unwrap();

    assert_eq!(result.status, Some(U256::one()));
    assert_elapsed(start, 3);
    assert_eq!(mock.requests_for("eth_sendTransaction").len(), 1);

    let tx = &mock.requests_for("eth_sendTransaction")[0].params[0];
    assert_eq!(tx["to"], format_address(&Address::repeat_byte(0xcc)));
    let data = tx["data"].as_str().unwrap();
    assert_eq!(data.len(), 2 + 8 + 3 * 64);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_resubmission_until_confirmed() {
    let config = OrchestratorConfig {
        max_tries: 2,
        max_resubmissions: None,
        ..fast_config()
    };
    let (mut orchestrator, mock) = setup(config);
    for _ in 0..4 {
        mock.push_response("eth_getTransactionReceipt", Value::Null);
    }
    mock.set_response("eth_getTransactionReceipt", receipt(None));

    orchestrator
        .transact(&contract(), "set", &[Token::int(-5)])
        .await
        .unwrap();
    assert_eq!(mock.requests_for("eth_sendTransaction").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_busy_node_is_retried_after_block_time() {
    let (mut orchestrator, mock) = setup(fast_config());
    mock.push_error("eth_sendTransaction", -32002, "resource unavailable");
    mock.push_error("eth_sendTransaction", -32002, "resource unavailable");
    mock.set_response("eth_getTransactionReceipt", receipt(None));

    let start = Instant::now();
    orchestrator
        .transact(&contract(), "set", &[Token::int(-1)])
        .await
        .unwrap();

    let sends = mock.requests_for("eth_sendTransaction");
    assert_eq!(sends.len(), 3);
    assert!(sends.iter().all(|s| s.params == sends[0].params));
    // Two busy waits and one confirmation wait
    assert_elapsed(start, 3);
}

#[tokio::test(start_paused = true)]
async fn test_busy_retries_are_bounded() {
    let config = OrchestratorConfig {
        max_busy_retries: 2,
        ..fast_config()
    };
    let (mut orchestrator, mock) = setup(config);
    mock.set_error("eth_sendTransaction", -32002, "resource unavailable");

    let err = orchestrator
        .transact(&contract(), "set", &[Token::int(-1)])
        .await
        .unwrap_err();
    assert_eq!(err.rpc_code(), Some(-32002));
    assert_eq!(mock.requests_for("eth_sendTransaction").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_other_submission_errors_are_fatal() {
    let (mut orchestrator, mock) = setup(fast_config());
    mock.push_error("eth_sendTransaction", -32000, "insufficient funds");

    let start = Instant::now();
    let err = orchestrator.deploy(&BYTECODE).await.unwrap_err();
    assert!(matches!(err, SdkError::Rpc { code: -32000, .. }));
    assert_elapsed(start, 0);
    assert!(mock.requests_for("eth_getTransactionReceipt").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_custom_busy_code() {
    let config = OrchestratorConfig {
        busy_codes: vec![-32005],
        ..fast_config()
    };
    let (mut orchestrator, mock) = setup(config);
    mock.push_error("eth_sendTransaction", -32005, "limit exceeded");
    mock.set_response("eth_getTransactionReceipt", receipt(None));

    orchestrator
        .transact(&contract(), "set", &[Token::int(-1)])
        .await
        .unwrap();
    assert_eq!(mock.requests_for("eth_sendTransaction").len(), 2);
}

// ==================== Overloads and Calls ====================

#[tokio::test]
async fn test_ambiguous_overload_sends_nothing() {
    let (mut orchestrator, mock) = setup(fast_config());

    let err = orchestrator
        .transact(&contract(), "set", &[Token::uint(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::AmbiguousOverload { .. }));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_resolve_reports_arity() {
    let (orchestrator, _) = setup(fast_config());
    let contract = contract();
    let err = orchestrator
        .resolve(&contract, "label", &[Token::string("a"), Token::string("b")])
        .unwrap_err();
    assert!(matches!(err, SdkError::ArityMismatch { expected: 1, got: 2 }));
    assert!(matches!(
        orchestrator.resolve(&contract, "lab", &[]),
        Err(SdkError::UnknownFunction(_))
    ));
}

#[tokio::test]
async fn test_call_decodes_outputs() {
    let (mut orchestrator, mock) = setup(fast_config());
    mock.set_response("eth_call", json!(format!("0x{:064x}", 7)));

    let output = orchestrator.call(&contract(), "get", &[]).await.unwrap();
    assert_eq!(output, vec![Token::uint(7)]);

    let sent = mock.requests_for("eth_call");
    let selector = hex::encode(selector_of("get()"));
    assert_eq!(sent[0].params[0]["data"], format!("0x{}", selector));
    assert!(mock.requests_for("eth_sendTransaction").is_empty());
}
