//! Integration tests for the proofchain HTTP endpoints
//!
//! These tests drive the router through axum-test and check status codes and
//! JSON shapes for mining, transaction submission and chain reads.

use axum_test::TestServer;
use proofchain::api::{
    build_api_router, queued_message, Node, INCOMPLETE_TRANSACTION_MESSAGE, MINED_MESSAGE,
};
use proofchain::blockchain::{hash_block, Block, Blockchain};
use proofchain::error::{ChainError, Result};
use proofchain::miner::valid_proof;
use proofchain::persistence::{BlockRecord, InMemoryPersistence, Persistence};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn test_server() -> (TestServer, Arc<Blockchain>) {
    let blockchain = Arc::new(Blockchain::new().expect("Failed to create blockchain"));
    let node = Arc::new(Node::new_shared(blockchain.clone()));
    let server = TestServer::new(build_api_router(node)).expect("Failed to create test server");
    (server, blockchain)
}

#[tokio::test]
async fn test_chain_starts_with_genesis() {
    let (server, _) = test_server();

    let response = server.get("/chain").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["length"], 1);
    assert_eq!(json["chain"][0]["index"], 1);
    assert_eq!(json["chain"][0]["proof"], 100);
    assert_eq!(json["chain"][0]["previous_hash"], "1");
    assert!(json["chain"][0]["timestamp"].is_number());
    assert_eq!(json["chain"][0]["transactions"], json!([]));
}

#[tokio::test]
async fn test_submit_then_mine() {
    let (server, blockchain) = test_server();
    let genesis = blockchain.last_block().unwrap();

    let response = server
        .get("/transactions/new")
        .json(&json!({"sender": "A", "recipient": "B", "amount": 10}))
        .await;
    assert_eq!(response.status_code(), 201);
    let json: Value = response.json();
    assert_eq!(json["message"], "Transaksi akan dimasukkan ke dalam blok 2");
    assert_eq!(json["message"], queued_message(2));

    let response = server.get("/mine").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["message"], "Blok baru telah ditambahkan");
    assert_eq!(json["message"], MINED_MESSAGE);
    assert_eq!(json["block_index"], 2);
    assert_eq!(
        json["transactions"],
        json!([{"sender": "A", "recipient": "B", "amount": 10}])
    );
    assert_eq!(json["previous_hash"], hash_block(&genesis));
    let proof = json["proof"].as_u64().unwrap();
    assert!(valid_proof(100, proof));

    let response = server.get("/chain").await;
    let json: Value = response.json();
    assert_eq!(json["length"], 2);
    assert_eq!(json["chain"][1]["transactions"][0]["amount"], 10);
}

#[tokio::test]
async fn test_missing_field_is_plain_text_400() {
    let (server, blockchain) = test_server();

    let response = server
        .get("/transactions/new")
        .json(&json!({"sender": "A", "amount": 10}))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.text(), "Data transaksi tidak lengkap");
    assert_eq!(response.text(), INCOMPLETE_TRANSACTION_MESSAGE);
    assert!(blockchain.pending_transactions().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_400() {
    let (server, blockchain) = test_server();

    let response = server.get("/transactions/new").text("sender=A").await;
    assert_eq!(response.status_code(), 400);

    let response = server.get("/transactions/new").await;
    assert_eq!(response.status_code(), 400);
    assert!(blockchain.pending_transactions().is_empty());
}

#[tokio::test]
async fn test_mine_empty_pool_and_chain_grows() {
    let (server, _) = test_server();

    for expected in 2..=3 {
        let response = server.get("/mine").await;
        assert_eq!(response.status_code(), 200);
        let json: Value = response.json();
        assert_eq!(json["block_index"], expected);
        assert_eq!(json["transactions"], json!([]));
    }

    let json: Value = server.get("/chain").await.json();
    assert_eq!(json["length"], 3);
    let indices: Vec<u64> = json["chain"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

/// Store that refuses writes while `down` is set.
struct SwitchableStore {
    inner: InMemoryPersistence,
    down: Arc<AtomicBool>,
}

impl Persistence for SwitchableStore {
    fn save_block(&self, block: &mut Block) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ChainError::DatabaseError("disk unavailable".to_string()));
        }
        self.inner.save_block(block)
    }

    fn load_records(&self) -> Result<Vec<BlockRecord>> {
        self.inner.load_records()
    }
}

#[tokio::test]
async fn test_mine_store_failure_is_json_500() {
    let down = Arc::new(AtomicBool::new(false));
    let store = SwitchableStore {
        inner: InMemoryPersistence::new(),
        down: down.clone(),
    };
    let blockchain = Arc::new(
        Blockchain::new_with_persistence(Box::new(store)).expect("Failed to create blockchain"),
    );
    let node = Arc::new(Node::new_shared(blockchain.clone()));
    let server = TestServer::new(build_api_router(node)).expect("Failed to create test server");

    let response = server
        .get("/transactions/new")
        .json(&json!({"sender": "A", "recipient": "B", "amount": 10}))
        .await;
    assert_eq!(response.status_code(), 201);

    down.store(true, Ordering::SeqCst);
    let response = server.get("/mine").await;
    assert_eq!(response.status_code(), 500);
    let json: Value = response.json();
    assert!(json["error"].is_string());
    assert!(json["error"].as_str().unwrap().contains("disk unavailable"));

    // Nothing was sealed and the pending transaction is still queued.
    let json: Value = server.get("/chain").await.json();
    assert_eq!(json["length"], 1);
    assert_eq!(blockchain.pending_transactions().len(), 1);

    down.store(false, Ordering::SeqCst);
    let response = server.get("/mine").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["block_index"], 2);
    assert_eq!(
        json["transactions"],
        json!([{"sender": "A", "recipient": "B", "amount": 10}])
    );
}
