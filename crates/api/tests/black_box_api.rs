use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use stockbook_api::app::services::ServiceConfig;
use stockbook_core::{ItemCode, OwnerId, StoreCode};
use stockbook_directory::{InMemoryDirectory, ItemInfo};
use stockbook_orders::TaxRate;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, in-memory store, ephemeral port.
    async fn spawn(directory: Arc<InMemoryDirectory>) -> Self {
        let config = ServiceConfig::in_memory(
            StoreCode::new("HQ").unwrap(),
            TaxRate::from_basis_points(700),
        );
        let app = stockbook_api::app::build_app(config, directory)
            .await
            .expect("failed to build app");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    directory.put_store(StoreCode::new("HQ").unwrap());
    directory.put_store(StoreCode::new("Bangna").unwrap());
    directory.put_store(StoreCode::new("Asoke").unwrap());
    directory.put_item(
        ItemCode::new("A1").unwrap(),
        ItemInfo {
            name: "Paper cup".to_string(),
            spec: "16oz".to_string(),
            cost: 3,
            price: 5,
            tax_class: "standard".to_string(),
        },
    );
    directory.put_owner("Somchai", OwnerId::new());
    Arc::new(directory)
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_lifecycle_submit_approve_and_stock_moves() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    // Submit
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "store": "Bangna",
            "requested_by": "somchai",
            "order_date": "2024-01-08",
            "lines": [{ "code": "A1", "qty": 5 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    let id = order["id"].as_str().unwrap().to_string();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["subtotal"], 25);
    assert_eq!(order["tax"], 1); // 7% of 25, rounded down

    // Approve
    let res = client
        .post(format!("{}/orders/{}/decide", srv.base_url, id))
        .json(&json!({
            "decision": "approve",
            "delivery_date": "2024-01-10",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let decided: serde_json::Value = res.json().await.unwrap();
    assert_eq!(decided["status"], "approved");
    let invoice = decided["invoice_number"].as_str().unwrap();
    assert!(invoice.starts_with("IV"));

    // Stock moved: -5 at HQ, +5 at Bangna, as of the delivery date.
    let res = client
        .get(format!("{}/stock/Bangna?as_of=2024-01-10", srv.base_url))
        .send()
        .await
        .unwrap();
    let stock: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stock["balances"]["A1"], 5);

    let res = client
        .get(format!("{}/stock/HQ?as_of=2024-01-10", srv.base_url))
        .send()
        .await
        .unwrap();
    let stock: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stock["balances"]["A1"], -5);

    // Both movements carry the invoice number.
    let res = client
        .get(format!("{}/movements?item=A1", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 2);
    for m in body["movements"].as_array().unwrap() {
        assert_eq!(m["invoice_number"].as_str().unwrap(), invoice);
    }

    // A second decision conflicts.
    let res = client
        .post(format!("{}/orders/{}/decide", srv.base_url, id))
        .json(&json!({ "decision": "reject" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn receipts_and_adjustments_converge_on_the_count() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/receipts", srv.base_url))
        .json(&json!({
            "store": "Bangna",
            "counterpart": "Siam Paper Co",
            "occurred_at": "2024-01-05",
            "lines": [{ "code": "A1", "qty": 50 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // The count found 47.
    let res = client
        .post(format!("{}/adjustments", srv.base_url))
        .json(&json!({
            "store": "Bangna",
            "note": "weekly stocktake",
            "occurred_at": "2024-01-06",
            "counts": [{ "code": "A1", "counted_qty": 47 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["movements_written"], 1);

    let res = client
        .get(format!("{}/stock/Bangna?as_of=2024-01-06", srv.base_url))
        .send()
        .await
        .unwrap();
    let stock: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stock["balances"]["A1"], 47);

    // Re-sending the same count writes nothing more.
    let res = client
        .post(format!("{}/adjustments", srv.base_url))
        .json(&json!({
            "store": "Bangna",
            "note": "weekly stocktake",
            "occurred_at": "2024-01-06",
            "counts": [{ "code": "A1", "counted_qty": 47 }],
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["movements_written"], 0);
}

#[tokio::test]
async fn unknown_items_fail_with_validation_errors() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "store": "Bangna",
            "requested_by": "somchai",
            "order_date": "2024-01-08",
            "lines": [{ "code": "NOPE", "qty": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn close_day_carries_unfinished_work_forward() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/tasks/close-day", srv.base_url))
        .json(&json!({
            "date": "2024-01-10",
            "owner": "Somchai",
            "owner_label": "Bangna / Somchai",
            "items": [
                { "id": null, "content": "stocktake", "progress": 100,
                  "priority": "normal", "manager_check": true, "manager_comment": null },
                { "id": null, "content": "order cups", "progress": 40,
                  "priority": "high", "manager_check": false, "manager_comment": null },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["finished"], 1);
    assert_eq!(body["carried_over"], 1);

    let res = client
        .get(format!(
            "{}/tasks/open?date=2024-01-11&owner=Somchai",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let open: serde_json::Value = res.json().await.unwrap();
    let continues = open["continue_items"].as_array().unwrap();
    assert_eq!(continues.len(), 1);
    assert_eq!(continues[0]["content"], "order cups");
    assert_eq!(continues[0]["progress"], 40);
}

#[tokio::test]
async fn unknown_owner_is_a_404() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/tasks/open?date=2024-01-11&owner=Nobody",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_owner");
}

#[tokio::test]
async fn forced_transfers_allocate_one_invoice_per_destination() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/transfers/force", srv.base_url))
        .json(&json!({
            "occurred_at": "2024-01-09",
            "transfers": [
                { "store": "Bangna", "code": "A1", "qty": 3 },
                { "store": "Asoke", "code": "A1", "qty": 2 },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let invoices = body["invoices"].as_object().unwrap();
    assert_eq!(invoices.len(), 2);
    assert_ne!(invoices["Bangna"], invoices["Asoke"]);

    // The ledger rows carry catalog names, not caller-supplied ones.
    let res = client
        .get(format!("{}/movements?item=A1&kind=inbound", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    for m in body["movements"].as_array().unwrap() {
        assert_eq!(m["item_name"], "Paper cup");
    }
}

#[tokio::test]
async fn forced_transfers_to_unknown_items_or_stores_fail() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/transfers/force", srv.base_url))
        .json(&json!({
            "occurred_at": "2024-01-09",
            "transfers": [{ "store": "Bangna", "code": "GHOST", "qty": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(format!("{}/transfers/force", srv.base_url))
        .json(&json!({
            "occurred_at": "2024-01-09",
            "transfers": [{ "store": "Nowhere", "code": "A1", "qty": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Nothing was written by either attempt.
    let res = client
        .get(format!("{}/movements", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn unknown_stores_are_404s_on_write_paths() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "store": "Nowhere",
            "requested_by": "somchai",
            "order_date": "2024-01-08",
            "lines": [{ "code": "A1", "qty": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = client
        .post(format!("{}/receipts", srv.base_url))
        .json(&json!({
            "store": "Nowhere",
            "counterpart": "Siam Paper Co",
            "occurred_at": "2024-01-05",
            "lines": [{ "code": "A1", "qty": 50 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn next_invoice_numbers_are_sequential_for_a_day() {
    let srv = TestServer::spawn(seeded_directory()).await;
    let client = reqwest::Client::new();

    let mut numbers = Vec::new();
    for _ in 0..2 {
        let res = client
            .post(format!("{}/invoices/next?date=2024-01-09", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: serde_json::Value = res.json().await.unwrap();
        numbers.push(body["invoice_number"].as_str().unwrap().to_string());
    }

    assert_eq!(numbers[0], "IV20240109001");
    assert_eq!(numbers[1], "IV20240109002");
}
