//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use intake_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_bytes(resp: Response) -> Vec<u8> {
  axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap()
    .to_vec()
}

async fn body_json(resp: Response) -> Value {
  serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn receipt_body() -> Value {
  json!({
    "date": "2024-01-10",
    "type": "OUT",
    "gross_amount": 42.50,
    "submitted_by": "alice",
    "attachments": [{
      "filename": "receipt.pdf",
      "mime_type": "application/pdf",
      "data_base64": B64.encode(b"%PDF-1.4 receipt"),
    }]
  })
}

// ── Example scenario ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_review_and_link_flow() {
  let app = app().await;

  let resp = send(&app, "POST", "/submissions", Some(receipt_body())).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(body_json(resp).await, json!({ "id": 1 }));

  let resp = send(&app, "GET", "/submissions/1", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let sub = body_json(resp).await;
  assert_eq!(sub["status"], "pending");
  assert_eq!(sub["type"], "OUT");
  let amount: f64 = sub["gross_amount"].as_str().unwrap().parse().unwrap();
  assert_eq!(amount, 42.5);
  assert_eq!(sub["attachments"][0]["filename"], "receipt.pdf");
  assert!(sub["attachments"][0].get("data").is_none());

  let resp = send(&app, "POST", "/submissions/1/approve", Some(json!({ "reviewer_notes": "ok" }))).await;
  assert_eq!(body_json(resp).await, json!({ "ok": true }));

  let resp = send(&app, "POST", "/submissions/1/approve", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await, json!({ "ok": false }));

  let resp = send(&app, "POST", "/submissions/1/voucher", Some(json!({ "voucher_id": 77 }))).await;
  assert_eq!(body_json(resp).await, json!({ "ok": true }));

  let sub = body_json(send(&app, "GET", "/submissions/1", None).await).await;
  assert_eq!(sub["status"], "approved");
  assert_eq!(sub["reviewer_notes"], "ok");
  assert_eq!(sub["voucher_id"], 77);
}

// ── Errors and soft failures ─────────────────────────────────────────────────

#[tokio::test]
async fn unknown_ids() {
  let app = app().await;

  let resp = send(&app, "GET", "/submissions/99", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(body_json(resp).await["error"].as_str().unwrap().contains("99"));

  let resp = send(&app, "GET", "/attachments/99", None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  for uri in ["/submissions/99/approve", "/submissions/99/reject"] {
    let resp = send(&app, "POST", uri, None).await;
    assert_eq!(body_json(resp).await, json!({ "ok": false }));
  }

  let resp = send(&app, "POST", "/submissions/99/voucher", Some(json!({ "voucher_id": 1 }))).await;
  assert_eq!(body_json(resp).await, json!({ "ok": false }));

  let resp = send(&app, "DELETE", "/submissions/99", None).await;
  assert_eq!(body_json(resp).await, json!({ "ok": false }));
}

#[tokio::test]
async fn create_with_bad_base64_is_rejected() {
  let app = app().await;
  let mut body = receipt_body();
  body["attachments"][0]["data_base64"] = json!("$$$");

  let resp = send(&app, "POST", "/submissions", Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(body_json(resp).await["error"].as_str().unwrap().contains("attachment 0"));

  let summary = body_json(send(&app, "GET", "/submissions/summary", None).await).await;
  assert_eq!(summary["total"], 0);
}

#[tokio::test]
async fn create_without_required_field_is_a_client_error() {
  let app = app().await;
  let mut body = receipt_body();
  body.as_object_mut().unwrap().remove("submitted_by");

  let resp = send(&app, "POST", "/submissions", Some(body)).await;
  assert!(resp.status().is_client_error(), "status {}", resp.status());
}

#[tokio::test]
async fn create_requires_explicit_type() {
  let app = app().await;
  let mut body = receipt_body();
  body.as_object_mut().unwrap().remove("type");

  let resp = send(&app, "POST", "/submissions", Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(body_json(resp).await["error"].as_str().unwrap().contains("type"));

  let summary = body_json(send(&app, "GET", "/submissions/summary", None).await).await;
  assert_eq!(summary["total"], 0);
}

#[tokio::test]
async fn linking_a_pending_submission_is_allowed() {
  let app = app().await;
  send(&app, "POST", "/submissions", Some(receipt_body())).await;

  let resp = send(&app, "POST", "/submissions/1/voucher", Some(json!({ "voucher_id": 9 }))).await;
  assert_eq!(body_json(resp).await, json!({ "ok": true }));

  let sub = body_json(send(&app, "GET", "/submissions/1", None).await).await;
  assert_eq!(sub["status"], "pending");
  assert_eq!(sub["voucher_id"], 9);
}

// ── Import ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_batch_is_all_or_nothing() {
  let app = app().await;
  let item = |data: &str| {
    json!({
      "date": "2024-02-01",
      "gross_amount": "10.00",
      "submitted_by": "mailbox",
      "attachments": [{ "filename": "scan.pdf", "data_base64": data }]
    })
  };
  let good = B64.encode(b"scan");

  let batch = json!({
    "submissions": [item(&good), item(&good), item(&good), item("not*base64"), item(&good)]
  });
  let resp = send(&app, "POST", "/submissions/import", Some(batch)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let summary = body_json(send(&app, "GET", "/submissions/summary", None).await).await;
  assert_eq!(summary["total"], 0);

  let batch = json!({ "submissions": [item(&good), item(&good)] });
  let resp = send(&app, "POST", "/submissions/import", Some(batch)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let outcome = body_json(resp).await;
  assert_eq!(outcome["imported"], 2);
  assert_eq!(outcome["ids"], json!([1, 2]));

  let sub = body_json(send(&app, "GET", "/submissions/2", None).await).await;
  assert_eq!(sub["type"], "OUT");
}

// ── List / summary ───────────────────────────────────────────────────────────

#[tokio::test]
async fn list_filters_and_pages() {
  let app = app().await;
  for _ in 0..4 {
    send(&app, "POST", "/submissions", Some(receipt_body())).await;
  }
  send(&app, "POST", "/submissions/1/reject", Some(json!({}))).await;

  let page = body_json(send(&app, "GET", "/submissions?status=pending&limit=2&offset=0", None).await).await;
  assert_eq!(page["total"], 3);
  assert_eq!(page["rows"].as_array().unwrap().len(), 2);
  assert_eq!(page["rows"][0]["id"], 4);

  let summary = body_json(send(&app, "GET", "/submissions/summary", None).await).await;
  assert_eq!(summary, json!({ "pending": 3, "approved": 0, "rejected": 1, "total": 4 }));
  assert_eq!(summary["pending"], page["total"]);
}

// ── Attachments / delete ─────────────────────────────────────────────────────

#[tokio::test]
async fn attachment_download_and_conditional_get() {
  let app = app().await;
  send(&app, "POST", "/submissions", Some(receipt_body())).await;

  let sub = body_json(send(&app, "GET", "/submissions/1", None).await).await;
  let att_id = sub["attachments"][0]["id"].as_i64().unwrap();
  let uri = format!("/attachments/{att_id}");

  let resp = send(&app, "GET", &uri, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
  assert_eq!(
    resp.headers()[header::CONTENT_DISPOSITION],
    "attachment; filename=\"receipt.pdf\""
  );
  let etag = resp.headers()[header::ETAG].to_str().unwrap().to_owned();
  assert_eq!(body_bytes(resp).await, b"%PDF-1.4 receipt");

  let req = Request::builder()
    .uri(&uri)
    .header(header::IF_NONE_MATCH, &etag)
    .body(Body::empty())
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn delete_removes_attachments_too() {
  let app = app().await;
  send(&app, "POST", "/submissions", Some(receipt_body())).await;
  let sub = body_json(send(&app, "GET", "/submissions/1", None).await).await;
  let att_id = sub["attachments"][0]["id"].as_i64().unwrap();

  let resp = send(&app, "DELETE", "/submissions/1", None).await;
  assert_eq!(body_json(resp).await, json!({ "ok": true }));

  let resp = send(&app, "GET", &format!("/attachments/{att_id}"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
