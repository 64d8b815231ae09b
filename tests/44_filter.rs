mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{admin_token, TestApp, TENANT};

async fn call(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()));
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, value))
}

/// Three trades, two of them on one business
async fn seeded() -> Result<(TestApp, String)> {
    let app = TestApp::new();
    let business = app.seed_business(TENANT, "Desk A").await;
    for (date, pnl, business_id) in [
        ("2024-03-01", 30, Some(business.id.as_str())),
        ("2024-01-01", -10, Some(business.id.as_str())),
        ("2024-02-01", 20, None),
    ] {
        let body = json!({ "trade_date": date, "profit_or_loss": pnl, "business_id": business_id });
        let (status, _) = call(&app, "POST", "/api/trades", Some(body)).await?;
        assert_eq!(status, StatusCode::CREATED);
    }
    Ok((app, business.id))
}

fn pnls(rows: &Value) -> Vec<i64> {
    rows.as_array()
        .map(|rows| rows.iter().filter_map(|r| r["profit_or_loss"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn lists_everything_in_insertion_order() -> Result<()> {
    let (app, _) = seeded().await?;
    let (status, rows) = call(&app, "GET", "/api/trades", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pnls(&rows), vec![30, -10, 20]);
    Ok(())
}

#[tokio::test]
async fn filters_by_business_and_orders() -> Result<()> {
    let (app, business_id) = seeded().await?;
    let uri = format!("/api/trades?business_id={}&order=trade_date%20asc", business_id);
    let (status, rows) = call(&app, "GET", &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pnls(&rows), vec![-10, 30]);
    Ok(())
}

#[tokio::test]
async fn pages_with_limit_and_offset() -> Result<()> {
    let (app, _) = seeded().await?;
    let (_, rows) = call(&app, "GET", "/api/trades?order=profit_or_loss%20desc&limit=2&offset=1", None).await?;
    assert_eq!(pnls(&rows), vec![20, -10]);
    Ok(())
}

#[tokio::test]
async fn expands_relations_on_request() -> Result<()> {
    let (app, business_id) = seeded().await?;
    let uri = format!("/api/trades?business_id={}&relations=business,_count", business_id);
    let (_, rows) = call(&app, "GET", &uri, None).await?;

    let first = &rows[0];
    assert_eq!(first["business"]["name"], "Desk A");
    assert_eq!(first["_count"], json!({}));

    // without the relation nothing is expanded
    let (_, plain) = call(&app, "GET", "/api/trades", None).await?;
    assert!(plain[0].get("business").is_none());
    Ok(())
}

#[tokio::test]
async fn selects_fields_but_keeps_id() -> Result<()> {
    let (app, _) = seeded().await?;
    let (_, rows) = call(&app, "GET", "/api/trades?fields=profit_or_loss", None).await?;

    let first = rows[0].as_object().cloned().unwrap_or_default();
    let mut keys: Vec<_> = first.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["id".to_string(), "profit_or_loss".to_string()]);
    Ok(())
}

#[tokio::test]
async fn read_by_id_ignores_query_id() -> Result<()> {
    let (app, _) = seeded().await?;
    let (_, rows) = call(&app, "GET", "/api/trades", None).await?;
    let first_id = rows[0]["id"].as_str().unwrap_or_default().to_string();
    let second_id = rows[1]["id"].as_str().unwrap_or_default().to_string();

    // the path id wins over `id` in the query string
    let uri = format!("/api/trades/{}?id={}&relations=business", first_id, second_id);
    let (status, record) = call(&app, "GET", &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["id"], first_id.as_str());
    assert_eq!(record["business"]["name"], "Desk A");
    Ok(())
}

#[tokio::test]
async fn rejects_unknown_keys_and_bad_values() -> Result<()> {
    let (app, _) = seeded().await?;

    for uri in [
        "/api/trades?profit=1",
        "/api/trades?order=secret%20asc",
        "/api/trades?order=trade_date%20sideways",
        "/api/trades?relations=owner",
        "/api/trades?fields=password",
        "/api/trades?limit=-1",
        "/api/trades?offset=abc",
    ] {
        let (status, body) = call(&app, "GET", uri, None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "BAD_REQUEST", "{}", uri);
    }
    Ok(())
}

#[tokio::test]
async fn limit_is_capped() -> Result<()> {
    let app = TestApp::new();
    for day in 1..=60 {
        let body = json!({ "trade_date": format!("2024-01-{:02}", (day % 28) + 1), "profit_or_loss": day });
        call(&app, "POST", "/api/trades", Some(body)).await?;
    }

    let (_, rows) = call(&app, "GET", "/api/trades?limit=500", None).await?;
    assert_eq!(rows.as_array().map(|r| r.len()), Some(50));
    Ok(())
}
