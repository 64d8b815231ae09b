mod common;

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;

use common::{admin_token, token, TestApp, TENANT};
use trades_api::client::{ClientError, TradesClient};
use trades_api::database::models::{GetQuery, TradeInput, TradeQuery};

fn client(base_url: &str, token: String) -> Result<TradesClient> {
    Ok(TradesClient::new(base_url, Some(token), Duration::from_secs(5))?)
}

#[tokio::test]
async fn client_round_trip() -> Result<()> {
    let app = TestApp::new();
    let business = app.seed_business(TENANT, "Desk A").await;
    let server = app.serve().await?;
    let api = client(&server.base_url, admin_token())?;

    let input = TradeInput {
        trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        profit_or_loss: 500,
        business_id: Some(business.id.clone()),
    };
    let created = api.create(&input).await?;
    assert_eq!(created.trade_date, input.trade_date);
    assert_eq!(created.profit_or_loss, 500);

    let fetched = api
        .get_by_id(&created.id, Some(&GetQuery { relations: Some("business".into()), ..Default::default() }))
        .await?
        .expect("record exists");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.business.map(|b| b.name), Some("Desk A".to_string()));

    let listed = api.list(Some(&TradeQuery::for_business(business.id.as_str()))).await?;
    assert_eq!(listed.len(), 1);
    assert!(api.list(Some(&TradeQuery::for_business("other"))).await?.is_empty());

    let updated = api.update_by_id(&created.id, &json!({ "profit_or_loss": -100 })).await?;
    assert_eq!(updated.profit_or_loss, -100);
    assert_eq!(updated.trade_date, input.trade_date);

    let removed = api.delete_by_id(&created.id).await?;
    assert_eq!(removed.map(|t| t.id), Some(created.id.clone()));
    assert_eq!(api.get_by_id(&created.id, None).await?, None);
    Ok(())
}

#[tokio::test]
async fn client_surfaces_server_status_and_body() -> Result<()> {
    let app = TestApp::new();
    let server = app.serve().await?;

    let viewer = client(&server.base_url, token(TENANT, &["viewer"]))?;
    let input = TradeInput {
        trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        profit_or_loss: 1,
        business_id: None,
    };
    match viewer.create(&input).await {
        Err(err @ ClientError::Status { .. }) => {
            assert_eq!(err.status(), Some(403));
            assert!(err.server_message().is_some());
        }
        other => panic!("expected 403, got {:?}", other),
    }

    let admin = client(&server.base_url, admin_token())?;
    match admin.update_by_id("missing", &json!({ "profit_or_loss": "x" })).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("profit_or_loss"), "{}", body);
        }
        other => panic!("expected 400, got {:?}", other),
    }

    match admin.delete_by_id("missing").await {
        Err(ClientError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn client_without_token_is_unauthorized() -> Result<()> {
    let app = TestApp::new();
    let server = app.serve().await?;
    let anonymous = TradesClient::new(&server.base_url, None, Duration::from_secs(5))?;

    let err = anonymous.list(None).await.expect_err("must be rejected");
    assert_eq!(err.status(), Some(401));
    Ok(())
}

#[tokio::test]
async fn transport_failures_are_not_status_errors() -> Result<()> {
    let port = portpicker::pick_unused_port().expect("free port");
    let api = TradesClient::new(&format!("http://127.0.0.1:{}", port), None, Duration::from_secs(2))?;

    let err = api.list(None).await.expect_err("nothing listens there");
    assert!(matches!(err, ClientError::Transport(_)), "{:?}", err);
    Ok(())
}

#[tokio::test]
async fn reserved_characters_in_ids_stay_on_the_item_route() -> Result<()> {
    let app = TestApp::new();
    let server = app.serve().await?;
    let api = client(&server.base_url, admin_token())?;

    let input = TradeInput {
        trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        profit_or_loss: 7,
        business_id: None,
    };
    let created = api.create(&input).await?;

    // unescaped, the suffix would become a fragment, a query or a second segment
    for suffix in ["#x", "?x=1", "/x"] {
        let id = format!("{}{}", created.id, suffix);
        assert_eq!(api.get_by_id(&id, None).await?, None, "{}", id);
    }
    assert!(api.get_by_id(&created.id, None).await?.is_some());
    Ok(())
}
