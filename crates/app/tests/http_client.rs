//! HTTP cart service against a mock server

use std::time::Duration;

use mealcart::lines::{ItemType, LineId, Quantity};
use mealcart_app::{
    auth::BearerToken,
    client::{CartService, GENERIC_FAILURE, HttpCartService, SyncError},
    wire::{CartRequest, DeleteItem, UpdateItem},
};
use mockito::Matcher;
use serde_json::json;
use testresult::TestResult;

fn token() -> TestResult<BearerToken> {
    Ok(BearerToken::new("test-token").ok_or("blank token")?)
}

fn service(server: &mockito::ServerGuard) -> TestResult<HttpCartService> {
    Ok(HttpCartService::new(server.url(), Duration::from_secs(5))?)
}

#[tokio::test]
async fn fetch_sends_bearer_token_and_decodes_cart() -> TestResult {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/cart")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "success": true,
                "data": {
                    "products": [{
                        "cart_product_id": 1,
                        "product_id": 10,
                        "name": "Oat milk",
                        "price": "2.10",
                        "quantity": 3
                    }]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let snapshot = service(&server)?.fetch(&token()?).await?;

    mock.assert_async().await;

    assert_eq!(snapshot.products.len(), 1);
    assert!(snapshot.recipes.is_empty());

    Ok(())
}

#[tokio::test]
async fn update_is_a_put_with_json_body() -> TestResult {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("PUT", "/cart")
        .match_body(Matcher::Json(
            json!({"item_type": "product", "item_id": 1, "quantity": 4}),
        ))
        .with_status(200)
        .with_body(json!({"success": true}).to_string())
        .create_async()
        .await;

    let request = CartRequest::Update(UpdateItem {
        item_type: ItemType::Product,
        item_id: LineId(1),
        quantity: Quantity::new(4)?,
        preparation_type_id: None,
    });

    let snapshot = service(&server)?.send(&token()?, request).await?;

    mock.assert_async().await;

    assert!(snapshot.is_none());

    Ok(())
}

#[tokio::test]
async fn rejection_carries_server_message() -> TestResult {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("DELETE", "/cart")
        .with_status(409)
        .with_body(json!({"success": false, "message": "Line already removed"}).to_string())
        .create_async()
        .await;

    let request = CartRequest::Delete(DeleteItem::Product {
        cart_product_id: LineId(7),
    });

    let error = service(&server)?
        .send(&token()?, request)
        .await
        .err()
        .ok_or("request should fail")?;

    assert!(matches!(error, SyncError::Server { status: 409, .. }));
    assert_eq!(error.user_message(), "Line already removed");

    Ok(())
}

#[tokio::test]
async fn failure_without_message_uses_generic_text() -> TestResult {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/cart")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let error = service(&server)?
        .fetch(&token()?)
        .await
        .err()
        .ok_or("request should fail")?;

    assert!(matches!(error, SyncError::Server { status: 502, .. }));
    assert_eq!(error.user_message(), GENERIC_FAILURE);

    Ok(())
}

#[tokio::test]
async fn unsuccessful_envelope_is_an_error_even_with_ok_status() -> TestResult {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("PUT", "/cart")
        .with_status(200)
        .with_body(json!({"success": false, "message": "Out of stock"}).to_string())
        .create_async()
        .await;

    let request = CartRequest::Update(UpdateItem {
        item_type: ItemType::Product,
        item_id: LineId(1),
        quantity: Quantity::ONE,
        preparation_type_id: None,
    });

    let error = service(&server)?
        .send(&token()?, request)
        .await
        .err()
        .ok_or("request should fail")?;

    assert_eq!(error.user_message(), "Out of stock");

    Ok(())
}

#[tokio::test]
async fn fetch_without_data_is_missing_cart() -> TestResult {
    let mut server = mockito::Server::new_async().await;

    server
        .mock("GET", "/cart")
        .with_status(200)
        .with_body(json!({"success": true}).to_string())
        .create_async()
        .await;

    let result = service(&server)?.fetch(&token()?).await;

    assert!(matches!(result, Err(SyncError::MissingCart)));

    Ok(())
}
