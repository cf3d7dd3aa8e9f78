mod common;

use common::{TestApp, TEST_SITE_ID, TEST_TOKEN, TEST_VIEWER_EMAIL, TEST_VIEWER_ID};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn checkout_body() -> serde_json::Value {
    json!({
        "price_id": "price_month",
        "mode": "subscription",
        "success_url": "https://tv.example.com/welcome",
        "cancel_url": "https://tv.example.com/plans",
    })
}

#[tokio::test]
async fn checkout_without_authorization_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/checkout", TEST_SITE_ID)))
        .json(&checkout_body())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["errors"][0]["code"], "unauthorized");
}

#[tokio::test]
async fn checkout_with_an_unrecognized_token_is_unauthorized_not_500() {
    let app = TestApp::spawn().await;
    app.mock_identity_rejects().await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/checkout", TEST_SITE_ID)))
        .bearer_auth("bogus-token")
        .json(&checkout_body())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["errors"][0]["code"], "unauthorized");
}

#[tokio::test]
async fn checkout_names_the_first_missing_parameter() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/checkout", TEST_SITE_ID)))
        .bearer_auth(TEST_TOKEN)
        .json(&json!({
            "price_id": "price_month",
            "mode": "payment",
            "success_url": "https://tv.example.com/welcome",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["errors"][0]["code"], "parameter_missing");
    assert_eq!(
        body["errors"][0]["description"],
        "Required parameter cancel_url is missing."
    );
}

#[tokio::test]
async fn checkout_creates_a_session_stamped_with_the_viewer() {
    let app = TestApp::spawn().await;
    app.mock_identity_viewer().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("mode=subscription"))
        .and(body_string_contains(
            "line_items%5B0%5D%5Bprice%5D=price_month",
        ))
        .and(body_string_contains(format!(
            "metadata%5Bviewer_id%5D={}",
            TEST_VIEWER_ID
        )))
        .and(body_string_contains(format!(
            "subscription_data%5Bmetadata%5D%5Bviewer_id%5D={}",
            TEST_VIEWER_ID
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1",
        })))
        .expect(1)
        .mount(&app.stripe)
        .await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/checkout", TEST_SITE_ID)))
        .bearer_auth(TEST_TOKEN)
        .json(&checkout_body())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_test_1");
}

#[tokio::test]
async fn stripe_rejections_surface_with_the_provider_message() {
    let app = TestApp::spawn().await;
    app.mock_identity_viewer().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such price: 'price_month'",
            }
        })))
        .mount(&app.stripe)
        .await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/checkout", TEST_SITE_ID)))
        .bearer_auth(TEST_TOKEN)
        .json(&checkout_body())
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["errors"][0]["code"], "bad_request");
    assert_eq!(
        body["errors"][0]["description"],
        "No such price: 'price_month'"
    );
}

async fn mock_customer_lookup(app: &TestApp, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v1/customers"))
        .and(query_param("email", TEST_VIEWER_EMAIL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(&app.stripe)
        .await;
}

#[tokio::test]
async fn billing_portal_requires_authorization() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/billing-portal", TEST_SITE_ID)))
        .json(&json!({"return_url": "https://tv.example.com/account"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn billing_portal_404s_viewers_with_no_billing_customer() {
    let app = TestApp::spawn().await;
    app.mock_identity_viewer().await;
    mock_customer_lookup(&app, json!([])).await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/billing-portal", TEST_SITE_ID)))
        .bearer_auth(TEST_TOKEN)
        .json(&json!({"return_url": "https://tv.example.com/account"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["errors"][0]["code"], "not_found");
}

#[tokio::test]
async fn billing_portal_without_return_url_names_it() {
    let app = TestApp::spawn().await;
    app.mock_identity_viewer().await;
    mock_customer_lookup(&app, json!([{"id": "cus_123"}])).await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/billing-portal", TEST_SITE_ID)))
        .bearer_auth(TEST_TOKEN)
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["errors"][0]["code"], "parameter_missing");
    assert_eq!(
        body["errors"][0]["description"],
        "Required parameter return_url is missing."
    );
}

#[tokio::test]
async fn billing_portal_returns_the_session_url() {
    let app = TestApp::spawn().await;
    app.mock_identity_viewer().await;
    mock_customer_lookup(&app, json!([{"id": "cus_123"}])).await;

    Mock::given(method("POST"))
        .and(path("/v1/billing_portal/sessions"))
        .and(body_string_contains("customer=cus_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bps_1",
            "url": "https://billing.stripe.com/session/bps_1",
        })))
        .expect(1)
        .mount(&app.stripe)
        .await;

    let response = app
        .client
        .post(app.url(&format!("/v2/sites/{}/billing-portal", TEST_SITE_ID)))
        .bearer_auth(TEST_TOKEN)
        .json(&json!({"return_url": "https://tv.example.com/account"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON body");
    assert_eq!(body["url"], "https://billing.stripe.com/session/bps_1");
}
