use crate::helpers::{spawn_app, spawn_app_with, spawn_app_with_store, UnavailableSubscriberStore};
use newsletter::configuration::Environment;
use std::sync::Arc;

#[tokio::test]
async fn hsts_is_only_sent_outside_development() {
    let local = spawn_app().await;
    let production = spawn_app_with(|c| c.environment = Environment::Production).await;

    let response = local.get("/").await;
    assert!(response.headers().get("Strict-Transport-Security").is_none());

    let response = production.get("/").await;
    assert_eq!(
        "max-age=2592000",
        response
            .headers()
            .get("Strict-Transport-Security")
            .unwrap()
            .to_str()
            .unwrap()
    );
}

#[tokio::test]
async fn server_errors_are_shown_raw_in_development() {
    let app = spawn_app_with_store(Arc::new(UnavailableSubscriberStore), |_| {}).await;

    let response = app.get("/Newsletter/Subscribers").await;

    assert_eq!(500, response.status().as_u16());
}

#[tokio::test]
async fn server_errors_redirect_to_the_error_page_in_production() {
    let app = spawn_app_with_store(Arc::new(UnavailableSubscriberStore), |c| {
        c.environment = Environment::Production
    })
    .await;

    let response = app.get("/Newsletter/Subscribers").await;

    assert_eq!(302, response.status().as_u16());
    assert_eq!("/Home/Error", response.headers().get("Location").unwrap());
    let html = app.get_html("/Home/Error").await;
    assert!(html.contains("An error occurred while processing your request."));
}

#[tokio::test]
async fn client_errors_are_not_redirected_in_production() {
    let app = spawn_app_with(|c| c.environment = Environment::Production).await;

    let response = app.get("/Images/missing.png").await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn plain_http_is_redirected_when_an_https_port_is_set() {
    let app = spawn_app_with(|c| c.application.https_port = Some(8443)).await;

    let response = app.get("/Newsletter/Subscribe?ref=home").await;

    assert_eq!(307, response.status().as_u16());
    assert_eq!(
        "https://127.0.0.1:8443/Newsletter/Subscribe?ref=home",
        response.headers().get("Location").unwrap()
    );
}
