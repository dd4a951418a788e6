use crate::helpers::{spawn_app, spawn_app_with, TestApp};

#[tokio::test]
async fn the_landing_page_is_served_on_every_alias() {
    let app = spawn_app().await;

    for path in ["/", "/Home", "/Home/Index"] {
        let response = app.get(path).await;

        assert_eq!(200, response.status().as_u16(), "GET {} failed", path);
        let html = response.text().await.unwrap();
        assert!(html.contains("Welcome to our newsletter"));
    }
}

#[tokio::test]
async fn the_hero_image_is_resolved_through_the_image_store() {
    let app = spawn_app_with_hero().await;

    let html = app.get_html("/").await;

    assert!(html.contains(r#"src="/Images/hero.jpg""#));
}

async fn spawn_app_with_hero() -> TestApp {
    spawn_app_with(|c| c.application.hero_image = Some("hero.jpg".into())).await
}

#[tokio::test]
async fn the_privacy_page_is_served() {
    let app = spawn_app().await;

    let response = app.get("/Home/Privacy").await;

    assert_eq!(200, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("Privacy Policy"));
}

#[tokio::test]
async fn the_error_page_shows_the_request_id() {
    let app = spawn_app().await;

    let response = app.get("/Home/Error").await;

    assert_eq!(200, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("Request ID"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let app = spawn_app().await;

    let response = app.get("/css/site.css").await;

    assert_eq!(200, response.status().as_u16());
    assert!(response
        .headers()
        .get("Content-Type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/css"));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = spawn_app().await;

    let response = app.get("/does/not/exist").await;

    assert_eq!(404, response.status().as_u16());
}
