use crate::helpers::{spawn_app, spawn_app_with};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3, 4];

#[tokio::test]
async fn an_uploaded_image_can_be_fetched_back() {
    // Arrange
    let app = spawn_app().await;

    // Act - Part 1 - Upload
    let response = app.post_image("image/png", PNG_BYTES.to_vec()).await;
    assert_eq!(201, response.status().as_u16());
    let location = response
        .headers()
        .get("Location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let body: serde_json::Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap();
    assert!(id.ends_with(".png"));
    assert_eq!(location, format!("/Images/{}", id));
    assert_eq!(body["url"].as_str().unwrap(), location);

    // Act - Part 2 - Fetch
    let response = app.get(&location).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert_eq!(
        "image/png",
        response.headers().get("Content-Type").unwrap().to_str().unwrap()
    );
    assert_eq!(PNG_BYTES, response.bytes().await.unwrap().as_ref());
}

#[tokio::test]
async fn uploaded_images_land_in_the_configured_directory() {
    let app = spawn_app().await;

    let response = app.post_image("image/jpeg", vec![0xff, 0xd8, 0xff]).await;
    let body: serde_json::Value = response.json().await.unwrap();

    let path = app.image_dir.path().join(body["id"].as_str().unwrap());
    assert_eq!(vec![0xff, 0xd8, 0xff], std::fs::read(path).unwrap());
}

#[tokio::test]
async fn non_image_uploads_are_rejected_with_a_415() {
    let app = spawn_app().await;

    for content_type in ["text/plain", "application/octet-stream", "image/svg+xml"] {
        let response = app.post_image(content_type, b"hello".to_vec()).await;

        assert_eq!(
            415,
            response.status().as_u16(),
            "{} was not rejected",
            content_type
        );
    }
}

#[tokio::test]
async fn empty_uploads_are_rejected_with_a_400() {
    let app = spawn_app().await;

    let response = app.post_image("image/png", Vec::new()).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn oversized_uploads_are_rejected_with_a_413() {
    let app = spawn_app_with(|c| c.application.max_image_bytes = 16).await;

    let response = app.post_image("image/png", vec![0u8; 64]).await;

    assert_eq!(413, response.status().as_u16());
}

#[tokio::test]
async fn fetching_a_missing_image_returns_a_404() {
    let app = spawn_app().await;

    let response = app.get("/Images/missing.png").await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn fetching_a_malformed_image_id_returns_a_400() {
    let app = spawn_app().await;

    for id in ["no-extension", "image.exe", "bad%20name.png"] {
        let response = app.get(&format!("/Images/{}", id)).await;

        assert_eq!(400, response.status().as_u16(), "{} was accepted", id);
    }
}
