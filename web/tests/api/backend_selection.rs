use crate::helpers::{spawn_app, test_configuration};
use newsletter::startup::Application;
use tempfile::TempDir;

#[tokio::test]
async fn both_flags_off_serves_from_the_fallback_backends() {
    let app = spawn_app().await;

    assert_eq!("in_memory", app.subscriber_store.backend_name());
    let response = app.get("/health_check").await;
    assert!(response.status().is_success());
}

#[tokio::test]
async fn the_mongodb_flag_without_a_connection_string_stops_startup() {
    let image_dir = TempDir::new().unwrap();
    let mut configuration = test_configuration(&image_dir);
    configuration.feature_flags.use_mongo_db = true;
    configuration.mongo_db.connection_string = Some(secrecy::Secret::new("   ".to_string()));

    let error = match Application::build(configuration).await {
        Ok(_) => panic!("The application started without a MongoDB connection string."),
        Err(e) => e,
    };

    assert_eq!("MongoDB ConnectionString is not configured.", error.to_string());
}

#[tokio::test]
async fn the_azure_flag_without_a_connection_string_stops_startup() {
    let image_dir = TempDir::new().unwrap();
    let mut configuration = test_configuration(&image_dir);
    configuration.feature_flags.use_azure_storage = true;
    configuration.azure_blob.connection_string = None;
    configuration.azure_blob.use_emulator = false;

    assert!(Application::build(configuration).await.is_err());
}
