use async_trait::async_trait;
use newsletter::backends::Backends;
use newsletter::configuration::{get_configuration, Settings};
use newsletter::domain::{
    Subscriber, SubscriberEmail, SubscriberId, SubscriberStore, SubscriberStoreError,
};
use newsletter::startup::Application;
use once_cell::sync::Lazy;
use std::sync::Arc;
use telemetry::{get_subscriber, init_subscriber, init_tracer};
use tempfile::TempDir;

// Ensure that the `tracing` stack is only initialised once
static TRACING: Lazy<()> = Lazy::new(|| {
    let mut configuration = get_configuration().expect("Failed to read configuration");
    configuration.telemetry.otlp_endpoint = None;
    let default_filter = "info".to_string();
    let subscriber_name = "test".to_string();
    configuration.telemetry.dataset_name = format!("test-{}", configuration.telemetry.dataset_name);

    let default_trace_provider =
        init_tracer(&configuration.telemetry).expect("Failed to build the tracer");

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter,
            std::io::stdout,
            &configuration.telemetry,
            &default_trace_provider,
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter,
            std::io::sink,
            &configuration.telemetry,
            &default_trace_provider,
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub subscriber_store: Arc<dyn SubscriberStore>,
    pub image_dir: TempDir,
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_html(&self, path: &str) -> String {
        self.get(path).await.text().await.unwrap()
    }

    pub async fn post_subscribe<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/Newsletter/Subscribe", &self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_unsubscribe<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/Newsletter/Unsubscribe", &self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_image(&self, content_type: &str, body: Vec<u8>) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/Images", &self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Settings for an isolated instance: random port, in-process backends and
/// a throwaway image directory.
pub fn test_configuration(image_dir: &TempDir) -> Settings {
    let mut c = get_configuration().expect("Failed to read configuration.");
    c.application.application_port = 0;
    c.application.host_name = "127.0.0.1".to_string();
    c.application.https_port = None;
    c.feature_flags.use_mongo_db = false;
    c.feature_flags.use_azure_storage = false;
    c.local_images.root_dir = image_dir.path().to_string_lossy().into_owned();
    c
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    Lazy::force(&TRACING);

    let image_dir = TempDir::new().expect("Failed to create a temporary image directory.");
    let mut configuration = test_configuration(&image_dir);
    customise(&mut configuration);

    let backends = Backends::from_settings(&configuration)
        .await
        .expect("Failed to select backends.");

    launch(configuration, backends, image_dir)
}

/// Like [`spawn_app_with`], but serving subscribers from `subscriber_store`.
pub async fn spawn_app_with_store(
    subscriber_store: Arc<dyn SubscriberStore>,
    customise: impl FnOnce(&mut Settings),
) -> TestApp {
    Lazy::force(&TRACING);

    let image_dir = TempDir::new().expect("Failed to create a temporary image directory.");
    let mut configuration = test_configuration(&image_dir);
    customise(&mut configuration);

    let mut backends = Backends::from_settings(&configuration)
        .await
        .expect("Failed to select backends.");
    backends.subscribers = subscriber_store;

    launch(configuration, backends, image_dir)
}

fn launch(configuration: Settings, backends: Backends, image_dir: TempDir) -> TestApp {
    let subscriber_store = backends.subscribers.clone();
    let application = Application::build_with_backends(configuration, backends)
        .expect("Failed to build application.");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        api_client,
        subscriber_store,
        image_dir,
    }
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}

/// A store whose backend is always down.
pub struct UnavailableSubscriberStore;

fn unavailable() -> SubscriberStoreError {
    SubscriberStoreError::UnexpectedError(anyhow::anyhow!("The subscriber store is unavailable."))
}

#[async_trait]
impl SubscriberStore for UnavailableSubscriberStore {
    async fn list(&self) -> Result<Vec<Subscriber>, SubscriberStoreError> {
        Err(unavailable())
    }

    async fn find_by_id(
        &self,
        _id: SubscriberId,
    ) -> Result<Option<Subscriber>, SubscriberStoreError> {
        Err(unavailable())
    }

    async fn find_by_email(
        &self,
        _email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, SubscriberStoreError> {
        Err(unavailable())
    }

    async fn insert(&self, _subscriber: &Subscriber) -> Result<(), SubscriberStoreError> {
        Err(unavailable())
    }

    async fn update(&self, _subscriber: &Subscriber) -> Result<(), SubscriberStoreError> {
        Err(unavailable())
    }

    async fn delete_by_email(&self, _email: &SubscriberEmail) -> Result<(), SubscriberStoreError> {
        Err(unavailable())
    }

    async fn apply_migrations(&self) -> Result<(), SubscriberStoreError> {
        Err(unavailable())
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}
