use crate::backends::Backends;
use crate::configuration::Settings;
use crate::domain::{ImageId, ImageStore, SubscriberStore};
use crate::middleware::{redirect_to_error_page, HttpsRedirection};
use crate::routes::{
    error, get_image, health_check, index, migrate_db, privacy, subscribe, subscribe_form,
    subscribers, unsubscribe, unsubscribe_form, upload_image, HeroImage,
};
use crate::services::NewsletterService;
use actix_files::Files;
use actix_web::cookie::Key;
use actix_web::dev::{Server, Service};
use actix_web::http::header::{HeaderName, HeaderValue, STRICT_TRANSPORT_SECURITY};
use actix_web::middleware::{Condition, DefaultHeaders, ErrorHandlers};
use actix_web::web::Data;
use actix_web::{web, App, HttpMessage, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use anyhow::anyhow;
use secrecy::ExposeSecret;
use std::net::TcpListener;
use telemetry::CustomLevelRootSpanBuilder;
use tracing_actix_web::{RequestId, TracingLogger};

/// 30 days.
const HSTS_HEADER_VALUE: &str = "max-age=2592000";

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Selects the backends from `configuration` and binds the listener.
    /// Fails, without serving anything, when a selected backend is misconfigured.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let backends = Backends::from_settings(&configuration).await?;
        Self::build_with_backends(configuration, backends)
    }

    pub fn build_with_backends(
        configuration: Settings,
        backends: Backends,
    ) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(format!(
            "{}:{}",
            configuration.application.host_name, configuration.application.application_port
        ))?;

        let port = listener.local_addr()?.port();
        let server = run(listener, configuration, backends)?;

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn run(
    listener: TcpListener,
    configuration: Settings,
    backends: Backends,
) -> Result<Server, anyhow::Error> {
    let application = configuration.application;

    let secret_key = Key::try_from(application.hmac_secret.expose_secret().as_bytes())
        .map_err(|_| anyhow!("application.hmac_secret must be at least 64 bytes long"))?;
    let message_store = CookieMessageStore::builder(secret_key).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let hero_image = application
        .hero_image
        .as_deref()
        .map(ImageId::parse)
        .transpose()
        .map_err(|e| anyhow!("application.hero_image: {}", e))?;
    let hero_image = Data::new(HeroImage(hero_image));

    let newsletter_service = Data::new(NewsletterService::new(backends.subscribers.clone()));
    let subscriber_store: Data<dyn SubscriberStore> = Data::from(backends.subscribers);
    let image_store: Data<dyn ImageStore> = Data::from(backends.images);

    let is_development = configuration.environment.is_development();
    if application.https_port.is_none() {
        tracing::warn!("Failed to determine the https port for redirect.");
    }
    let https_redirection = HttpsRedirection::new(application.https_port);
    let static_files_dir = application.static_files_dir;
    let max_image_bytes = application.max_image_bytes;

    tracing::info!(
        environment = configuration.environment.as_str(),
        subscriber_store = subscriber_store.backend_name(),
        image_store = image_store.backend_name(),
        "Request pipeline configured"
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(https_redirection)
            .wrap(Condition::new(
                !is_development,
                ErrorHandlers::new().default_handler_server(redirect_to_error_page),
            ))
            .wrap(Condition::new(
                !is_development,
                DefaultHeaders::new().add((STRICT_TRANSPORT_SECURITY, HSTS_HEADER_VALUE)),
            ))
            .wrap_fn(|req, srv| {
                let request_id = req.extensions().get::<RequestId>().copied();
                let res = srv.call(req);
                async move {
                    let mut res = res.await?;
                    if let Some(request_id) = request_id {
                        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                            res.headers_mut()
                                .insert(HeaderName::from_static("x-request-id"), value);
                        }
                    }
                    Ok(res)
                }
            })
            .wrap(TracingLogger::<CustomLevelRootSpanBuilder>::new())
            .route("/", web::get().to(index))
            .route("/Home", web::get().to(index))
            .route("/Home/Index", web::get().to(index))
            .route("/Home/Privacy", web::get().to(privacy))
            .route("/Home/Error", web::get().to(error))
            .route("/Newsletter", web::get().to(subscribe_form))
            .route("/Newsletter/Subscribe", web::get().to(subscribe_form))
            .route("/Newsletter/Subscribe", web::post().to(subscribe))
            .route("/Newsletter/Subscribers", web::get().to(subscribers))
            .route("/Newsletter/Unsubscribe", web::get().to(unsubscribe_form))
            .route("/Newsletter/Unsubscribe", web::post().to(unsubscribe))
            .route("/Images", web::post().to(upload_image))
            .route("/Images/{id}", web::get().to(get_image))
            .route("/health_check", web::get().to(health_check))
            .route("/util/_migrate", web::get().to(migrate_db))
            .service(Files::new("/", &static_files_dir))
            .app_data(web::PayloadConfig::new(max_image_bytes))
            .app_data(subscriber_store.clone())
            .app_data(image_store.clone())
            .app_data(newsletter_service.clone())
            .app_data(hero_image.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
