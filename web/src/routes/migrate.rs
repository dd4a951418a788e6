use crate::domain::SubscriberStore;
use actix_web::{web, HttpResponse};

#[tracing::instrument(name = "Database migration", skip(store), fields(backend = store.backend_name()))]
pub async fn migrate_db(store: web::Data<dyn SubscriberStore>) -> HttpResponse {
    match store.apply_migrations().await {
        Ok(_) => {
            tracing::info!("Subscriber store migrated successfully");

            HttpResponse::Ok().finish()
        }
        Err(e) => {
            tracing::error!(error = ?e, "Subscriber store migration failed");

            HttpResponse::InternalServerError().finish()
        }
    }
}
