use crate::adapters::{
    AzureBlobImageStore, InMemorySubscriberStore, LocalImageStore, MongoDbSubscriberStore,
};
use crate::configuration::{
    AzureBlobSettings, FeatureFlags, LocalImageSettings, MongoDbSettings, Settings,
};
use crate::domain::{ImageStore, SubscriberStore};
use crate::utils::error_chain_fmt;
use mongodb::Client;
use std::sync::Arc;

#[derive(thiserror::Error)]
pub enum BackendSelectionError {
    #[error("MongoDB ConnectionString is not configured.")]
    MissingMongoDbConnectionString,
    #[error("Failed to create the MongoDB client.")]
    MongoDbClient(#[source] mongodb::error::Error),
    #[error("Azure Blob Storage ConnectionString is not configured.")]
    MissingAzureBlobConnectionString,
    #[error("Failed to create the Azure Blob Storage client.")]
    AzureBlobClient(#[source] anyhow::Error),
}

impl std::fmt::Debug for BackendSelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The adapters chosen for this process, one per capability.
#[derive(Clone)]
pub struct Backends {
    pub subscribers: Arc<dyn SubscriberStore>,
    pub images: Arc<dyn ImageStore>,
}

impl Backends {
    pub async fn from_settings(settings: &Settings) -> Result<Self, BackendSelectionError> {
        let subscribers =
            select_subscriber_store(&settings.feature_flags, &settings.mongo_db).await?;
        let images = select_image_store(
            &settings.feature_flags,
            &settings.azure_blob,
            &settings.local_images,
        )?;

        Ok(Self {
            subscribers,
            images,
        })
    }
}

pub async fn select_subscriber_store(
    flags: &FeatureFlags,
    settings: &MongoDbSettings,
) -> Result<Arc<dyn SubscriberStore>, BackendSelectionError> {
    if !flags.use_mongo_db {
        tracing::info!(backend = "in_memory", "Using in-memory repository");
        return Ok(Arc::new(InMemorySubscriberStore::new()));
    }

    let connection_string = settings
        .connection_string()
        .ok_or(BackendSelectionError::MissingMongoDbConnectionString)?;

    // Only parses the URI; the driver connects lazily.
    let client = Client::with_uri_str(connection_string)
        .await
        .map_err(BackendSelectionError::MongoDbClient)?;
    let collection = client
        .database(&settings.database_name)
        .collection(&settings.subscribers_collection_name);

    tracing::info!(
        backend = "mongodb",
        database = %settings.database_name,
        collection = %settings.subscribers_collection_name,
        "Using MongoDB repository"
    );
    Ok(Arc::new(MongoDbSubscriberStore::new(collection)))
}

pub fn select_image_store(
    flags: &FeatureFlags,
    azure: &AzureBlobSettings,
    local: &LocalImageSettings,
) -> Result<Arc<dyn ImageStore>, BackendSelectionError> {
    if !flags.use_azure_storage {
        tracing::info!(
            backend = "local_filesystem",
            root_dir = %local.root_dir,
            "Using local storage for images"
        );
        return Ok(Arc::new(LocalImageStore::new(&local.root_dir)));
    }

    let store = if azure.use_emulator {
        AzureBlobImageStore::emulator(&azure.container_name)
    } else {
        let connection_string = azure
            .connection_string()
            .ok_or(BackendSelectionError::MissingAzureBlobConnectionString)?;
        AzureBlobImageStore::from_connection_string(connection_string, &azure.container_name)
            .map_err(BackendSelectionError::AzureBlobClient)?
    };

    tracing::info!(
        backend = "azure_blob",
        container = %azure.container_name,
        "Using Azure Blob Storage for images"
    );
    Ok(Arc::new(store))
}
