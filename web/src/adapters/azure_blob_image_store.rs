use crate::domain::{Image, ImageId, ImageStore, ImageStoreError};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_storage::ConnectionString;
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient, PublicAccess};
use tokio::sync::OnceCell;

/// Images as block blobs in a single, publicly readable container.
pub struct AzureBlobImageStore {
    container_client: ContainerClient,
    container_ready: OnceCell<()>,
}

impl std::fmt::Debug for AzureBlobImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobImageStore")
            .field("container", &self.container_client.container_name())
            .finish()
    }
}

fn is_not_found(error: &azure_core::Error) -> bool {
    match error.kind() {
        ErrorKind::HttpResponse { status, .. } => u16::from(*status) == 404,
        _ => false,
    }
}

impl AzureBlobImageStore {
    pub fn new(container_client: ContainerClient) -> Self {
        Self {
            container_client,
            container_ready: OnceCell::new(),
        }
    }

    /// Builds the client from an account connection string
    /// (`DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...`).
    /// Nothing is sent over the network until the first request.
    pub fn from_connection_string(
        connection_string: &str,
        container_name: &str,
    ) -> Result<Self, anyhow::Error> {
        let connection_string = ConnectionString::new(connection_string)
            .context("Failure parsing the Azure Blob Storage connection string")?;
        let account = connection_string
            .account_name
            .ok_or_else(|| anyhow!("The Azure Blob Storage connection string has no AccountName"))?
            .to_string();
        let credentials = connection_string
            .storage_credentials()
            .context("Failure reading credentials from the Azure Blob Storage connection string")?;

        Ok(Self::new(
            ClientBuilder::new(account, credentials).container_client(container_name),
        ))
    }

    /// Targets the well-known local storage emulator account.
    pub fn emulator(container_name: &str) -> Self {
        Self::new(ClientBuilder::emulator().container_client(container_name))
    }

    async fn ensure_container(&self) -> Result<(), anyhow::Error> {
        self.container_ready
            .get_or_try_init(|| async {
                let exists = self
                    .container_client
                    .exists()
                    .await
                    .context("Failure checking for the blob container")?;
                if !exists {
                    tracing::info!(
                        container = self.container_client.container_name(),
                        "Creating blob container"
                    );
                    self.container_client
                        .create()
                        .public_access(PublicAccess::Blob)
                        .await
                        .context("Failure creating the blob container")?;
                }
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ImageStore for AzureBlobImageStore {
    #[tracing::instrument(
        name = "Store image in Azure Blob Storage",
        skip(self, image),
        fields(image_id = %image.id, size = image.bytes.len())
    )]
    async fn store(&self, image: &Image) -> Result<(), ImageStoreError> {
        self.ensure_container().await?;

        self.container_client
            .blob_client(image.id.as_str())
            .put_block_blob(image.bytes.clone())
            .content_type(image.content_type())
            .await
            .context(format!(
                "Failure uploading blob {} to container {}",
                image.id,
                self.container_client.container_name()
            ))?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Read image from Azure Blob Storage",
        skip(self),
        fields(image_id = %id)
    )]
    async fn retrieve(&self, id: &ImageId) -> Result<Option<Image>, ImageStoreError> {
        // A missing blob shows up as a 404 on the download itself.
        let bytes = match self
            .container_client
            .blob_client(id.as_str())
            .get_content()
            .await
        {
            Ok(bytes) => bytes,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failure downloading blob {}", id))
                    .into())
            }
        };

        Ok(Some(Image::new(id.clone(), bytes)))
    }

    fn image_url(&self, id: &ImageId) -> String {
        match self.container_client.blob_client(id.as_str()).url() {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, image_id = %id, "Falling back to the proxied image URL");
                format!("/Images/{}", id)
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "azure_blob"
    }
}
