use crate::domain::image::{Image, ImageId};
use crate::utils::error_chain_fmt;
use async_trait::async_trait;

#[derive(thiserror::Error)]
pub enum ImageStoreError {
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ImageStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `image` under its id, replacing whatever was there.
    async fn store(&self, image: &Image) -> Result<(), ImageStoreError>;

    /// `None` when nothing is stored under `id`.
    async fn retrieve(&self, id: &ImageId) -> Result<Option<Image>, ImageStoreError>;

    /// Where a browser can load the image from.
    fn image_url(&self, id: &ImageId) -> String;

    fn backend_name(&self) -> &'static str;
}
