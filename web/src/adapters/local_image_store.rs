use crate::domain::{Image, ImageId, ImageStore, ImageStoreError};
use anyhow::Context;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

/// Images as plain files under a single directory, one file per id.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &ImageId) -> PathBuf {
        self.root.join(id.as_str())
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    #[tracing::instrument(
        name = "Store image on local disk",
        skip(self, image),
        fields(image_id = %image.id, size = image.bytes.len())
    )]
    async fn store(&self, image: &Image) -> Result<(), ImageStoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context(format!("Failure creating image directory {}", self.root.display()))?;

        let path = self.path_for(&image.id);
        tokio::fs::write(&path, &image.bytes)
            .await
            .context(format!("Failure writing image to {}", path.display()))?;

        Ok(())
    }

    #[tracing::instrument(name = "Read image from local disk", skip(self), fields(image_id = %id))]
    async fn retrieve(&self, id: &ImageId) -> Result<Option<Image>, ImageStoreError> {
        let path = self.path_for(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Image::new(id.clone(), bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failure reading image from {}", path.display()))
                .into()),
        }
    }

    fn image_url(&self, id: &ImageId) -> String {
        format!("/Images/{}", id)
    }

    fn backend_name(&self) -> &'static str {
        "local_filesystem"
    }
}
