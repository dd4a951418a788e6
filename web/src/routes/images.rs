use crate::domain::{Image, ImageFormat, ImageId, ImageStore};
use crate::utils::error_chain_fmt;
use actix_web::http::header::{CONTENT_TYPE, LOCATION};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;

#[derive(thiserror::Error)]
pub enum ImageError {
    #[error("{0}")]
    InvalidId(String),
    #[error("Only PNG, JPEG, GIF and WebP images are accepted, got {0:?}.")]
    UnsupportedMediaType(String),
    #[error("The uploaded image is empty.")]
    EmptyBody,
    #[error("There is no image called {0}.")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ImageError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) | Self::EmptyBody => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(serde::Serialize)]
struct UploadedImage {
    id: String,
    url: String,
}

#[tracing::instrument(
    name = "Uploading an image",
    skip(request, body, image_store),
    fields(size = body.len(), image_id = tracing::field::Empty)
)]
pub async fn upload_image(
    request: HttpRequest,
    body: web::Bytes,
    image_store: web::Data<dyn ImageStore>,
) -> Result<HttpResponse, ImageError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let format = ImageFormat::from_content_type(content_type)
        .ok_or_else(|| ImageError::UnsupportedMediaType(content_type.to_string()))?;

    if body.is_empty() {
        return Err(ImageError::EmptyBody);
    }

    let image = Image::new(ImageId::generate(format), body);
    tracing::Span::current().record("image_id", tracing::field::display(&image.id));

    image_store
        .store(&image)
        .await
        .context("Failed to store the uploaded image.")?;

    Ok(HttpResponse::Created()
        .insert_header((LOCATION, format!("/Images/{}", image.id)))
        .json(UploadedImage {
            id: image.id.to_string(),
            url: image_store.image_url(&image.id),
        }))
}

#[tracing::instrument(name = "Serving an image", skip(image_store))]
pub async fn get_image(
    id: web::Path<String>,
    image_store: web::Data<dyn ImageStore>,
) -> Result<HttpResponse, ImageError> {
    let id = ImageId::parse(&id).map_err(ImageError::InvalidId)?;

    let image = image_store
        .retrieve(&id)
        .await
        .context("Failed to retrieve the image.")?
        .ok_or_else(|| ImageError::NotFound(id.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type(image.content_type())
        .body(image.bytes))
}
