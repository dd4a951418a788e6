use actix_web::web::Bytes;
use uuid::Uuid;

const MAX_STEM_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Accepts the essence of a `Content-Type` header, parameters ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// The name an image is stored under, e.g. `hero.jpg`.
///
/// Only `[A-Za-z0-9_-]` are allowed before the extension, so an id is always a
/// single path segment and a valid blob name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId {
    value: String,
    format: ImageFormat,
}

impl ImageId {
    pub fn generate(format: ImageFormat) -> Self {
        Self {
            value: format!("{}.{}", Uuid::new_v4(), format.extension()),
            format,
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        let invalid = || format!("{} is not a valid image id.", s);

        let (stem, extension) = s.rsplit_once('.').ok_or_else(invalid)?;
        let stem_is_valid = !stem.is_empty()
            && stem.len() <= MAX_STEM_LENGTH
            && stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !stem_is_valid {
            return Err(invalid());
        }

        let format =
            ImageFormat::from_extension(&extension.to_ascii_lowercase()).ok_or_else(invalid)?;

        Ok(Self {
            value: s.to_string(),
            format,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub id: ImageId,
    pub bytes: Bytes,
}

impl Image {
    pub fn new(id: ImageId, bytes: impl Into<Bytes>) -> Self {
        Self {
            id,
            bytes: bytes.into(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.id.format().content_type()
    }
}
