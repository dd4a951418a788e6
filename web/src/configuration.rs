use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use telemetry::TelemetrySettings;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub feature_flags: FeatureFlags,
    pub mongo_db: MongoDbSettings,
    pub azure_blob: AzureBlobSettings,
    pub local_images: LocalImageSettings,
    #[serde(skip)]
    pub environment: Environment,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub application_port: u16,
    pub host_name: String,
    /// Port plain-HTTP requests get redirected to. No redirection when unset.
    #[serde(default)]
    pub https_port: Option<u16>,
    pub hmac_secret: Secret<String>,
    pub static_files_dir: String,
    #[serde(default)]
    pub hero_image: Option<String>,
    pub max_image_bytes: usize,
}

/// Backend switches, each evaluated once at startup.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    #[serde(default)]
    pub use_mongo_db: bool,
    #[serde(default)]
    pub use_azure_storage: bool,
}

#[derive(Deserialize, Clone)]
pub struct MongoDbSettings {
    #[serde(default)]
    pub connection_string: Option<Secret<String>>,
    pub database_name: String,
    pub subscribers_collection_name: String,
}

impl MongoDbSettings {
    /// The configured connection string, or `None` when it is missing or blank.
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Deserialize, Clone)]
pub struct AzureBlobSettings {
    #[serde(default)]
    pub connection_string: Option<Secret<String>>,
    pub container_name: String,
    /// Talk to a local storage emulator (Azurite) instead of a real account.
    #[serde(default)]
    pub use_emulator: bool,
}

impl AzureBlobSettings {
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Deserialize, Clone)]
pub struct LocalImageSettings {
    pub root_dir: String,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;

    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let environment_filename = format!("{}.yaml", environment.as_str());

    // Init configuration reader
    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_FEATURE_FLAGS__USE_MONGO_DB=true` would set `Settings.feature_flags.use_mongo_db`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut settings = settings.try_deserialize::<Settings>()?;
    settings.environment = environment;
    Ok(settings)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a support environment. Use either local or production",
                other
            )),
        }
    }
}
