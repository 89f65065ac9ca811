use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use legends_llm::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, GEMINI_PROVIDER_ID, ProviderConfig};
use serde::{Deserialize, Deserializer, Serialize};
use snafu::{ResultExt, Snafu, ensure};

pub const SETTINGS_DIRECTORY_NAME: &str = "two-legends-pro";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const API_KEY_ENV: &str = "API_KEY";

/// Environment overrides in merge order; later entries win.
const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("LEGENDS_PROVIDER_ID", "provider_id"),
    ("LEGENDS_ENDPOINT", "endpoint"),
    ("LEGENDS_MODEL", "model"),
    ("LEGENDS_API_KEY", "api_key"),
    (API_KEY_ENV, "api_key"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_id", deserialize_with = "lenient_string")]
    pub provider_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_key: String,
    #[serde(default = "default_endpoint", deserialize_with = "lenient_string")]
    pub endpoint: String,
    #[serde(default = "default_model", deserialize_with = "lenient_string")]
    pub model: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
        }
    }
}

impl ProviderSettings {
    /// Builds the gateway config. A blank key is passed through; the gateway
    /// rejects each query until one is configured.
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.provider_id, &self.api_key, &self.endpoint, &self.model)
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = non_blank_or(self.provider_id, default_provider_id);
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = non_blank_or(self.endpoint, default_endpoint);
        self.model = non_blank_or(self.model, default_model);
        self
    }
}

/// Current provider settings, layered from defaults, the settings file and the
/// environment.
///
/// Readers get a cheap snapshot; [`SettingsStore::save_api_key`] swaps in a new
/// one after the file is written.
pub struct SettingsStore {
    settings: ArcSwap<ProviderSettings>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".two-legends-pro"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = load_layers(&config_path);
        Self {
            settings: ArcSwap::from_pointee(settings),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<ProviderSettings> {
        self.settings.load_full()
    }

    /// Writes `api_key` into the settings file and makes it current.
    ///
    /// Only the file's own values are written back; environment overrides stay
    /// in the environment.
    pub async fn save_api_key(&self, api_key: &str) -> Result<Arc<ProviderSettings>, SettingsError> {
        let api_key = api_key.trim();
        ensure!(
            !api_key.is_empty(),
            BlankApiKeySnafu {
                stage: "validate-api-key",
            }
        );

        let mut on_disk = file_layer(&self.config_path);
        on_disk.api_key = api_key.to_string();
        self.write_file(&on_disk.normalized()).await?;

        let mut current = ProviderSettings::clone(&self.settings.load());
        current.api_key = api_key.to_string();
        let current = Arc::new(current.normalized());
        self.settings.store(Arc::clone(&current));

        tracing::info!(path = ?self.config_path, "api key saved");
        Ok(current)
    }

    async fn write_file(&self, settings: &ProviderSettings) -> Result<(), SettingsError> {
        let directory = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !directory.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&directory)
                .await
                .context(CreateConfigDirSnafu {
                    stage: "create-config-dir",
                    path: directory.clone(),
                })?;
        }

        let encoded = serde_json::to_vec_pretty(settings).context(EncodeSettingsSnafu {
            stage: "encode-settings",
        })?;

        // Written beside the target so the rename stays on one filesystem.
        let staging = directory.join(format!(".{SETTINGS_FILE_NAME}.{}", std::process::id()));
        tokio::fs::write(&staging, encoded)
            .await
            .context(WriteSettingsSnafu {
                stage: "write-staged-settings",
                path: staging.clone(),
            })?;

        tokio::fs::rename(&staging, &self.config_path)
            .await
            .context(ReplaceSettingsSnafu {
                stage: "replace-settings-file",
                path: self.config_path.clone(),
            })
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("refusing to save a blank API key"))]
    BlankApiKey { stage: &'static str },
    #[snafu(display("cannot create config directory {path:?} on `{stage}`: {source}"))]
    CreateConfigDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot encode settings on `{stage}`: {source}"))]
    EncodeSettings {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("cannot write {path:?} on `{stage}`: {source}"))]
    WriteSettings {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot replace {path:?} on `{stage}`: {source}"))]
    ReplaceSettings {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(ProviderSettings::default()))
}

/// Merges every set override variable verbatim, so an all-digit key stays a string.
fn with_env(figment: Figment) -> Figment {
    ENV_OVERRIDES
        .iter()
        .fold(figment, |figment, &(variable, field)| match Env::var(variable) {
            Some(value) => figment.merge(Serialized::default(field, value)),
            None => figment,
        })
}

fn load_layers(path: &Path) -> ProviderSettings {
    if !path.exists() {
        tracing::info!(path = ?path, "no settings file, using defaults and environment");
    }

    match with_env(defaults().merge(Json::file(path))).extract::<ProviderSettings>() {
        Ok(settings) => settings.normalized(),
        Err(error) => {
            tracing::warn!(
                path = ?path,
                error = %error,
                "settings file unreadable, keeping defaults and environment"
            );
            match with_env(defaults()).extract::<ProviderSettings>() {
                Ok(settings) => settings.normalized(),
                Err(error) => {
                    tracing::warn!(error = %error, "environment overrides unreadable, using defaults");
                    ProviderSettings::default()
                }
            }
        }
    }
}

/// The settings file on its own, without environment overrides.
fn file_layer(path: &Path) -> ProviderSettings {
    defaults()
        .merge(Json::file(path))
        .extract::<ProviderSettings>()
        .unwrap_or_else(|error| {
            tracing::warn!(path = ?path, error = %error, "replacing unreadable settings file");
            ProviderSettings::default()
        })
}

/// Accepts numbers and booleans where a string is expected; hand-edited files
/// often carry `"api_key": 123` style values.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Unsigned(value) => value.to_string(),
        Scalar::Signed(value) => value.to_string(),
        Scalar::Float(value) => value.to_string(),
        Scalar::Flag(value) => value.to_string(),
    })
}

fn non_blank_or(value: String, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

fn default_provider_id() -> String {
    GEMINI_PROVIDER_ID.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}
