use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chatpane_transport::TransportConfig;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
    value::Value,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::chat::{ChatOptions, RenderMode, SubmitPolicy};
use crate::dialogs::Locale;
use crate::persist::{AtomicWriteError, write_json_atomically};
use crate::sidebar::{DEFAULT_BREAKPOINT, SidebarOptions};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5001";
pub const SETTINGS_DIRECTORY_NAME: &str = "chatpane";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "CHATPANE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    /// Base URL of the chat server; routes are appended to its path.
    pub endpoint: String,
    pub breakpoint: u32,
    pub render_mode: RenderMode,
    pub submit_policy: SubmitPolicy,
    /// Send the trimmed text instead of the raw input.
    pub trim_outbound: bool,
    pub show_send_errors: bool,
    pub locale: Locale,
    pub persist_sidebar: bool,
    pub restore_sidebar: bool,
    pub request_timeout_ms: Option<u64>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            breakpoint: DEFAULT_BREAKPOINT,
            render_mode: RenderMode::default(),
            submit_policy: SubmitPolicy::default(),
            trim_outbound: false,
            show_send_errors: false,
            locale: Locale::default(),
            persist_sidebar: true,
            restore_sidebar: false,
            request_timeout_ms: None,
        }
    }
}

impl WidgetSettings {
    /// Defaults, then the JSON file at `path`, then `CHATPANE_*` variables.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(WidgetSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(SETTINGS_ENV_PREFIX))
    }

    pub fn extract(path: &Path) -> Result<Self, SettingsError> {
        Self::figment(path)
            .extract::<WidgetSettings>()
            .map(WidgetSettings::normalized)
            .context(ExtractSnafu {
                stage: "extract-settings",
                path: path.to_path_buf(),
            })
    }

    pub fn normalized(mut self) -> Self {
        self.endpoint = if self.endpoint.trim().is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            self.endpoint.trim().to_string()
        };
        self.breakpoint = self.breakpoint.max(1);
        self.request_timeout_ms = self.request_timeout_ms.filter(|timeout| *timeout > 0);
        self
    }

    /// Copy with one field replaced, parsing `raw` the way environment values are.
    pub fn with_override(&self, key: &str, raw: &str) -> Result<Self, SettingsError> {
        let known = serde_json::to_value(self)
            .ok()
            .and_then(|fields| fields.as_object().map(|fields| fields.contains_key(key)))
            .unwrap_or(false);
        if !known {
            return UnknownKeySnafu {
                stage: "override-setting",
                key,
            }
            .fail();
        }

        let value: Value = raw.parse().unwrap_or_else(|never| match never {});
        Figment::from(Serialized::defaults(self))
            .merge(Serialized::default(key, value))
            .extract::<WidgetSettings>()
            .map(WidgetSettings::normalized)
            .context(OverrideSnafu {
                stage: "override-setting",
                key,
                value: raw,
            })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn transport_config(&self) -> TransportConfig {
        let config = TransportConfig::new(&self.endpoint);
        match self.request_timeout() {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }

    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            render_mode: self.render_mode,
            submit_policy: self.submit_policy,
            trim_outbound: self.trim_outbound,
            show_send_errors: self.show_send_errors,
            locale: self.locale,
        }
    }

    pub fn sidebar_options(&self) -> SidebarOptions {
        SidebarOptions {
            breakpoint: self.breakpoint,
            persist: self.persist_sidebar,
            restore: self.restore_sidebar,
        }
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<WidgetSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".chatpane"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<WidgetSettings> {
        self.settings.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn update(&self, settings: WidgetSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> WidgetSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match WidgetSettings::extract(path) {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!("{error}. using defaults");
                WidgetSettings::default()
            }
        }
    }

    fn persist(&self, settings: &WidgetSettings) -> Result<(), SettingsError> {
        write_json_atomically(&self.config_path, settings).context(PersistSnafu {
            stage: "persist-settings",
            path: self.config_path.clone(),
        })?;
        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to load settings from {path:?} on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        path: PathBuf,
        #[snafu(source(from(figment::Error, Box::new)))]
        source: Box<figment::Error>,
    },
    #[snafu(display("unknown setting `{key}` on `{stage}`"))]
    UnknownKey { stage: &'static str, key: String },
    #[snafu(display("cannot set `{key}` to '{value}' on `{stage}`: {source}"))]
    Override {
        stage: &'static str,
        key: String,
        value: String,
        #[snafu(source(from(figment::Error, Box::new)))]
        source: Box<figment::Error>,
    },
    #[snafu(display("failed to save settings to {path:?} on `{stage}`: {source}"))]
    Persist {
        stage: &'static str,
        path: PathBuf,
        source: AtomicWriteError,
    },
}
