//! Layered configuration for gtn-helpdesk
//!
//! Values come from built-in defaults, then an optional YAML file, then
//! `HELPDESK__SECTION__KEY` environment variables.

use crate::error::Result;
use crate::timezone::OffsetFormatter;
use config::{Config, Environment, File, FileFormat, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "HELPDESK";
const CONFIG_FILE_NAME: &str = "helpdesk.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpdeskConfig {
    pub validation: ValidationSettings,
    pub lifecycle: LifecycleSettings,
    pub attachments: AttachmentSettings,
    pub timezone: TimezoneSettings,
    /// SMTP settings; notifications fail and are journaled as such when absent
    pub email: Option<EmailSettings>,
    pub storage: StorageSettings,
    pub reports: ReportSettings,
}

/// Length limits applied to user input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub title_min: usize,
    pub title_max: usize,
    pub description_min: usize,
    pub comment_min: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            title_min: 5,
            title_max: 200,
            description_min: 10,
            comment_min: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleSettings {
    /// How many times ticket creation retries after a number collision
    pub allocation_retries: u32,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            allocation_retries: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentSettings {
    pub upload_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            upload_dir: PathBuf::from("uploads"),
            allowed_extensions: list(&[
                "png", "jpg", "jpeg", "gif", "bmp", "pdf", "doc", "docx", "xls", "xlsx", "csv",
                "ppt", "pptx", "txt",
            ]),
            image_extensions: list(&["png", "jpg", "jpeg", "gif", "bmp"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneSettings {
    pub name: String,
    pub utc_offset: String,
}

impl Default for TimezoneSettings {
    fn default() -> Self {
        Self {
            name: "Indian Standard Time (IST)".to_string(),
            utc_offset: "+05:30".to_string(),
        }
    }
}

impl TimezoneSettings {
    pub fn formatter(&self) -> Result<OffsetFormatter> {
        OffsetFormatter::parse(&self.utc_offset, self.name.clone())
    }
}

/// Outbound mail settings; the transport itself lives outside this crate
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub use_tls: bool,
    pub from_email: Option<String>,
    pub from_name: String,
    pub is_active: bool,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            use_tls: true,
            from_email: None,
            from_name: "GTN IT Helpdesk".to_string(),
            is_active: true,
        }
    }
}

impl EmailSettings {
    /// `From` header value
    #[must_use]
    pub fn sender(&self) -> String {
        let address = self.from_email.as_deref().unwrap_or(&self.smtp_username);
        format!("{} <{}>", self.from_name, address)
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("is_active", &self.is_active)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub state_file: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let state_file = project_dirs().map_or_else(
            || PathBuf::from(".gtn-helpdesk").join("state.yaml"),
            |dirs| dirs.data_dir().join("state.yaml"),
        );
        Self { state_file }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub top_creators: usize,
    pub recent_limit: usize,
    pub notification_limit: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_creators: 8,
            recent_limit: 10,
            notification_limit: 100,
        }
    }
}

impl HelpdeskConfig {
    /// Load from defaults, `path` (or the user config file if present) and
    /// the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Self::load`] but with an explicit environment map instead of
    /// the process environment
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
            },
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder
                        .add_source(File::from(default_path).format(FileFormat::Yaml).required(false));
                }
            },
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: Self = builder.add_source(environment).build()?.try_deserialize()?;
        tracing::debug!(state_file = %config.storage.state_file.display(), "configuration loaded");
        Ok(config)
    }

    /// Platform config file location, e.g. `~/.config/gtn-helpdesk/helpdesk.yaml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "gtn", "gtn-helpdesk")
}
