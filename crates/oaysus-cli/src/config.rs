//! Configuration loading for the Oaysus CLI.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `oaysus.config.json` in the project root (or `--config`)
//! 3. `OAYSUS_*` environment variables (`OAYSUS_OUTPUT_DIR`, `OAYSUS_MINIFY`, ...)
//! 4. Command-line flags

use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use oaysus_build::PipelineOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "oaysus.config.json";

const ENV_PREFIX: &str = "OAYSUS_";

/// Keys accepted from the environment. Anything else with the prefix is ignored.
const ENV_KEYS: &[&str] = &[
    "output_dir",
    "cdn_url",
    "r2_public_url",
    "r2_base_path",
    "minify",
    "install_missing_deps",
    "tool_timeout_secs",
    "components_dir",
];

/// Merged CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OaysusConfig {
    /// Output directory, relative to the project root
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// ESM CDN used for import maps when no R2 public URL is set
    #[serde(default = "default_cdn_url")]
    pub cdn_url: String,

    /// Public URL of the asset bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r2_public_url: Option<String>,

    /// Theme prefix inside the bucket (defaults to `<theme>/<version>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r2_base_path: Option<String>,

    #[serde(default = "default_true")]
    pub minify: bool,

    /// Install dependencies when `node_modules` is missing
    #[serde(default = "default_true")]
    pub install_missing_deps: bool,

    /// Seconds before a package-manager or CSS tool invocation is killed
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Component directory, relative to the project root. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components_dir: Option<PathBuf>,
}

fn default_output_dir() -> String {
    ".oaysus-build".to_string()
}

fn default_cdn_url() -> String {
    "https://esm.sh".to_string()
}

fn default_true() -> bool {
    true
}

fn default_tool_timeout_secs() -> u64 {
    120
}

impl Default for OaysusConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cdn_url: default_cdn_url(),
            r2_public_url: None,
            r2_base_path: None,
            minify: true,
            install_missing_deps: true,
            tool_timeout_secs: default_tool_timeout_secs(),
            components_dir: None,
        }
    }
}

/// Values supplied on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_base_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_missing_deps: Option<bool>,
}

impl OaysusConfig {
    /// Load configuration for a project.
    ///
    /// An explicit `config_path` must exist. Without one, `oaysus.config.json`
    /// in `project_root` is used when present.
    pub fn load(
        project_root: &Path,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    project_root.join(path)
                };
                if !path.exists() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = project_root.join(CONFIG_FILE);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!("Loading config from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        figment = figment
            .merge(Env::prefixed(ENV_PREFIX).only(ENV_KEYS))
            .merge(Serialized::defaults(overrides));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Extract(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.trim().is_empty() {
            return Err(invalid(
                "output_dir",
                &self.output_dir,
                "Use a directory name such as .oaysus-build",
            ));
        }
        if Path::new(&self.output_dir).is_absolute() || self.output_dir.contains("..") {
            return Err(invalid(
                "output_dir",
                &self.output_dir,
                "The output directory must stay inside the project root",
            ));
        }
        if !is_http_url(&self.cdn_url) {
            return Err(invalid(
                "cdn_url",
                &self.cdn_url,
                "Use an http(s) URL such as https://esm.sh",
            ));
        }
        if let Some(url) = &self.r2_public_url {
            if !is_http_url(url) {
                return Err(invalid(
                    "r2_public_url",
                    url,
                    "Use the public http(s) origin of the bucket",
                ));
            }
        }
        if self.tool_timeout_secs == 0 {
            return Err(invalid(
                "tool_timeout_secs",
                "0",
                "Use a timeout of at least one second",
            ));
        }
        Ok(())
    }

    /// Pipeline settings for `project_root`.
    pub fn pipeline_options(&self, project_root: impl Into<PathBuf>) -> PipelineOptions {
        PipelineOptions {
            output_dir_name: self.output_dir.clone(),
            cdn_url: self.cdn_url.clone(),
            r2_public_url: self.r2_public_url.clone(),
            r2_base_path: self.r2_base_path.clone(),
            minify: self.minify,
            install_missing_deps: self.install_missing_deps,
            tool_timeout_secs: self.tool_timeout_secs,
            ..PipelineOptions::new(project_root)
        }
    }

    /// JSON Schema for `oaysus.config.json`.
    pub fn json_schema() -> Result<serde_json::Value> {
        let schema = schemars::schema_for!(OaysusConfig);
        Ok(serde_json::to_value(schema)?)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn invalid(field: &str, value: &str, hint: &str) -> crate::error::CliError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        hint: hint.to_string(),
    }
    .into()
}
