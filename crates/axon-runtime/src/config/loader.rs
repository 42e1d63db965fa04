//! Layered loading of [`AxonConfig`] with figment.
//!
//! Layers, lowest first: built-in defaults, [`ConfigLoader::merge`],
//! `axon.<profile>.<ext>`, `axon.<ext>`, then `AXON_*` variables with `__`
//! between nested keys (`AXON_COLLECTOR__COUNT=3`). `AXON_PROFILE` picks the
//! profile. TOML files need the `toml-config` feature, YAML `yaml-config`.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
use figment::providers::{self, Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::AxonConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "AXON_";
const PROFILE_VAR: &str = "AXON_PROFILE";
const FILE_STEMS: [&str; 2] = ["axon", "config"];

/// Name selecting the `axon.<profile>.<ext>` overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile(String);

impl Profile {
    /// Lowercases `name`; `dev` and `prod` expand to their long forms.
    pub fn new(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        Self(match name.as_str() {
            "" | "dev" => "development".to_string(),
            "prod" => "production".to_string(),
            _ => name,
        })
    }

    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|name| Self::new(&name))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("development")
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Config file formats compiled into this build.
#[derive(Debug, Clone, Copy)]
enum FileFormat {
    #[cfg(feature = "toml-config")]
    Toml,
    #[cfg(feature = "yaml-config")]
    Yaml,
}

impl FileFormat {
    /// Enabled formats in merge order.
    fn enabled() -> Vec<Self> {
        #[allow(unused_mut)]
        let mut formats = Vec::new();
        #[cfg(feature = "toml-config")]
        formats.push(Self::Toml);
        #[cfg(feature = "yaml-config")]
        formats.push(Self::Yaml);
        formats
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Some(Self::Toml),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => &["toml"],
            #[cfg(feature = "yaml-config")]
            Self::Yaml => &["yaml", "yml"],
        }
    }

    fn merge(self, figment: Figment, path: &Path) -> Figment {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => figment.merge(providers::Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => figment.merge(providers::Yaml::file(path)),
        }
    }
}

/// Builder over the configuration layers.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    skip_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            file: None,
            skip_env: false,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::new(profile.as_ref());
        self
    }

    /// Adds a directory to search. Without any, the working directory and
    /// `<user config dir>/axon` are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Layers `config` directly above the built-in defaults.
    pub fn merge(mut self, config: AxonConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges every layer, then extracts and validates the result.
    pub fn load(self) -> ConfigResult<AxonConfig> {
        let mut figment = Figment::from(Serialized::defaults(AxonConfig::default()))
            .merge(self.overrides.clone());

        figment = match &self.file {
            Some(path) => self.merge_file(figment, path)?,
            None => self.merge_found(figment),
        };
        if !self.skip_env {
            trace!(prefix = ENV_PREFIX, "Merging environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        let config: AxonConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("Failed to extract configuration: {e}")))?;
        validate_config(&config)?;

        debug!(
            profile = %self.profile,
            library = %config.library,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn merge_file(&self, figment: Figment, path: &Path) -> ConfigResult<Figment> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))?;

        info!(path = %path.display(), "Loading configuration file");
        Ok(format.merge(figment, path))
    }

    /// For each format, merges the first candidate that exists on disk: its
    /// profile overlay, then the base file.
    fn merge_found(&self, mut figment: Figment) -> Figment {
        let dirs = self.search_dirs();
        let mut loaded = 0;

        for format in FileFormat::enabled() {
            let Some((overlay, base)) = self
                .candidates(&dirs, format)
                .find(|(overlay, base)| overlay.is_file() || base.is_file())
            else {
                continue;
            };
            for path in [overlay, base] {
                if path.is_file() {
                    info!(path = %path.display(), profile = %self.profile, "Loading configuration file");
                    figment = format.merge(figment, &path);
                    loaded += 1;
                }
            }
        }

        if loaded == 0 {
            warn!(dirs = dirs.len(), "No configuration file found, using defaults");
        }
        figment
    }

    /// `(axon.<profile>.<ext>, axon.<ext>)` pairs in search order.
    fn candidates<'a>(
        &'a self,
        dirs: &'a [PathBuf],
        format: FileFormat,
    ) -> impl Iterator<Item = (PathBuf, PathBuf)> + 'a {
        dirs.iter().flat_map(move |dir| {
            FILE_STEMS.iter().flat_map(move |stem| {
                format.extensions().iter().map(move |ext| {
                    (
                        dir.join(format!("{stem}.{}.{ext}", self.profile)),
                        dir.join(format!("{stem}.{ext}")),
                    )
                })
            })
        })
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("axon")))
            .collect()
    }
}
