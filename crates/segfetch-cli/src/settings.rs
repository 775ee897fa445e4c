use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use segfetch::{FetchOptions, Timeouts};
use serde::{Deserialize, Serialize};

/// Configuration file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "segfetch.toml";

/// Prefix of environment variables that override the configuration file.
pub const ENV_PREFIX: &str = "SEGFETCH_";

/// Effective settings of one invocation.
///
/// Sources are layered lowest first: built-in defaults, the TOML file,
/// `SEGFETCH_*` environment variables, then command-line flags.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub concurrency:          u32,
    pub dir:                  PathBuf,
    pub max_attempts:         u32,
    pub backoff_ms:           u64,
    pub max_in_flight:        Option<usize>,
    pub deadline_secs:        Option<u64>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub headers:              BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let options = FetchOptions::default();
        Self {
            concurrency:          100,
            dir:                  PathBuf::from("."),
            max_attempts:         options.max_attempts,
            backoff_ms:           options.backoff_unit.as_millis() as u64,
            max_in_flight:        None,
            deadline_secs:        None,
            connect_timeout_secs: Timeouts::default().connect.as_secs(),
            request_timeout_secs: None,
            headers:              BTreeMap::new(),
        }
    }
}

// Header values may carry credentials; only names are printed.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("concurrency", &self.concurrency)
            .field("dir", &self.dir)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_ms", &self.backoff_ms)
            .field("max_in_flight", &self.max_in_flight)
            .field("deadline_secs", &self.deadline_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The subset of settings that can be given as flags.
///
/// `-H` headers are not layered here: they are passed to
/// [`Settings::fetch_options`] so repeated names survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency:   Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir:           Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl Settings {
    /// Layer every source. An explicit `config` must exist; the default
    /// file is optional.
    pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Self, figment::Error> {
        Self::figment(config, overrides).extract()
    }

    fn figment(config: Option<&Path>, overrides: &Overrides) -> Figment {
        let file = match config {
            Some(path) => Toml::file_exact(path),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };

        Figment::from(Serialized::defaults(Settings::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: self.request_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Fetch options described by these settings, without a progress hook.
    ///
    /// `extra_headers` come from the command line and are sent in order,
    /// repeats included. A configured header whose name appears there
    /// (ignoring case) is dropped.
    pub fn fetch_options(&self, extra_headers: &[(String, String)]) -> FetchOptions {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(name, _)| !extra_headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.extend(extra_headers.iter().cloned());

        FetchOptions::default()
            .max_attempts(self.max_attempts)
            .backoff_unit(Duration::from_millis(self.backoff_ms))
            .max_in_flight(self.max_in_flight)
            .deadline(self.deadline_secs.map(Duration::from_secs))
            .headers(headers)
    }
}
