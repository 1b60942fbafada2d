//! Load admin connection settings from file and environment.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::protocol::{DEFAULT_HOST, DEFAULT_PORT, RECV_TIMEOUT};

/// Where and how to reach the router's admin socket.
/// File: ~/.config/yrd/admin.toml or /etc/yrd/admin.toml.
/// Env overrides: YRD_ADMIN_HOST, YRD_ADMIN_PORT, YRD_ADMIN_PASSWORD, YRD_DEBUG.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Admin password; empty means requests go unauthenticated.
    #[serde(default)]
    pub password: String,
    /// Receive timeout in milliseconds (default 7000; 0 means default).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Mirror every request and response to the `tracing` debug level.
    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout_ms() -> u64 {
    RECV_TIMEOUT.as_millis() as u64
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: String::new(),
            timeout_ms: default_timeout_ms(),
            debug: false,
        }
    }
}

impl AdminConfig {
    pub fn new(host: &str, port: u16, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            password: password.to_string(),
            ..Self::default()
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            RECV_TIMEOUT
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(h) = lookup("YRD_ADMIN_HOST") {
            self.host = h;
        }
        if let Some(p) = lookup("YRD_ADMIN_PORT").and_then(|s| s.parse::<u16>().ok()) {
            self.port = p;
        }
        if let Some(pw) = lookup("YRD_ADMIN_PASSWORD") {
            self.password = pw;
        }
        if debug_from(&lookup) {
            self.debug = true;
        }
    }
}

/// Error reading an explicitly named config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load config: defaults, then the first config file found, then env vars.
pub fn load() -> AdminConfig {
    load_with(|k| std::env::var(k).ok())
}

/// [`load`] with variables (`HOME` and the overrides) read through `lookup`.
pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> AdminConfig {
    let mut c = load_file(&config_paths(lookup("HOME"))).unwrap_or_default();
    c.apply_env(lookup);
    c
}

/// Whether `YRD_DEBUG` asks for request/response mirroring.
pub fn debug_from_env() -> bool {
    debug_from(|k| std::env::var(k).ok())
}

fn debug_from(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup("YRD_DEBUG").is_some_and(|v| !v.is_empty())
}

pub fn load_file_at(path: &Path) -> Result<AdminConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    AdminConfig::from_toml(&s)
}

fn config_paths(home: Option<String>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(h) = home.filter(|h| !h.is_empty()) {
        out.push(Path::new(&h).join(".config/yrd/admin.toml"));
    }
    out.push(PathBuf::from("/etc/yrd/admin.toml"));
    out
}

fn load_file(paths: &[PathBuf]) -> Option<AdminConfig> {
    let path = paths.iter().find(|p| p.exists())?;
    match load_file_at(path) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring admin config file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    /// Fresh `$HOME` under the system temp dir, holding `admin` as the user config if given.
    fn home_with(name: &str, admin: Option<&str>) -> PathBuf {
        let home = std::env::temp_dir().join(format!("yrd-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&home);
        let dir = home.join(".config/yrd");
        fs::create_dir_all(&dir).unwrap();
        if let Some(text) = admin {
            fs::write(dir.join("admin.toml"), text).unwrap();
        }
        home
    }

    #[test]
    fn defaults() {
        let c = AdminConfig::default();
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.port, 11234);
        assert!(c.password.is_empty());
        assert_eq!(c.timeout(), Duration::from_secs(7));
        assert!(!c.debug);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = AdminConfig::from_toml("password = \"secret\"\nport = 11235\n").unwrap();
        assert_eq!(c.password, "secret");
        assert_eq!(c.port, 11235);
        assert_eq!(c.host, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            AdminConfig::from_toml("bind = \"0.0.0.0\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_timeout_means_default() {
        let c = AdminConfig::from_toml("timeout_ms = 0\n").unwrap();
        assert_eq!(c.timeout(), RECV_TIMEOUT);
        let c = AdminConfig::from_toml("timeout_ms = 250\n").unwrap();
        assert_eq!(c.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("YRD_ADMIN_HOST", "::1"),
            ("YRD_ADMIN_PORT", "not-a-port"),
            ("YRD_ADMIN_PASSWORD", "pw"),
            ("YRD_DEBUG", "1"),
        ]
        .into_iter()
        .collect();
        let mut c = AdminConfig::default();
        c.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.host, "::1");
        assert_eq!(c.port, 11234);
        assert_eq!(c.password, "pw");
        assert!(c.debug);
    }

    #[test]
    fn empty_debug_var_is_off() {
        let mut c = AdminConfig::default();
        c.apply_env(|k| (k == "YRD_DEBUG").then(String::new));
        assert!(!c.debug);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_file_at(Path::new("/nonexistent/yrd/admin.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_home_config_then_env() {
        let home = home_with("load", Some("port = 11300\npassword = \"from-file\"\n"));
        let home_str = home.to_string_lossy().into_owned();
        let c = load_with(|k| match k {
            "HOME" => Some(home_str.clone()),
            "YRD_ADMIN_PASSWORD" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(c.port, 11300);
        assert_eq!(c.password, "from-env");
        assert_eq!(c.host, "127.0.0.1");
        fs::remove_dir_all(&home).unwrap();
    }

    #[test]
    fn load_ignores_broken_home_config() {
        let home = home_with("broken", Some("port = \"eleven\"\n"));
        let home_str = home.to_string_lossy().into_owned();
        let c = load_with(|k| (k == "HOME").then(|| home_str.clone()));
        assert_eq!(c.port, 11234);
        assert!(c.password.is_empty());
        fs::remove_dir_all(&home).unwrap();
    }

    #[test]
    fn home_config_listed_first() {
        let paths = config_paths(Some("/home/u".to_string()));
        assert_eq!(paths[0], Path::new("/home/u/.config/yrd/admin.toml"));
        assert_eq!(paths.last().unwrap(), Path::new("/etc/yrd/admin.toml"));
        assert_eq!(config_paths(None).len(), 1);
        assert_eq!(config_paths(Some(String::new())).len(), 1);
    }

    #[test]
    fn debug_flag_from_lookup() {
        assert!(debug_from(|k| (k == "YRD_DEBUG").then(|| "yes".to_string())));
        assert!(!debug_from(|k| (k == "YRD_DEBUG").then(String::new)));
        assert!(!debug_from(|_| None));
        assert_eq!(
            debug_from_env(),
            std::env::var("YRD_DEBUG").is_ok_and(|v| !v.is_empty())
        );
    }
}
