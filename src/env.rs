use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const APP_DIR_NAME: &str = "resource-launcher";
const DEFAULT_DESCRIPTOR_NAME: &str = "writable-resources.xml";
const DEFAULT_ARCHIVE_NAME: &str = "writable-resources.jar";
const DEFAULT_REQUIRED_CONFIG: &str = "app.properties";
const DEFAULT_RESERVED_PREFIX: &str = "META-INF";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Returns the per-user data directory the resource bundle lives in by default.
pub fn default_app_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("LOCALAPPDATA")
            .or_else(|| env::var_os("APPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Application Support")),
        _ => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".local").join("share")),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR_NAME)
}

/// Everything the bootstrap pipeline needs to know about paths and endpoints.
///
/// The struct is built once in `main` (defaults, then an optional JSON file,
/// then CLI overrides) and handed to every component by reference.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub resource_root: PathBuf,
    pub remote_base_url: Option<String>,
    pub descriptor_name: String,
    pub archive_name: String,
    pub required_config_name: String,
    pub reserved_prefix: String,
    pub app_command: Option<PathBuf>,
    pub app_args: Vec<String>,
    pub http_timeout_secs: u64,
    pub standalone: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resource_root: default_app_dir(),
            remote_base_url: None,
            descriptor_name: DEFAULT_DESCRIPTOR_NAME.into(),
            archive_name: DEFAULT_ARCHIVE_NAME.into(),
            required_config_name: DEFAULT_REQUIRED_CONFIG.into(),
            reserved_prefix: DEFAULT_RESERVED_PREFIX.into(),
            app_command: None,
            app_args: Vec::new(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            standalone: false,
        }
    }
}

impl BootstrapConfig {
    /// Build a config rooted at `resource_root` with every other field defaulted.
    #[cfg(test)]
    pub fn with_root(resource_root: impl Into<PathBuf>) -> Self {
        Self {
            resource_root: resource_root.into(),
            ..Self::default()
        }
    }

    /// Load a JSON config file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("unable to read config {}: {e}", path.display()))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("config parse error in {}: {e}", path.display()))
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.resource_root.join(&self.descriptor_name)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.resource_root.join(&self.archive_name)
    }

    /// The file whose presence makes a degraded launch acceptable.
    pub fn required_config_path(&self) -> PathBuf {
        self.resource_root.join(&self.required_config_name)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.resource_root.join("sessions")
    }

    pub fn courses_dir(&self) -> PathBuf {
        self.resource_root.join("courses")
    }

    pub fn remote_descriptor_url(&self) -> Option<String> {
        self.remote_base_url
            .as_deref()
            .map(|base| join_url(base, &self.descriptor_name))
    }

    pub fn remote_archive_url(&self) -> Option<String> {
        self.remote_base_url
            .as_deref()
            .map(|base| join_url(base, &self.archive_name))
    }

    /// Create the resource root if it does not exist yet.
    pub fn ensure_resource_root(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.resource_root)
    }
}

fn join_url(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_remote_urls_with_single_separator() {
        assert_eq!(join_url("http://host/jws/", "a.xml"), "http://host/jws/a.xml");
        assert_eq!(join_url("http://host/jws", "a.xml"), "http://host/jws/a.xml");
    }

    #[test]
    fn remote_urls_absent_without_base() {
        let config = BootstrapConfig::with_root("/tmp/res");
        assert!(config.remote_descriptor_url().is_none());
        assert!(config.remote_archive_url().is_none());
    }

    #[test]
    fn derives_paths_from_resource_root() {
        let config = BootstrapConfig::with_root("/tmp/res");
        assert_eq!(
            config.descriptor_path(),
            Path::new("/tmp/res").join(DEFAULT_DESCRIPTOR_NAME)
        );
        assert_eq!(
            config.archive_path(),
            Path::new("/tmp/res").join(DEFAULT_ARCHIVE_NAME)
        );
        assert_eq!(
            config.required_config_path(),
            Path::new("/tmp/res").join(DEFAULT_REQUIRED_CONFIG)
        );
        assert_eq!(config.sessions_dir(), Path::new("/tmp/res").join("sessions"));
        assert_eq!(config.courses_dir(), Path::new("/tmp/res").join("courses"));
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.json");
        fs::write(
            &path,
            r#"{ "remote_base_url": "http://example.org/jws", "reserved_prefix": "INTERNAL" }"#,
        )
        .unwrap();

        let config = BootstrapConfig::load(&path).unwrap();
        assert_eq!(config.remote_base_url.as_deref(), Some("http://example.org/jws"));
        assert_eq!(config.reserved_prefix, "INTERNAL");
        assert_eq!(config.descriptor_name, DEFAULT_DESCRIPTOR_NAME);
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(
            config.remote_archive_url().as_deref(),
            Some("http://example.org/jws/writable-resources.jar")
        );
    }

    #[test]
    fn rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher.json");
        fs::write(&path, "{ not json").unwrap();
        let err = BootstrapConfig::load(&path).unwrap_err();
        assert!(err.contains("config parse error"));
    }
}
