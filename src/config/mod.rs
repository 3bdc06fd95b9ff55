//! Layered flowctl configuration: defaults, YAML file, dotenv files,
//! environment and the `--server` flag.
pub mod keys;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::errors::{FlowctlError, Result};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "FLOWCTL__";
/// Config file name inside the application directory.
pub const DEFAULT_CONFIG_FILE: &str = "flowctl.yaml";
/// Config file argument that disables the file.
pub const DISABLED_CONFIG_FILE: &str = "-";
/// Name of the server added by `--server <URL>`.
pub const CLI_SERVER_NAME: &str = "cli";
/// Application directory name under the home directory.
pub const APP_DIR_NAME: &str = ".flowdapt";

/// Variables bound to global CLI options rather than configuration keys.
const CLI_ENV_VARS: [&str; 4] = [
    "FLOWCTL__APP_DIR",
    "FLOWCTL__CONFIG_FILE",
    "FLOWCTL__DEV_MODE",
    "FLOWCTL__SERVER",
];

/// A named Flowdapt server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub url: Url,
}

/// Resolved flowctl configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(skip)]
    pub app_dir: PathBuf,
    /// Full path of the config file; `None` when disabled.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
    #[serde(default = "default_servers")]
    pub servers: Vec<Server>,
    #[serde(default = "default_current_server")]
    pub current_server: String,
}

fn default_servers() -> Vec<Server> {
    match Url::parse("http://localhost:8080") {
        Ok(url) => vec![Server {
            name: "default".to_owned(),
            url,
        }],
        Err(_) => Vec::new(),
    }
}

fn default_current_server() -> String {
    "default".to_owned()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            app_dir: PathBuf::new(),
            config_file: None,
            servers: default_servers(),
            current_server: default_current_server(),
        }
    }
}

/// Inputs for [`Configuration::build`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub app_dir: PathBuf,
    /// Config file name relative to `app_dir`; `None` disables the file.
    pub config_file: Option<PathBuf>,
    pub dotenv_files: Vec<PathBuf>,
    /// Server name or URL from `--server`.
    pub server: Option<String>,
}

impl Configuration {
    /// Build from the process environment. See [`Configuration::build`].
    ///
    /// # Errors
    ///
    /// See [`Configuration::build`].
    pub fn load(opts: &LoadOptions) -> Result<Self> {
        Self::build(opts, std::env::vars())
    }

    /// Build the configuration from its layers, lowest precedence first:
    /// defaults, the config file (written with defaults when missing),
    /// dotenv files, `env`, then `opts.server`.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::Config` for unreadable layers or values that do
    /// not validate, and `FlowctlError::ServerNotFound` when `opts.server`
    /// names an unknown server.
    pub fn build(
        opts: &LoadOptions,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let full_path = opts.config_file.as_ref().map(|f| opts.app_dir.join(f));
        let mut document = serde_json::to_value(Self::default())?;

        if let Some(path) = &full_path {
            if !path.exists() {
                Self::default().to_file(path)?;
            }
            debug!(path = %path.display(), "Loading config file");
            let contents = std::fs::read_to_string(path)?;
            let file_value: Value = serde_yaml::from_str(&contents)
                .map_err(|e| FlowctlError::Config(format!("{}: {e}", path.display())))?;
            match file_value {
                Value::Object(map) => {
                    for (key, value) in map {
                        document[key] = value;
                    }
                }
                Value::Null => {}
                _ => {
                    return Err(FlowctlError::Config(format!(
                        "{}: expected a mapping",
                        path.display()
                    )));
                }
            }
        }

        for dotenv in &opts.dotenv_files {
            debug!(path = %dotenv.display(), "Loading dotenv file");
            let iter = dotenvy::from_path_iter(dotenv)
                .map_err(|e| FlowctlError::Config(format!("{}: {e}", dotenv.display())))?;
            for item in iter {
                let (name, value) =
                    item.map_err(|e| FlowctlError::Config(format!("{}: {e}", dotenv.display())))?;
                apply_env_var(&mut document, &name, value)?;
            }
        }

        for (name, value) in env {
            apply_env_var(&mut document, &name, value)?;
        }

        let mut config: Self = serde_json::from_value(document)
            .map_err(|e| FlowctlError::Config(e.to_string()))?;
        config.app_dir.clone_from(&opts.app_dir);
        config.config_file = full_path;

        if let Some(server) = opts.server.as_deref().filter(|s| !s.is_empty()) {
            config.select_server(server)?;
        }

        debug!(current_server = %config.current_server, servers = config.servers.len(), "Configuration loaded");
        Ok(config)
    }

    /// Select a server by name, or add an ephemeral `cli` server for a URL.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::ServerNotFound` for an unknown name.
    pub fn select_server(&mut self, server: &str) -> Result<()> {
        if let Some(url) = parse_server_url(server) {
            self.servers.retain(|s| s.name != CLI_SERVER_NAME);
            self.servers.push(Server {
                name: CLI_SERVER_NAME.to_owned(),
                url,
            });
            CLI_SERVER_NAME.clone_into(&mut self.current_server);
        } else {
            if self.get_server(server).is_none() {
                return Err(FlowctlError::ServerNotFound(server.to_owned()));
            }
            server.clone_into(&mut self.current_server);
        }
        Ok(())
    }

    #[must_use]
    pub fn get_server(&self, name: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// The server named by `current_server`.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::ServerNotFound` when it is not configured.
    pub fn current(&self) -> Result<&Server> {
        self.get_server(&self.current_server)
            .ok_or_else(|| FlowctlError::ServerNotFound(self.current_server.clone()))
    }

    /// The config file path, or an error when the file is disabled.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::ConfigFileDisabled` for `-c -`.
    pub fn writable_path(&self) -> Result<&Path> {
        self.config_file
            .as_deref()
            .ok_or(FlowctlError::ConfigFileDisabled)
    }

    /// Value at a dotted key of the serialized configuration.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::Config` for a key that does not exist.
    pub fn get_by_key(&self, key: &str) -> Result<Value> {
        let document = serde_json::to_value(self)?;
        keys::get_path(&document, key)
            .cloned()
            .ok_or_else(|| FlowctlError::Config(format!("Key `{key}` does not exist.")))
    }

    /// A copy with `key` set to the string `value`, re-validated.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::Config` for invalid keys or values.
    pub fn set_by_key(&self, key: &str, value: &str) -> Result<Self> {
        let mut document = serde_json::to_value(self)?;
        keys::set_path(&mut document, key, Value::String(value.to_owned()))?;
        let mut updated: Self = serde_json::from_value(document)
            .map_err(|e| FlowctlError::Config(format!("Invalid value for `{key}`: {e}")))?;
        updated.app_dir.clone_from(&self.app_dir);
        updated.config_file.clone_from(&self.config_file);
        Ok(updated)
    }

    /// Add a new server.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::Config` for a duplicate name or an invalid URL.
    pub fn add_server(&mut self, name: &str, url: &str) -> Result<()> {
        if self.get_server(name).is_some() {
            return Err(FlowctlError::Config(format!("Server `{name}` already exists.")));
        }
        let url = parse_server_url(url)
            .ok_or_else(|| FlowctlError::Config(format!("Invalid server URL: {url}")))?;
        self.servers.push(Server {
            name: name.to_owned(),
            url,
        });
        Ok(())
    }

    /// Make `name` the current server.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::ServerNotFound` for an unknown name.
    pub fn use_server(&mut self, name: &str) -> Result<()> {
        if self.get_server(name).is_none() {
            return Err(FlowctlError::ServerNotFound(name.to_owned()));
        }
        name.clone_into(&mut self.current_server);
        Ok(())
    }

    /// Remove a server and select the last remaining one.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::ServerNotFound` for an unknown name and
    /// `FlowctlError::Config` when it is the only server.
    pub fn remove_server(&mut self, name: &str) -> Result<()> {
        if self.get_server(name).is_none() {
            return Err(FlowctlError::ServerNotFound(name.to_owned()));
        }
        if self.servers.len() == 1 {
            return Err(FlowctlError::Config(format!(
                "Cannot remove `{name}`, it is the only configured server."
            )));
        }
        self.servers.retain(|s| s.name != name);
        if let Some(last) = self.servers.last() {
            self.current_server.clone_from(&last.name);
        }
        Ok(())
    }

    /// Write the serializable fields as YAML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns I/O and YAML errors.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        info!(path = %path.display(), "Wrote configuration");
        Ok(())
    }
}

/// Apply one `FLOWCTL__A__B=value` variable as key `a.b`. Other variables,
/// and those bound to CLI options, are ignored.
fn apply_env_var(document: &mut Value, name: &str, value: String) -> Result<()> {
    if CLI_ENV_VARS.contains(&name) {
        return Ok(());
    }
    let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
        return Ok(());
    };
    let key = rest.to_lowercase().replace("__", ".");
    debug!(%key, "Applying environment override");
    keys::set_path(document, &key, Value::String(value))
}

/// Parse an http(s) URL with a host.
fn parse_server_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

/// Resolve the application directory. The default `~/.flowdapt` is created
/// when missing; an explicit directory must exist.
///
/// # Errors
///
/// Returns `FlowctlError::Config` when the directory is missing or no home
/// directory can be found.
pub fn resolve_app_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        if !dir.is_dir() {
            return Err(FlowctlError::Config(format!(
                "The app directory `{}` does not exist.",
                dir.display()
            )));
        }
        return Ok(dir.canonicalize()?);
    }

    let dir = dirs::home_dir()
        .map(|home| home.join(APP_DIR_NAME))
        .ok_or_else(|| FlowctlError::Config("Cannot determine the home directory.".to_owned()))?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        info!(path = %dir.display(), "Created app directory");
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts(dir: &TempDir) -> LoadOptions {
        LoadOptions {
            app_dir: dir.path().to_path_buf(),
            config_file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            ..LoadOptions::default()
        }
    }

    fn env(vars: &[(&str, &str)]) -> Vec<(String, String)> {
        vars.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_missing_file_is_written_with_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Configuration::build(&opts(&dir), Vec::new()).unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        assert!(path.exists());
        assert_eq!(config.config_file.as_deref(), Some(path.as_path()));
        assert_eq!(config.current_server, "default");
        assert_eq!(config.current().unwrap().url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_file_then_env_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "servers:\n- name: a\n  url: http://a:1\n- name: b\n  url: http://b:2\ncurrent_server: a\n",
        )
        .unwrap();
        let config = Configuration::build(
            &opts(&dir),
            env(&[
                ("FLOWCTL__CURRENT_SERVER", "b"),
                ("FLOWCTL__SERVERS__1__URL", "http://b:3"),
                ("FLOWCTL__SERVER", "ignored"),
                ("HOME", "/nowhere"),
            ]),
        )
        .unwrap();
        assert_eq!(config.current_server, "b");
        assert_eq!(config.current().unwrap().url.as_str(), "http://b:3/");
    }

    #[test]
    fn test_dotenv_layer_below_environment() {
        let dir = TempDir::new().unwrap();
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, "FLOWCTL__CURRENT_SERVER=from-dotenv\nOTHER=1\n").unwrap();
        let mut options = opts(&dir);
        options.config_file = None;
        options.dotenv_files = vec![dotenv];

        let config = Configuration::build(&options, Vec::new()).unwrap();
        assert_eq!(config.current_server, "from-dotenv");
        assert!(config.current().is_err());

        let config =
            Configuration::build(&options, env(&[("FLOWCTL__CURRENT_SERVER", "default")])).unwrap();
        assert_eq!(config.current_server, "default");
    }

    #[test]
    fn test_server_flag() {
        let dir = TempDir::new().unwrap();
        let mut options = opts(&dir);
        options.server = Some("http://example.com:9000".to_owned());
        let config = Configuration::build(&options, Vec::new()).unwrap();
        assert_eq!(config.current_server, CLI_SERVER_NAME);
        assert_eq!(config.current().unwrap().url.as_str(), "http://example.com:9000/");

        options.server = Some("prod".to_owned());
        assert!(matches!(
            Configuration::build(&options, Vec::new()),
            Err(FlowctlError::ServerNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_url_fails_validation() {
        let dir = TempDir::new().unwrap();
        let result = Configuration::build(
            &opts(&dir),
            env(&[("FLOWCTL__SERVERS__0__URL", "not a url")]),
        );
        assert!(matches!(result, Err(FlowctlError::Config(_))));
    }

    #[test]
    fn test_get_and_set_by_key() {
        let config = Configuration::default();
        assert_eq!(config.get_by_key("servers.0.name").unwrap(), Value::from("default"));
        assert!(config.get_by_key("nope").is_err());

        let updated = config.set_by_key("servers.0.url", "http://other:1").unwrap();
        assert_eq!(updated.servers[0].url.as_str(), "http://other:1/");
        assert!(config.set_by_key("servers.0.url", "bad").is_err());
    }

    #[test]
    fn test_server_management() {
        let mut config = Configuration::default();
        config.add_server("prod", "https://prod.example.com").unwrap();
        assert!(config.add_server("prod", "https://x.example.com").is_err());
        assert!(config.add_server("bad", "nope").is_err());

        config.use_server("prod").unwrap();
        assert_eq!(config.current_server, "prod");
        assert!(config.use_server("missing").is_err());

        config.remove_server("prod").unwrap();
        assert_eq!(config.current_server, "default");
        assert!(config.remove_server("default").is_err());
    }

    #[test]
    fn test_disabled_file_is_not_writable() {
        let config = Configuration::default();
        assert!(matches!(config.writable_path(), Err(FlowctlError::ConfigFileDisabled)));
    }

    #[test]
    fn test_round_trip_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("flowctl.yaml");
        let mut config = Configuration::default();
        config.add_server("x", "http://x:1").unwrap();
        config.to_file(&path).unwrap();

        let loaded = Configuration::build(
            &LoadOptions {
                app_dir: dir.path().join("nested"),
                config_file: Some(PathBuf::from("flowctl.yaml")),
                ..LoadOptions::default()
            },
            Vec::new(),
        )
        .unwrap();
        assert_eq!(loaded.servers, config.servers);
    }
}
