use crate::logger::{LogLevel, LoggerConfig};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_JSON_LIMIT: usize = 50 * 1024 * 1024;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const DEFAULT_REFERENCE_IMAGE: &str = "public/refer_avatar.jpg";
pub const DEFAULT_OUTPUT_DIR: &str = ".";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    /// Where diagnostic snapshots are written.
    pub log_dir: PathBuf,
    /// Maximum accepted JSON body, in bytes.
    pub json_limit: usize,
    /// Mirror console logs into this file.
    pub log_file: Option<PathBuf>,
    /// Emit JSON lines instead of the colored console format.
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: LogLevel::Info,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            json_limit: DEFAULT_JSON_LIMIT,
            log_file: None,
            json_logs: false,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port);
        let log_level = LogLevel::resolve(env::args(), env::var("LOG_LEVEL").ok());
        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);
        let log_file = env::var("LOG_FILE").ok().map(PathBuf::from);
        let json_logs = env::var("LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        ServerConfig {
            host,
            port,
            log_level,
            log_dir,
            json_limit: defaults.json_limit,
            log_file,
            json_logs,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_json_limit(mut self, limit: usize) -> Self {
        self.json_limit = limit;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Logger settings matching this server's verbosity and output options.
    pub fn logger_config(&self) -> LoggerConfig {
        let mut config = if self.log_level >= LogLevel::Debug {
            LoggerConfig::development()
        } else {
            LoggerConfig::new()
        }
        .with_level(self.log_level)
        .with_json_output(self.json_logs);

        if let Some(path) = &self.log_file {
            config = config.with_file_output(&path.to_string_lossy());
        }
        config
    }
}

/// Settings for the client side of the flow.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: String,
    pub reference_image_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            reference_image_path: PathBuf::from(DEFAULT_REFERENCE_IMAGE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backend_url = env::var("VITE_BACKEND_URL")
            .or_else(|_| env::var("BACKEND_URL"))
            .unwrap_or(defaults.backend_url);
        let reference_image_path = env::var("REFERENCE_IMAGE")
            .map(PathBuf::from)
            .unwrap_or(defaults.reference_image_path);
        let output_dir = env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        ClientConfig {
            backend_url,
            reference_image_path,
            output_dir,
        }
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_reference_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_image_path = path.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}
