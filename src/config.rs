use std::path::PathBuf;
use std::time::Duration;

use crate::sync::SyncConfig;
use crate::types::LogLevel;
use crate::wallabag::{ClientConfig, Credentials};

/// Application configuration.
pub struct Config {
    pub credentials: Credentials,
    pub server_url: String,
    pub base_dir: PathBuf,
    pub reload_command: String,
    pub timeout: Duration,
    pub page_size: u32,
    pub log_level: LogLevel,
    pub skip_tls: bool,
    pub no_progress_bar: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("credentials", &self.credentials)
            .field("server_url", &self.server_url)
            .field("base_dir", &self.base_dir)
            .field("reload_command", &self.reload_command)
            .field("skip_tls", &self.skip_tls)
            .finish_non_exhaustive()
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Trim surrounding whitespace and trailing slashes so endpoint paths can be
/// appended directly.
fn normalize_server_url(url: &str) -> anyhow::Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        anyhow::bail!(
            "wallabag server URL must start with http:// or https://, got '{}'",
            url
        );
    }
    Ok(trimmed.to_string())
}

impl Config {
    pub fn from_cli(cli: crate::cli::Cli) -> anyhow::Result<Self> {
        Ok(Self {
            credentials: Credentials {
                username: cli.username,
                password: cli.password,
                client_id: cli.client_id,
                client_secret: cli.client_secret,
            },
            server_url: normalize_server_url(&cli.wallabag_server)?,
            base_dir: expand_tilde(&cli.path),
            reload_command: cli.reload_command,
            timeout: Duration::from_secs(cli.timeout),
            page_size: cli.page_size,
            log_level: cli.log_level,
            skip_tls: cli.skip_tls,
            no_progress_bar: cli.no_progress_bar,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server_url.clone(),
            credentials: self.credentials.clone(),
            skip_tls_verify: self.skip_tls,
            timeout: self.timeout,
            page_size: self.page_size,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            no_progress_bar: self.no_progress_bar,
        }
    }
}
