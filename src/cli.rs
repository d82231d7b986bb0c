use clap::Parser;

use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "wallabag-sync",
    version,
    about = "Keep an e-reader's documents folder in sync with unread wallabag entries"
)]
pub struct Cli {
    /// wallabag username
    pub username: String,

    /// wallabag password.
    /// WARNING: command line arguments are visible in process listings.
    pub password: String,

    /// API client id
    pub client_id: String,

    /// API client secret
    pub client_secret: String,

    /// Base path where the ebooks are placed
    #[arg(long, default_value = "/mnt/base-us/documents")]
    pub path: String,

    /// URL of the wallabag server
    #[arg(long = "wallabag-server", default_value = "https://app.wallabag.it")]
    pub wallabag_server: String,

    /// Command telling the device to reload its ebooks (empty to skip)
    #[arg(
        long,
        default_value = "dbus-send --system /default com.lab126.powerd.resuming int32:1"
    )]
    pub reload_command: String,

    /// Skip TLS certificate verification (e.g. a server reached by IP)
    #[arg(long)]
    pub skip_tls: bool,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Entries requested per listing page
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: u32,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}
