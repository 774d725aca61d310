//! Configuration loading, validation, and template generation.
//!
//! The relay reads a single JSON document at startup and treats it as
//! immutable for the lifetime of the process. Validation happens before any
//! network connection is attempted; an incomplete config is a fatal error.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Office-list entry meaning "forward bulletins from every office".
pub const WILDCARD_OFFICE: &str = "every";

/// Node of the multi-user chat room carrying the bulletin feed.
const BULLETIN_ROOM_NODE: &str = "nwws";

/// Relay configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// NWWS-OI account name, issued by the National Weather Service.
    pub username: String,

    /// NWWS-OI account password.
    pub password: String,

    /// XMPP server host (normally `nwws-oi.weather.gov`).
    pub server: String,

    /// XMPP server port.
    pub port: u16,

    /// Open the connection with TLS from the first byte instead of
    /// upgrading via STARTTLS.
    pub use_tls: bool,

    /// XMPP resource identifier for this session.
    pub resource: String,

    /// Issuing-office identifiers (CCCC) to forward. The word `every`
    /// (any case) is a wildcard matching all offices.
    pub wfo_offices: Vec<String>,

    /// Webhook URL receiving one JSON POST per matching bulletin.
    pub webhook_url: String,

    /// Raise a desktop notification for each matching bulletin.
    pub enable_notifications: bool,
}

impl Config {
    /// Full JID for the session, `username@server/resource`.
    pub fn jid(&self) -> String {
        format!("{}@{}/{}", self.username, self.server, self.resource)
    }

    /// Bare JID of the bulletin room, `nwws@conference.{server}`.
    pub fn room_jid(&self) -> String {
        format!("{BULLETIN_ROOM_NODE}@conference.{}", self.server)
    }

    /// Nickname used when joining the bulletin room.
    pub fn nickname(&self) -> &str {
        &self.username
    }

    /// Check that every field carries a usable value.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first field that is empty, zero, or
    /// otherwise unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.username.is_empty(),
            "username is empty; NWWS-OI credentials can be requested at https://weather.gov/nwws"
        );
        ensure!(
            !self.password.is_empty(),
            "password is empty; NWWS-OI credentials can be requested at https://weather.gov/nwws"
        );
        ensure!(!self.server.is_empty(), "server is empty");
        ensure!(self.port != 0, "port must be a non-zero port number");
        ensure!(!self.resource.is_empty(), "resource is empty");
        ensure!(
            !self.wfo_offices.is_empty(),
            "wfo_offices must list at least one office, or the word '{WILDCARD_OFFICE}'"
        );
        ensure!(
            self.wfo_offices.iter().all(|o| !o.is_empty()),
            "wfo_offices contains an empty entry"
        );
        let webhook = url::Url::parse(&self.webhook_url)
            .context("webhook_url is not a valid URL")?;
        ensure!(
            matches!(webhook.scheme(), "http" | "https"),
            "webhook_url must be an http or https URL"
        );
        Ok(())
    }

    /// The password masked to asterisks, for the startup summary.
    pub fn redacted_password(&self) -> String {
        "*".repeat(self.password.chars().count())
    }

    /// The webhook URL with its trailing token segment masked.
    ///
    /// Webhook URLs end in a capability token; the startup summary must not
    /// echo it.
    pub fn redacted_webhook_url(&self) -> String {
        let Ok(mut url) = url::Url::parse(&self.webhook_url) else {
            return "<invalid webhook url>".to_owned();
        };
        let masked = url
            .path_segments()
            .and_then(|segments| segments.last().map(|t| "*".repeat(t.chars().count())));
        if let Some(masked) = masked {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop();
                segments.push(&masked);
            }
        }
        url.to_string()
    }

    /// A blank config with placeholder values, serialized by
    /// [`write_template`].
    pub fn template() -> Self {
        Self {
            username: "<INSERT YOUR NWWS-OI USERNAME HERE>".to_owned(),
            password: "<INSERT YOUR NWWS-OI PASSWORD HERE>".to_owned(),
            server: "nwws-oi.weather.gov".to_owned(),
            port: 5222,
            use_tls: false,
            resource: "nwws".to_owned(),
            wfo_offices: vec![format!(
                "<INSERT THE CCCC OF EACH WFO TO MONITOR, OR THE WORD {WILDCARD_OFFICE}>"
            )],
            webhook_url: "<INSERT THE URL OF THE WEBHOOK TO SEND BULLETINS TO>".to_owned(),
            enable_notifications: false,
        }
    }
}

/// Load and validate a config from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if any field
/// fails [`Config::validate`].
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Write a blank configuration template to the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_template(path: &Path) -> anyhow::Result<()> {
    let template = serde_json::to_string_pretty(&Config::template())
        .context("failed to serialize config template")?;
    std::fs::write(path, template)
        .map_err(|e| anyhow::anyhow!("failed to write template to {}: {e}", path.display()))?;
    Ok(())
}

/// Resolve the relay's data directory (`~/.oirelay/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".oirelay"))
}
