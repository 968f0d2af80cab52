use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

const MIN_SECRET_LEN: usize = 32;

#[derive(Parser, Debug)]
#[command(name = "snapfeed", about = "A small photo and video feed server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Where uploads are staged before being handed to the media host
    pub scratch_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub secret: Option<String>,
    pub token_lifetime_secs: u64,
    pub reset_token_lifetime_secs: u64,
    pub verify_token_lifetime_secs: u64,
    pub bcrypt_cost: u32,
    /// Emails granted superuser on registration and at startup
    pub superusers: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaProvider {
    #[default]
    Local,
    Imagekit,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct MediaConfig {
    pub provider: MediaProvider,
    pub local: LocalMediaConfig,
    pub imagekit: ImageKitConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LocalMediaConfig {
    pub path: Option<PathBuf>,
    /// Base URL clients use to reach `/media`; defaults to the bind address
    pub public_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ImageKitConfig {
    pub private_key: Option<String>,
    pub upload_url: String,
    pub folder: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_lifetime_secs: 3600,
            reset_token_lifetime_secs: 3600,
            verify_token_lifetime_secs: 3600,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            superusers: Vec::new(),
        }
    }
}

impl Default for ImageKitConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            upload_url: "https://upload.imagekit.io/api/v1/files/upload".to_string(),
            folder: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.resolve_paths(&data_dir);
        Ok(config)
    }

    /// Fill unset paths and URLs from the data directory and bind address.
    pub fn resolve_paths(&mut self, data_dir: &std::path::Path) {
        if self.database.path.is_none() {
            self.database.path = Some(data_dir.join("snapfeed.db"));
        }
        if self.storage.scratch_dir.is_none() {
            self.storage.scratch_dir = Some(data_dir.join("scratch"));
        }
        if self.media.local.path.is_none() {
            self.media.local.path = Some(data_dir.join("media"));
        }
        if self.media.local.public_url.is_none() {
            self.media.local.public_url = Some(self.default_public_url());
        }
    }

    /// Base URL of the local media route as clients should see it.
    /// A wildcard bind address is not routable, so it becomes loopback.
    fn default_public_url(&self) -> String {
        let host = match self.server.host.as_str() {
            "0.0.0.0" => "127.0.0.1",
            "::" | "[::]" => "[::1]",
            host => host,
        };
        format!("http://{}:{}", host, self.server.port)
    }

    pub fn local_public_url(&self) -> String {
        self.media
            .local
            .public_url
            .clone()
            .unwrap_or_else(|| self.default_public_url())
    }

    /// Check the settings that have no usable default.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.auth.secret.as_deref() {
            None => anyhow::bail!("auth.secret must be set"),
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                anyhow::bail!("auth.secret must be at least {MIN_SECRET_LEN} characters")
            }
            Some(_) => {}
        }

        if self.media.provider == MediaProvider::Imagekit
            && self
                .media
                .imagekit
                .private_key
                .as_deref()
                .map_or(true, str::is_empty)
        {
            anyhow::bail!("media.imagekit.private_key must be set when provider = \"imagekit\"");
        }

        Ok(())
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir.clone() {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".snapfeed"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("snapfeed.db"))
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.storage
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn local_media_path(&self) -> PathBuf {
        self.media
            .local
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("media"))
    }

    pub fn secret(&self) -> &str {
        self.auth.secret.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(data_dir: &std::path::Path) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir: Some(data_dir.to_path_buf()),
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.token_lifetime_secs, 3600);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.storage.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.media.provider, MediaProvider::Local);
        assert!(config.auth.secret.is_none());
        assert!(config.database.path.is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli_with(std::path::Path::new("/tmp/test-snapfeed"));
        assert_eq!(
            Config::data_dir(&cli).unwrap(),
            PathBuf::from("/tmp/test-snapfeed")
        );
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli_with(tmp.path())).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.db_path(), tmp.path().join("snapfeed.db"));
        assert_eq!(config.scratch_path(), tmp.path().join("scratch"));
        assert_eq!(config.local_media_path(), tmp.path().join("media"));
        assert_eq!(
            config.media.local.public_url.as_deref(),
            Some("http://127.0.0.1:8000")
        );
    }

    #[test]
    fn wildcard_bind_never_leaks_into_public_url() {
        let mut config = Config::default();
        assert_eq!(config.local_public_url(), "http://127.0.0.1:8000");

        config.server.host = "::".to_string();
        assert_eq!(config.local_public_url(), "http://[::1]:8000");

        config.server.host = "feed.example.com".to_string();
        assert_eq!(config.local_public_url(), "http://feed.example.com:8000");

        config.media.local.public_url = Some("https://cdn.example.com".to_string());
        assert_eq!(config.local_public_url(), "https://cdn.example.com");
    }

    #[test]
    fn load_applies_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            host: Some("127.0.0.1".to_string()),
            port: Some(8080),
            ..cli_with(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.media.local.public_url.as_deref(),
            Some("http://127.0.0.1:8080")
        );
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000

[auth]
secret = "0123456789abcdef0123456789abcdef"
token_lifetime_secs = 60

[media]
provider = "imagekit"

[media.imagekit]
private_key = "private_abc"
folder = "/posts"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_with(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.token_lifetime_secs, 60);
        assert_eq!(config.media.provider, MediaProvider::Imagekit);
        assert_eq!(config.media.imagekit.folder.as_deref(), Some("/posts"));
        assert_eq!(
            config.media.imagekit.upload_url,
            "https://upload.imagekit.io/api/v1/files/upload"
        );
        config.validate().unwrap();
    }

    #[test]
    fn validate_requires_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_secret() {
        let mut config = Config::default();
        config.auth.secret = Some("short".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_requires_imagekit_key() {
        let mut config = Config::default();
        config.auth.secret = Some("x".repeat(32));
        config.validate().unwrap();

        config.media.provider = MediaProvider::Imagekit;
        assert!(config.validate().is_err());

        config.media.imagekit.private_key = Some("private_abc".into());
        config.validate().unwrap();
    }
}
