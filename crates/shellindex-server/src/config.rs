use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub default_locale: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
    // JSON-lines dump loaded at startup
    pub seed_file: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            default_locale: "en".into(),
            default_page_size: 20,
            max_page_size: 500,
            seed_file: None,
            tls: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(addr) = lookup("HTTP_ADDR") {
            config.http_addr = addr
                .parse()
                .with_context(|| format!("HTTP_ADDR is not a socket address: {addr}"))?;
        }
        if let Some(locale) = lookup("DEFAULT_LOCALE").filter(|l| !l.trim().is_empty()) {
            config.default_locale = locale;
        }
        if let Some(size) = lookup("DEFAULT_PAGE_SIZE") {
            config.default_page_size = size
                .parse()
                .with_context(|| format!("DEFAULT_PAGE_SIZE is not a number: {size}"))?;
        }
        if let Some(size) = lookup("MAX_PAGE_SIZE") {
            config.max_page_size = size
                .parse()
                .with_context(|| format!("MAX_PAGE_SIZE is not a number: {size}"))?;
        }
        if config.default_page_size == 0 || config.max_page_size == 0 {
            bail!("page sizes must be positive");
        }
        if config.default_page_size > config.max_page_size {
            bail!(
                "DEFAULT_PAGE_SIZE ({}) exceeds MAX_PAGE_SIZE ({})",
                config.default_page_size,
                config.max_page_size
            );
        }
        config.seed_file = lookup("SEED_FILE").map(PathBuf::from);
        config.tls = match (lookup("TLS_CERT_PATH"), lookup("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together"),
        };
        Ok(config)
    }

    /// Requested page size, defaulted and clamped to `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}
