//! Package download sources

use crate::error::{SesameError, SesameResult};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for a whole package download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Where package archives come from
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Download `url` into the file at `dest`, returning the byte count
    async fn download(&self, url: &str, dest: &Path) -> SesameResult<u64>;
}

/// Downloads archives over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpPackageSource {
    allow_insecure_tls: bool,
    timeout: Duration,
}

impl HttpPackageSource {
    pub fn new(allow_insecure_tls: bool) -> Self {
        Self {
            allow_insecure_tls,
            timeout: DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A dedicated agent per download keeps relaxed certificate checks scoped to that call
    fn agent(&self) -> ureq::Agent {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(self.allow_insecure_tls)
            .build();
        ureq::Agent::config_builder()
            .tls_config(tls)
            .timeout_global(Some(self.timeout))
            .build()
            .into()
    }

    fn fetch_blocking(&self, url: &str, dest: &Path) -> SesameResult<u64> {
        let download_error = |reason: String| SesameError::Download {
            url: url.to_string(),
            reason,
        };

        let response = self
            .agent()
            .get(url)
            .call()
            .map_err(|e| download_error(e.to_string()))?;

        let mut reader = response.into_body().into_reader();
        let mut file = fs::File::create(dest)
            .map_err(|e| SesameError::io(format!("creating {}", dest.display()), e))?;
        std::io::copy(&mut reader, &mut file).map_err(|e| download_error(e.to_string()))
    }
}

#[async_trait]
impl PackageSource for HttpPackageSource {
    async fn download(&self, url: &str, dest: &Path) -> SesameResult<u64> {
        if self.allow_insecure_tls {
            warn!("Certificate verification disabled for {}", url);
        }
        debug!("Downloading {} to {}", url, dest.display());

        let source = self.clone();
        let url_owned = url.to_string();
        let dest_owned: PathBuf = dest.to_path_buf();
        tokio::task::spawn_blocking(move || source.fetch_blocking(&url_owned, &dest_owned))
            .await
            .map_err(|e| SesameError::Internal(format!("download task failed: {}", e)))?
    }
}
