//! R2 client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Cache directive for published artifacts; they are immutable once written.
const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Configuration for the R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// Account identifier; the S3 endpoint is derived from it
    pub account_id: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Operator-configured domain fronting the bucket, if any
    pub custom_domain: Option<String>,
}

impl R2Config {
    /// Read config from environment variables.
    ///
    /// Returns `Ok(None)` when storage is simply not configured
    /// (`R2_ACCOUNT_ID` absent); an error when it is half-configured.
    pub fn from_env() -> StorageResult<Option<Self>> {
        let account_id = match std::env::var("R2_ACCOUNT_ID") {
            Ok(v) if !v.is_empty() => v,
            _ => return Ok(None),
        };

        Ok(Some(Self {
            account_id,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket: std::env::var("R2_BUCKET").unwrap_or_else(|_| "video-intake".to_string()),
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            custom_domain: std::env::var("R2_CUSTOM_DOMAIN").ok().filter(|v| !v.is_empty()),
        }))
    }

    fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    /// Base of the public URL: custom domain when configured, otherwise the
    /// provider-default bucket/account pattern.
    pub fn public_base(&self) -> String {
        match &self.custom_domain {
            Some(domain) => format!("https://{}", domain),
            None => format!(
                "https://{}.{}.r2.cloudflarestorage.com",
                self.bucket, self.account_id
            ),
        }
    }
}

/// Object storage availability, decided once at startup.
///
/// Checked exhaustively by the publication stage; `Unconfigured` and
/// `Failed` both degrade to source-URL passthrough rather than aborting.
pub enum StorageState {
    /// No storage credentials supplied
    Unconfigured,
    /// Client built and ready for uploads
    Ready(R2Client),
    /// Credentials present but the client could not be built
    Failed(String),
}

impl StorageState {
    /// Resolve storage availability from the environment.
    pub fn from_env() -> Self {
        match R2Config::from_env() {
            Ok(None) => {
                info!("Object storage not configured, publication will degrade to source URLs");
                Self::Unconfigured
            }
            Ok(Some(config)) => match R2Client::new(config) {
                Ok(client) => Self::Ready(client),
                Err(e) => {
                    warn!(error = %e, "Object storage client failed to initialize");
                    Self::Failed(e.to_string())
                }
            },
            Err(e) => {
                warn!(error = %e, "Object storage misconfigured");
                Self::Failed(e.to_string())
            }
        }
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    public_base: String,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);
        let public_base = config.public_base();

        Ok(Self {
            client,
            bucket: config.bucket,
            public_base,
        })
    }

    /// Upload a file to R2.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Upload bytes to R2.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    /// Browsable URL for an uploaded key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(custom_domain: Option<&str>) -> R2Config {
        R2Config {
            account_id: "acct".into(),
            access_key_id: "ak".into(),
            secret_access_key: "sk".into(),
            bucket: "clips".into(),
            region: "auto".into(),
            custom_domain: custom_domain.map(String::from),
        }
    }

    #[test]
    fn test_public_base_prefers_custom_domain() {
        assert_eq!(
            config(Some("media.example.com")).public_base(),
            "https://media.example.com"
        );
        assert_eq!(
            config(None).public_base(),
            "https://clips.acct.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_endpoint_derived_from_account() {
        assert_eq!(
            config(None).endpoint_url(),
            "https://acct.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_public_url_joins_key() {
        let client = R2Client::new(config(Some("media.example.com"))).unwrap();
        assert_eq!(
            client.public_url("videos/2025-06-01/abc/video.mp4"),
            "https://media.example.com/videos/2025-06-01/abc/video.mp4"
        );
    }
}
