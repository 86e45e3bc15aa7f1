//! S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::gateway::{ListPage, ObjectInfo, ObjectStore};
use crate::retry::{with_retry, RetryConfig};

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region
    pub region: String,
    /// Retry policy for transport errors
    pub retry: RetryConfig,
}

impl S3Config {
    /// Create config from environment variables.
    ///
    /// The endpoint is `STORAGE_ENDPOINT_URL` when set, otherwise it is
    /// derived from `STORAGE_NAMESPACE` and the region as an Oracle Cloud
    /// S3-compatibility endpoint.
    pub fn from_env() -> StorageResult<Self> {
        let region = std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let endpoint_url = match std::env::var("STORAGE_ENDPOINT_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                let namespace = std::env::var("STORAGE_NAMESPACE").map_err(|_| {
                    StorageError::config_error(
                        "neither STORAGE_ENDPOINT_URL nor STORAGE_NAMESPACE is set",
                    )
                })?;
                oci_endpoint(&namespace, &region)
            }
        };

        let max_retries = std::env::var("STORAGE_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        Ok(Self {
            endpoint_url,
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STORAGE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STORAGE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("SOURCE_BUCKET")
                .map_err(|_| StorageError::config_error("SOURCE_BUCKET not set"))?,
            region,
            retry: RetryConfig::default().with_max_retries(max_retries),
        })
    }
}

/// S3-compatibility endpoint for an Oracle Cloud object storage namespace.
pub fn oci_endpoint(namespace: &str, region: &str) -> String {
    format!(
        "https://{}.compat.objectstorage.{}.oraclecloud.com",
        namespace, region
    )
}

/// S3-compatible storage client bound to one bucket.
///
/// Built once at startup and shared between jobs; the underlying SDK client
/// pools connections internally and is safe to use concurrently.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
    retry: RetryConfig,
}

impl S3Client {
    /// Create a new client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        if config.bucket_name.trim().is_empty() {
            return Err(StorageError::config_error("bucket name is empty"));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vconvert",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            retry: config.retry,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_page_once(
        &self,
        prefix: Option<&str>,
        continuation: Option<String>,
    ) -> StorageResult<ListPage> {
        let mut request = self.client.list_objects_v2().bucket(&self.bucket);

        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify(&e, &self.bucket))?;

        let objects = response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|obj| {
                let key = obj.key?;
                Some(ObjectInfo::new(key, obj.size.unwrap_or(0).max(0) as u64))
            })
            .collect();

        let next_continuation = if response.is_truncated == Some(true) {
            response.next_continuation_token
        } else {
            None
        };

        Ok(ListPage {
            objects,
            next_continuation,
        })
    }

    async fn fetch_once(&self, key: &str, path: &Path) -> StorageResult<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(&e, key))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut body = response.body.into_async_read();
        tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(|e| StorageError::transport(format!("reading body of {}: {}", key, e)))?;
        file.flush().await?;

        Ok(())
    }

    async fn put_once(&self, path: &Path, key: &str) -> StorageResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(key))
            .send()
            .await
            .map_err(|e| classify(&e, key))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation: Option<String>,
    ) -> StorageResult<ListPage> {
        debug!(bucket = %self.bucket, prefix = ?prefix, "Listing objects");

        let page = with_retry(&self.retry, "list_objects", || {
            self.list_page_once(prefix, continuation.clone())
        })
        .await?;

        debug!(
            bucket = %self.bucket,
            count = page.objects.len(),
            more = !page.is_last(),
            "Listed page"
        );
        Ok(page)
    }

    async fn fetch(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        debug!("Downloading {} to {}", key, local_path.display());

        with_retry(&self.retry, "get_object", || self.fetch_once(key, local_path)).await?;

        info!("Downloaded {} to {}", key, local_path.display());
        Ok(())
    }

    async fn put(&self, local_path: &Path, key: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", local_path.display(), key);

        with_retry(&self.retry, "put_object", || self.put_once(local_path, key)).await?;

        info!("Uploaded {} to {}", local_path.display(), key);
        Ok(())
    }
}

/// Map an SDK error onto the storage taxonomy.
fn classify<E>(err: &SdkError<E, HttpResponse>, subject: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());

    match (err.code(), status) {
        (Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket"), _) | (_, Some(404)) => {
            StorageError::not_found(subject)
        }
        (Some("AccessDenied") | Some("Forbidden") | Some("InvalidAccessKeyId"), _)
        | (_, Some(401)) | (_, Some(403)) => StorageError::access_denied(format!(
            "{}: {}",
            subject,
            DisplayErrorContext(err)
        )),
        _ => StorageError::transport(format!("{}: {}", subject, DisplayErrorContext(err))),
    }
}

fn content_type_for(key: &str) -> &'static str {
    if key.to_ascii_lowercase().ends_with(".mp4") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}
