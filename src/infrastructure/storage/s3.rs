use crate::config::settings::StorageConfig;
use crate::modules::transcode::ports::ObjectStore;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    pub bucket: String,
}

impl StorageService {
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            // Custom endpoints (MinIO) need path-style addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!("✅ S3 client ready for bucket '{}'", config.bucket);

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }

    pub async fn get_object_to_file(&self, key: &str, dest: &Path) -> Result<u64> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("GetObject failed: {}", aws_sdk_s3::Error::from(e)))?;

        let mut reader = object.body.into_async_read();
        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        Ok(written)
    }

    pub async fn put_file(&self, key: &str, src: &Path, content_type: &str) -> Result<()> {
        let body = ByteStream::from_path(src)
            .await
            .with_context(|| format!("Failed to read {}", src.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("PutObject failed: {}", aws_sdk_s3::Error::from(e)))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn download(&self, key: &str, dest: &Path) -> Result<()> {
        info!("⬇️ Get object: {}", key);
        let bytes = self.get_object_to_file(key, dest).await?;
        info!("⬇️ Downloaded {} bytes to {}", bytes, dest.display());
        Ok(())
    }

    async fn upload(&self, key: &str, src: &Path, content_type: &str) -> Result<()> {
        info!("⬆️ Put object: {}", key);
        self.put_file(key, src, content_type).await
    }
}
