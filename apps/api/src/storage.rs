use std::str::FromStr;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;

pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    Avatar,
}

impl DocumentKind {
    fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cvs",
            DocumentKind::Avatar => "avatars",
        }
    }

    /// File extension for an accepted content type, `None` if the type is refused.
    pub fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        match (self, content_type) {
            (DocumentKind::Cv, "application/pdf") => Some("pdf"),
            (DocumentKind::Avatar, "image/png") => Some("png"),
            (DocumentKind::Avatar, "image/jpeg") => Some("jpg"),
            (DocumentKind::Avatar, "image/webp") => Some("webp"),
            _ => None,
        }
    }
}

impl FromStr for DocumentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cv" => Ok(DocumentKind::Cv),
            "avatar" => Ok(DocumentKind::Avatar),
            other => Err(AppError::NotFound(format!("Unknown document kind '{other}'"))),
        }
    }
}

/// Builds the object key, rejecting content types and sizes the kind does not accept.
pub fn object_key(
    kind: DocumentKind,
    profile_id: Uuid,
    content_type: &str,
    size: usize,
) -> Result<String, AppError> {
    if size == 0 {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if size > MAX_DOCUMENT_BYTES {
        return Err(AppError::Validation(format!(
            "File exceeds the {} MiB limit",
            MAX_DOCUMENT_BYTES / (1024 * 1024)
        )));
    }
    let ext = kind.extension_for(content_type).ok_or_else(|| {
        AppError::Validation(format!("Content type '{content_type}' is not accepted"))
    })?;
    Ok(format!(
        "{}/{}/{}.{}",
        kind.prefix(),
        profile_id,
        Uuid::new_v4(),
        ext
    ))
}

/// Hosted object storage. Returns the public URL of the stored object.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError>;
}

pub struct S3DocumentStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3DocumentStorage {
    pub async fn from_config(config: &Config) -> Self {
        Self {
            client: build_s3_client(config).await,
            bucket: config.s3_bucket.clone(),
            public_base_url: config.s3_public_url.clone(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}

#[async_trait]
impl DocumentStorage for S3DocumentStorage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(self.public_url(key))
    }
}

/// Constructs an S3 client for the hosted S3-compatible endpoint.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "tremplin-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // Hosted S3-compatible stores address buckets by path, not subdomain.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
