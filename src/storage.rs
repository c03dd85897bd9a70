use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;

/// Document store: uploaded documents and rendered certificates live here.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String>;
}

/// Object key for an uploaded document. The original file name is kept at the end
/// (sanitized) so downloads stay recognizable.
pub fn document_key(user_id: i64, certificate_id: i64, object_id: uuid::Uuid, file_name: &str) -> String {
    let clean: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let clean = if clean.is_empty() { "document".to_string() } else { clean };
    format!("documents/{}/{}/{}-{}", user_id, certificate_id, object_id, clean)
}

/// Deterministic location of the rendered artifact for a certificate.
pub fn certificate_pdf_key(certificate_id: i64) -> String {
    format!("certificates/certificate_{}.pdf", certificate_id)
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("s3 put_object {}", key))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("s3 delete_object {}", key))?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(key);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_key_sanitizes_file_name() {
        let id = uuid::Uuid::nil();
        let key = document_key(7, 42, id, "soil report (v2).pdf");
        assert_eq!(
            key,
            format!("documents/7/42/{}-soil_report__v2_.pdf", id)
        );
    }

    #[test]
    fn document_key_falls_back_for_empty_name() {
        let key = document_key(1, 2, uuid::Uuid::nil(), "");
        assert!(key.ends_with("-document"));
    }

    #[test]
    fn certificate_pdf_key_is_keyed_by_id() {
        assert_eq!(certificate_pdf_key(12), "certificates/certificate_12.pdf");
    }
}
