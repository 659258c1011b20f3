//! Amazon S3 sink.
//!
//! Objects are uploaded with a `public-read` ACL so the URLs embedded in
//! the location index resolve without credentials. Credentials and region
//! come from the AWS SDK default chain (`AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`, profiles, instance metadata).

use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

use crate::{ArtifactSink, PublishError, Published};

/// Remote object metadata from `HeadObject`.
struct RemoteMeta {
    /// Content length in bytes.
    size: u64,
    /// `ETag` (the quoted MD5 hex digest for non-multipart uploads).
    etag: Option<String>,
}

/// Publishes artifacts to an S3 bucket.
pub struct S3Sink {
    client: aws_sdk_s3::Client,
    bucket: String,
    base_url: String,
}

impl S3Sink {
    /// Creates a sink for `bucket` using the default AWS credential chain.
    ///
    /// `region` overrides the region from the environment. Returned URLs
    /// are `{base_url}/{name}`.
    pub async fn from_env(bucket: &str, region: Option<&str>, base_url: &str) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket: bucket.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    /// Fetch object metadata via `HeadObject`.
    ///
    /// Returns `None` if the object doesn't exist.
    async fn head(&self, key: &str) -> Result<Option<RemoteMeta>, PublishError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                #[allow(clippy::cast_sign_loss)] // S3 content-length is non-negative
                let size = output.content_length().unwrap_or(0) as u64;
                let etag = output.e_tag().map(str::to_string);
                Ok(Some(RemoteMeta { size, etag }))
            }
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(aws_sdk_s3::operation::head_object::HeadObjectError::is_not_found)
                {
                    return Ok(None);
                }
                Err(PublishError::Head {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    transient: is_transient_sdk_error(&err),
                    source: Box::new(err),
                })
            }
        }
    }
}

#[async_trait]
impl ArtifactSink for S3Sink {
    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }

    async fn publish(&self, local_path: &Path, name: &str) -> Result<Published, PublishError> {
        if !local_path.exists() {
            return Err(PublishError::MissingArtifact {
                path: local_path.to_path_buf(),
            });
        }

        let data = tokio::fs::read(local_path).await?;

        if let Some(remote) = self.head(name).await?
            && is_remote_match(&data, &remote)
        {
            log::debug!("  s3://{}/{name}: skipped (unchanged)", self.bucket);
            return Ok(Published {
                url: self.url(name),
                unchanged: true,
            });
        }

        log::debug!(
            "Pushing {} -> s3://{}/{name} ({} bytes)",
            local_path.display(),
            self.bucket,
            data.len()
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(data))
            .content_type("application/json")
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| PublishError::Upload {
                bucket: self.bucket.clone(),
                key: name.to_string(),
                transient: is_transient_sdk_error(&e),
                source: Box::new(e),
            })?;

        Ok(Published {
            url: self.url(name),
            unchanged: false,
        })
    }
}

/// Whether `data` matches the remote object.
///
/// Sizes must match. When the `ETag` looks like a plain MD5 hex digest
/// the digests must match too; multipart `ETag`s (containing `-`) fall
/// back to the size check.
fn is_remote_match(data: &[u8], remote: &RemoteMeta) -> bool {
    if data.len() as u64 != remote.size {
        return false;
    }

    if let Some(etag) = &remote.etag {
        let clean = etag.trim_matches('"');
        if !clean.contains('-') && clean.len() == 32 {
            return format!("{:x}", md5::compute(data)) == clean;
        }
    }

    true
}

/// Classifies an SDK failure.
///
/// Timeouts, dispatch (connection) failures and unparseable responses are
/// transient, as are service errors with HTTP 429 or 5xx. Everything else
/// (construction failures, 4xx) is permanent.
fn is_transient_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> bool {
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(service) => is_transient_status(service.raw().status().as_u16()),
        _ => false,
    }
}

/// HTTP 429 and 5xx are worth retrying.
#[must_use]
pub const fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500..=599)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(size: u64, etag: Option<&str>) -> RemoteMeta {
        RemoteMeta {
            size,
            etag: etag.map(String::from),
        }
    }

    #[test]
    fn remote_match_compares_size_then_md5() {
        let data = b"[]\n";
        let digest = format!("\"{:x}\"", md5::compute(data));

        assert!(is_remote_match(data, &meta(3, Some(&digest))));
        assert!(!is_remote_match(data, &meta(4, Some(&digest))));
        assert!(!is_remote_match(
            data,
            &meta(3, Some("\"00000000000000000000000000000000\""))
        ));
    }

    #[test]
    fn multipart_etag_falls_back_to_size() {
        assert!(is_remote_match(b"abc", &meta(3, Some("\"abc123-5\""))));
        assert!(is_remote_match(b"abc", &meta(3, None)));
    }

    #[test]
    fn throttling_and_server_errors_are_transient() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(500));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(403));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(200));
    }
}
