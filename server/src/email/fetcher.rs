use anyhow::Context;

use crate::error::AppResult;

/// Retrieves one raw message from the inbound bucket and decodes it as
/// text. The object key is the upstream service's message identifier.
/// Credentials come from the ambient AWS credential chain; a missing
/// object or missing read access propagates as an error.
pub async fn fetch_raw_email(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> AppResult<String> {
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .with_context(|| format!("Failed to fetch message {} from bucket {}", key, bucket))?;

    let bytes = object
        .body
        .collect()
        .await
        .with_context(|| format!("Failed to read message body for {}", key))?
        .to_vec();

    // Lossy decode: a bad transfer encoding should not kill ingestion.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
