//! Uploads rendered chart and report JSON to S3 for the static dashboard.

use serde::Serialize;
use tracing::info;

use crate::output::encode_json;

/// Serializes a value to JSON and uploads it to an S3 bucket with
/// `application/json` content type, gzip-encoded when `gzip` is set.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> anyhow::Result<()> {
    let body = encode_json(value, gzip)?;
    let size = body.len();

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body.into())
        .content_type("application/json");
    if gzip {
        request = request.content_encoding("gzip");
    }
    request.send().await?;

    info!(bucket, key, bytes = size, gzip, "Uploaded JSON to S3");
    Ok(())
}

/// Object key for a rendered chart, e.g. `charts/2018-2025.json`.
pub fn chart_key(start_year: i32, end_year: i32, gzip: bool) -> String {
    let suffix = if gzip { ".json.gz" } else { ".json" };
    format!("charts/{start_year}-{end_year}{suffix}")
}
