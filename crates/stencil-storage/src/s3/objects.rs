//! Raw S3 object calls used by the S3 collection.

use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_types::byte_stream::ByteStream;

use crate::error::StoreError;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Body and ETag of a fetched object.
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: Option<String>,
}

/// One page of a prefix listing.
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
}

/// Fetch an object. A missing key is `Ok(None)`, not an error.
pub async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Option<StoredObject>, StoreError> {
    let resp = match client.get_object().bucket(bucket).key(key).send().await {
        Ok(resp) => resp,
        Err(e) => {
            let err = e.into_service_error();
            if err.is_no_such_key() {
                return Ok(None);
            }
            return Err(StoreError::GetObject(DisplayErrorContext(&err).to_string()));
        }
    };

    let etag = resp.e_tag().map(|s| s.to_string());
    let body = resp
        .body
        .collect()
        .await
        .map_err(|e| StoreError::GetObject(e.to_string()))?
        .into_bytes()
        .to_vec();

    Ok(Some(StoredObject { body, etag }))
}

/// Create an object only if nothing exists at `key` yet (`If-None-Match: *`).
pub async fn put_object_if_absent(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
) -> Result<(), StoreError> {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON_CONTENT_TYPE)
        .body(ByteStream::from(body))
        .if_none_match("*")
        .send()
        .await
        .map_err(|e| classify_put_error(e.into_service_error(), key))?;

    Ok(())
}

/// Overwrite an object only if its ETag still equals `expected_etag`.
pub async fn put_object_if_match(
    client: &Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    expected_etag: &str,
) -> Result<(), StoreError> {
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(JSON_CONTENT_TYPE)
        .body(ByteStream::from(body))
        .if_match(expected_etag)
        .send()
        .await
        .map_err(|e| classify_put_error(e.into_service_error(), key))?;

    Ok(())
}

pub async fn delete_object(client: &Client, bucket: &str, key: &str) -> Result<(), StoreError> {
    client
        .delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            StoreError::DeleteObject(DisplayErrorContext(&e.into_service_error()).to_string())
        })?;

    Ok(())
}

/// List one page of keys under `prefix`, continuing from `token` if given.
pub async fn list_page(
    client: &Client,
    bucket: &str,
    prefix: &str,
    token: Option<&str>,
) -> Result<ListPage, StoreError> {
    let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);

    if let Some(token) = token {
        req = req.continuation_token(token);
    }

    let resp = req.send().await.map_err(|e| {
        StoreError::ListObjects(DisplayErrorContext(&e.into_service_error()).to_string())
    })?;

    let keys = resp
        .contents()
        .iter()
        .filter_map(|obj| obj.key())
        .map(|key| key.to_string())
        .collect();

    let next_token = if resp.is_truncated() == Some(true) {
        resp.next_continuation_token().map(|s| s.to_string())
    } else {
        None
    };

    Ok(ListPage { keys, next_token })
}

/// S3 answers a failed `If-Match`/`If-None-Match` with 412, or with 409 when
/// two conditional writes race on the same key.
pub fn is_precondition_conflict(code: Option<&str>) -> bool {
    matches!(code, Some("PreconditionFailed" | "ConditionalRequestConflict"))
}

fn classify_put_error<E>(err: E, key: &str) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    if is_precondition_conflict(err.code()) {
        StoreError::PreconditionFailed {
            key: key.to_string(),
        }
    } else {
        StoreError::PutObject(DisplayErrorContext(&err).to_string())
    }
}
