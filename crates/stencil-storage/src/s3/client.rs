use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;

use super::S3Options;

/// Build an S3 client from the default credential chain.
///
/// A custom endpoint (MinIO, LocalStack) switches the client to path-style
/// addressing, which those servers expect.
pub async fn build_client(options: &S3Options) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &options.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &options.endpoint_url {
        loader = loader.endpoint_url(endpoint.clone());
    }

    let sdk_config = loader.load().await;
    let config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(options.endpoint_url.is_some())
        .build();

    Client::from_conf(config)
}
