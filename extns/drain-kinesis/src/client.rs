use aws_config::{BehaviorVersion, Region, meta::region::RegionProviderChain};
use aws_sdk_kinesis::Client;

use crate::sink::KinesisSinkConfig;

/// Creates a Kinesis client for the configured region, falling back to the
/// environment's default provider chain.
pub async fn create_kinesis_client(config: &KinesisSinkConfig) -> Client {
    tracing::info!(region = config.region, "Creating Kinesis client in region");

    let region_provider = RegionProviderChain::first_try(Region::new(config.region.clone()))
        .or_default_provider()
        .or_else(Region::new(crate::sink::KINESIS_DEFAULT_REGION));

    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;

    Client::new(&shared_config)
}
