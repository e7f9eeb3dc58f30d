mod cancellation;
mod lifecycle_properties;
mod peer_failures;
