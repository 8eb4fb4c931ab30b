pub mod launch_source;
pub mod message_transport;
pub mod processed_launch_repository;
pub mod subscription_repository;

pub use launch_source::{Credential, LaunchSource};
pub use message_transport::MessageTransport;
pub use processed_launch_repository::ProcessedLaunchRepository;
pub use subscription_repository::SubscriptionRepository;
