pub mod fake_gateway;
pub mod fixtures;
pub mod recording_notifier;

pub use fake_gateway::{FakeGateway, FakeGatewayStats};
pub use recording_notifier::RecordingNotifier;
