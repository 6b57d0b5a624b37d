//! SDK-backed implementations of the adapter traits.
//!
//! The handlers are synchronous; each SDK call is driven to completion on the
//! current multi-threaded runtime.

use std::future::Future;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};

pub mod eventbridge;
pub mod organizations;
pub mod sns;
pub mod sts;

pub use eventbridge::EventBridgePublisher;
pub use organizations::{OrganizationsDirectory, OrganizationsPolicyAttacher};
pub use sns::SnsNotifier;
pub use sts::{ScopedSession, StsRoleAssumer};

/// Load shared SDK config whose per-operation timeout is the time the
/// invocation has left.
pub async fn load_sdk_config(remaining: Duration) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(remaining)
                .build(),
        )
        .load()
        .await
}

fn block_on_sdk<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
