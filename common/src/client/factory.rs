//! Session factory for creating session handles from configuration.

use std::sync::Arc;

use super::config::SessionConfig;
use super::in_memory::InMemoryCluster;
use super::{ClientError, ClientResult, CqlSession};

/// Creates and connects a session based on the provided configuration.
///
/// Establishing the connection is this function's single suspension point;
/// on success the returned handle is ready for statement execution.
pub async fn create_session(config: &SessionConfig) -> ClientResult<Arc<dyn CqlSession>> {
    match config {
        SessionConfig::InMemory => Ok(Arc::new(InMemoryCluster::new())),
        SessionConfig::Shared { contact_points } => {
            if contact_points.is_empty() {
                return Err(ClientError::Transport(
                    "at least one contact point is required".to_string(),
                ));
            }
            Ok(Arc::new(InMemoryCluster::shared(contact_points)))
        }
    }
}
