//! Session configuration.

use serde::{Deserialize, Serialize};

/// Selects how the session handle is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SessionConfig {
    /// A private in-process cluster, isolated to the session that opened it.
    /// Useful for unit tests that must not observe each other's data.
    InMemory,
    /// A process-wide in-process cluster named by its contact points.
    /// Sessions created with the same contact points attach to the same
    /// cluster state, so several adapter instances observe each other's
    /// writes and may bootstrap the schema concurrently.
    ///
    /// Driver-backed sessions for a real cluster are constructed by the
    /// embedding application and injected directly; see
    /// `KeyValueDb::with_session` in the adapter crate.
    Shared {
        #[serde(default = "default_contact_points")]
        contact_points: Vec<String>,
    },
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::Shared {
            contact_points: default_contact_points(),
        }
    }
}

fn default_contact_points() -> Vec<String> {
    vec!["127.0.0.1".to_string()]
}
