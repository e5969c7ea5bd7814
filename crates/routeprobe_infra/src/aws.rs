use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::sync::OnceCell;
use tracing::debug;

/// Shared AWS configuration per credential profile.
///
/// Each profile is resolved lazily on first use and reused afterwards, so
/// concurrent probes against one profile load its credentials once.
#[derive(Debug)]
pub(crate) struct AwsSessions {
    region: String,
    sessions: Mutex<HashMap<String, Arc<OnceCell<SdkConfig>>>>,
}

impl AwsSessions {
    pub fn new(region: impl ToString) -> Self {
        Self { region: region.to_string(), sessions: Mutex::default() }
    }

    pub async fn config(&self, profile: &str) -> SdkConfig {
        let cell = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.entry(profile.to_string()).or_default().clone()
        };

        cell.get_or_init(|| async {
            debug!(profile, region = %self.region, "Loading AWS profile");
            aws_config::defaults(BehaviorVersion::latest())
                .profile_name(profile)
                .region(Region::new(self.region.clone()))
                .load()
                .await
        })
        .await
        .clone()
    }
}
