use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::warn;

// Every leaf goes through `lenient` so one malformed value only resets that
// value to its default instead of rejecting the whole document.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub litellm: RawLitellm,
    #[serde(default, deserialize_with = "lenient")]
    pub aws: RawAws,
    #[serde(default, deserialize_with = "lenient")]
    pub cris: RawCris,
    #[serde(default, deserialize_with = "lenient")]
    pub model_list: Vec<RawModel>,
    #[serde(default, deserialize_with = "lenient")]
    pub router_settings: RawRouterSettings,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLitellm {
    #[serde(default, deserialize_with = "lenient")]
    pub port: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAws {
    #[serde(default, deserialize_with = "lenient")]
    pub profile_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub secondary_profile_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub region_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bedrock_log_group_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCris {
    #[serde(default, deserialize_with = "lenient")]
    pub model_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawModel {
    #[serde(default, deserialize_with = "lenient")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub litellm_params: RawLitellmParams,
    #[serde(default, deserialize_with = "lenient")]
    pub rpm: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLitellmParams {
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawRouterSettings {
    #[serde(default, deserialize_with = "lenient")]
    pub routing_strategy: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub fallbacks: Vec<BTreeMap<String, Vec<String>>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_yml::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }

    Ok(serde_yml::from_value(value).unwrap_or_else(|error| {
        warn!(%error, "Ignoring malformed configuration value");
        T::default()
    }))
}
