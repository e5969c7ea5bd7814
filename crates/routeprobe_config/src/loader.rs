use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::document::RawDocument;
use crate::{
    AwsConfig, Config, CrisConfig, ModelDeployment, ProxyConfig, RouterSettings, DEFAULT_CRIS_MODEL,
    DEFAULT_HOST, DEFAULT_LOG_GROUP, DEFAULT_PORT, DEFAULT_PROFILE, DEFAULT_REGION,
    DEFAULT_SECONDARY_PROFILE,
};
use crate::config::strip_provider;

pub const DEFAULT_CONFIG_PATH: &str = "./config/config.yaml";

lazy_static! {
    static ref REGION_PATTERN: Regex = Regex::new(r"^[a-z]{2}(-[a-z]+)*-[0-9]+$").unwrap();
    static ref LOG_GROUP_PATTERN: Regex = Regex::new(r"^[\w./-]+$").unwrap();
}

impl Config {
    /// Loads the configuration file at `path`.
    ///
    /// Never fails: a missing or unreadable file yields the defaults, and
    /// every invalid value is replaced by its default with a warning.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "Loaded configuration file");
                Self::from_yaml(&content)
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Configuration file unavailable, using defaults");
                Self::default()
            }
        }
    }

    /// Parses a configuration document, falling back to defaults per value.
    pub fn from_yaml(content: &str) -> Self {
        let document = match serde_yml::from_str::<Option<RawDocument>>(content) {
            Ok(document) => document.unwrap_or_default(),
            Err(error) => {
                warn!(%error, "Configuration file is not valid YAML, using defaults");
                RawDocument::default()
            }
        };

        Self::resolve(document)
    }

    fn resolve(document: RawDocument) -> Self {
        let proxy = ProxyConfig {
            host: non_empty(document.litellm.host)
                .filter(|host| valid_host(host))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: resolve_port(document.litellm.port),
            base_url: document.litellm.base_url.and_then(|url| {
                Url::parse(url.trim())
                    .inspect_err(|error| warn!(%error, "Invalid proxy base URL, ignoring"))
                    .ok()
            }),
        };

        let aws = AwsConfig {
            profile: non_empty(document.aws.profile_name)
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            secondary_profile: non_empty(document.aws.secondary_profile_name)
                .unwrap_or_else(|| DEFAULT_SECONDARY_PROFILE.to_string()),
            region: matching(document.aws.region_name, &REGION_PATTERN, "region")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            log_group: matching(
                document.aws.bedrock_log_group_name,
                &LOG_GROUP_PATTERN,
                "log group name",
            )
            .unwrap_or_else(|| DEFAULT_LOG_GROUP.to_string()),
        };

        let cris = CrisConfig {
            model_id: non_empty(document.cris.model_id)
                .unwrap_or_else(|| DEFAULT_CRIS_MODEL.to_string()),
        };

        let models = document
            .model_list
            .into_iter()
            .map(|raw| ModelDeployment {
                name: non_empty(raw.model_name).unwrap_or_else(|| "unknown".to_string()),
                model: non_empty(raw.litellm_params.model)
                    .map(|model| strip_provider(&model))
                    .unwrap_or_else(|| "unknown".to_string()),
                rpm: raw.rpm,
            })
            .collect();

        let fallbacks = document
            .router_settings
            .fallbacks
            .into_iter()
            .flatten()
            .fold(BTreeMap::<String, Vec<String>>::new(), |mut acc, (primary, chain)| {
                acc.entry(primary).or_default().extend(chain);
                acc
            });

        let router = RouterSettings {
            routing_strategy: non_empty(document.router_settings.routing_strategy),
            fallbacks,
        };

        Config { proxy, aws, cris, models, router }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn matching(value: Option<String>, pattern: &Regex, what: &str) -> Option<String> {
    non_empty(value).filter(|value| {
        let valid = pattern.is_match(value);
        if !valid {
            warn!(value = %value, "Invalid {what} format, using default");
        }
        valid
    })
}

fn valid_host(host: &str) -> bool {
    let valid = Url::parse(&format!("http://{host}:{DEFAULT_PORT}/")).is_ok();
    if !valid {
        warn!(host, "Invalid proxy host, using default");
    }
    valid
}

fn resolve_port(port: Option<i64>) -> u16 {
    match port {
        None => DEFAULT_PORT,
        Some(port) if (1024..=65535).contains(&port) => port as u16,
        Some(port) => {
            warn!(port, "Invalid port in config, using default {DEFAULT_PORT}");
            DEFAULT_PORT
        }
    }
}
