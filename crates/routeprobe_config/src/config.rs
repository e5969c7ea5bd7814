use std::collections::BTreeMap;

use derive_setters::Setters;
use strum_macros::Display;
use url::Url;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_SECONDARY_PROFILE: &str = "default-secondary";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_LOG_GROUP: &str = "BedrockModelInvocation";
pub const DEFAULT_CRIS_MODEL: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

/// Immutable configuration shared by every scenario.
#[derive(Debug, Clone, PartialEq, Default, Setters)]
#[setters(into)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub aws: AwsConfig,
    pub cris: CrisConfig,
    pub models: Vec<ModelDeployment>,
    pub router: RouterSettings,
}

/// Location of the LiteLLM proxy.
#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(into)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Full override of the base URL; wins over host and port.
    pub base_url: Option<Url>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_string(), port: DEFAULT_PORT, base_url: None }
    }
}

impl ProxyConfig {
    /// Base URL chat completions are sent to.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(&format!("http://{}:{}/", self.host, self.port)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(into)]
pub struct AwsConfig {
    pub profile: String,
    pub secondary_profile: String,
    pub region: String,
    pub log_group: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            secondary_profile: DEFAULT_SECONDARY_PROFILE.to_string(),
            region: DEFAULT_REGION.to_string(),
            log_group: DEFAULT_LOG_GROUP.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(into)]
pub struct CrisConfig {
    /// Cross-region inference profile id.
    pub model_id: String,
}

impl Default for CrisConfig {
    fn default() -> Self {
        Self { model_id: DEFAULT_CRIS_MODEL.to_string() }
    }
}

/// One entry of the proxy `model_list`.
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
#[setters(into)]
pub struct ModelDeployment {
    /// Public model group name clients ask for.
    pub name: String,
    /// Backing model id with the `bedrock/` provider prefix removed.
    pub model: String,
    /// Requests-per-minute quota of this deployment.
    pub rpm: Option<u32>,
}

impl ModelDeployment {
    pub fn new(name: impl ToString, model: impl ToString) -> Self {
        Self { name: name.to_string(), model: strip_provider(&model.to_string()), rpm: None }
    }
}

pub(crate) fn strip_provider(model: &str) -> String {
    model.strip_prefix("bedrock/").unwrap_or(model).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Setters)]
#[setters(into)]
pub struct RouterSettings {
    pub routing_strategy: Option<String>,
    /// Primary model group to its ordered fallback groups.
    pub fallbacks: BTreeMap<String, Vec<String>>,
}

/// Role of a deployment in a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DeploymentRole {
    Primary,
    Fallback,
}

impl Config {
    /// Deployments registered under a model group name.
    pub fn deployments(&self, name: &str) -> impl Iterator<Item = &ModelDeployment> {
        let name = name.to_string();
        self.models.iter().filter(move |model| model.name == name)
    }

    /// Fallback groups configured for a primary model group.
    pub fn fallbacks_for(&self, primary: &str) -> &[String] {
        self.router
            .fallbacks
            .get(primary)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Backing deployments of a primary group followed by those of its
    /// fallback groups, tagged with their role.
    pub fn fallback_chain(&self, primary: &str) -> Vec<(DeploymentRole, &ModelDeployment)> {
        let fallbacks = self.fallbacks_for(primary);
        let primary = self
            .deployments(primary)
            .map(|deployment| (DeploymentRole::Primary, deployment));
        let fallback = self
            .models
            .iter()
            .filter(|model| fallbacks.contains(&model.name))
            .map(|deployment| (DeploymentRole::Fallback, deployment));
        primary.chain(fallback).collect()
    }

    /// Backing model ids a primary group can fall back to.
    pub fn fallback_models(&self, primary: &str) -> Vec<String> {
        self.fallback_chain(primary)
            .into_iter()
            .filter(|(role, _)| *role == DeploymentRole::Fallback)
            .map(|(_, deployment)| deployment.model.clone())
            .collect()
    }

    /// Quota of the first deployment registered under `name`.
    pub fn rpm_for(&self, name: &str) -> Option<u32> {
        self.deployments(name).find_map(|deployment| deployment.rpm)
    }
}
