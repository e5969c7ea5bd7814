use std::sync::Arc;
use std::time::Duration;

use routeprobe_config::Config;
use routeprobe_display::{
    ProgressLine, REPORT_WIDTH, banner, fallback_events, fallback_events_detail, fallback_summary,
    router_settings_table, rule,
};
use routeprobe_domain::{Endpoint, PartitionLabel, ProbeRequest, ProbeResult, RouteClassifier};

use crate::{ConsoleExt, Dispatcher, Infra, ProgressStyle, prompt_for};

pub const FALLBACK_MODEL: &str = "claude-sonnet-fallback-demo";
/// Key presented to the proxy by the routed scenarios.
pub const DEMO_API_KEY: &str = "demo-key";
/// Partition of every call that goes through the proxy under one key.
pub const PROXY_PARTITION: &str = "PROXY";

const PROMPTS: [&str; 10] = [
    "What is AI?",
    "Define ML",
    "Explain NLP",
    "What is DL?",
    "Define CNN",
    "What is RNN?",
    "Explain GAN",
    "Define API",
    "What is REST?",
    "Explain GraphQL",
];

const LAUNCH_SPACING: Duration = Duration::from_millis(50);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds staggered proxy requests against one model group.
pub(crate) fn routed_requests(
    model: &str,
    prompts: &[&str],
    spacing: Duration,
    timeout: Duration,
) -> Vec<ProbeRequest> {
    let endpoint = Endpoint::Proxy { api_key: DEMO_API_KEY.to_string(), model: model.to_string() };
    (0..prompts.len())
        .map(|index| {
            ProbeRequest::new(
                index + 1,
                PartitionLabel::from(PROXY_PARTITION),
                prompt_for(prompts, index),
                endpoint.clone(),
            )
            .timeout(timeout)
            .launch_delay(spacing * index as u32)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackReport {
    pub results: Vec<ProbeResult>,
    /// Sequence ids served by a fallback deployment.
    pub fallbacks: Vec<usize>,
}

/// Overloads a rate-limited model group so the proxy has to fail over.
pub struct FallbackDemo<I> {
    infra: Arc<I>,
    config: Arc<Config>,
}

impl<I: Infra> FallbackDemo<I> {
    pub fn new(infra: Arc<I>, config: Arc<Config>) -> Self {
        Self { infra, config }
    }

    pub async fn run(&self) -> anyhow::Result<FallbackReport> {
        let console = &*self.infra;
        let classifier = RouteClassifier::new(self.config.fallback_models(FALLBACK_MODEL));

        console.print(banner("LITELLM FALLBACK DEMO"));
        console.println(
            "This demo triggers rate limits on Claude models to show fallback to Sonnet 3.5 models",
        );
        console.println("Watch for model switches from Claude → Sonnet 3.5 when limits are hit\n");
        console.println(router_settings_table(
            self.config.router.routing_strategy.as_deref(),
            &self.config.fallback_chain(FALLBACK_MODEL),
        ));

        console.progress(ProgressLine::info(format!(
            "Sending {} requests in parallel to trigger rate limits...",
            PROMPTS.len()
        )));
        console.println("");

        let style = ProgressStyle::Routed { classifier: classifier.clone(), width: 45, announce: true };
        let requests = routed_requests(FALLBACK_MODEL, &PROMPTS, LAUNCH_SPACING, REQUEST_TIMEOUT);
        let results = Dispatcher::new(self.infra.clone()).dispatch(requests, &style).await;

        console.print(format!("\n{}", fallback_summary(&results, &classifier)));
        console.println("");

        let fallbacks: Vec<usize> = fallback_events(&results, &classifier)
            .iter()
            .map(|result| result.sequence)
            .collect();
        if fallbacks.is_empty() {
            console.progress(ProgressLine::warning(
                "No fallbacks triggered (may need to increase request rate or check config)",
            ));
        } else {
            console.progress(ProgressLine::success(format!(
                "FALLBACK WORKING: {} requests successfully failed over to Sonnet 3.5 models!",
                fallbacks.len()
            )));
            console.println("");
            console.print(fallback_events_detail(&results, &classifier));
        }
        console.println(format!("{}\n", rule(REPORT_WIDTH)));

        Ok(FallbackReport { results, fallbacks })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use routeprobe_config::{ModelDeployment, RouterSettings};
    use routeprobe_domain::{ErrorKind, ProbeFailure, ProbeReply};

    use super::*;
    use crate::tests::MockInfra;

    const SONNET_35: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";

    fn config() -> Arc<Config> {
        Arc::new(
            Config::default()
                .models(vec![
                    ModelDeployment::new(FALLBACK_MODEL, "bedrock/us.anthropic.claude-sonnet-4").rpm(5u32),
                    ModelDeployment::new("claude-3-5-sonnet-fallback", format!("bedrock/{SONNET_35}"))
                        .rpm(50u32),
                ])
                .router(RouterSettings::default().fallbacks(BTreeMap::from([(
                    FALLBACK_MODEL.to_string(),
                    vec!["claude-3-5-sonnet-fallback".to_string()],
                )]))),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_over_requests_are_detected() {
        let infra = Arc::new(
            MockInfra::default()
                .reply(7, Ok(ProbeReply::new(SONNET_35)), Duration::from_millis(800))
                .reply(3, Ok(ProbeReply::new(SONNET_35)), Duration::from_millis(900))
                .reply(9, Err(ProbeFailure::new(ErrorKind::Throttled, "429")), Duration::ZERO),
        );
        let fixture = FallbackDemo::new(infra.clone(), config());

        let actual = fixture.run().await.unwrap();

        assert_eq!(actual.results.len(), 10);
        assert_eq!(actual.fallbacks, vec![3, 7]);
        let text = infra.console_text();
        assert!(text.contains("FALLBACK WORKING: 2 requests successfully failed over to Sonnet 3.5 models!"));
        assert!(text.contains("Fallback Triggered:    2"));
        assert!(text.contains("Request # 9 → RATE LIMIT: 429"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fallback_warns() {
        let infra = Arc::new(MockInfra::default());
        let fixture = FallbackDemo::new(infra.clone(), config());

        let actual = fixture.run().await.unwrap();

        assert!(actual.fallbacks.is_empty());
        assert!(
            infra
                .console_text()
                .contains("No fallbacks triggered (may need to increase request rate or check config)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_staggered_and_keyed() {
        let infra = Arc::new(MockInfra::default());
        FallbackDemo::new(infra.clone(), config()).run().await.unwrap();

        let mut actual = infra.requests();
        actual.sort_by_key(|request| request.sequence);

        assert_eq!(actual[0].launch_delay, Duration::ZERO);
        assert_eq!(actual[9].launch_delay, Duration::from_millis(450));
        assert_eq!(actual[3].prompt, "What is DL?");
        assert_eq!(
            actual[0].endpoint,
            Endpoint::Proxy { api_key: "demo-key".into(), model: FALLBACK_MODEL.into() }
        );
        assert_eq!(actual[0].timeout, REQUEST_TIMEOUT);
    }
}
