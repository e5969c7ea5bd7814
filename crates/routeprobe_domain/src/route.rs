use strum_macros::Display;

/// Whether a reply came from the primary route or from a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RouteRole {
    #[strum(to_string = "PRIMARY")]
    Primary,
    #[strum(to_string = "FALLBACK")]
    Fallback,
}

/// Markers of the model family the demo fallback chains point to.
const FALLBACK_FAMILY_MARKERS: [&str; 2] = ["sonnet-3-5", "3-5-sonnet"];

/// Decides the role of a served route from the configured fallback
/// deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteClassifier {
    fallback_models: Vec<String>,
}

impl RouteClassifier {
    pub fn new(fallback_models: impl IntoIterator<Item = impl ToString>) -> Self {
        Self {
            fallback_models: fallback_models
                .into_iter()
                .map(|model| model.to_string().to_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, route: &str) -> RouteRole {
        let route = route.to_lowercase();
        let configured = self
            .fallback_models
            .iter()
            .any(|model| !model.is_empty() && route.contains(model.as_str()));
        let family = FALLBACK_FAMILY_MARKERS
            .iter()
            .any(|marker| route.contains(marker));

        if configured || family {
            RouteRole::Fallback
        } else {
            RouteRole::Primary
        }
    }
}
