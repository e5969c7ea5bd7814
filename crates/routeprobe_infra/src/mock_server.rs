use mockito::{Matcher, Mock, Server, ServerGuard};

/// Local stand-in for the routing proxy.
pub struct MockServer {
    server: ServerGuard,
}

impl MockServer {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await }
    }

    pub fn url(&self) -> String {
        format!("{}/", self.server.url())
    }

    pub async fn mock_completion(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", "/chat/completions")
            .match_header("authorization", Matcher::Regex("^Bearer .+".to_string()))
            .match_header("content-type", "application/json")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
