//! Shared helpers for cluster integration tests

use chrono::NaiveDate;
use reaper_common::{ElasticClient, ElasticConfig};
use std::ops::Deref;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

pub const USER: &str = "elastic";
pub const PASSWORD: &str = "changeme";

/// Mock Elasticsearch cluster speaking the `_cat/indices` and DELETE APIs
pub struct MockCluster {
    server: MockServer,
}

impl MockCluster {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Client pointed at the mock with valid credentials
    pub fn client(&self) -> ElasticClient {
        let config = ElasticConfig::new(&self.server.uri()).with_credentials(USER, PASSWORD);
        ElasticClient::new(&config).unwrap()
    }

    /// Serve a `_cat/indices?v` listing for the given index names
    pub async fn mock_listing<T: Into<Times>>(&self, indices: &[&str], n_times: T) {
        let mut body = String::from(
            "health status index uuid pri rep docs.count docs.deleted store.size pri.store.size\n",
        );
        for (i, name) in indices.iter().enumerate() {
            body.push_str(&format!(
                "green open {} uuid{:04} 1 1 100 0 1.2mb 600kb\n",
                name, i
            ));
        }

        Mock::given(method("GET"))
            .and(path("/_cat/indices"))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .named("cat indices")
            .expect(n_times)
            .mount(self)
            .await;
    }

    pub async fn mock_listing_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/_cat/indices"))
            .respond_with(ResponseTemplate::new(status).set_body_string("unavailable"))
            .named("cat indices failure")
            .mount(self)
            .await;
    }

    /// Respond to `DELETE /<index>` with `status`
    pub async fn mock_delete<T: Into<Times>>(&self, index: &str, status: u16, n_times: T) {
        Mock::given(method("DELETE"))
            .and(path(format!("/{}", index)))
            .and(basic_auth(USER, PASSWORD))
            .respond_with(
                ResponseTemplate::new(status).set_body_string(r#"{"acknowledged":true}"#),
            )
            .named(format!("delete {}", index))
            .expect(n_times)
            .mount(self)
            .await;
    }

    /// Methods and paths of every request received so far
    pub async fn requests(&self) -> Vec<(String, String)> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| (r.method.to_string(), r.url.path().to_string()))
            .collect()
    }
}

impl Deref for MockCluster {
    type Target = MockServer;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}
