//! Cluster index catalog: listing and deleting indices over the REST API

use crate::error::{ReaperError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Source of index names and sink for deletions
///
/// The retention engine only talks to the cluster through this trait.
#[async_trait]
pub trait IndexCatalog: Send + Sync {
    /// List every index name currently present in the cluster
    async fn list_indices(&self) -> Result<Vec<String>>;

    /// Delete a single index
    async fn delete_index(&self, index: &str) -> Result<()>;
}

/// Extract index names from a `_cat/indices?v` response
///
/// The first line is the column header. Rows with fewer than three columns
/// are ignored; the index name is the third column.
pub fn parse_cat_indices(body: &str) -> Vec<String> {
    body.lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(2))
        .map(str::to_string)
        .collect()
}

/// Connection settings for [`ElasticClient`]
#[derive(Debug, Clone)]
pub struct ElasticConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    /// Accept self-signed or otherwise invalid TLS certificates
    pub insecure: bool,
}

impl ElasticConfig {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            insecure: false,
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }
}

/// Elasticsearch client using basic authentication
#[derive(Clone)]
pub struct ElasticClient {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticClient {
    pub fn new(config: &ElasticConfig) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(ReaperError::Config("cluster host is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build request with basic auth when credentials are configured
    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, &url);

        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }

    /// Map non-success statuses to errors, returning the body otherwise
    async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if status.is_success() {
            Ok(response.text().await?)
        } else if status.as_u16() == 401 {
            Err(ReaperError::AuthFailed)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ReaperError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl IndexCatalog for ElasticClient {
    async fn list_indices(&self) -> Result<Vec<String>> {
        let response = self
            .build_request(reqwest::Method::GET, "/_cat/indices?v")
            .send()
            .await?;

        let body = self.handle_response(response).await?;
        let indices = parse_cat_indices(&body);
        tracing::debug!(count = indices.len(), "listed cluster indices");

        Ok(indices)
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let path = format!("/{}", urlencoding::encode(index));
        let response = self
            .build_request(reqwest::Method::DELETE, &path)
            .send()
            .await?;

        self.handle_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_OUTPUT: &str = "\
health status index               uuid                   pri rep docs.count docs.deleted store.size pri.store.size
green  open   logstash-2024.01.01 Yx3kQ1b7Ta2xW9oP0aBcDe   1   1      12000            0      8.1mb          4.0mb
yellow open   .kibana_1           aB4dE6fG8hI0jK2lM4nO6p   1   0         42            3     60.2kb         60.2kb
green  open   logstash-2024.03.01 Zz9yX8wV7uT6sR5qP4oN3m   1   1       9000            0      6.3mb          3.1mb
";

    #[test]
    fn test_parse_cat_indices() {
        let indices = parse_cat_indices(CAT_OUTPUT);
        assert_eq!(
            indices,
            vec!["logstash-2024.01.01", ".kibana_1", "logstash-2024.03.01"]
        );
    }

    #[test]
    fn test_parse_cat_indices_skips_short_and_blank_rows() {
        let body = "health status index\n\ngreen open\ngreen open logstash-2024.01.01\n";
        assert_eq!(parse_cat_indices(body), vec!["logstash-2024.01.01"]);
    }

    #[test]
    fn test_parse_cat_indices_empty() {
        assert!(parse_cat_indices("").is_empty());
        assert!(parse_cat_indices("health status index uuid\n").is_empty());
    }

    #[test]
    fn test_client_requires_host() {
        let config = ElasticConfig::new("  ");
        assert!(matches!(ElasticClient::new(&config), Err(ReaperError::Config(_))));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = ElasticConfig::new("https://es.example.com:9200/");
        let client = ElasticClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://es.example.com:9200");
    }
}
