use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::auth::{self, Credentials};
use super::error::RemoteError;
use super::responses::EntriesPage;
use super::EntrySource;
use crate::state::EntryId;

const USER_AGENT: &str = concat!("wallabag-sync/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`WallabagClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root without a trailing slash, e.g. `https://app.wallabag.it`.
    pub server_url: String,
    pub credentials: Credentials,
    pub skip_tls_verify: bool,
    pub timeout: Duration,
    pub page_size: u32,
}

/// Authenticated wallabag v2 API client.
pub struct WallabagClient {
    http: Client,
    server_url: String,
    access_token: String,
    page_size: u32,
}

impl std::fmt::Debug for WallabagClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallabagClient")
            .field("server_url", &self.server_url)
            .field("access_token", &"<redacted>")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl WallabagClient {
    /// Build the HTTP client and obtain an access token.
    pub async fn connect(config: &ClientConfig) -> Result<Self, RemoteError> {
        if config.skip_tls_verify {
            tracing::warn!("TLS certificate verification is disabled");
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .map_err(|source| RemoteError::Http {
                url: config.server_url.clone(),
                source,
            })?;

        let access_token =
            auth::request_token(&http, &config.server_url, &config.credentials).await?;
        Ok(Self {
            http,
            server_url: config.server_url.clone(),
            access_token,
            page_size: config.page_size.max(1),
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.server_url, endpoint)
    }

    /// Send an authorized request and reject non-2xx statuses.
    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, RemoteError> {
        let response = builder
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|source| RemoteError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn read_body(response: Response, url: &str) -> Result<Vec<u8>, RemoteError> {
        let bytes = response.bytes().await.map_err(|source| RemoteError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let response = self.send(self.http.get(url).query(query), url).await?;
        let body = Self::read_body(response, url).await?;
        serde_json::from_slice(&body).map_err(|source| RemoteError::Json {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_page(&self, page: u32) -> Result<EntriesPage, RemoteError> {
        let url = self.api_url("entries.json");
        let query = [
            ("archive", "0".to_string()),
            ("detail", "metadata".to_string()),
            ("perPage", self.page_size.to_string()),
            ("page", page.to_string()),
        ];
        self.get_json(&url, &query).await
    }
}

#[async_trait]
impl EntrySource for WallabagClient {
    /// Pages are requested from 1 upwards and concatenated in server order
    /// until the reported total is reached, the last reported page has been
    /// read, or a page comes back empty. A page holding only ids already seen
    /// also ends the listing, which keeps a server that ignores `page` from
    /// looping forever.
    async fn list_unarchived(&self) -> Result<Vec<EntryId>, RemoteError> {
        let mut ids: Vec<EntryId> = Vec::new();
        let mut seen: HashSet<EntryId> = HashSet::new();
        let mut page = 1u32;

        loop {
            let response = self.fetch_page(page).await?;
            let items: Vec<EntryId> = response.embedded.items.iter().map(|e| e.id).collect();
            let fetched = items.len();
            let new = items.iter().filter(|id| !seen.contains(*id)).count();
            tracing::debug!(
                page,
                pages = ?response.pages,
                total = ?response.total,
                fetched,
                new,
                "Fetched entries page"
            );

            if fetched > 0 && new == 0 {
                tracing::warn!(page, "Listing page repeated earlier entries, stopping");
                break;
            }
            seen.extend(items.iter().copied());
            ids.extend(items);

            let reached_total = response.total.is_some_and(|total| ids.len() as u64 >= total);
            let last_page = response.pages.is_some_and(|pages| page >= pages);
            if fetched == 0 || reached_total || last_page {
                break;
            }
            page += 1;
        }

        Ok(ids)
    }

    async fn archive_entry(&self, id: EntryId) -> Result<(), RemoteError> {
        let url = self.api_url(&format!("entries/{}.json", id));
        let body = serde_json::json!({ "archive": 1 });
        self.send(self.http.patch(&url).json(&body), &url).await?;
        Ok(())
    }

    async fn fetch_export(&self, id: EntryId) -> Result<Vec<u8>, RemoteError> {
        let url = self.api_url(&format!("entries/{}/export.mobi", id));
        let response = self.send(self.http.get(&url), &url).await?;
        Self::read_body(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "tok", "expires_in": 3600})),
            )
            .mount(server)
            .await;
    }

    async fn connect(server: &MockServer, page_size: u32) -> WallabagClient {
        mock_token(server).await;
        WallabagClient::connect(&ClientConfig {
            server_url: server.uri(),
            credentials: Credentials {
                username: "reader".into(),
                password: "pw".into(),
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
            skip_tls_verify: false,
            timeout: Duration::from_secs(5),
            page_size,
        })
        .await
        .unwrap()
    }

    fn page_body(ids: &[u64], pages: u32, total: u64) -> serde_json::Value {
        let items: Vec<_> = ids.iter().map(|id| json!({"id": id, "title": "t"})).collect();
        json!({
            "page": 1,
            "limit": 2,
            "pages": pages,
            "total": total,
            "_embedded": {"items": items}
        })
    }

    #[tokio::test]
    async fn test_list_follows_pagination_in_server_order() {
        let server = MockServer::start().await;
        let client = connect(&server, 2).await;

        for (page, ids) in [("1", vec![9u64, 5]), ("2", vec![30, 1]), ("3", vec![7])] {
            Mock::given(method("GET"))
                .and(path("/api/entries.json"))
                .and(query_param("archive", "0"))
                .and(query_param("perPage", "2"))
                .and(query_param("page", page))
                .and(header("authorization", "Bearer tok"))
                .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&ids, 3, 5)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let ids = client.list_unarchived().await.unwrap();
        assert_eq!(
            ids,
            [9, 5, 30, 1, 7].into_iter().map(EntryId).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_list_stops_at_reported_total() {
        let server = MockServer::start().await;
        let client = connect(&server, 2).await;

        // Claims more pages than the total warrants; the total wins.
        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[4, 2], 10, 2)))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client.list_unarchived().await.unwrap();
        assert_eq!(ids, vec![EntryId(4), EntryId(2)]);
    }

    #[tokio::test]
    async fn test_list_empty_account() {
        let server = MockServer::start().await;
        let client = connect(&server, 30).await;

        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[], 1, 0)))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client.list_unarchived().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_stops_when_server_ignores_page() {
        let server = MockServer::start().await;
        let client = connect(&server, 2).await;

        // No `pages` or `total`, and every page is the first one.
        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": {"items": [{"id": 3}, {"id": 8}]}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let ids = client.list_unarchived().await.unwrap();
        assert_eq!(ids, vec![EntryId(3), EntryId(8)]);
    }

    #[tokio::test]
    async fn test_list_server_error() {
        let server = MockServer::start().await;
        let client = connect(&server, 30).await;

        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client.list_unarchived().await.unwrap_err();
        assert!(matches!(err, RemoteError::HttpStatus { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_list_malformed_json() {
        let server = MockServer::start().await;
        let client = connect(&server, 30).await;

        Mock::given(method("GET"))
            .and(path("/api/entries.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client.list_unarchived().await.unwrap_err();
        assert!(matches!(err, RemoteError::Json { .. }));
    }

    #[tokio::test]
    async fn test_archive_entry_patches_archive_flag() {
        let server = MockServer::start().await;
        let client = connect(&server, 30).await;

        Mock::given(method("PATCH"))
            .and(path("/api/entries/9.json"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({"archive": 1})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 9, "is_archived": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client.archive_entry(EntryId(9)).await.unwrap();
    }

    #[tokio::test]
    async fn test_archive_missing_entry_fails() {
        let server = MockServer::start().await;
        let client = connect(&server, 30).await;

        Mock::given(method("PATCH"))
            .and(path("/api/entries/9.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client.archive_entry(EntryId(9)).await.unwrap_err();
        match err {
            RemoteError::HttpStatus { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/api/entries/9.json"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_export_returns_body() {
        let server = MockServer::start().await;
        let client = connect(&server, 30).await;

        Mock::given(method("GET"))
            .and(path("/api/entries/5/export.mobi"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BOOKMOBI".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let data = client.fetch_export(EntryId(5)).await.unwrap();
        assert_eq!(data, b"BOOKMOBI");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = WallabagClient {
            http: Client::new(),
            server_url: "https://example.org".into(),
            access_token: "very-secret".into(),
            page_size: 30,
        };
        let debug = format!("{:?}", client);
        assert!(debug.contains("example.org"));
        assert!(!debug.contains("very-secret"));
    }
}
