//! Typed HTTP client for `/api/trades`.
//!
//! Five calls, one request each. No retries, caching or batching; any non-2xx
//! response surfaces as [`ClientError::Status`] with the server's status and body.

mod error;

pub use error::ClientError;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

use crate::database::models::{GetQuery, Trade, TradeInput, TradeQuery};

#[derive(Debug, Clone)]
pub struct TradesClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl TradesClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url, token })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET /api/trades
    pub async fn list(&self, query: Option<&TradeQuery>) -> Result<Vec<Trade>, ClientError> {
        let mut req = self.request(Method::GET, self.collection_url()?);
        if let Some(q) = query {
            req = req.query(q);
        }
        self.send(req).await
    }

    /// POST /api/trades
    pub async fn create(&self, input: &TradeInput) -> Result<Trade, ClientError> {
        let req = self.request(Method::POST, self.collection_url()?).json(input);
        self.send(req).await
    }

    /// GET /api/trades/:id; the server answers `null` when nothing matches
    pub async fn get_by_id(&self, id: &str, query: Option<&GetQuery>) -> Result<Option<Trade>, ClientError> {
        let mut req = self.request(Method::GET, self.item_url(id)?);
        if let Some(q) = query {
            req = req.query(q);
        }
        self.send(req).await
    }

    /// PUT /api/trades/:id with any JSON body (full record or partial fields)
    pub async fn update_by_id<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> Result<Trade, ClientError> {
        let req = self.request(Method::PUT, self.item_url(id)?).json(body);
        self.send(req).await
    }

    /// DELETE /api/trades/:id
    pub async fn delete_by_id(&self, id: &str) -> Result<Option<Trade>, ClientError> {
        let req = self.request(Method::DELETE, self.item_url(id)?);
        self.send(req).await
    }

    fn collection_url(&self) -> Result<Url, ClientError> {
        Ok(self.base_url.join("api/trades")?)
    }

    /// The id is pushed as one percent-encoded path segment
    fn item_url(&self, id: &str) -> Result<Url, ClientError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(ClientError::Status { status: status.as_u16(), body });
    }

    // empty bodies decode like `null` so Option targets become None
    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = TradesClient::new("http://localhost:3000/v1", None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url().join("api/trades").unwrap().as_str(), "http://localhost:3000/v1/api/trades");
    }

    #[test]
    fn item_ids_stay_in_one_path_segment() {
        let client = TradesClient::new("http://localhost:3000/v1/", None, Duration::from_secs(5)).unwrap();
        let url = client.item_url("a#b/c?d").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/v1/api/trades/a%23b%2Fc%3Fd");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn server_message_reads_json_body() {
        let err = ClientError::Status {
            status: 405,
            body: r#"{"message":"Method PATCH not allowed","code":"METHOD_NOT_ALLOWED"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(405));
        assert_eq!(err.server_message().as_deref(), Some("Method PATCH not allowed"));
    }
}
