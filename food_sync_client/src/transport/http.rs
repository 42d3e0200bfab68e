use food_order_engine::{
    db_types::{Order, OrderId},
    order_objects::{OrdersResult, WalletSummary},
};
use futures::StreamExt;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
    RequestBuilder,
    Response,
};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use url::Url;

use super::{sse::SseParser, OrderSyncTransport, PushConnection};
use crate::errors::TransportError;

/// Frames buffered between the reader task and the sync manager.
const PUSH_BUFFER: usize = 64;

/// Talks to `food_order_server` on behalf of one signed-in user.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    server: Url,
    access_token: String,
}

impl HttpTransport {
    pub fn new(server: &str, access_token: impl Into<String>) -> Result<Self, TransportError> {
        let server = Url::parse(server)?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("Food Order Sync Client")
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::ConnectionError(format!("Failed to create HTTP client. {e}")))?;
        Ok(Self { client, server, access_token: access_token.into() })
    }

    pub fn server(&self) -> &str {
        self.server.as_str()
    }

    pub fn url(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.server.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let res = self.authorized(self.client.get(url)).send().await?;
        let res = check_status(res).await?;
        let value = res.json::<T>().await?;
        Ok(value)
    }
}

/// Turns non-2xx responses into [`TransportError::ServerError`], pulling the message out of the JSON error body if
/// there is one.
async fn check_status(res: Response) -> Result<Response, TransportError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    Err(TransportError::ServerError { status: status.as_u16(), message })
}

impl OrderSyncTransport for HttpTransport {
    async fn open_push(&self) -> Result<PushConnection, TransportError> {
        let url = self.url("/api/subscribe")?;
        let res = self
            .authorized(self.client.get(url))
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await?;
        let res = check_status(res).await?;
        let (tx, rx) = mpsc::channel(PUSH_BUFFER);
        let mut body = res.bytes_stream();
        tokio::spawn(async move {
            let mut parser = SseParser::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("🔄️ Push channel read failed. {e}");
                        let _ = tx.send(Err(TransportError::ConnectionError(e.to_string()))).await;
                        return;
                    },
                };
                for event in parser.feed(&chunk) {
                    if tx.send(event).await.is_err() {
                        trace!("🔄️ Push channel receiver dropped. Closing the connection.");
                        return;
                    }
                }
            }
            debug!("🔄️ Push channel closed by the server");
            let _ = tx.send(Err(TransportError::PushClosed)).await;
        });
        Ok(rx)
    }

    async fn fetch_active_orders(&self) -> Result<Vec<Order>, TransportError> {
        let mut url = self.url("/api/orders")?;
        url.query_pairs_mut().append_pair("state", "active");
        let result = self.get_json::<OrdersResult>(url).await?;
        Ok(result.orders)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, TransportError> {
        let mut url = self.url("/api/orders/")?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(format!("{} cannot be a base URL", self.server)))?
            .pop_if_empty()
            .push(order_id.as_str());
        self.get_json(url).await
    }

    async fn fetch_wallet(&self, limit: u32) -> Result<WalletSummary, TransportError> {
        let mut url = self.url("/api/wallet")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }
}
