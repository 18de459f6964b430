//! Scripted [`Transport`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::Transport;
use crate::error::TransportError;

/// Canned reply for one URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Status(u16),
    Refused,
    /// Never completes; for deadline and cancellation tests
    Hang,
}

impl Reply {
    pub fn body(body: &str) -> Self {
        Self::Body(body.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Bytes>,
}

/// Unscripted URLs are refused.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, Reply>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(mut self, url: &str, reply: Reply) -> Self {
        self.routes.insert(url.to_owned(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn post_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "POST")
            .map(|c| c.url)
            .collect()
    }

    async fn reply(
        &self,
        method: &'static str,
        url: &str,
        body: Option<Bytes>,
    ) -> Result<Bytes, TransportError> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_owned(),
            body,
        });

        match self.routes.get(url).cloned() {
            Some(Reply::Body(body)) => Ok(Bytes::from(body)),
            Some(Reply::Status(code)) => Err(TransportError::HttpStatus {
                status: http::StatusCode::from_u16(code).unwrap(),
                body_preview: String::new(),
            }),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Refused) | None => Err(TransportError::Transport(
                format!("connection refused: {url}").into(),
            )),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<Bytes, TransportError> {
        self.reply("GET", url, None).await
    }

    async fn post_json(&self, url: &str, body: Bytes) -> Result<Bytes, TransportError> {
        self.reply("POST", url, Some(body)).await
    }
}
