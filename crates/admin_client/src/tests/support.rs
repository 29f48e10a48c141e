//! In-memory [`HttpTransport`] double shared by the service and screen tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::RemoteError,
    transport::{ApiResponse, HttpTransport},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type Reply = Result<ApiResponse, RemoteError>;

/// Replies are queued per `(method, route)`; the last queued reply for a route
/// keeps being served. GET routes that carry a `page` query are addressed as
/// `"<path>?page=<n>"`.
#[derive(Default)]
pub struct RecordingTransport {
    replies: Mutex<HashMap<(&'static str, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &'static str, route: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .expect("replies lock")
            .entry((method, route.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(data: Value) -> Reply {
        Ok(ApiResponse { status: 200, data })
    }

    pub fn no_content() -> Reply {
        Ok(ApiResponse {
            status: 204,
            data: Value::Null,
        })
    }

    pub fn status(status: u16, message: Option<&str>) -> Reply {
        Err(RemoteError::Status {
            status,
            message: message.map(str::to_string),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    fn reply(&self, method: &'static str, route: String) -> Reply {
        let mut replies = self.replies.lock().expect("replies lock");
        let queue = replies.get_mut(&(method, route.clone()));
        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("non-empty queue"),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(RemoteError::Status {
                status: 404,
                message: Some(format!("no reply for {method} {route}")),
            }),
        }
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Reply {
        self.record(RecordedCall {
            method: "GET",
            path: path.to_string(),
            query: query.to_vec(),
            body: None,
        });
        let route = match query.iter().find(|(k, _)| k == "page") {
            Some((_, page)) => format!("{path}?page={page}"),
            None => path.to_string(),
        };
        self.reply("GET", route)
    }

    async fn put(&self, path: &str, body: Option<Value>) -> Reply {
        self.record(RecordedCall {
            method: "PUT",
            path: path.to_string(),
            query: Vec::new(),
            body,
        });
        self.reply("PUT", path.to_string())
    }

    async fn delete(&self, path: &str) -> Reply {
        self.record(RecordedCall {
            method: "DELETE",
            path: path.to_string(),
            query: Vec::new(),
            body: None,
        });
        self.reply("DELETE", path.to_string())
    }
}
