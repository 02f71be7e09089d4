//! Scripted transport for tests and offline simulations.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use async_trait::async_trait;

use crate::{FetchError, HttpRequest, HttpResponse, Method, Transport};

/// What the mock answers for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A response (any status).
    Respond(HttpResponse),
    /// A transport failure, e.g. network down.
    Fail(String),
    /// Never completes.
    Pending,
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

/// Transport answering from scripted replies keyed by method and path.
///
/// Replies for a route are consumed in order; the last one repeats.
/// Unrouted requests get a `404`. Every request is recorded before the
/// reply is produced.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<HttpRequest>>,
    latency: Cell<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield to the executor `polls` times before answering, so other
    /// handlers can run while a request is in flight.
    pub fn with_latency(self, polls: usize) -> Self {
        self.latency.set(polls);
        self
    }

    /// Queue a reply for `method path`.
    pub fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut routes = self.routes.borrow_mut();
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Queue a JSON reply.
    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.push(method, path, Reply::Respond(HttpResponse::json(status, &body)));
    }

    /// Queue a plain-text reply.
    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Reply::Respond(HttpResponse::new(status, body)));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        let mut routes = self.routes.borrow_mut();
        let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == request.path())
        else {
            return Reply::Respond(HttpResponse::new(404, "Not Found"));
        };
        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap_or(Reply::Pending)
        } else {
            route.replies.front().cloned().unwrap_or(Reply::Pending)
        }
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let reply = self.next_reply(&request);
        self.requests.borrow_mut().push(request);

        for _ in 0..self.latency.get() {
            tokio::task::yield_now().await;
        }

        match reply {
            Reply::Respond(resp) => Ok(resp),
            Reply::Fail(message) => Err(FetchError::Connection(message)),
            Reply::Pending => std::future::pending().await,
        }
    }
}
