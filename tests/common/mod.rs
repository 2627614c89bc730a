#![allow(dead_code)]

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use roster_ratings::{
    CacheError, CacheKey, CacheStore, HttpClient, HttpError, HttpRequest, HttpResponse,
    LookupConfig, LookupClient, LookupRequest, LookupResponse, MemoryCache, Method, RatingRecord,
    Sleeper, Transport,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

pub enum Reply {
    Respond(u16, String),
    Fail(HttpError),
    Hang,
}

/// HTTP client answering from a closure and remembering every request.
pub struct ScriptedHttp {
    handler: Box<dyn Fn(&HttpRequest) -> Reply>,
    pub calls: RefCell<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn new(handler: impl Fn(&HttpRequest) -> Reply + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Search texts of all structured queries sent so far.
    pub fn search_texts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(search_text)
            .collect()
    }
}

impl HttpClient for ScriptedHttp {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, HttpError>> {
        let reply = (self.handler)(&request);
        self.calls.borrow_mut().push(request);
        match reply {
            Reply::Respond(status, body) => {
                future::ready(Ok(HttpResponse { status, body })).boxed_local()
            }
            Reply::Fail(e) => future::ready(Err(e)).boxed_local(),
            Reply::Hang => future::pending().boxed_local(),
        }
    }
}

/// The `text` variable of a structured search request.
pub fn search_text(request: &HttpRequest) -> Option<String> {
    if request.method != Method::Post {
        return None;
    }
    let body: serde_json::Value = serde_json::from_str(request.body.as_deref()?).ok()?;
    body["variables"]["text"].as_str().map(str::to_string)
}

/// A search response listing `(first, last, avgRating, numRatings)` teachers.
pub fn teachers(found: &[(&str, &str, f64, Option<u32>)]) -> String {
    let edges: Vec<serde_json::Value> = found
        .iter()
        .enumerate()
        .map(|(i, (first, last, avg, num))| {
            serde_json::json!({
                "node": {
                    "id": format!("VGVhY2hlci0{}", i),
                    "firstName": first,
                    "lastName": last,
                    "school": { "name": "State University", "id": "U2Nob29sLTg3Nw==" },
                    "avgRating": avg,
                    "numRatings": num,
                    "wouldTakeAgainPercent": 80.5,
                    "avgDifficulty": 3.1
                }
            })
        })
        .collect();
    serde_json::json!({ "data": { "newSearch": { "teachers": { "edges": edges } } } }).to_string()
}

pub fn no_teachers() -> String {
    teachers(&[])
}

pub struct NeverSleeper;

impl Sleeper for NeverSleeper {
    fn sleep(&self, _ms: u32) -> LocalBoxFuture<'static, ()> {
        future::pending().boxed_local()
    }
}

/// Every timeout elapses immediately.
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _ms: u32) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }
}

/// Timeouts stay pending until `expire` is called, then all elapse.
#[derive(Clone, Default)]
pub struct SwitchSleeper {
    expired: Rc<Cell<bool>>,
}

impl SwitchSleeper {
    pub fn expire(&self) {
        self.expired.set(true);
    }
}

impl Sleeper for SwitchSleeper {
    fn sleep(&self, _ms: u32) -> LocalBoxFuture<'static, ()> {
        let expired = Rc::clone(&self.expired);
        future::poll_fn(move |_| if expired.get() { Poll::Ready(()) } else { Poll::Pending })
            .boxed_local()
    }
}

pub fn lookup_client(http: Rc<ScriptedHttp>) -> LookupClient {
    LookupClient::new(http, Rc::new(NeverSleeper), LookupConfig::default())
}

/// Transport answering from a fixed table, optionally held until released.
pub struct FakeTransport {
    answers: HashMap<String, LookupResponse>,
    gate: Option<Shared<oneshot::Receiver<()>>>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new(answers: &[(&str, Option<&str>)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(name, answer)| (name.to_string(), answer.map(str::to_string)))
                .collect(),
            gate: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn gated(answers: &[(&str, Option<&str>)], gate: oneshot::Receiver<()>) -> Self {
        Self {
            gate: Some(gate.shared()),
            ..Self::new(answers)
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl Transport for FakeTransport {
    fn request(&self, request: LookupRequest) -> LocalBoxFuture<'_, LookupResponse> {
        async move {
            let LookupRequest::SearchProfessor { name } = request else {
                return None;
            };
            self.requests.borrow_mut().push(name.clone());
            if let Some(gate) = &self.gate {
                let _ = gate.clone().await;
            }
            self.answers.get(&name).cloned().flatten()
        }
        .boxed_local()
    }
}

/// Transport that records each request and never answers it.
#[derive(Default)]
pub struct SilentTransport {
    pub requests: Cell<usize>,
}

impl Transport for SilentTransport {
    fn request(&self, _request: LookupRequest) -> LocalBoxFuture<'_, LookupResponse> {
        self.requests.set(self.requests.get() + 1);
        future::pending().boxed_local()
    }
}

/// Returns `Pending` once, waking itself, then completes.
#[derive(Default)]
pub struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Memory cache whose reads take the value at call time but complete only
/// after yielding once, like a store backed by an async API.
#[derive(Default)]
pub struct SuspendingCache {
    pub inner: MemoryCache,
}

impl CacheStore for SuspendingCache {
    fn get<'a>(&'a self, key: &'a CacheKey) -> LocalBoxFuture<'a, Option<RatingRecord>> {
        let snapshot = self.inner.raw(key.as_str());
        async move {
            YieldOnce::default().await;
            snapshot.and_then(|raw| raw.parse().ok())
        }
        .boxed_local()
    }

    fn set<'a>(
        &'a self,
        key: &'a CacheKey,
        record: &'a RatingRecord,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>> {
        self.inner.set(key, record)
    }
}

/// Memory cache that counts writes.
#[derive(Default)]
pub struct RecordingCache {
    pub inner: MemoryCache,
    pub sets: Cell<usize>,
}

impl RecordingCache {
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self {
            inner: MemoryCache::with_entries(entries.iter().copied()),
            sets: Cell::new(0),
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.raw(key)
    }
}

impl CacheStore for RecordingCache {
    fn get<'a>(&'a self, key: &'a CacheKey) -> LocalBoxFuture<'a, Option<RatingRecord>> {
        self.inner.get(key)
    }

    fn set<'a>(
        &'a self,
        key: &'a CacheKey,
        record: &'a RatingRecord,
    ) -> LocalBoxFuture<'a, Result<(), CacheError>> {
        self.sets.set(self.sets.get() + 1);
        self.inner.set(key, record)
    }
}
