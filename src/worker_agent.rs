//! Web Worker agent hosting the rating resolver, and the page-side
//! transport that talks to it.
//!
//! Requests travel as JSON strings (`{"kind":"searchProfessor","name":...}`)
//! tagged with a sequence number; the worker answers each one with the same
//! number and the serialized record or `None`.

use crate::config::{LookupConfig, LOOKUP_CONFIG_URL};
use crate::lookup::LookupClient;
use crate::transport::{LookupRequest, LookupResponse, RatingService, Transport};
use crate::web::fetch::FetchClient;
use crate::web::timer::GlooSleeper;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::lock::Mutex;
use futures::sink::SinkExt;
use futures::StreamExt;
use log::{debug, warn};
use std::cell::Cell;
use std::rc::Rc;
use yew_agent::reactor::{reactor, ReactorBridge, ReactorScope};
use yew_agent::Spawnable;

/// Worker reactor answering lookup requests one at a time, in order.
#[reactor]
pub async fn RatingTask(mut scope: ReactorScope<(u64, String), (u64, LookupResponse)>) {
    let http = Rc::new(FetchClient);
    let sleeper = Rc::new(GlooSleeper);
    let config = LookupConfig::load(&*http, &*sleeper, LOOKUP_CONFIG_URL).await;
    let service = RatingService::new(LookupClient::new(http, sleeper, config));

    while let Some((seq, request)) = scope.next().await {
        let response = service.handle_json(&request).await;

        // abort loop if all bridges dropped
        if scope.send((seq, response)).await.is_err() {
            break;
        }
    }
}

/// Transport backed by a [`RatingTask`] worker.
///
/// The bridge is held for a whole request/response exchange. A caller that
/// gives up mid-exchange releases it; the late answer is recognised by its
/// sequence number and dropped by the next caller.
pub struct WorkerTransport {
    bridge: Mutex<ReactorBridge<RatingTask>>,
    next_seq: Cell<u64>,
}

impl WorkerTransport {
    pub fn spawn(script: &str) -> Self {
        Self {
            bridge: Mutex::new(<RatingTask as Spawnable>::spawner().spawn(script)),
            next_seq: Cell::new(0),
        }
    }
}

impl Transport for WorkerTransport {
    fn request(&self, request: LookupRequest) -> LocalBoxFuture<'_, LookupResponse> {
        async move {
            let payload = match request.to_json() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Could not encode request: {}", e);
                    return None;
                }
            };
            let seq = self.next_seq.get();
            self.next_seq.set(seq.wrapping_add(1));

            let mut bridge = self.bridge.lock().await;
            if bridge.send((seq, payload)).await.is_err() {
                warn!("Rating worker is gone");
                return None;
            }
            while let Some((answered, response)) = bridge.next().await {
                if answered == seq {
                    return response;
                }
                debug!("Dropping late answer #{}", answered);
            }
            None
        }
        .boxed_local()
    }
}
