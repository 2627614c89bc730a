//! Messages crossing the boundary between the page-side scanner and the
//! privileged resolver, and the in-process implementation of that boundary.
//!
//! On the wire a request is JSON, e.g. `{"kind":"searchProfessor","name":"Jane Smith"}`.
//! The response is the serialized rating record (`"4.2 - 37"` or `"N/A"`), or
//! nothing when no answer could be produced.

use crate::lookup::LookupClient;
use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LookupRequest {
    SearchProfessor { name: String },
    /// Manual refresh ping; acknowledged with an empty response.
    Update,
}

impl LookupRequest {
    pub fn search(name: impl Into<String>) -> Self {
        LookupRequest::SearchProfessor { name: name.into() }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Serialized rating record, or `None` when nothing could be resolved.
pub type LookupResponse = Option<String>;

/// Request/response channel to the resolver. Exactly one response per request.
pub trait Transport {
    fn request(&self, request: LookupRequest) -> LocalBoxFuture<'_, LookupResponse>;
}

/// The privileged side: answers requests using a [`LookupClient`].
///
/// Unavailable ratings are answered with `"N/A"` rather than nothing, so the
/// caller can cache the negative result like any other.
pub struct RatingService {
    lookup: LookupClient,
}

impl RatingService {
    pub fn new(lookup: LookupClient) -> Self {
        Self { lookup }
    }

    pub async fn handle(&self, request: LookupRequest) -> LookupResponse {
        match request {
            LookupRequest::SearchProfessor { name } => {
                debug!("Resolving professor {}", name);
                let record = self.lookup.resolve(&name).await;
                Some(record.to_string())
            }
            LookupRequest::Update => {
                info!("Manual update requested");
                None
            }
        }
    }

    /// Handle a JSON-encoded request. Undecodable requests get no response.
    pub async fn handle_json(&self, json: &str) -> LookupResponse {
        match LookupRequest::from_json(json) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("Dropping undecodable request: {}", e);
                None
            }
        }
    }
}

/// Transport that calls a [`RatingService`] living in the same context.
pub struct LocalTransport {
    service: RatingService,
}

impl LocalTransport {
    pub fn new(service: RatingService) -> Self {
        Self { service }
    }
}

impl Transport for LocalTransport {
    fn request(&self, request: LookupRequest) -> LocalBoxFuture<'_, LookupResponse> {
        self.service.handle(request).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        assert_eq!(
            LookupRequest::search("Jane Smith").to_json().unwrap(),
            r#"{"kind":"searchProfessor","name":"Jane Smith"}"#
        );
        assert_eq!(LookupRequest::Update.to_json().unwrap(), r#"{"kind":"update"}"#);
        assert_eq!(
            LookupRequest::from_json(r#"{"name":"A. Lee","kind":"searchProfessor"}"#).unwrap(),
            LookupRequest::search("A. Lee")
        );
        assert!(LookupRequest::from_json(r#"{"kind":"deleteEverything"}"#).is_err());
    }
}
