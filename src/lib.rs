//! Instructor rating resolution for course roster pages.
//!
//! Raw names found on a page are turned into cached, display-ready ratings:
//! [`ScanCoordinator`] deduplicates a scan and consults the [`CacheStore`],
//! misses go across a [`Transport`] to a [`RatingService`], which resolves
//! them with the tiered [`LookupClient`]. [`ChangeWatcher`] re-runs scans
//! when the page changes.

pub mod badge;
pub mod cache;
pub mod cells;
pub mod config;
pub mod http;
pub mod key;
pub mod logging;
pub mod lookup;
pub mod rating;
pub mod scan;
pub mod timer;
pub mod transport;
pub mod watch;

#[cfg(target_arch = "wasm32")]
pub mod web;
#[cfg(target_arch = "wasm32")]
pub mod worker_agent;

pub use badge::{Badge, RatingBand};
pub use cache::{CacheError, CacheStore, MemoryCache};
pub use config::{LookupConfig, WatchPolicy};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, Method};
pub use key::{derive_key, CacheKey, NameParts};
pub use lookup::{LookupClient, TeacherRecord};
pub use rating::{Rating, RatingParseError, RatingRecord, Resolution};
pub use scan::{ScanCoordinator, ScanReport, ScanSession, Skip};
pub use timer::{Scheduler, Sleeper};
pub use transport::{LocalTransport, LookupRequest, LookupResponse, RatingService, Transport};
pub use watch::ChangeWatcher;
