//! Scan coordination: turns the names found in one page scan into rendered
//! ratings, consulting the cache first and the resolver for misses.
//!
//! Within a scan each distinct name is handled once, in page order. Across
//! overlapping scans, a key whose lookup is still pending is joined rather
//! than dispatched again; the pending lookup writes the cache exactly once.
//! A lookup that gets no answer within the transport timeout is deferred and
//! leaves the registry, so a later scan asks again.

use crate::cache::CacheStore;
use crate::config::{PLACEHOLDER_NAME, TRANSPORT_TIMEOUT_MS};
use crate::key::{derive_key, CacheKey};
use crate::rating::{RatingRecord, Resolution};
use crate::timer::{with_timeout, Sleeper};
use crate::transport::{LookupRequest, Transport};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

type PendingLookup = Shared<LocalBoxFuture<'static, Resolution>>;
type InFlight = Rc<RefCell<HashMap<CacheKey, PendingLookup>>>;

/// Drops a key from the in-flight registry when its lookup ends, whether it
/// completed or was dropped unfinished.
struct InFlightEntry {
    registry: InFlight,
    key: CacheKey,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        // The removed lookup is released after the borrow ends.
        let removed = self.registry.borrow_mut().remove(&self.key);
        drop(removed);
    }
}

/// Names already handled during one scan pass.
#[derive(Debug, Default)]
pub struct ScanSession {
    seen: HashSet<String>,
}

/// Why a name was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Blank,
    Placeholder,
    Duplicate,
}

impl ScanSession {
    /// Admit a trimmed name, or say why it is skipped.
    pub fn admit(&mut self, name: &str) -> Result<(), Skip> {
        if name.is_empty() {
            Err(Skip::Blank)
        } else if name == PLACEHOLDER_NAME {
            Err(Skip::Placeholder)
        } else if !self.seen.insert(name.to_string()) {
            Err(Skip::Duplicate)
        } else {
            Ok(())
        }
    }
}

/// Counters for one scan pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub skipped: usize,
    pub cache_hits: usize,
    /// New lookups sent across the transport.
    pub dispatched: usize,
    /// Misses that joined a lookup already pending from another scan.
    pub joined: usize,
    pub rendered: usize,
    /// Names left unannotated because no answer came back.
    pub deferred: usize,
}

pub struct ScanCoordinator {
    cache: Rc<dyn CacheStore>,
    transport: Rc<dyn Transport>,
    sleeper: Rc<dyn Sleeper>,
    timeout_ms: u32,
    in_flight: InFlight,
}

impl ScanCoordinator {
    pub fn new(
        cache: Rc<dyn CacheStore>,
        transport: Rc<dyn Transport>,
        sleeper: Rc<dyn Sleeper>,
    ) -> Self {
        Self {
            cache,
            transport,
            sleeper,
            timeout_ms: TRANSPORT_TIMEOUT_MS,
            in_flight: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Bound each transport round trip to `ms` instead of the default.
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Number of lookups currently pending across all scans.
    pub fn in_flight(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Process the names of one scan, calling `render` for each name that
    /// ends up with a record (cached or freshly resolved).
    pub async fn process_scan<I, S, F>(&self, raw_names: I, mut render: F) -> ScanReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str, &RatingRecord),
    {
        let mut report = ScanReport::default();
        let mut session = ScanSession::default();
        let mut pending = FuturesUnordered::new();

        for raw in raw_names {
            let name = raw.as_ref().trim();
            if let Err(reason) = session.admit(name) {
                debug!("Skipping {:?} ({:?})", name, reason);
                report.skipped += 1;
                continue;
            }

            let key = derive_key(name);
            let lookup = match self.pending_lookup(&key) {
                Some(existing) => {
                    debug!("Joining pending lookup for {}", key);
                    report.joined += 1;
                    existing
                }
                None => {
                    if let Some(record) = self.cache.get(&key).await {
                        debug!("Using cached data for {}: {}", key, record);
                        report.cache_hits += 1;
                        report.rendered += 1;
                        render(name, &record);
                        continue;
                    }
                    let (lookup, joined) = self.lookup_for(name, key);
                    if joined {
                        report.joined += 1;
                    } else {
                        report.dispatched += 1;
                    }
                    lookup
                }
            };
            let name = name.to_string();
            pending.push(async move { (name, lookup.await) });
        }

        while let Some((name, resolution)) = pending.next().await {
            match resolution.record() {
                Some(record) => {
                    report.rendered += 1;
                    render(&name, &record);
                }
                None => {
                    info!("No rating found for {}", name);
                    report.deferred += 1;
                }
            }
        }

        debug!("Scan finished: {:?}", report);
        report
    }

    fn pending_lookup(&self, key: &CacheKey) -> Option<PendingLookup> {
        self.in_flight.borrow().get(key).cloned()
    }

    /// The pending lookup for `key`, creating it if none is in flight.
    /// The flag says whether an existing lookup was joined.
    fn lookup_for(&self, name: &str, key: CacheKey) -> (PendingLookup, bool) {
        if let Some(existing) = self.pending_lookup(&key) {
            debug!("Joining pending lookup for {}", key);
            return (existing, true);
        }

        info!("No cached data for {}, requesting lookup of {}", key, name);
        let transport = Rc::clone(&self.transport);
        let cache = Rc::clone(&self.cache);
        let sleeper = Rc::clone(&self.sleeper);
        let timeout_ms = self.timeout_ms;
        let request = LookupRequest::search(name);
        let entry = InFlightEntry {
            registry: Rc::clone(&self.in_flight),
            key: key.clone(),
        };

        let lookup = async move {
            // Another scan's lookup may have stored this key while our cache
            // read was suspended.
            if let Some(record) = cache.get(&entry.key).await {
                debug!("{} was stored while waiting, skipping lookup", entry.key);
                return Resolution::from(record);
            }

            let answer = with_timeout(&*sleeper, timeout_ms, transport.request(request)).await;
            let response = match answer {
                Some(response) => response,
                None => {
                    warn!("No answer for {} after {}ms", entry.key, timeout_ms);
                    None
                }
            };
            let resolution = Resolution::from_response(response.as_deref());
            if let Some(record) = resolution.record() {
                if let Err(e) = cache.set(&entry.key, &record).await {
                    warn!("{}", e);
                }
            }
            resolution
        }
        .boxed_local()
        .shared();

        self.in_flight.borrow_mut().insert(key, lookup.clone());
        (lookup, false)
    }
}
