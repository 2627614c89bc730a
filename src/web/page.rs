//! Page-side wiring: finds instructor cells, renders badges and re-scans
//! when the roster changes.

use crate::badge::Badge;
use crate::cache::{CacheStore, MemoryCache};
use crate::cells::find_instructor_cells;
use crate::config::{WatchPolicy, BADGE_CLASS, NAME_ATTRIBUTE, WORKER_SCRIPT};
use crate::rating::RatingRecord;
use crate::scan::ScanCoordinator;
use crate::transport::Transport;
use crate::watch::ChangeWatcher;
use crate::web::storage::LocalStorageCache;
use crate::web::timer::{GlooScheduler, GlooSleeper};
use crate::worker_agent::WorkerTransport;
use log::{info, warn};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlElement, MutationObserver, MutationObserverInit, PageTransitionEvent};

/// Start annotating the current page.
pub fn start() {
    let cache: Rc<dyn CacheStore> = match LocalStorageCache::open() {
        Ok(cache) => Rc::new(cache),
        Err(e) => {
            warn!("{}; ratings will not persist", e);
            Rc::new(MemoryCache::new())
        }
    };
    let transport: Rc<dyn Transport> = Rc::new(WorkerTransport::spawn(WORKER_SCRIPT));
    let coordinator = Rc::new(ScanCoordinator::new(cache, transport, Rc::new(GlooSleeper)));

    let on_scan: Rc<dyn Fn()> = Rc::new(move || {
        let coordinator = Rc::clone(&coordinator);
        spawn_local(async move { scan_page(&coordinator).await });
    });

    let watcher = ChangeWatcher::new(GlooScheduler, WatchPolicy::default(), on_scan);
    watcher.start();
    if let Err(e) = follow_page_lifecycle(Rc::clone(&watcher)) {
        warn!("Could not listen for page unload: {:?}", e);
    }
    if let Err(e) = observe_mutations(watcher) {
        warn!("Could not watch the page for changes: {:?}", e);
    }
}

async fn scan_page(coordinator: &ScanCoordinator) {
    let names: Vec<String> = instructor_cells().iter().map(cell_name).collect();
    if names.is_empty() {
        return;
    }
    info!("Processing {} instructor cells", names.len());
    coordinator.process_scan(names, render_rating).await;
}

fn instructor_cells() -> Vec<HtmlElement> {
    let document = gloo_utils::document();
    find_instructor_cells(|selector| match document.query_selector_all(selector) {
        Ok(list) => (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .collect(),
        Err(e) => {
            warn!("Selector {} rejected: {:?}", selector, e);
            Vec::new()
        }
    })
}

/// The instructor name as it read before any badge was added.
fn cell_name(cell: &HtmlElement) -> String {
    cell.get_attribute(NAME_ATTRIBUTE)
        .unwrap_or_else(|| cell.inner_text())
        .trim()
        .to_string()
}

/// Render sink: annotate every cell showing `name`. Repeating a call with
/// the same record leaves the page untouched.
fn render_rating(name: &str, record: &RatingRecord) {
    let badge = Badge::for_record(record);
    for cell in instructor_cells() {
        if cell_name(&cell) != name {
            continue;
        }
        if let Err(e) = apply_badge(&cell, name, &badge) {
            warn!("Failed to annotate {}: {:?}", name, e);
        }
    }
}

fn apply_badge(cell: &HtmlElement, name: &str, badge: &Badge) -> Result<(), JsValue> {
    let existing = cell.query_selector(&format!("span.{}", BADGE_CLASS))?;
    if let Some(span) = &existing {
        if span.text_content().as_deref() == Some(badge.text.as_str()) {
            return Ok(());
        }
    }

    cell.set_attribute(NAME_ATTRIBUTE, name)?;
    let span = match existing {
        Some(span) => span,
        None => {
            let span = gloo_utils::document().create_element("span")?;
            span.set_class_name(BADGE_CLASS);
            cell.append_child(&span)?;
            span
        }
    };
    span.set_text_content(Some(&badge.text));
    span.set_attribute(
        "style",
        &format!("color: {}; font-weight: bold;", badge.band.color()),
    )?;
    Ok(())
}

fn observe_mutations(watcher: Rc<ChangeWatcher<GlooScheduler>>) -> Result<(), JsValue> {
    let callback = Closure::<dyn FnMut()>::new(move || watcher.notify_mutation());
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(&gloo_utils::body(), &options)?;

    // The observer lives as long as the page.
    callback.forget();
    Ok(())
}

/// Detach the watcher when the page is hidden for unload, and start it again
/// if the page is restored from the back/forward cache.
fn follow_page_lifecycle(watcher: Rc<ChangeWatcher<GlooScheduler>>) -> Result<(), JsValue> {
    let window = gloo_utils::window();

    let hidden = Rc::clone(&watcher);
    let on_hide = Closure::<dyn FnMut()>::new(move || hidden.detach());
    window.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref())?;

    let on_show = Closure::<dyn FnMut(PageTransitionEvent)>::new(move |event: PageTransitionEvent| {
        if event.persisted() {
            info!("Page restored, resuming");
            watcher.start();
        }
    });
    window.add_event_listener_with_callback("pageshow", on_show.as_ref().unchecked_ref())?;

    on_hide.forget();
    on_show.forget();
    Ok(())
}
