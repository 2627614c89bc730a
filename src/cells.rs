//! Instructor cell discovery strategy.
//!
//! Strategies are tried in order and the first one that yields anything
//! wins. The query is supplied by the caller, so the DOM stays out of here.

use crate::config::INSTRUCTOR_SELECTORS;
use log::{debug, info};

/// Run `query` over `strategies` in order, returning the first non-empty
/// result with the strategy that produced it.
pub fn first_match<'s, T, P>(strategies: &[&'s str], mut query: P) -> Option<(&'s str, Vec<T>)>
where
    P: FnMut(&str) -> Vec<T>,
{
    for &strategy in strategies {
        let found = query(strategy);
        if !found.is_empty() {
            debug!("Found {} instructor cells using selector: {}", found.len(), strategy);
            return Some((strategy, found));
        }
    }
    None
}

/// [`first_match`] over the default instructor selectors.
pub fn find_instructor_cells<T, P>(query: P) -> Vec<T>
where
    P: FnMut(&str) -> Vec<T>,
{
    match first_match(INSTRUCTOR_SELECTORS, query) {
        Some((_, cells)) => cells,
        None => {
            info!("No instructor cells found");
            Vec::new()
        }
    }
}
