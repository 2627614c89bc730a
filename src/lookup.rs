//! Remote rating resolution.
//!
//! One name is resolved through an ordered chain of tiers, first success
//! wins:
//! 1. structured search for the full name within the institution scope,
//! 2. the same search with only the surname (only when step 1 found nothing),
//! 3. a fetch of the guessed profile page, scanned as plain text.
//!
//! A transport failure or error payload in step 1 skips straight to step 3.
//! When several teachers match, the first one returned is used as is.
//! Every failure folds into [`RatingRecord::Unavailable`]; this module never
//! touches the cache.

use crate::config::LookupConfig;
use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::key::NameParts;
use crate::rating::{Rating, RatingRecord};
use crate::timer::{with_timeout, Sleeper};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::rc::Rc;

static AVG_RATING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)avgRating["\s:]+([0-9.]+)"#).unwrap());
static NUM_RATINGS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)numRatings["\s:]+([0-9]+)"#).unwrap());

const SEARCH_QUERY: &str = r#"query NewSearchTeachersQuery($text: String!, $schoolID: ID) {
  newSearch {
    teachers(query: {text: $text, schoolID: $schoolID}) {
      edges {
        node {
          id
          firstName
          lastName
          school { name id }
          avgRating
          numRatings
          wouldTakeAgainPercent
          avgDifficulty
        }
      }
    }
  }
}"#;

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'static str,
    variables: SearchVariables<'a>,
}

#[derive(Serialize)]
struct SearchVariables<'a> {
    text: &'a str,
    #[serde(rename = "schoolID")]
    school_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    data: Option<SearchData>,
    errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchData {
    new_search: Option<NewSearch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewSearch {
    teachers: Option<TeacherConnection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeacherConnection {
    edges: Vec<TeacherEdge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeacherEdge {
    node: Option<TeacherRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct School {
    pub id: String,
    pub name: String,
}

/// One candidate returned by the structured search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub school: Option<School>,
    pub avg_rating: Option<f64>,
    pub num_ratings: Option<u32>,
    pub would_take_again_percent: Option<f64>,
    pub avg_difficulty: Option<f64>,
}

impl TeacherRecord {
    fn rating(&self) -> Option<Rating> {
        self.avg_rating
            .map(|avg| Rating::new(avg, self.num_ratings.unwrap_or(0)))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SearchOutcome {
    /// First candidate, which carries an average rating.
    Match(TeacherRecord, Rating),
    NoMatch,
    /// Transport failure, non-success status or an error payload.
    Failed(String),
}

/// Resolves names to ratings against the remote service.
pub struct LookupClient {
    http: Rc<dyn HttpClient>,
    sleeper: Rc<dyn Sleeper>,
    config: LookupConfig,
}

impl LookupClient {
    pub fn new(http: Rc<dyn HttpClient>, sleeper: Rc<dyn Sleeper>, config: LookupConfig) -> Self {
        Self {
            http,
            sleeper,
            config,
        }
    }

    /// Resolve `full_name` through the tier chain. Never fails.
    pub async fn resolve(&self, full_name: &str) -> RatingRecord {
        let name = full_name.trim();
        if name.is_empty() {
            debug!("Refusing to look up a blank name");
            return RatingRecord::Unavailable;
        }
        let parts = NameParts::split(name);

        match self.search(name).await {
            SearchOutcome::Match(teacher, rating) => {
                return accept(name, "full name", &teacher, rating)
            }
            SearchOutcome::NoMatch => {
                debug!("No teachers found for {}, trying surname {}", name, parts.last);
                match self.search(parts.last).await {
                    SearchOutcome::Match(teacher, rating) => {
                        return accept(name, "surname", &teacher, rating)
                    }
                    SearchOutcome::NoMatch => debug!("No teachers found for surname {}", parts.last),
                    SearchOutcome::Failed(reason) => {
                        warn!("Surname search for {} failed: {}", parts.last, reason)
                    }
                }
            }
            SearchOutcome::Failed(reason) => warn!("Search for {} failed: {}", name, reason),
        }

        self.profile_page(parts).await
    }

    async fn search(&self, text: &str) -> SearchOutcome {
        let payload = SearchRequest {
            query: SEARCH_QUERY,
            variables: SearchVariables {
                text,
                school_id: &self.config.school_id,
            },
        };
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => return SearchOutcome::Failed(e.to_string()),
        };
        let request = HttpRequest::post(self.config.graphql_url.as_str(), body)
            .header("Content-Type", "application/json")
            .header("Authorization", self.config.auth_header.as_str());

        debug!("Searching teachers for \"{}\"", text);
        match self.fetch(request).await {
            Ok(response) if response.is_success() => parse_search(&response.body),
            Ok(response) => SearchOutcome::Failed(format!("HTTP status {}", response.status)),
            Err(e) => SearchOutcome::Failed(e.to_string()),
        }
    }

    async fn profile_page(&self, parts: NameParts<'_>) -> RatingRecord {
        let url = profile_url(&self.config, parts);
        debug!("Trying profile page {}", url);

        let response = match self.fetch(HttpRequest::get(url.as_str())).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                warn!("Profile page {} returned status {}", url, response.status);
                return RatingRecord::Unavailable;
            }
            Err(e) => {
                warn!("Profile page fetch failed: {}", e);
                return RatingRecord::Unavailable;
            }
        };

        match extract_page_rating(&response.body) {
            Some(rating) => {
                let record = RatingRecord::Resolved(rating);
                info!("Extracted {} from {}", record, url);
                record
            }
            None => {
                info!("No rating found on {}", url);
                RatingRecord::Unavailable
            }
        }
    }

    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = request.url.clone();
        let after_ms = self.config.request_timeout_ms;
        with_timeout(self.sleeper.as_ref(), after_ms, self.http.send(request))
            .await
            .unwrap_or(Err(HttpError::Timeout { url, after_ms }))
    }
}

fn parse_search(body: &str) -> SearchOutcome {
    let parsed: SearchResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Malformed search response treated as no match: {}", e);
            return SearchOutcome::NoMatch;
        }
    };

    if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
        return SearchOutcome::Failed(format!("{} error(s) in search response", errors.len()));
    }

    parsed
        .data
        .and_then(|data| data.new_search)
        .and_then(|search| search.teachers)
        .and_then(|teachers| teachers.edges.into_iter().next())
        .and_then(|edge| edge.node)
        .and_then(|teacher| teacher.rating().map(|rating| SearchOutcome::Match(teacher, rating)))
        .unwrap_or(SearchOutcome::NoMatch)
}

fn accept(name: &str, tier: &str, teacher: &TeacherRecord, rating: Rating) -> RatingRecord {
    let record = RatingRecord::Resolved(rating);
    info!(
        "Found {} {} for {} by {}: {}",
        teacher.first_name, teacher.last_name, name, tier, record
    );
    record
}

/// Best-effort profile page URL for `first-last` under the legacy school id.
pub fn profile_url(config: &LookupConfig, parts: NameParts<'_>) -> String {
    format!(
        "{}/{}/{}",
        config.profile_base_url.trim_end_matches('/'),
        config.legacy_school_id,
        encode_uri_component(&format!("{}-{}", parts.first, parts.last))
    )
}

/// Pull `avgRating` and `numRatings` out of unstructured page text.
///
/// A missing review count defaults to zero; a missing or unparsable average
/// means no rating.
pub fn extract_page_rating(page: &str) -> Option<Rating> {
    let score: f64 = AVG_RATING_REGEX
        .captures(page)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    let count = NUM_RATINGS_REGEX
        .captures(page)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0);
    Some(Rating::new(score, count))
}

// Same unreserved set as JavaScript's encodeURIComponent.
fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_rating_from_embedded_json() {
        let page = r#"<script>{"legacyId":1,"avgRating":4.25,"numRatings":41}</script>"#;
        assert_eq!(extract_page_rating(page), Some(Rating::new(4.3, 41)));
    }

    #[test]
    fn missing_count_defaults_to_zero() {
        assert_eq!(extract_page_rating("AVGRATING: 3.7"), Some(Rating::new(3.7, 0)));
    }

    #[test]
    fn unparsable_page_has_no_rating() {
        assert_eq!(extract_page_rating("<html>Professor not found</html>"), None);
        assert_eq!(extract_page_rating(r#""avgRating": ..."#), None);
    }

    #[test]
    fn profile_url_encodes_name() {
        let config = LookupConfig::default();
        assert_eq!(
            profile_url(&config, NameParts::split("José O'Neil")),
            "https://www.ratemyprofessors.com/professor/877/Jos%C3%A9-O'Neil"
        );
    }

    #[test]
    fn search_with_errors_is_a_failure() {
        let body = r#"{"data":null,"errors":[{"message":"rate limited"}]}"#;
        assert!(matches!(parse_search(body), SearchOutcome::Failed(_)));
    }

    #[test]
    fn first_match_without_rating_is_no_match() {
        let body = r#"{"data":{"newSearch":{"teachers":{"edges":[{"node":{"firstName":"A","lastName":"Lee"}}]}}}}"#;
        assert_eq!(parse_search(body), SearchOutcome::NoMatch);
    }

    #[test]
    fn first_rated_match_carries_its_rating() {
        let body = r#"{"data":{"newSearch":{"teachers":{"edges":[{"node":{"firstName":"A","lastName":"Lee","avgRating":3.5}}]}}}}"#;
        match parse_search(body) {
            SearchOutcome::Match(teacher, rating) => {
                assert_eq!(teacher.last_name, "Lee");
                assert_eq!(rating, Rating::new(3.5, 0));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn malformed_body_is_no_match() {
        assert_eq!(parse_search("<html>"), SearchOutcome::NoMatch);
        assert_eq!(parse_search("{}"), SearchOutcome::NoMatch);
    }
}
