//! Functions exported to extension glue code.

use crate::badge::Badge;
use crate::key::derive_key;
use crate::rating::RatingRecord;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RatingView {
    score: Option<f64>,
    review_count: Option<u32>,
    label: String,
    color: &'static str,
}

/// Cache key for a raw instructor name, e.g. `"J. SMITH"`.
#[wasm_bindgen(js_name = deriveCacheKey)]
pub fn derive_cache_key(raw_name: &str) -> String {
    derive_key(raw_name).to_string()
}

/// Decode a stored rating string into `{ score, reviewCount, label, color }`,
/// or `null` if it is not a rating.
#[wasm_bindgen(js_name = describeRating)]
pub fn describe_rating(serialized: &str) -> JsValue {
    let Ok(record) = serialized.parse::<RatingRecord>() else {
        return JsValue::NULL;
    };
    let badge = Badge::for_record(&record);
    let (score, review_count) = match record {
        RatingRecord::Resolved(rating) => (Some(rating.score()), Some(rating.review_count())),
        RatingRecord::Unavailable => (None, None),
    };
    let view = RatingView {
        score,
        review_count,
        label: badge.text.trim().to_string(),
        color: badge.band.color(),
    };
    serde_wasm_bindgen::to_value(&view).unwrap_or(JsValue::NULL)
}
