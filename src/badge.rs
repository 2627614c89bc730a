//! Display text and colour for a rating annotation.

use crate::rating::RatingRecord;

/// Colour band of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
    Excellent,
    Fair,
    Poor,
    Bad,
    /// Below 1.0, or no rating at all.
    Neutral,
}

impl RatingBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 4.0 {
            RatingBand::Excellent
        } else if score >= 3.0 {
            RatingBand::Fair
        } else if score >= 2.0 {
            RatingBand::Poor
        } else if score >= 1.0 {
            RatingBand::Bad
        } else {
            RatingBand::Neutral
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RatingBand::Excellent => "#28a745",
            RatingBand::Fair => "#ffc107",
            RatingBand::Poor => "#fd7e14",
            RatingBand::Bad => "#dc3545",
            RatingBand::Neutral => "#4A90E2",
        }
    }
}

/// What gets appended next to an instructor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub band: RatingBand,
}

impl Badge {
    pub fn for_record(record: &RatingRecord) -> Self {
        match record {
            RatingRecord::Resolved(rating) => Badge {
                text: format!(
                    " ({} | {} reviews)",
                    rating.score_text(),
                    rating.review_count()
                ),
                band: RatingBand::for_score(rating.score()),
            },
            RatingRecord::Unavailable => Badge {
                text: format!(" ({})", record),
                band: RatingBand::Neutral,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::Rating;

    #[test]
    fn resolved_badge() {
        let badge = Badge::for_record(&RatingRecord::Resolved(Rating::new(4.2, 37)));
        assert_eq!(badge.text, " (4.2 | 37 reviews)");
        assert_eq!(badge.band, RatingBand::Excellent);
    }

    #[test]
    fn unavailable_badge() {
        let badge = Badge::for_record(&RatingRecord::Unavailable);
        assert_eq!(badge.text, " (N/A)");
        assert_eq!(badge.band.color(), "#4A90E2");
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(RatingBand::for_score(3.0), RatingBand::Fair);
        assert_eq!(RatingBand::for_score(2.9), RatingBand::Poor);
        assert_eq!(RatingBand::for_score(1.0), RatingBand::Bad);
        assert_eq!(RatingBand::for_score(0.0), RatingBand::Neutral);
    }
}
