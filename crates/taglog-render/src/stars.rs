//! Star compression: a deliberately non-linear map from raw vote counts
//! to a small display rating, so a handful of high-vote tags do not
//! dominate visually.

/// `round(log2(round(v / (avg + 1)) + 1))`, floored at zero stars for
/// ties, negative votes, and any non-finite intermediate.
pub fn star_count(votes: i64, avg: f64) -> usize {
    let base = (votes as f64 / (avg + 1.0)).round() + 1.0;
    if base <= 0.0 {
        return 0;
    }
    let stars = base.log2().round();
    if !stars.is_finite() || stars <= 0.0 {
        0
    } else {
        stars as usize
    }
}

/// Mean vote count of the rendered set.
pub fn average_votes(votes: impl IntoIterator<Item = i64>) -> f64 {
    let mut sum = 0i64;
    let mut count = 0usize;
    for v in votes {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
