//! Score arithmetic for finalized attempts.
//!
//! Percentages round half up: 1 of 8 (12.5%) reports 13 and 7 of 8 (87.5%)
//! reports 88. The computation stays in integer arithmetic.

/// `round(correct / total * 100)` with ties rounded up. An empty attempt
/// scores zero.
pub fn score_percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    ((200 * correct + total) / (2 * total)) as u8
}

pub fn is_passing(score: u8, passing_threshold: u8) -> bool {
    score >= passing_threshold
}
