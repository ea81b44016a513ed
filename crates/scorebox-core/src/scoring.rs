/// Penalty assigned per innings when a run fails or its innings totals
/// cannot be resolved.
pub const PENALTY_PER_INNINGS: i64 = 999;
pub const PENALTY_TOTAL: i64 = 2 * PENALTY_PER_INNINGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorBreakdown {
    pub error_i1: i64,
    pub error_i2: i64,
    pub total: i64,
}

impl ErrorBreakdown {
    pub fn penalty() -> Self {
        Self {
            error_i1: PENALTY_PER_INNINGS,
            error_i2: PENALTY_PER_INNINGS,
            total: PENALTY_TOTAL,
        }
    }
}

/// Absolute per-innings error and their sum. Pure; callers handle
/// unresolved inputs via the fixed penalty instead.
pub fn innings_error(
    predicted_i1: i64,
    predicted_i2: i64,
    actual_i1: i64,
    actual_i2: i64,
) -> ErrorBreakdown {
    let error_i1 = (predicted_i1 - actual_i1).abs();
    let error_i2 = (predicted_i2 - actual_i2).abs();
    ErrorBreakdown {
        error_i1,
        error_i2,
        total: error_i1 + error_i2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_absolute_differences() {
        let e = innings_error(165, 158, 170, 150);
        assert_eq!(e.error_i1, 5);
        assert_eq!(e.error_i2, 8);
        assert_eq!(e.total, 13);
    }

    #[test]
    fn sign_symmetric() {
        let over = innings_error(180, 160, 170, 150);
        let under = innings_error(160, 140, 170, 150);
        assert_eq!(over.total, under.total);
        assert_eq!(over.error_i1, 10);
        assert_eq!(under.error_i1, 10);
    }

    #[test]
    fn exact_prediction_scores_zero() {
        let e = innings_error(170, 150, 170, 150);
        assert_eq!(e.total, 0);
    }

    #[test]
    fn penalty_matches_constants() {
        let p = ErrorBreakdown::penalty();
        assert_eq!(p.error_i1, 999);
        assert_eq!(p.error_i2, 999);
        assert_eq!(p.total, 1998);
    }
}
