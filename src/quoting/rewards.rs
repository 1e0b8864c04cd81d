//! Loyalty tier resolution.

use super::models::RewardTier;

/// Pick the tier a customer currently holds.
///
/// The customer holds the active tier with the highest `min_points` that
/// their balance reaches. Returns `None` below the lowest tier.
pub fn resolve_tier(tiers: &[RewardTier], points: i32) -> Option<&RewardTier> {
    tiers
        .iter()
        .filter(|tier| tier.active && tier.min_points <= points)
        .max_by_key(|tier| tier.min_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quoting::models::Promotion;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn tier(name: &str, pct: Decimal, min_points: i32, active: bool) -> RewardTier {
        RewardTier {
            id: Uuid::new_v4(),
            name: name.to_string(),
            discount_percent: pct,
            min_points,
            active,
        }
    }

    fn tiers() -> Vec<RewardTier> {
        vec![
            tier("Oro", dec!(15), 1000, true),
            tier("Bronce", dec!(5), 100, true),
            tier("Plata", dec!(10), 500, true),
            tier("Platino", dec!(20), 5000, false),
        ]
    }

    // ==================== resolve_tier tests ====================

    #[test]
    fn test_resolve_tier_picks_highest_reached() {
        let tiers = tiers();
        assert_eq!(resolve_tier(&tiers, 750).map(|t| t.name.as_str()), Some("Plata"));
        assert_eq!(resolve_tier(&tiers, 1000).map(|t| t.name.as_str()), Some("Oro"));
    }

    #[test]
    fn test_resolve_tier_below_lowest() {
        assert!(resolve_tier(&tiers(), 99).is_none());
        assert!(resolve_tier(&[], 10_000).is_none());
    }

    #[test]
    fn test_resolve_tier_ignores_inactive() {
        let tiers = tiers();
        assert_eq!(resolve_tier(&tiers, 9000).map(|t| t.name.as_str()), Some("Oro"));
    }

    // ==================== promotion validity tests ====================

    fn promotion(active: bool, days_left: Option<i64>) -> Promotion {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Promotion {
            id: Uuid::new_v4(),
            code: "VERANO".to_string(),
            discount_percent: dec!(20),
            valid_from: start,
            valid_to: days_left.map(|d| start + Duration::days(d)),
            active,
        }
    }

    #[test]
    fn test_promotion_valid_within_window() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        assert!(promotion(true, Some(10)).is_valid_at(at));
        assert!(promotion(true, None).is_valid_at(at));
    }

    #[test]
    fn test_promotion_invalid_outside_window() {
        let before = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 11, 0, 0, 0).unwrap();
        assert!(!promotion(true, Some(10)).is_valid_at(before));
        assert!(!promotion(true, Some(10)).is_valid_at(end));
    }

    #[test]
    fn test_promotion_inactive() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
        assert!(!promotion(false, None).is_valid_at(at));
    }
}
