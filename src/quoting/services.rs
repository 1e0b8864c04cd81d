//! Quoting service functions with database access.
//!
//! These functions resolve the quote context through the cache and database,
//! hand it to the pure calculators and persist the result.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::{AppError, Result};

use super::calculators::{quote_strict, QuotePayload, ShippablePackage};
use super::models::{Locker, Promotion};
use super::queries;
use super::requests::{PreviewQuoteRequest, QuoteRequest};
use super::responses::{PackageResponse, StatusResponse};
use super::rewards::resolve_tier;
use super::tracking::{can_transition, TrackingStatus};

/// Quote a package from stored lockers, factors, tiers and promotions.
///
/// The customer's reward tier is derived from their current points. An
/// unknown or expired promotion code fails the quote instead of being
/// silently dropped.
pub async fn quote_package(
    pool: &PgPool,
    cache: &AppCache,
    request: &QuoteRequest,
    now: DateTime<Utc>,
) -> Result<ShippablePackage> {
    let locker = cache
        .locker(pool, request.locker_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Locker {}", request.locker_id)))?;
    ensure_active(&locker)?;

    let factor = cache
        .factor(pool, request.factor_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversion factor {}", request.factor_id)))?;

    let customer = queries::get_customer_points(pool, request.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer {}", request.user_id)))?;
    let tiers = cache.reward_tiers(pool).await?;
    let reward_tier = resolve_tier(&tiers, customer.points).cloned();

    let promotion = match request.promotion_code() {
        Some(code) => Some(require_promotion(
            code,
            queries::find_promotion_by_code(pool, code, now).await?,
        )?),
        None => None,
    };

    let payload = QuotePayload {
        declaration: request.declaration.clone(),
        locker: (*locker).clone(),
        factor: (*factor).clone(),
        reward_tier,
    };

    let package = quote_strict(&payload, promotion.as_ref(), now)?;

    info!(
        locker = %locker.code,
        factor_id = factor.id,
        reward = payload.reward_tier.as_ref().map(|t| t.name.as_str()).unwrap_or("none"),
        promotion = promotion.as_ref().map(|p| p.code.as_str()).unwrap_or("none"),
        total = %package.total,
        "Quoted package {}",
        package.tracking_code
    );

    Ok(package)
}

/// Quote with all context supplied by the caller. No database access.
pub fn preview_quote(request: &PreviewQuoteRequest, now: DateTime<Utc>) -> Result<ShippablePackage> {
    if let Some(promotion) = &request.promotion {
        if !promotion.is_valid_at(now) {
            return Err(AppError::BadRequest(format!(
                "Promotion {} is not valid",
                promotion.code
            )));
        }
    }

    let payload = QuotePayload {
        declaration: request.declaration.clone(),
        locker: request.locker.clone(),
        factor: request.factor.clone(),
        reward_tier: request.reward_tier.clone(),
    };

    Ok(quote_strict(&payload, request.promotion.as_ref(), now)?)
}

/// Quote and store a package for the requesting customer.
pub async fn register_package(
    pool: &PgPool,
    cache: &AppCache,
    request: &QuoteRequest,
    now: DateTime<Utc>,
) -> Result<(Uuid, ShippablePackage)> {
    let package = quote_package(pool, cache, request, now).await?;

    let id = queries::insert_package(pool, request.user_id, &package)
        .await
        .map_err(|e| insert_error(&package.tracking_code, e))?;

    info!("Registered package {} ({})", package.tracking_code, id);
    Ok((id, package))
}

/// Look up a stored package by tracking code.
pub async fn find_package(pool: &PgPool, tracking_code: &str) -> Result<PackageResponse> {
    let row = queries::get_package_by_tracking_code(pool, tracking_code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Package {}", tracking_code)))?;

    PackageResponse::try_from(row).map_err(AppError::Internal)
}

/// Move a package to the next tracking status.
pub async fn advance_status(
    pool: &PgPool,
    tracking_code: &str,
    to: TrackingStatus,
) -> Result<StatusResponse> {
    let package = find_package(pool, tracking_code).await?;
    let from = package.status;

    ensure_transition(tracking_code, from, to)?;
    ensure_updated(
        tracking_code,
        queries::update_package_status(pool, tracking_code, from, to).await?,
    )?;

    info!("Package {} moved from {} to {}", tracking_code, from, to);

    Ok(StatusResponse {
        tracking_code: tracking_code.to_string(),
        previous: from,
        status: to,
        status_label: to.label(),
    })
}

fn ensure_active(locker: &Locker) -> Result<()> {
    if locker.active {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Locker {} is not active",
            locker.code
        )))
    }
}

fn require_promotion(code: &str, found: Option<Promotion>) -> Result<Promotion> {
    found.ok_or_else(|| AppError::NotFound(format!("Promotion {}", code)))
}

/// A unique violation on insert means the tracking code is already taken
fn insert_error(tracking_code: &str, err: AppError) -> AppError {
    match err {
        AppError::Database(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!("Tracking code collision for {}", tracking_code);
            AppError::Conflict(format!("Tracking code {} already exists", tracking_code))
        }
        other => other,
    }
}

fn ensure_transition(tracking_code: &str, from: TrackingStatus, to: TrackingStatus) -> Result<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move package {} from {} to {}",
            tracking_code, from, to
        )))
    }
}

/// `updated` is false when another writer moved the package first
fn ensure_updated(tracking_code: &str, updated: bool) -> Result<()> {
    if updated {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Package {} changed status concurrently",
            tracking_code
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quoting::calculators::PackageDeclaration;
    use crate::quoting::models::ConversionFactor;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn preview(promotion: Option<Promotion>) -> PreviewQuoteRequest {
        PreviewQuoteRequest {
            declaration: PackageDeclaration {
                description: "Ropa".to_string(),
                declared_value: None,
                category_id: None,
                weight: dec!(2),
                length: dec!(30),
                width: dec!(20),
                height: dec!(10),
                address_id: Some(Uuid::new_v4()),
            },
            locker: Locker {
                id: Uuid::new_v4(),
                code: "MIA".to_string(),
                name: "Miami".to_string(),
                country: "US".to_string(),
                air_rate: Some(dec!(5)),
                ground_rate: None,
                sea_rate: None,
                active: true,
            },
            factor: ConversionFactor {
                id: 1,
                name: "Aéreo".to_string(),
                divisor: dec!(5000),
            },
            reward_tier: None,
            promotion,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn promotion(valid_to: Option<DateTime<Utc>>) -> Promotion {
        Promotion {
            id: Uuid::new_v4(),
            code: "MARZO".to_string(),
            discount_percent: dec!(50),
            valid_from: now() - Duration::days(1),
            valid_to,
            active: true,
        }
    }

    #[test]
    fn test_preview_quote_applies_valid_promotion() {
        let package = preview_quote(&preview(Some(promotion(None))), now()).unwrap();
        // 10.00 - 50% = 5.00, + 13% = 5.65
        assert_eq!(package.total, dec!(5.65));
    }

    #[test]
    fn test_preview_quote_rejects_expired_promotion() {
        let expired = promotion(Some(now() - Duration::hours(1)));
        match preview_quote(&preview(Some(expired)), now()) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("MARZO")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_preview_quote_rejects_invalid_declaration() {
        let mut request = preview(None);
        request.declaration.weight = dec!(0);
        assert!(matches!(
            preview_quote(&request, now()),
            Err(AppError::Quote(_))
        ));
    }

    // ==================== failure mapping tests ====================

    #[derive(Debug)]
    struct DuplicateKey;

    impl std::fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn test_inactive_locker_is_bad_request() {
        let mut locker = preview(None).locker;
        assert!(ensure_active(&locker).is_ok());

        locker.active = false;
        match ensure_active(&locker) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Locker MIA is not active"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_promotion_is_not_found() {
        let err = require_promotion("NOEXISTE", None).unwrap_err();
        assert!(matches!(&err, AppError::NotFound(what) if what == "Promotion NOEXISTE"));

        let found = require_promotion("MARZO", Some(promotion(None))).unwrap();
        assert_eq!(found.code, "MARZO");
    }

    #[test]
    fn test_tracking_code_collision_is_conflict() {
        let err = AppError::Database(sqlx::Error::Database(Box::new(DuplicateKey)));
        match insert_error("MIA-12345678", err) {
            AppError::Conflict(msg) => assert!(msg.contains("MIA-12345678")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_other_insert_errors_pass_through() {
        let err = insert_error("MIA-12345678", AppError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(err, AppError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        assert!(ensure_transition("MIA-1", TrackingStatus::Received, TrackingStatus::InTransit).is_ok());
        assert!(matches!(
            ensure_transition("MIA-1", TrackingStatus::Received, TrackingStatus::Delivered),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_lost_status_race_is_conflict() {
        assert!(ensure_updated("MIA-1", true).is_ok());
        match ensure_updated("MIA-1", false) {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("concurrently")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }
}
