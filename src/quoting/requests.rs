//! Request DTOs for quoting API endpoints.

use serde::Deserialize;
use uuid::Uuid;

use super::calculators::PackageDeclaration;
use super::models::{ConversionFactor, Locker, Promotion, RewardTier};
use super::tracking::TrackingStatus;

/// Request to quote a package from stored reference data
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub user_id: Uuid,
    pub locker_id: Uuid,
    pub factor_id: i32,
    #[serde(flatten)]
    pub declaration: PackageDeclaration,
    #[serde(default)]
    pub promotion_code: Option<String>,
}

impl QuoteRequest {
    /// Promotion code with surrounding whitespace removed, `None` when blank
    pub fn promotion_code(&self) -> Option<&str> {
        self.promotion_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

/// Request to quote with every input supplied inline (cost calculator)
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewQuoteRequest {
    pub declaration: PackageDeclaration,
    pub locker: Locker,
    pub factor: ConversionFactor,
    #[serde(default)]
    pub reward_tier: Option<RewardTier>,
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

/// Request to move a package to its next tracking status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TrackingStatus,
}
