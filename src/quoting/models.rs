//! Database models for quoting reference data and stored packages.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.
//! The column names are aliased to these field names in `queries.rs`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::calculators::InvoiceLine;

/// Transport mode of a conversion factor.
///
/// The numeric id is the primary key of the factor row and decides which
/// rate column of the locker is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Air,
    Ground,
    Sea,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Air => "air",
            TransportMode::Ground => "ground",
            TransportMode::Sea => "sea",
        }
    }
}

impl TryFrom<i32> for TransportMode {
    type Error = i32;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(TransportMode::Air),
            2 => Ok(TransportMode::Ground),
            3 => Ok(TransportMode::Sea),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locker from casilleros
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Locker {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub country: String,
    pub air_rate: Option<Decimal>,
    pub ground_rate: Option<Decimal>,
    pub sea_rate: Option<Decimal>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Locker {
    /// Per-kg rate charged for the given transport mode
    pub fn rate_for(&self, mode: TransportMode) -> Option<Decimal> {
        match mode {
            TransportMode::Air => self.air_rate,
            TransportMode::Ground => self.ground_rate,
            TransportMode::Sea => self.sea_rate,
        }
    }
}

/// ConversionFactor from factores_conversion
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConversionFactor {
    pub id: i32,
    pub name: String,
    pub divisor: Decimal,
}

/// RewardTier from recompensas
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RewardTier {
    pub id: Uuid,
    pub name: String,
    pub discount_percent: Decimal,
    #[serde(default)]
    pub min_points: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Promotion from promociones
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: Decimal,
    pub valid_from: DateTime<Utc>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Promotion {
    /// Check if the promotion can be applied at the given time
    pub fn is_valid_at(&self, check_time: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if self.valid_from > check_time {
            return false;
        }
        match self.valid_to {
            Some(end) => check_time < end,
            None => true,
        }
    }
}

/// Customer points balance from usuarios
#[derive(Debug, Clone, FromRow)]
pub struct CustomerPoints {
    pub id: Uuid,
    pub points: i32,
}

/// Package from paquetes
#[derive(Debug, Clone, FromRow)]
pub struct PackageRow {
    pub id: Uuid,
    pub tracking_code: String,
    pub user_id: Uuid,
    pub locker_id: Uuid,
    pub factor_id: i32,
    pub description: String,
    pub declared_value: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub weight: Decimal,
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub address_id: Option<Uuid>,
    pub total: Decimal,
    pub invoice: Json<Vec<InvoiceLine>>,
    pub status: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}
