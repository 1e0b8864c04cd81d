//! Core quote calculation functions.
//!
//! Pure functions for shipping cost math - no database access.
//! The only ambient input is the clock, used for the tracking code suffix.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{ConversionFactor, Locker, Promotion, RewardTier, TransportMode};
use super::tracking::TrackingStatus;

/// Fixed tax rate applied after discounts
pub const TAX_RATE: Decimal = dec!(0.13);

/// Flat surcharge when the package has no destination address on file
pub const HOME_DELIVERY_FEE: Decimal = dec!(2.50);

const ONE_HUNDRED: Decimal = dec!(100);

/// Round to specified decimal places, halves away from zero.
///
/// This matches how amounts have always been displayed to customers
/// (`0.125` shows as `0.13`, not `0.12`).
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use envios_web::quoting::round_money;
///
/// assert_eq!(round_money(dec!(8.136), 2), dec!(8.14));
/// assert_eq!(round_money(dec!(0.125), 2), dec!(0.13));
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as a fixed two-decimal string for invoice lines.
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = round_money(amount, 2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(2);
    rounded.to_string()
}

/// Errors raised while quoting a package
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuoteError {
    #[error("Unknown transport mode id {0}")]
    UnknownTransportMode(i32),

    #[error("Conversion factor {factor_id} has a zero divisor")]
    ZeroDivisor { factor_id: i32 },

    #[error("Locker {locker_code} has no {mode} rate")]
    MissingRate {
        locker_code: String,
        mode: TransportMode,
    },

    #[error("Quote amount out of range")]
    Overflow,

    #[error("Invalid quote input: {}", .errors.join("; "))]
    InvalidInput { errors: Vec<String> },
}

/// Display priority of an invoice line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinePriority {
    Important,
    Default,
    Promo,
}

/// One line of the itemized invoice. Order of lines is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub priority: LinePriority,
    pub label: String,
    pub value: String,
}

impl InvoiceLine {
    fn new(priority: LinePriority, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            priority,
            label: label.into(),
            value: value.into(),
        }
    }

    fn important(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(LinePriority::Important, label, value)
    }

    fn regular(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(LinePriority::Default, label, value)
    }

    fn promo(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(LinePriority::Promo, label, value)
    }
}

/// Shipment facts entered by the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDeclaration {
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub declared_value: Option<Decimal>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    /// Real weight in kg
    #[serde(with = "rust_decimal::serde::str")]
    pub weight: Decimal,
    /// Dimensions in cm
    #[serde(with = "rust_decimal::serde::str")]
    pub length: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub width: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub height: Decimal,
    /// Destination address on file; when present no home delivery is charged
    #[serde(default)]
    pub address_id: Option<Uuid>,
}

/// Everything needed to quote one package, resolved by the caller
#[derive(Debug, Clone)]
pub struct QuotePayload {
    pub declaration: PackageDeclaration,
    pub locker: Locker,
    pub factor: ConversionFactor,
    pub reward_tier: Option<RewardTier>,
}

/// A quoted package ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippablePackage {
    #[serde(flatten)]
    pub declaration: PackageDeclaration,
    pub locker_id: Uuid,
    pub factor_id: i32,
    pub tracking_code: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub invoice: Vec<InvoiceLine>,
    pub status: TrackingStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Quote a package at the current time.
pub fn quote(
    payload: &QuotePayload,
    promotion: Option<&Promotion>,
) -> Result<ShippablePackage, QuoteError> {
    quote_at(payload, promotion, Utc::now())
}

/// Quote a package, building the tracking code from `now`.
///
/// Inputs are trusted: only conditions that make the arithmetic itself
/// impossible are reported. Use [`quote_strict`] for untrusted input.
///
/// Invoice lines are emitted in this order: real weight, volumetric weight,
/// billable weight, base tariff, reward (always), promotion (only when
/// applied), tax, home delivery (only without address), total.
pub fn quote_at(
    payload: &QuotePayload,
    promotion: Option<&Promotion>,
    now: DateTime<Utc>,
) -> Result<ShippablePackage, QuoteError> {
    let declaration = &payload.declaration;
    let factor = &payload.factor;
    let mode = TransportMode::try_from(factor.id).map_err(QuoteError::UnknownTransportMode)?;

    let mut invoice = Vec::with_capacity(9);

    invoice.push(InvoiceLine::important(
        "Peso Real (kg)",
        format_money(declaration.weight),
    ));

    if factor.divisor.is_zero() {
        return Err(QuoteError::ZeroDivisor {
            factor_id: factor.id,
        });
    }
    let volumetric = declaration
        .length
        .checked_mul(declaration.width)
        .and_then(|v| v.checked_mul(declaration.height))
        .and_then(|v| v.checked_div(factor.divisor))
        .ok_or(QuoteError::Overflow)?;
    invoice.push(InvoiceLine::important(
        "Peso Volumétrico (kg)",
        format_money(volumetric),
    ));

    let billable = declaration.weight.max(volumetric);
    invoice.push(InvoiceLine::important(
        "Peso Facturable (kg)",
        format_money(billable),
    ));

    let rate = payload
        .locker
        .rate_for(mode)
        .ok_or_else(|| QuoteError::MissingRate {
            locker_code: payload.locker.code.clone(),
            mode,
        })?;
    let mut cost = billable.checked_mul(rate).ok_or(QuoteError::Overflow)?;
    invoice.push(InvoiceLine::regular(
        format!("Tarifa Base (${}/kg)", format_money(rate)),
        format_money(cost),
    ));

    // Reward first, then promotion on the already discounted amount
    match payload
        .reward_tier
        .as_ref()
        .filter(|tier| tier.discount_percent > Decimal::ZERO)
    {
        Some(tier) => {
            let discount = percent_of(cost, tier.discount_percent)?;
            cost = cost.checked_sub(discount).ok_or(QuoteError::Overflow)?;
            invoice.push(InvoiceLine::promo(
                format!("Descuento Recompensa ({}%)", tier.discount_percent.normalize()),
                format_money(-discount),
            ));
        }
        None => invoice.push(InvoiceLine::promo("Sin Recompensa", "0")),
    }

    if let Some(promo) = promotion.filter(|p| p.discount_percent > Decimal::ZERO) {
        let discount = percent_of(cost, promo.discount_percent)?;
        cost = cost.checked_sub(discount).ok_or(QuoteError::Overflow)?;
        invoice.push(InvoiceLine::promo(
            format!("Descuento Promoción ({}%)", promo.discount_percent.normalize()),
            format_money(-discount),
        ));
    }

    let tax = cost.checked_mul(TAX_RATE).ok_or(QuoteError::Overflow)?;
    cost = cost.checked_add(tax).ok_or(QuoteError::Overflow)?;
    invoice.push(InvoiceLine::regular("Impuesto (13%)", format_money(tax)));

    // Untaxed
    if declaration.address_id.is_none() {
        cost = cost
            .checked_add(HOME_DELIVERY_FEE)
            .ok_or(QuoteError::Overflow)?;
        invoice.push(InvoiceLine::regular(
            "Entrega a Domicilio",
            format_money(HOME_DELIVERY_FEE),
        ));
    }

    invoice.push(InvoiceLine::important("Total", format_money(cost)));

    Ok(ShippablePackage {
        declaration: declaration.clone(),
        locker_id: payload.locker.id,
        factor_id: factor.id,
        tracking_code: tracking_code(&payload.locker.code, now),
        total: round_money(cost, 2),
        invoice,
        status: TrackingStatus::default(),
        active: true,
        created_at: now,
    })
}

/// Validate every input, then quote.
pub fn quote_strict(
    payload: &QuotePayload,
    promotion: Option<&Promotion>,
    now: DateTime<Utc>,
) -> Result<ShippablePackage, QuoteError> {
    validate_payload(payload, promotion)?;
    quote_at(payload, promotion, now)
}

/// Check the quote inputs, collecting every problem found.
pub fn validate_payload(
    payload: &QuotePayload,
    promotion: Option<&Promotion>,
) -> Result<(), QuoteError> {
    let declaration = &payload.declaration;
    let mut errors = Vec::new();

    for (field, value) in [
        ("weight", declaration.weight),
        ("length", declaration.length),
        ("width", declaration.width),
        ("height", declaration.height),
    ] {
        if value <= Decimal::ZERO {
            errors.push(format!("{} must be positive", field));
        }
    }

    if payload.factor.divisor <= Decimal::ZERO {
        errors.push("divisor must be positive".to_string());
    }

    match TransportMode::try_from(payload.factor.id) {
        Ok(mode) => match payload.locker.rate_for(mode) {
            Some(rate) if rate < Decimal::ZERO => {
                errors.push(format!("{} rate must not be negative", mode));
            }
            Some(_) => {}
            None => errors.push(format!("locker {} has no {} rate", payload.locker.code, mode)),
        },
        Err(id) => errors.push(format!("unknown transport mode id {}", id)),
    }

    if let Some(tier) = &payload.reward_tier {
        if !is_percentage(tier.discount_percent) {
            errors.push("reward discount must be between 0 and 100".to_string());
        }
    }
    if let Some(promo) = promotion {
        if !is_percentage(promo.discount_percent) {
            errors.push("promotion discount must be between 0 and 100".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(QuoteError::InvalidInput { errors })
    }
}

fn percent_of(amount: Decimal, percent: Decimal) -> Result<Decimal, QuoteError> {
    amount
        .checked_mul(percent / ONE_HUNDRED)
        .ok_or(QuoteError::Overflow)
}

fn is_percentage(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= ONE_HUNDRED
}

/// `{locker_code}-{last 8 digits of the epoch millis}`
pub fn tracking_code(locker_code: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{:08}",
        locker_code,
        now.timestamp_millis().rem_euclid(100_000_000)
    )
}
