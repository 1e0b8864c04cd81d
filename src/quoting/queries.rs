//! Database queries for the quoting engine.
//!
//! Column names of the managed store are aliased onto the model field names.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::calculators::ShippablePackage;
use super::models::{ConversionFactor, CustomerPoints, Locker, PackageRow, Promotion, RewardTier};
use super::tracking::TrackingStatus;

/// Get a locker by id
pub async fn get_locker(pool: &PgPool, locker_id: Uuid) -> Result<Option<Locker>, AppError> {
    let locker = sqlx::query_as::<_, Locker>(
        r#"
        SELECT
            id,
            codigo AS code,
            nombre AS name,
            pais AS country,
            tarifa_aereo AS air_rate,
            tarifa_terrestre AS ground_rate,
            tarifa_maritimo AS sea_rate,
            activo AS active
        FROM casilleros
        WHERE id = $1
        "#,
    )
    .bind(locker_id)
    .fetch_optional(pool)
    .await?;

    Ok(locker)
}

/// Get all active lockers (for cache warming)
pub async fn get_active_lockers(pool: &PgPool) -> Result<Vec<Locker>, AppError> {
    let lockers = sqlx::query_as::<_, Locker>(
        r#"
        SELECT
            id,
            codigo AS code,
            nombre AS name,
            pais AS country,
            tarifa_aereo AS air_rate,
            tarifa_terrestre AS ground_rate,
            tarifa_maritimo AS sea_rate,
            activo AS active
        FROM casilleros
        WHERE activo = true
        ORDER BY codigo
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(lockers)
}

/// Get a conversion factor by id
pub async fn get_conversion_factor(
    pool: &PgPool,
    factor_id: i32,
) -> Result<Option<ConversionFactor>, AppError> {
    let factor = sqlx::query_as::<_, ConversionFactor>(
        r#"
        SELECT id, nombre AS name, divisor
        FROM factores_conversion
        WHERE id = $1
        "#,
    )
    .bind(factor_id)
    .fetch_optional(pool)
    .await?;

    Ok(factor)
}

/// Get all conversion factors (for cache warming)
pub async fn get_conversion_factors(pool: &PgPool) -> Result<Vec<ConversionFactor>, AppError> {
    let factors = sqlx::query_as::<_, ConversionFactor>(
        r#"
        SELECT id, nombre AS name, divisor
        FROM factores_conversion
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(factors)
}

/// Get all reward tiers
pub async fn get_reward_tiers(pool: &PgPool) -> Result<Vec<RewardTier>, AppError> {
    let tiers = sqlx::query_as::<_, RewardTier>(
        r#"
        SELECT
            id,
            nombre AS name,
            porcentaje_descuento AS discount_percent,
            puntos_minimos AS min_points,
            activo AS active
        FROM recompensas
        ORDER BY puntos_minimos
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(tiers)
}

/// Get the points balance of a customer
pub async fn get_customer_points(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<CustomerPoints>, AppError> {
    let points = sqlx::query_as::<_, CustomerPoints>(
        r#"
        SELECT id, puntos AS points
        FROM usuarios
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(points)
}

/// Find a promotion valid at `check_time` by its code (case-insensitive)
pub async fn find_promotion_by_code(
    pool: &PgPool,
    code: &str,
    check_time: DateTime<Utc>,
) -> Result<Option<Promotion>, AppError> {
    let promotion = sqlx::query_as::<_, Promotion>(
        r#"
        SELECT
            id,
            codigo AS code,
            porcentaje_descuento AS discount_percent,
            valido_desde AS valid_from,
            valido_hasta AS valid_to,
            activo AS active
        FROM promociones
        WHERE UPPER(codigo) = UPPER($1)
          AND activo = true
          AND valido_desde <= $2
          AND (valido_hasta IS NULL OR valido_hasta > $2)
        ORDER BY valido_desde DESC
        LIMIT 1
        "#,
    )
    .bind(code)
    .bind(check_time)
    .fetch_optional(pool)
    .await?;

    Ok(promotion)
}

/// Store a quoted package, returning its row id
pub async fn insert_package(
    pool: &PgPool,
    user_id: Uuid,
    package: &ShippablePackage,
) -> Result<Uuid, AppError> {
    let declaration = &package.declaration;
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO paquetes (
            id, codigo_rastreo, usuario_id, casillero_id, factor_id,
            descripcion, valor_declarado, categoria_id,
            peso, largo, ancho, alto, direccion_id,
            total, factura, estado, activo, creado_en
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&package.tracking_code)
    .bind(user_id)
    .bind(package.locker_id)
    .bind(package.factor_id)
    .bind(&declaration.description)
    .bind(declaration.declared_value)
    .bind(declaration.category_id)
    .bind(declaration.weight)
    .bind(declaration.length)
    .bind(declaration.width)
    .bind(declaration.height)
    .bind(declaration.address_id)
    .bind(package.total)
    .bind(Json(&package.invoice))
    .bind(package.status.as_str())
    .bind(package.active)
    .bind(package.created_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get a package by tracking code
pub async fn get_package_by_tracking_code(
    pool: &PgPool,
    tracking_code: &str,
) -> Result<Option<PackageRow>, AppError> {
    let package = sqlx::query_as::<_, PackageRow>(
        r#"
        SELECT
            id,
            codigo_rastreo AS tracking_code,
            usuario_id AS user_id,
            casillero_id AS locker_id,
            factor_id,
            descripcion AS description,
            valor_declarado AS declared_value,
            categoria_id AS category_id,
            peso AS weight,
            largo AS length,
            ancho AS width,
            alto AS height,
            direccion_id AS address_id,
            total,
            factura AS invoice,
            estado AS status,
            activo AS active,
            creado_en AS created_at
        FROM paquetes
        WHERE codigo_rastreo = $1
        "#,
    )
    .bind(tracking_code)
    .fetch_optional(pool)
    .await?;

    Ok(package)
}

/// Move a package from `from` to `to`. Returns false if the stored status
/// was no longer `from`.
pub async fn update_package_status(
    pool: &PgPool,
    tracking_code: &str,
    from: TrackingStatus,
    to: TrackingStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE paquetes
        SET estado = $3
        WHERE codigo_rastreo = $1
          AND estado = $2
        "#,
    )
    .bind(tracking_code)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
