use crate::{
    db::DbPool,
    entities::discount::{self, Entity as DiscountEntity},
    errors::ServiceError,
    metrics::DISCOUNT_VALIDATION_FAILURES,
};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;

/// A discount code that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedDiscount {
    pub id: i32,
    pub code: String,
    /// Stored fraction, e.g. `0.1` for 10%
    #[schema(value_type = String, example = "0.1")]
    pub percentage: Decimal,
}

/// Last accepted instant for a code valid until `valid_until`: 23:59:59.999
/// of that day in `tz`.
pub fn end_of_validity(valid_until: NaiveDate, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let last_moment = valid_until.and_hms_milli_opt(23, 59, 59, 999)?;
    tz.from_local_datetime(&last_moment).single()
}

/// Pure expiry check, `now` supplied by the caller.
pub fn is_expired(valid_until: NaiveDate, tz: FixedOffset, now: DateTime<Utc>) -> bool {
    match end_of_validity(valid_until, tz) {
        Some(end) => now > end,
        None => true,
    }
}

/// Resolves discount codes against the `discounts` table. Never writes.
#[derive(Clone)]
pub struct DiscountService {
    db_pool: Arc<DbPool>,
    timezone: FixedOffset,
}

impl DiscountService {
    pub fn new(db_pool: Arc<DbPool>, timezone: FixedOffset) -> Self {
        Self { db_pool, timezone }
    }

    /// `Ok(None)` when no code was supplied.
    pub async fn validate_optional(
        &self,
        code: Option<&str>,
    ) -> Result<Option<ValidatedDiscount>, ServiceError> {
        match code {
            Some(code) => self.validate_code(code).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn validate_code(&self, code: &str) -> Result<ValidatedDiscount, ServiceError> {
        self.validate_code_at(code, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn validate_code_at(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ValidatedDiscount, ServiceError> {
        let record = DiscountEntity::find()
            .filter(discount::Column::Code.eq(code))
            .one(&*self.db_pool)
            .await?;

        let record = match record {
            Some(record) => record,
            None => return Err(reject(format!("Discount code '{}' not found", code))),
        };

        if !record.is_active {
            return Err(reject(format!("Discount code '{}' is not active", code)));
        }

        if let Some(valid_until) = record.valid_until {
            if is_expired(valid_until, self.timezone, now) {
                return Err(reject(format!("Discount code '{}' has expired", code)));
            }
        }

        Ok(ValidatedDiscount {
            id: record.id,
            code: record.code,
            percentage: record.amount.normalize(),
        })
    }
}

fn reject(message: String) -> ServiceError {
    warn!(reason = %message, "Discount code rejected");
    DISCOUNT_VALIDATION_FAILURES.inc();
    ServiceError::ValidationError(message)
}
