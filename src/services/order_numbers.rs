use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::errors::ServiceError;
use crate::models::order_number_sequence_entity::{self, Column, Entity as OrderNumberSequence};

pub const ORDER_NUMBER_PREFIX: &str = "PO";

/// `PO-YYYYMMDD-NNN`. The counter is zero-padded to three digits and widens past 999.
pub fn format_order_number(day: NaiveDate, sequence: i32) -> String {
    format!(
        "{}-{}-{:03}",
        ORDER_NUMBER_PREFIX,
        day.format("%Y%m%d"),
        sequence
    )
}

/// Allocates the next order number for the UTC day of `now`.
///
/// Must run inside the transaction that inserts the order: the counter row stays
/// write-locked until commit, and a rollback hands the number back.
pub async fn next_order_number<C>(conn: &C, now: DateTime<Utc>) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    let day = now.date_naive();
    let key = day.format("%Y%m%d").to_string();

    OrderNumberSequence::insert(order_number_sequence_entity::ActiveModel {
        day: Set(key.clone()),
        last_value: Set(0),
    })
    .on_conflict(OnConflict::column(Column::Day).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await
    .map_err(ServiceError::db_error)?;

    OrderNumberSequence::update_many()
        .col_expr(Column::LastValue, Expr::col(Column::LastValue).add(1))
        .filter(Column::Day.eq(key.as_str()))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let sequence = OrderNumberSequence::find_by_id(key.clone())
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|row| row.last_value)
        .ok_or_else(|| {
            ServiceError::db_error(format!("Order number sequence for {} vanished", key))
        })?;

    Ok(format_order_number(day, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_three_digits() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_order_number(day, 1), "PO-20250307-001");
        assert_eq!(format_order_number(day, 42), "PO-20250307-042");
    }

    #[test]
    fn widens_past_nine_hundred_ninety_nine() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(format_order_number(day, 1000), "PO-20251231-1000");
    }
}
