/*!
 * Transaction helper
 *
 * Every engine write runs through [`with_transaction`]: commit on `Ok`, rollback on `Err`,
 * with the caller's `ServiceError` preserved instead of being flattened into a `DbErr`.
 */

use metrics::counter;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

use crate::errors::ServiceError;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// ```rust,ignore
/// let order = with_transaction(&db, move |txn| {
///     Box::pin(async move {
///         let order = order_model.insert(txn).await?;
///         for item in items {
///             item.insert(txn).await?;
///         }
///         Ok(order)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    let result = db.transaction::<F, T, ServiceError>(f).await;
    if result.is_err() {
        counter!("procurement_db.transaction.rolled_back", 1);
        warn!("Transaction rolled back");
    }
    result.map_err(ServiceError::from)
}
