//! Data access gateway - the one shared handle to the database.
//!
//! A [`Gateway`] owns the process's single `SQLite` connection and an optional explicit
//! transaction. Raw statements ([`Gateway::query`], [`Gateway::execute`]) and the business
//! operations in [`crate::core`] (through [`Gateway::atomic`]) all run on the explicit
//! transaction while one is open, so everything issued between [`Gateway::begin`] and
//! [`Gateway::commit`] forms one atomic unit. Every call takes the gateway lock for its
//! whole duration, which serializes access through the single handle.

use crate::config::database;
use crate::errors::{Error, Result};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, JsonValue, QueryResult,
    Statement, TransactionTrait, Value,
};
use std::{future::Future, pin::Pin};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// A column-keyed result row, as a JSON object.
pub type Row = JsonValue;

/// Outcome of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Number of rows changed
    pub rows_affected: u64,
    /// Row id of the last inserted row
    pub last_insert_id: u64,
}

/// Shared database gateway. Construct one at startup, pass it by reference, close it at
/// shutdown.
pub struct Gateway {
    db: DatabaseConnection,
    explicit: Mutex<Option<DatabaseTransaction>>,
}

impl Gateway {
    /// Opens the database at `database_url` and ensures the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = database::create_connection(database_url).await?;
        database::create_tables(&db).await?;
        Ok(Self::from_connection(db))
    }

    /// Wraps an already opened connection.
    #[must_use]
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self {
            db,
            explicit: Mutex::new(None),
        }
    }

    /// Starts an explicit transaction. Every following statement joins it until
    /// [`Gateway::commit`] or [`Gateway::rollback`].
    #[instrument(skip(self))]
    pub async fn begin(&self) -> Result<()> {
        let mut explicit = self.explicit.lock().await;
        if explicit.is_some() {
            return Err(Error::TransactionState {
                message: "begin called while a transaction is already open".to_string(),
            });
        }
        *explicit = Some(self.db.begin().await?);
        debug!("Explicit transaction started");
        Ok(())
    }

    /// Commits the explicit transaction.
    #[instrument(skip(self))]
    pub async fn commit(&self) -> Result<()> {
        let txn = self.take_explicit("commit").await?;
        txn.commit().await?;
        info!("Transaction committed");
        Ok(())
    }

    /// Rolls back the explicit transaction, discarding every statement since
    /// [`Gateway::begin`].
    #[instrument(skip(self))]
    pub async fn rollback(&self) -> Result<()> {
        let txn = self.take_explicit("rollback").await?;
        txn.rollback().await?;
        info!("Transaction rolled back");
        Ok(())
    }

    /// Whether an explicit transaction is currently open.
    pub async fn in_transaction(&self) -> bool {
        self.explicit.lock().await.is_some()
    }

    async fn take_explicit(&self, action: &str) -> Result<DatabaseTransaction> {
        self.explicit
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::TransactionState {
                message: format!("{action} called without an open transaction"),
            })
    }

    /// Runs a read query with positional `?` parameters and returns its rows in order.
    #[instrument(skip(self, values))]
    pub async fn query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Row>> {
        let explicit = self.explicit.lock().await;
        let stmt = Statement::from_sql_and_values(self.db.get_database_backend(), sql, values);
        let results = match explicit.as_ref() {
            Some(txn) => txn.query_all(stmt).await?,
            None => self.db.query_all(stmt).await?,
        };
        let rows = results.iter().map(row_to_json).collect::<Result<Vec<_>>>()?;
        debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }

    /// Executes a mutating statement with positional `?` parameters.
    ///
    /// Outside an explicit transaction the statement commits on its own and is rolled back if
    /// it fails. Inside one, a failure is returned as is and the transaction stays open; the
    /// caller decides whether to [`Gateway::rollback`].
    #[instrument(skip(self, values))]
    pub async fn execute(&self, sql: &str, values: Vec<Value>) -> Result<ExecOutcome> {
        let explicit = self.explicit.lock().await;
        let stmt = Statement::from_sql_and_values(self.db.get_database_backend(), sql, values);
        let result = match explicit.as_ref() {
            Some(txn) => txn.execute(stmt).await?,
            None => {
                let txn = self.db.begin().await?;
                match txn.execute(stmt).await {
                    Ok(result) => {
                        txn.commit().await?;
                        result
                    }
                    Err(e) => {
                        txn.rollback().await?;
                        return Err(e.into());
                    }
                }
            }
        };
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    /// Runs `callback` as one atomic unit and returns its result.
    ///
    /// Without an explicit transaction the unit is its own transaction. With one open, the
    /// unit is a savepoint inside it, so a later [`Gateway::rollback`] still discards it. An
    /// error from the callback rolls the unit back before it is returned.
    pub async fn atomic<F, T>(&self, callback: F) -> Result<T>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>
            + Send,
        T: Send,
    {
        let explicit = self.explicit.lock().await;
        let outcome = match explicit.as_ref() {
            Some(txn) => txn.transaction(callback).await,
            None => self.db.transaction(callback).await,
        };
        outcome.map_err(Error::from)
    }

    /// Closes the connection. An explicit transaction still open is rolled back first.
    #[instrument(skip(self))]
    pub async fn close(self) -> Result<()> {
        if let Some(txn) = self.explicit.into_inner() {
            warn!("Closing gateway with an open transaction, rolling back");
            txn.rollback().await?;
        }
        self.db.close().await?;
        info!("Database connection closed");
        Ok(())
    }
}

/// Decodes every column by the storage class of its value, so expression columns without a
/// declared type (aggregates, literals) are kept.
fn row_to_json(row: &QueryResult) -> Result<Row> {
    let mut object = JsonValue::Object(Default::default());
    for name in row.column_names() {
        let value = if let Ok(v) = row.try_get::<Option<i64>>("", &name) {
            v.map_or(JsonValue::Null, JsonValue::from)
        } else if let Ok(v) = row.try_get::<Option<f64>>("", &name) {
            v.map_or(JsonValue::Null, JsonValue::from)
        } else if let Ok(v) = row.try_get::<Option<String>>("", &name) {
            v.map_or(JsonValue::Null, JsonValue::from)
        } else if let Ok(v) = row.try_get::<Option<Vec<u8>>>("", &name) {
            v.map_or(JsonValue::Null, JsonValue::from)
        } else {
            return Err(Error::Database(DbErr::Type(format!(
                "Column {name} has no JSON representation"
            ))));
        };
        object[name.as_str()] = value;
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::{count_rows, init_test_tracing, setup_test_gateway};

    #[tokio::test]
    async fn test_query_returns_column_keyed_rows_in_order() -> Result<()> {
        init_test_tracing();
        let gateway = setup_test_gateway().await?;
        for (origin, destination, distance) in
            [("Antipolo", "T.I.P.", 17.7), ("Cubao", "Antipolo", 16.4)]
        {
            gateway
                .execute(
                    "INSERT INTO routes (origin, destination, distance) VALUES (?, ?, ?)",
                    vec![origin.into(), destination.into(), distance.into()],
                )
                .await?;
        }

        let rows = gateway
            .query(
                "SELECT route_id, origin, destination FROM routes ORDER BY origin DESC",
                vec![],
            )
            .await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["origin"], "Cubao");
        assert_eq!(rows[1]["origin"], "Antipolo");
        assert_eq!(rows[1]["destination"], "T.I.P.");
        Ok(())
    }

    #[tokio::test]
    async fn test_query_keeps_aggregate_and_literal_columns() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        for (origin, destination, distance) in
            [("Antipolo", "T.I.P.", 17.7), ("Cubao", "Antipolo", 16.4)]
        {
            gateway
                .execute(
                    "INSERT INTO routes (origin, destination, distance) VALUES (?, ?, ?)",
                    vec![origin.into(), destination.into(), distance.into()],
                )
                .await?;
        }

        let rows = gateway
            .query(
                "SELECT COUNT(*) AS n, SUM(distance) AS total, MAX(route_id) AS top, \
                 1.5 AS x, NULL AS nothing, 'fixed' AS label FROM routes",
                vec![],
            )
            .await?;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["n"].as_i64(), Some(2));
        assert!((row["total"].as_f64().unwrap() - 34.1).abs() < 1e-9);
        assert_eq!(row["top"].as_i64(), Some(2));
        assert_eq!(row["x"].as_f64(), Some(1.5));
        assert!(row.get("nothing").unwrap().is_null());
        assert_eq!(row["label"], "fixed");

        // Declared REAL columns keep full precision
        let rows = gateway
            .query("SELECT distance FROM routes WHERE origin = ?", vec!["Cubao".into()])
            .await?;
        assert_eq!(rows[0]["distance"].as_f64(), Some(16.4));
        Ok(())
    }

    #[tokio::test]
    async fn test_read_on_closed_connection_is_connection_error() -> Result<()> {
        let db = database::create_connection("sqlite::memory:").await?;
        database::create_tables(&db).await?;
        let gateway = Gateway::from_connection(db.clone());
        db.close().await?;

        let err = gateway
            .query("SELECT route_id FROM routes", vec![])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);

        let err = crate::core::route::list_routes(&gateway).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_reports_insert_id() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        let first = gateway
            .execute(
                "INSERT INTO routes (origin, destination, distance) VALUES (?, ?, ?)",
                vec!["A".into(), "B".into(), 1.0.into()],
            )
            .await?;
        let second = gateway
            .execute(
                "INSERT INTO routes (origin, destination, distance) VALUES (?, ?, ?)",
                vec!["B".into(), "A".into(), 1.0.into()],
            )
            .await?;
        assert_eq!(first.rows_affected, 1);
        assert_eq!(second.last_insert_id, first.last_insert_id + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_discards_both_writes() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        gateway
            .execute(
                "INSERT INTO vehicles (vehicle_id, plate_no) VALUES (?, ?)",
                vec!["V1".into(), "ABC 123".into()],
            )
            .await?;
        let routes_before = count_rows(&gateway, "routes").await?;
        let vehicles_before = count_rows(&gateway, "vehicles").await?;

        gateway.begin().await?;
        gateway
            .execute(
                "INSERT INTO routes (origin, destination, distance) VALUES (?, ?, ?)",
                vec!["Antipolo".into(), "Cubao".into(), 16.4.into()],
            )
            .await?;
        gateway
            .execute(
                "INSERT INTO vehicles (vehicle_id, plate_no) VALUES (?, ?)",
                vec!["V2".into(), "XYZ 789".into()],
            )
            .await?;
        // Visible inside the transaction
        assert_eq!(count_rows(&gateway, "routes").await?, routes_before + 1);
        gateway.rollback().await?;

        assert_eq!(count_rows(&gateway, "routes").await?, routes_before);
        assert_eq!(count_rows(&gateway, "vehicles").await?, vehicles_before);
        assert!(!gateway.in_transaction().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_keeps_writes() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        gateway.begin().await?;
        gateway
            .execute(
                "INSERT INTO vehicles (vehicle_id, plate_no) VALUES (?, ?)",
                vec!["V1".into(), "ABC 123".into()],
            )
            .await?;
        gateway.commit().await?;
        assert_eq!(count_rows(&gateway, "vehicles").await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_constraint_violation_inside_transaction_keeps_it_open() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        gateway.begin().await?;
        gateway
            .execute(
                "INSERT INTO vehicles (vehicle_id, plate_no) VALUES (?, ?)",
                vec!["V1".into(), "ABC 123".into()],
            )
            .await?;
        let err = gateway
            .execute(
                "INSERT INTO vehicles (vehicle_id, plate_no) VALUES (?, ?)",
                vec!["V2".into(), "ABC 123".into()],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        // The gateway does not roll back on its own
        assert!(gateway.in_transaction().await);
        assert_eq!(count_rows(&gateway, "vehicles").await?, 1);

        gateway.rollback().await?;
        assert_eq!(count_rows(&gateway, "vehicles").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_implicit_statement_failure_leaves_nothing() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        let err = gateway
            .execute(
                "INSERT INTO fares (route_id, price_fare, discount_fare) VALUES (?, ?, ?)",
                vec![42_i64.into(), 10.0.into(), 8.0.into()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { .. }));
        assert_eq!(count_rows(&gateway, "fares").await?, 0);
        assert!(!gateway.in_transaction().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_transaction_state_misuse() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        assert!(matches!(
            gateway.commit().await,
            Err(Error::TransactionState { .. })
        ));
        assert!(matches!(
            gateway.rollback().await,
            Err(Error::TransactionState { .. })
        ));
        gateway.begin().await?;
        assert!(matches!(
            gateway.begin().await,
            Err(Error::TransactionState { .. })
        ));
        gateway.rollback().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_atomic_rolls_back_on_error() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        let result: Result<()> = gateway
            .atomic(|txn| {
                Box::pin(async move {
                    txn.execute_unprepared(
                        "INSERT INTO vehicles (vehicle_id, plate_no) VALUES ('V1', 'ABC 123')",
                    )
                    .await?;
                    Err(Error::InvalidInput {
                        message: "abort".to_string(),
                    })
                })
            })
            .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert_eq!(count_rows(&gateway, "vehicles").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_atomic_joins_explicit_transaction() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        gateway.begin().await?;
        gateway
            .atomic(|txn| {
                Box::pin(async move {
                    txn.execute_unprepared(
                        "INSERT INTO vehicles (vehicle_id, plate_no) VALUES ('V1', 'ABC 123')",
                    )
                    .await?;
                    Ok(())
                })
            })
            .await?;
        assert_eq!(count_rows(&gateway, "vehicles").await?, 1);
        gateway.rollback().await?;
        assert_eq!(count_rows(&gateway, "vehicles").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_with_open_transaction() -> Result<()> {
        let gateway = setup_test_gateway().await?;
        gateway.begin().await?;
        gateway.close().await?;
        Ok(())
    }
}
