//! Statement executor.
//!
//! Applies diff statements to a database, one at a time and in order.

use sqlx::mysql::MySqlPool;
use tracing::{debug, info};

use crate::error::{MigrateError, Result};

/// Runs DDL statements against a MySQL database.
pub struct Executor {
    pool: MySqlPool,
    dry_run: bool,
}

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            dry_run: false,
        }
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Returns whether dry-run mode is enabled.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Runs `statements` in order and returns how many were run.
    ///
    /// Stops at the first failure; statements before it stay applied, since
    /// MySQL commits DDL implicitly.
    pub async fn execute(&self, statements: &[String]) -> Result<usize> {
        for (index, sql) in statements.iter().enumerate() {
            debug!(sql = %sql, "Executing SQL");

            if self.dry_run {
                println!("{sql};");
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|source| MigrateError::Execution {
                    index,
                    statement: sql.clone(),
                    source,
                })?;
        }

        info!(
            statements = statements.len(),
            dry_run = self.dry_run,
            "Statements executed"
        );
        Ok(statements.len())
    }
}
