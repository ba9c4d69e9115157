//! Round trips against a live MySQL server.
//!
//! Ignored by default. Run with a disposable database on a server that keeps
//! integer display widths and the `utf8` charset name (MySQL 5.7):
//!
//! ```bash
//! DATABASE_URL=mysql://root@127.0.0.1/joinery_test cargo test -- --ignored
//! ```

use joinery_migrate::prelude::*;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

fn fixture(name: &str) -> Table {
    let path = format!(
        "{}/../joinery-core/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    );
    read_tables(path).unwrap().remove(0)
}

async fn connect() -> (MySqlPool, String) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("Failed to connect to MySQL");
    let (schema,): (String,) = sqlx::query_as("SELECT CAST(DATABASE() AS CHAR)")
        .fetch_one(&pool)
        .await
        .unwrap();
    (pool, schema)
}

async fn current(pool: &MySqlPool, schema: &str) -> Option<Table> {
    CatalogReader::new(pool)
        .read_tables(schema, &["build_test".to_string()])
        .await
        .unwrap()
        .pop()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a disposable MySQL 5.7 database"]
async fn create_alter_drop_round_trip() {
    let (pool, schema) = connect().await;
    let executor = Executor::new(pool.clone());
    executor
        .execute(&["drop table if exists `build_test`".to_string()])
        .await
        .unwrap();

    // Create, then read back: nothing left to do.
    let v1 = fixture("table1.json");
    executor.execute(&diff(None, Some(&v1)).unwrap()).await.unwrap();
    let read = current(&pool, &schema).await.unwrap();
    assert!(diff(Some(&read), Some(&v1)).unwrap().is_empty());

    // Alter from what the server reports, then read back again.
    let v2 = fixture("table2.json");
    executor
        .execute(&diff(Some(&read), Some(&v2)).unwrap())
        .await
        .unwrap();
    let read = current(&pool, &schema).await.unwrap();
    assert!(diff(Some(&read), Some(&v2)).unwrap().is_empty());
    assert_eq!(
        read.get_key("k1").map(|k| k.columns.clone()),
        Some(vec!["created_at".to_string()])
    );

    executor
        .execute(&diff(Some(&read), None).unwrap())
        .await
        .unwrap();
    assert!(current(&pool, &schema).await.is_none());
}
