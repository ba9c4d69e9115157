//! Reads table definitions from MySQL's `information_schema`.
//!
//! Every catalog value is `CAST` to `CHAR` or `SIGNED` in SQL, so row
//! decoding does not depend on the column types a given server version
//! reports (`SEQ_IN_INDEX` alone changed from `bigint` to `int unsigned`
//! between 5.7 and 8.0).

use std::collections::HashMap;

use joinery_core::{
    Column, Key, KeyKind, KeyRole, NullInt64, NullString, PRIMARY_KEY_NAME, Table,
    is_current_timestamp,
};
use sqlx::Row;
use sqlx::mysql::{MySqlPool, MySqlRow};
use tracing::{debug, info, warn};

use crate::error::{MigrateError, Result};

const TABLES_SQL: &str = "SELECT CAST(t.TABLE_NAME AS CHAR) AS TABLE_NAME,
        CAST(t.ENGINE AS CHAR) AS ENGINE,
        CAST(t.TABLE_COLLATION AS CHAR) AS TABLE_COLLATION,
        CAST(a.CHARACTER_SET_NAME AS CHAR) AS CHARACTER_SET_NAME
    FROM information_schema.tables t
    LEFT JOIN information_schema.collation_character_set_applicability a
        ON a.COLLATION_NAME = t.TABLE_COLLATION
    WHERE t.TABLE_SCHEMA = ? AND t.TABLE_TYPE = 'BASE TABLE'
    ORDER BY t.TABLE_NAME";

const COLUMNS_SQL: &str = "SELECT CAST(TABLE_NAME AS CHAR) AS TABLE_NAME,
        CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME,
        CAST(ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION,
        CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT,
        CAST(IS_NULLABLE AS CHAR) AS IS_NULLABLE,
        CAST(DATA_TYPE AS CHAR) AS DATA_TYPE,
        CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS CHARACTER_MAXIMUM_LENGTH,
        CAST(CHARACTER_OCTET_LENGTH AS SIGNED) AS CHARACTER_OCTET_LENGTH,
        CAST(NUMERIC_PRECISION AS SIGNED) AS NUMERIC_PRECISION,
        CAST(NUMERIC_SCALE AS SIGNED) AS NUMERIC_SCALE,
        CAST(CHARACTER_SET_NAME AS CHAR) AS CHARACTER_SET_NAME,
        CAST(COLLATION_NAME AS CHAR) AS COLLATION_NAME,
        CAST(COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
        CAST(COLUMN_KEY AS CHAR) AS COLUMN_KEY,
        CAST(EXTRA AS CHAR) AS EXTRA,
        CAST(COLUMN_COMMENT AS CHAR) AS COLUMN_COMMENT
    FROM information_schema.columns
    WHERE TABLE_SCHEMA = ?
    ORDER BY TABLE_NAME, ORDINAL_POSITION";

const KEYS_SQL: &str = "SELECT CAST(TABLE_NAME AS CHAR) AS TABLE_NAME,
        CAST(INDEX_NAME AS CHAR) AS INDEX_NAME,
        CAST(NON_UNIQUE AS SIGNED) AS NON_UNIQUE,
        CAST(SEQ_IN_INDEX AS SIGNED) AS SEQ_IN_INDEX,
        CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME
    FROM information_schema.statistics
    WHERE TABLE_SCHEMA = ?
    ORDER BY TABLE_NAME, INDEX_NAME = 'PRIMARY' DESC, INDEX_NAME, SEQ_IN_INDEX";

/// Reads [`Table`]s from a live MySQL server.
pub struct CatalogReader<'a> {
    pool: &'a MySqlPool,
}

impl<'a> CatalogReader<'a> {
    /// Creates a reader over `pool`.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// Reads the base tables of `schema`.
    ///
    /// With an empty `names` slice every table is returned, sorted by name.
    /// Otherwise the result follows the order of `names`, and names with no
    /// matching table are skipped.
    pub async fn read_tables(&self, schema: &str, names: &[String]) -> Result<Vec<Table>> {
        info!(schema = %schema, "Reading catalog");

        let table_rows = sqlx::query(TABLES_SQL)
            .bind(schema)
            .fetch_all(self.pool)
            .await?
            .iter()
            .map(TableRow::decode)
            .collect::<Result<Vec<_>>>()?;
        let column_rows = sqlx::query(COLUMNS_SQL)
            .bind(schema)
            .fetch_all(self.pool)
            .await?
            .iter()
            .map(ColumnRow::decode)
            .collect::<Result<Vec<_>>>()?;
        let key_rows = sqlx::query(KEYS_SQL)
            .bind(schema)
            .fetch_all(self.pool)
            .await?
            .iter()
            .map(KeyRow::decode)
            .collect::<Result<Vec<_>>>()?;

        let tables = assemble(schema, table_rows, column_rows, key_rows)?;
        Ok(select(tables, names))
    }
}

// ---- Catalog rows ----------------------------------------------

#[derive(Debug, Clone, Default)]
struct TableRow {
    table_name: String,
    engine: Option<String>,
    collation: Option<String>,
    charset: Option<String>,
}

impl TableRow {
    fn decode(row: &MySqlRow) -> Result<Self> {
        Ok(Self {
            table_name: row.try_get("TABLE_NAME")?,
            engine: row.try_get("ENGINE")?,
            collation: row.try_get("TABLE_COLLATION")?,
            charset: row.try_get("CHARACTER_SET_NAME")?,
        })
    }

    /// The default charset, falling back to the collation prefix when the
    /// server has no applicability row for it.
    fn default_charset(&self) -> String {
        self.charset.clone().unwrap_or_else(|| {
            self.collation
                .as_deref()
                .and_then(|c| c.split('_').next())
                .unwrap_or_default()
                .to_string()
        })
    }
}

#[derive(Debug, Clone, Default)]
struct ColumnRow {
    table_name: String,
    column_name: String,
    ordinal_position: i64,
    column_default: Option<String>,
    is_nullable: String,
    data_type: String,
    character_maximum_length: Option<i64>,
    character_octet_length: Option<i64>,
    numeric_precision: Option<i64>,
    numeric_scale: Option<i64>,
    character_set_name: Option<String>,
    collation_name: Option<String>,
    column_type: String,
    column_key: String,
    extra: String,
    column_comment: String,
}

impl ColumnRow {
    fn decode(row: &MySqlRow) -> Result<Self> {
        Ok(Self {
            table_name: row.try_get("TABLE_NAME")?,
            column_name: row.try_get("COLUMN_NAME")?,
            ordinal_position: row.try_get("ORDINAL_POSITION")?,
            column_default: row.try_get("COLUMN_DEFAULT")?,
            is_nullable: row.try_get("IS_NULLABLE")?,
            data_type: row.try_get("DATA_TYPE")?,
            character_maximum_length: row.try_get("CHARACTER_MAXIMUM_LENGTH")?,
            character_octet_length: row.try_get("CHARACTER_OCTET_LENGTH")?,
            numeric_precision: row.try_get("NUMERIC_PRECISION")?,
            numeric_scale: row.try_get("NUMERIC_SCALE")?,
            character_set_name: row.try_get("CHARACTER_SET_NAME")?,
            collation_name: row.try_get("COLLATION_NAME")?,
            column_type: row.try_get("COLUMN_TYPE")?,
            column_key: row.try_get("COLUMN_KEY")?,
            extra: row.try_get("EXTRA")?,
            column_comment: row.try_get("COLUMN_COMMENT")?,
        })
    }

    fn into_column(self) -> Result<Column> {
        let ordinal_position = u32::try_from(self.ordinal_position).map_err(|_| {
            MigrateError::Catalog(format!(
                "column '{}.{}' has ordinal position {}",
                self.table_name, self.column_name, self.ordinal_position
            ))
        })?;

        // MySQL 8 reports expression defaults without their parentheses.
        let default_expression = self.extra.starts_with("DEFAULT_GENERATED");
        let default = match self.column_default {
            Some(value)
                if default_expression
                    && !is_current_timestamp(&value)
                    && !(value.starts_with('(') && value.ends_with(')')) =>
            {
                Some(format!("({value})"))
            }
            other => other,
        };
        let default_expression = default_expression && default.is_some();

        Ok(Column {
            name: self.column_name,
            ordinal_position,
            sql_type: self.column_type,
            data_type: self.data_type,
            nullable: self.is_nullable.eq_ignore_ascii_case("YES"),
            default: NullString::from_row(default),
            default_expression,
            auto_increment: self.extra.to_ascii_lowercase().contains("auto_increment"),
            key_role: KeyRole::from_catalog(&self.column_key),
            charset: NullString::from_row(self.character_set_name),
            collation: NullString::from_row(self.collation_name),
            comment: self.column_comment,
            character_maximum_length: NullInt64::from_row(self.character_maximum_length),
            character_octet_length: NullInt64::from_row(self.character_octet_length),
            numeric_precision: NullInt64::from_row(self.numeric_precision),
            numeric_scale: NullInt64::from_row(self.numeric_scale),
        })
    }
}

#[derive(Debug, Clone, Default)]
struct KeyRow {
    table_name: String,
    index_name: String,
    non_unique: i64,
    seq_in_index: i64,
    column_name: Option<String>,
}

impl KeyRow {
    fn decode(row: &MySqlRow) -> Result<Self> {
        Ok(Self {
            table_name: row.try_get("TABLE_NAME")?,
            index_name: row.try_get("INDEX_NAME")?,
            non_unique: row.try_get("NON_UNIQUE")?,
            seq_in_index: row.try_get("SEQ_IN_INDEX")?,
            column_name: row.try_get("COLUMN_NAME")?,
        })
    }

    fn kind(&self) -> KeyKind {
        if self.index_name == PRIMARY_KEY_NAME {
            KeyKind::Primary
        } else if self.non_unique == 0 {
            KeyKind::Unique
        } else {
            KeyKind::Plain
        }
    }
}

// ---- Assembly --------------------------------------------------

/// Groups key rows into keys per table.
///
/// Rows must be ordered by table, key and sequence. Functional key parts
/// have no column name; keys containing one are skipped.
fn group_keys(rows: Vec<KeyRow>) -> Result<HashMap<String, Vec<Key>>> {
    let mut keys: HashMap<String, Vec<Key>> = HashMap::new();
    let mut skipped: Option<(String, String)> = None;

    for row in rows {
        let id = (row.table_name.clone(), row.index_name.clone());
        if skipped.as_ref() == Some(&id) {
            continue;
        }

        let table_keys = keys.entry(row.table_name.clone()).or_default();
        let continues_last = table_keys
            .last()
            .is_some_and(|k: &Key| k.name == row.index_name);

        let Some(column) = row.column_name.clone() else {
            warn!(
                table = %row.table_name,
                key = %row.index_name,
                "Skipping key over an expression"
            );
            if continues_last {
                table_keys.pop();
            }
            skipped = Some(id);
            continue;
        };

        if continues_last {
            if let Some(key) = table_keys.last_mut() {
                key.columns.push(column);
            }
            continue;
        }

        if row.seq_in_index != 1 {
            return Err(MigrateError::Catalog(format!(
                "key '{}.{}' starts at sequence {}",
                row.table_name, row.index_name, row.seq_in_index
            )));
        }
        table_keys.push(Key::new(row.index_name.clone(), row.kind(), [column]));
    }

    Ok(keys)
}

fn assemble(
    schema: &str,
    table_rows: Vec<TableRow>,
    column_rows: Vec<ColumnRow>,
    key_rows: Vec<KeyRow>,
) -> Result<Vec<Table>> {
    let mut columns: HashMap<String, Vec<Column>> = HashMap::new();
    for row in column_rows {
        let table = row.table_name.clone();
        columns.entry(table).or_default().push(row.into_column()?);
    }
    let mut keys = group_keys(key_rows)?;

    let mut tables = Vec::with_capacity(table_rows.len());
    for row in table_rows {
        let charset = row.default_charset();
        let table = Table {
            schema: schema.to_string(),
            columns: columns.remove(&row.table_name).unwrap_or_default(),
            keys: keys.remove(&row.table_name).unwrap_or_default(),
            engine: row.engine.unwrap_or_default(),
            charset,
            name: row.table_name,
        };
        if table.columns.is_empty() {
            return Err(MigrateError::Catalog(format!(
                "table '{}' has no columns",
                table.name
            )));
        }
        debug!(
            table = %table.name,
            columns = table.columns.len(),
            keys = table.keys.len(),
            "Read table"
        );
        tables.push(table);
    }
    Ok(tables)
}

/// Picks the tables named in `names`, in that order. An empty list keeps
/// every table.
fn select(tables: Vec<Table>, names: &[String]) -> Vec<Table> {
    if names.is_empty() {
        return tables;
    }
    let mut by_name: HashMap<String, Table> =
        tables.into_iter().map(|t| (t.name.clone(), t)).collect();
    names
        .iter()
        .filter_map(|name| {
            let table = by_name.remove(name);
            if table.is_none() {
                debug!(table = %name, "Table not found in catalog");
            }
            table
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_row(name: &str) -> TableRow {
        TableRow {
            table_name: name.to_string(),
            engine: Some("InnoDB".to_string()),
            collation: Some("utf8_general_ci".to_string()),
            charset: Some("utf8".to_string()),
        }
    }

    fn column_row(table: &str, name: &str, position: i64, column_type: &str) -> ColumnRow {
        ColumnRow {
            table_name: table.to_string(),
            column_name: name.to_string(),
            ordinal_position: position,
            is_nullable: "NO".to_string(),
            data_type: column_type
                .split('(')
                .next()
                .unwrap_or_default()
                .to_string(),
            column_type: column_type.to_string(),
            ..ColumnRow::default()
        }
    }

    fn key_row(table: &str, name: &str, non_unique: i64, seq: i64, column: &str) -> KeyRow {
        KeyRow {
            table_name: table.to_string(),
            index_name: name.to_string(),
            non_unique,
            seq_in_index: seq,
            column_name: Some(column.to_string()),
        }
    }

    #[test]
    fn column_row_conversion() {
        let row = ColumnRow {
            column_default: Some("0".to_string()),
            is_nullable: "YES".to_string(),
            extra: "auto_increment".to_string(),
            column_key: "PRI".to_string(),
            numeric_precision: Some(10),
            numeric_scale: Some(0),
            ..column_row("users", "id", 1, "int(11) unsigned")
        };
        let column = row.into_column().unwrap();
        assert_eq!(column.name, "id");
        assert_eq!(column.data_type, "int");
        assert!(column.nullable);
        assert!(column.auto_increment);
        assert_eq!(column.key_role, KeyRole::Primary);
        assert_eq!(column.default.as_str(), Some("0"));
        assert!(column.charset.is_null());
        assert_eq!(column.numeric_precision.get(), Some(&10));
        assert!(column.character_maximum_length.is_null());
    }

    #[test]
    fn generated_expression_default_is_parenthesized() {
        let row = ColumnRow {
            column_default: Some("json_array()".to_string()),
            extra: "DEFAULT_GENERATED".to_string(),
            ..column_row("t", "j", 1, "json")
        };
        let column = row.into_column().unwrap();
        assert!(column.default_expression);
        assert_eq!(column.default.as_str(), Some("(json_array())"));
        assert_eq!(column.format_default().as_deref(), Some("(json_array())"));

        let row = ColumnRow {
            column_default: Some("CURRENT_TIMESTAMP".to_string()),
            extra: "DEFAULT_GENERATED on update CURRENT_TIMESTAMP".to_string(),
            ..column_row("t", "updated_at", 1, "datetime")
        };
        assert_eq!(
            row.into_column().unwrap().default.as_str(),
            Some("CURRENT_TIMESTAMP")
        );
    }

    #[test]
    fn plain_parenthesized_default_is_a_string_literal() {
        let row = ColumnRow {
            column_default: Some("(x)".to_string()),
            ..column_row("t", "label", 1, "varchar(8)")
        };
        let column = row.into_column().unwrap();
        assert!(!column.default_expression);
        assert_eq!(column.format_default().as_deref(), Some("'(x)'"));
    }

    #[test]
    fn generated_string_default_is_rendered_verbatim() {
        let row = ColumnRow {
            column_default: Some("uuid()".to_string()),
            extra: "DEFAULT_GENERATED".to_string(),
            ..column_row("t", "token", 1, "varchar(36)")
        };
        let column = row.into_column().unwrap();
        assert_eq!(
            column.render_definition(),
            "`token` varchar(36) not null default (uuid())"
        );
    }

    #[test]
    fn negative_position_is_a_catalog_error() {
        let row = column_row("t", "a", -1, "int(11)");
        assert!(matches!(row.into_column(), Err(MigrateError::Catalog(_))));
    }

    #[test]
    fn keys_are_grouped_in_sequence() {
        let keys = group_keys(vec![
            key_row("users", "PRIMARY", 0, 1, "id"),
            key_row("users", "k2", 1, 1, "gender"),
            key_row("users", "k2", 1, 2, "country"),
            key_row("users", "name", 0, 1, "name"),
        ])
        .unwrap();
        assert_eq!(
            keys["users"],
            vec![
                Key::primary(["id"]),
                Key::plain("k2", ["gender", "country"]),
                Key::unique("name", ["name"]),
            ]
        );
    }

    #[test]
    fn functional_keys_are_skipped() {
        let mut functional = key_row("t", "k_expr", 1, 2, "");
        functional.column_name = None;
        let keys = group_keys(vec![
            key_row("t", "k_expr", 1, 1, "a"),
            functional,
            key_row("t", "k_expr", 1, 3, "b"),
            key_row("t", "k_plain", 1, 1, "b"),
        ])
        .unwrap();
        assert_eq!(keys["t"], vec![Key::plain("k_plain", ["b"])]);
    }

    #[test]
    fn key_starting_mid_sequence_is_a_catalog_error() {
        let result = group_keys(vec![key_row("t", "k", 1, 2, "a")]);
        assert!(matches!(result, Err(MigrateError::Catalog(_))));
    }

    #[test]
    fn tables_are_assembled() {
        let tables = assemble(
            "test",
            vec![table_row("a"), table_row("b")],
            vec![
                column_row("a", "id", 1, "int(11)"),
                column_row("b", "id", 1, "int(11)"),
                column_row("b", "name", 2, "varchar(64)"),
            ],
            vec![key_row("b", "PRIMARY", 0, 1, "id")],
        )
        .unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].schema, "test");
        assert!(tables[0].keys.is_empty());
        assert_eq!(tables[1].columns.len(), 2);
        assert_eq!(tables[1].keys, vec![Key::primary(["id"])]);
        assert_eq!(tables[1].engine, "InnoDB");
        assert_eq!(tables[1].charset, "utf8");
        assert!(tables[1].validate().is_ok());
    }

    #[test]
    fn charset_falls_back_to_collation_prefix() {
        let row = TableRow {
            charset: None,
            collation: Some("utf8mb4_0900_ai_ci".to_string()),
            ..table_row("t")
        };
        assert_eq!(row.default_charset(), "utf8mb4");
    }

    #[test]
    fn selection_follows_requested_order() {
        let tables = vec![Table::new("a"), Table::new("b"), Table::new("c")];
        let names = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let picked: Vec<String> = select(tables.clone(), &names)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(picked, vec!["c", "a"]);
        assert_eq!(select(tables, &[]).len(), 3);
    }
}
