//! Table diff engine.
//!
//! Compares an "old" (current database) and a "new" (desired) [`Table`]
//! and produces the ordered DDL statements that migrate old into new.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::column::Column;
use crate::error::{DiffError, Result};
use crate::key::Key;
use crate::table::Table;

// ================================================================
// Single table
// ================================================================

/// Diffs one table.
///
/// - `(None, Some(new))` creates the table.
/// - `(Some(old), None)` drops it, without inspecting its columns.
/// - `(Some(old), Some(new))` emits one `alter table` statement, or
///   nothing when the tables are equivalent.
///
/// Statements must be executed in the returned order.
///
/// # Errors
///
/// Fails if both tables are absent, or if `new` has no columns or breaks
/// one of the invariants checked by [`Table::validate`].
pub fn diff(old: Option<&Table>, new: Option<&Table>) -> Result<Vec<String>> {
    match (old, new) {
        (None, None) => Err(DiffError::NothingToDiff),
        (None, Some(new)) => {
            new.validate()?;
            debug!(table = %new.name, "table will be created");
            Ok(vec![new.render_create()])
        }
        (Some(old), None) => {
            debug!(table = %old.name, "table will be dropped");
            Ok(vec![old.render_drop()])
        }
        (Some(old), Some(new)) => {
            new.validate()?;
            let clauses = alter_clauses(old, new)?;
            if clauses.is_empty() {
                debug!(table = %new.name, "table is up to date");
                return Ok(Vec::new());
            }
            debug!(table = %new.name, clauses = clauses.len(), "table will be altered");
            Ok(vec![new.render_alter(&clauses)])
        }
    }
}

/// How the columns of a table pair are reconciled.
struct ColumnPlan<'a> {
    /// Old columns that are dropped, including relocated ones.
    dropped: Vec<&'a Column>,
    /// New columns that are added, including relocated ones.
    added: Vec<&'a Column>,
    /// Columns changed in place, as `(old, new)`.
    modified: Vec<(&'a Column, &'a Column)>,
    /// Columns whose keys must be dropped and re-added: relocated or
    /// retyped columns.
    rebuilt: HashSet<&'a str>,
}

impl<'a> ColumnPlan<'a> {
    fn new(table: &str, old: &'a Table, new: &'a Table) -> Self {
        let old_columns = old.columns_by_position();
        let new_columns = new.columns_by_position();
        let relocated = relocated_columns(&old_columns, &new_columns);

        let mut plan = Self {
            dropped: Vec::new(),
            added: Vec::new(),
            modified: Vec::new(),
            rebuilt: HashSet::new(),
        };

        for &old_col in &old_columns {
            match new.get_column(&old_col.name) {
                None => plan.dropped.push(old_col),
                Some(_) if relocated.contains(old_col.name.as_str()) => {
                    debug!(table, column = %old_col.name, "column relocated");
                    plan.dropped.push(old_col);
                    plan.rebuilt.insert(old_col.name.as_str());
                }
                Some(new_col) if old_col.is_changed(new_col) => {
                    if old_col.sql_type != new_col.sql_type {
                        plan.rebuilt.insert(old_col.name.as_str());
                    }
                    plan.modified.push((old_col, new_col));
                }
                Some(_) => {}
            }
        }

        for &new_col in &new_columns {
            if old.get_column(&new_col.name).is_none()
                || relocated.contains(new_col.name.as_str())
            {
                plan.added.push(new_col);
            }
        }

        plan
    }

    fn touches(&self, key: &Key) -> bool {
        self.rebuilt.iter().any(|column| key.references(column))
    }
}

/// Builds the ordered `alter table` clauses for a table pair.
///
/// Order: drop keys, drop columns, add columns, add keys, modify columns.
fn alter_clauses(old: &Table, new: &Table) -> Result<Vec<String>> {
    let plan = ColumnPlan::new(&new.name, old, new);
    let mut clauses = Vec::new();

    // ---- Removed keys and keys over rebuilt columns ------------
    for old_key in &old.keys {
        match new.get_key(&old_key.name) {
            None => clauses.push(old_key.render_drop()),
            Some(new_key) if !old_key.is_changed(new_key) && plan.touches(old_key) => {
                debug!(table = %new.name, key = %old_key.name, "key rebuilt");
                clauses.push(old_key.render_drop());
            }
            Some(_) => {}
        }
    }

    // ---- Removed and relocated columns -------------------------
    clauses.extend(plan.dropped.iter().map(|c| c.render_drop()));

    // ---- New and relocated columns, left to right --------------
    for column in &plan.added {
        let position = column.compute_position(&new.columns)?;
        clauses.push(column.render_add(&position));
    }

    // ---- New, changed and rebuilt keys -------------------------
    for new_key in &new.keys {
        match old.get_key(&new_key.name) {
            None => clauses.push(new_key.render_add()),
            Some(old_key) if old_key.is_changed(new_key) => {
                clauses.push(old_key.render_drop());
                clauses.push(new_key.render_add());
            }
            Some(old_key) if plan.touches(old_key) => clauses.push(new_key.render_add()),
            Some(_) => {}
        }
    }

    // ---- Columns changed in place ------------------------------
    for (old_col, new_col) in &plan.modified {
        if old_col.is_charset_change_only(new_col) {
            clauses.push(new_col.render_modify_charset());
        } else {
            clauses.push(new_col.render_modify());
        }
    }

    Ok(clauses)
}

// ================================================================
// Column relocation
// ================================================================

/// Returns the common columns that must move because their order
/// relative to the other common columns changed.
///
/// Columns on a longest run that keeps its relative order stay put;
/// everything else is relocated. Shifts caused by added or dropped
/// columns never relocate anything.
fn relocated_columns<'a>(old: &[&'a Column], new: &[&'a Column]) -> BTreeSet<&'a str> {
    let old_index: HashMap<&str, usize> = old
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();
    let common: Vec<(&'a str, usize)> = new
        .iter()
        .filter_map(|c| {
            old_index
                .get(c.name.as_str())
                .map(|&i| (c.name.as_str(), i))
        })
        .collect();

    let indices: Vec<usize> = common.iter().map(|&(_, i)| i).collect();
    let keep = longest_increasing(&indices);

    common
        .iter()
        .zip(keep)
        .filter(|&(_, kept)| !kept)
        .map(|(&(name, _), _)| name)
        .collect()
}

/// Marks the members of one longest strictly increasing subsequence.
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &value) in values.iter().enumerate() {
        let len = tails.partition_point(|&t| values[t] < value);
        if len > 0 {
            previous[i] = Some(tails[len - 1]);
        }
        if len == tails.len() {
            tails.push(i);
        } else {
            tails[len] = i;
        }
    }

    let mut keep = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        keep[i] = true;
        cursor = previous[i];
    }
    keep
}

// ================================================================
// Multiple tables
// ================================================================

/// Options for [`Differ`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Whether tables missing from the desired side are dropped.
    pub drop_tables: bool,
}

impl DiffOptions {
    /// Creates default options (tables are never dropped).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables dropping tables absent from the desired side.
    #[must_use]
    pub const fn with_drop_tables(mut self) -> Self {
        self.drop_tables = true;
        self
    }
}

/// Diffs whole sets of tables, pairing them by name.
#[derive(Debug, Default)]
pub struct Differ {
    options: DiffOptions,
}

impl Differ {
    /// Creates a differ with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a differ with custom options.
    #[must_use]
    pub const fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Compares the `current` tables against the `desired` ones.
    ///
    /// Creates and alters follow the order of `desired`; drops (only with
    /// [`DiffOptions::drop_tables`]) follow the order of `current` and come
    /// last.
    ///
    /// # Errors
    ///
    /// Fails on a table name declared twice on one side, or on any error
    /// [`diff`] reports for a table pair. No statements are returned in
    /// that case.
    pub fn diff_schemas(&self, current: &[Table], desired: &[Table]) -> Result<Vec<String>> {
        let current_by_name = index_by_name(current)?;
        let desired_by_name = index_by_name(desired)?;

        let mut statements = Vec::new();
        for table in desired {
            let old = current_by_name.get(table.name.as_str()).copied();
            statements.extend(diff(old, Some(table))?);
        }

        for table in current {
            if desired_by_name.contains_key(table.name.as_str()) {
                continue;
            }
            if self.options.drop_tables {
                statements.extend(diff(Some(table), None)?);
            } else {
                info!(table = %table.name, "table not in desired schema, keeping it");
            }
        }

        Ok(statements)
    }
}

fn index_by_name(tables: &[Table]) -> Result<HashMap<&str, &Table>> {
    let mut by_name = HashMap::with_capacity(tables.len());
    for table in tables {
        if by_name.insert(table.name.as_str(), table).is_some() {
            return Err(DiffError::DuplicateTable(table.name.clone()));
        }
    }
    Ok(by_name)
}
