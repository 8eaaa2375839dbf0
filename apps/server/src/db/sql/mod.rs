//! SQL rendering for the query engine's key, count and fetch queries.
//!
//! - every nested prefix of a filter path becomes one `INNER JOIN`, aliased
//!   `t1`, `t2`, ... in first-use order; the root table is `t0`
//! - the key query collapses joined rows with `GROUP BY` on the primary key
//!   before `LIMIT`/`OFFSET`, and always ends its ordering on the primary key
//! - the fetch query builds one JSON document per key, embedding relations
//!   through correlated subqueries so joined rows never multiply the result

mod bind;
pub(crate) mod escape;

use super::schema::{Schema, TableMapping};
use bind::{push_array, push_bigint, push_value};
use escape::{qualified, quote_ident, quote_literal};
use sieve_query::{
    AttributePath, CountQuery, Error, FetchQuery, KeyQuery, Predicate, Result, ScalarType,
};
use uuid::Uuid;

const ROOT_ALIAS: &str = "t0";

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Uuid(Uuid),
    Text(String),
    BoolArray(Vec<bool>),
    SmallIntArray(Vec<i16>),
    IntArray(Vec<i32>),
    BigIntArray(Vec<i64>),
    UuidArray(Vec<Uuid>),
    TextArray(Vec<String>),
}

struct Join<'s> {
    prefix: Vec<String>,
    alias: String,
    table: &'s TableMapping,
}

/// `FROM` clause of a filtered query, with the joins its predicate needs.
struct FromClause<'s> {
    root: &'s TableMapping,
    joins: Vec<Join<'s>>,
    sql: String,
}

impl<'s> FromClause<'s> {
    fn table_for(&self, prefix: &[String]) -> Option<(&str, &'s TableMapping)> {
        if prefix.is_empty() {
            return Some((ROOT_ALIAS, self.root));
        }
        self.joins
            .iter()
            .find(|j| j.prefix == prefix)
            .map(|j| (j.alias.as_str(), j.table))
    }

    /// Qualified column of a path's leaf, plus its declared type.
    fn column(&self, path: &AttributePath) -> Result<(String, ScalarType)> {
        let segments = path.segments();
        let Some((leaf, prefix)) = segments.split_last() else {
            return Err(Error::Execution("empty attribute path".to_string()));
        };
        let (alias, table) = self
            .table_for(prefix)
            .ok_or_else(|| Error::Execution(format!("no join for {path}")))?;
        let column = table.column(leaf).ok_or_else(|| {
            Error::Execution(format!("{} has no column for {leaf}", table.entity))
        })?;
        Ok((qualified(alias, &column.column), column.scalar_type))
    }
}

pub struct SqlBuilder<'s> {
    schema: &'s Schema,
}

impl<'s> SqlBuilder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// `SELECT pk ... GROUP BY pk ORDER BY ..., pk LIMIT n OFFSET m`
    pub fn build_key_sql(&self, query: &KeyQuery) -> Result<(String, Vec<BindValue>)> {
        let mut bind_params = Vec::new();
        let from = self.from_clause(&query.entity, query.predicate.as_ref())?;
        let pk = qualified(ROOT_ALIAS, &from.root.primary_key.column);

        let mut sql = format!(
            "SELECT {}",
            comparable(pk.clone(), from.root.primary_key.scalar_type)
        );
        sql.push_str(&from.sql);
        push_where(&mut sql, &from, query.predicate.as_ref(), &mut bind_params)?;

        let mut group_by = vec![pk.clone()];
        let mut order_by = Vec::with_capacity(query.sort.len() + 1);
        for sort in &query.sort {
            let (column, _) = from.column(&sort.path)?;
            if !group_by.contains(&column) {
                group_by.push(column.clone());
            }
            order_by.push(format!("{column} {}", sort.direction.as_sql()));
        }

        // Ensure deterministic ordering for pagination.
        if !order_by.iter().any(|o| o.starts_with(&format!("{pk} "))) {
            order_by.push(format!("{pk} ASC"));
        }

        sql.push_str(" GROUP BY ");
        sql.push_str(&group_by.join(", "));
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by.join(", "));

        let limit_idx = push_bigint(&mut bind_params, query.page.limit);
        let offset_idx = push_bigint(&mut bind_params, query.page.offset);
        sql.push_str(&format!(" LIMIT ${limit_idx} OFFSET ${offset_idx}"));

        Ok((sql, bind_params))
    }

    /// `SELECT COUNT(DISTINCT pk) ...` over the same joins and filter.
    pub fn build_count_sql(&self, query: &CountQuery) -> Result<(String, Vec<BindValue>)> {
        let mut bind_params = Vec::new();
        let from = self.from_clause(&query.entity, query.predicate.as_ref())?;
        let pk = qualified(ROOT_ALIAS, &from.root.primary_key.column);

        let mut sql = format!("SELECT COUNT(DISTINCT {pk})");
        sql.push_str(&from.sql);
        push_where(&mut sql, &from, query.predicate.as_ref(), &mut bind_params)?;

        Ok((sql, bind_params))
    }

    /// One `jsonb` document per key, with the requested relations embedded.
    pub fn build_fetch_sql(&self, query: &FetchQuery) -> Result<(String, Vec<BindValue>)> {
        let mut bind_params = Vec::new();
        let root = self.schema.table(&query.entity)?;

        let mut fields = json_fields(root, ROOT_ALIAS);
        for (i, attribute) in query.fetch.iter().enumerate() {
            let relation = root.relation(attribute).ok_or_else(|| {
                Error::InvalidShape(format!("{} has no relation {attribute}", root.entity))
            })?;
            let target = self.schema.table(&relation.target)?;
            let alias = format!("r{}", i + 1);
            let object = format!("jsonb_build_object({})", json_fields(target, &alias).join(", "));
            let on = format!(
                "{} = {}",
                qualified(&alias, &relation.target_column),
                qualified(ROOT_ALIAS, &relation.local_column)
            );

            let subquery = if relation.many {
                format!(
                    "(SELECT COALESCE(jsonb_agg({object} ORDER BY {}), '[]'::jsonb) FROM {} {alias} WHERE {on})",
                    qualified(&alias, &target.primary_key.column),
                    quote_ident(&target.table),
                )
            } else {
                format!(
                    "(SELECT {object} FROM {} {alias} WHERE {on} LIMIT 1)",
                    quote_ident(&target.table),
                )
            };
            fields.push(format!("{}, {subquery}", quote_literal(attribute)));
        }

        let keys_idx = push_array(&mut bind_params, root.primary_key.scalar_type, &query.keys);
        let sql = format!(
            "SELECT jsonb_build_object({}) AS document FROM {} {ROOT_ALIAS} WHERE {} = ANY(${keys_idx})",
            fields.join(", "),
            quote_ident(&root.table),
            comparable(
                qualified(ROOT_ALIAS, &root.primary_key.column),
                root.primary_key.scalar_type
            ),
        );

        Ok((sql, bind_params))
    }

    fn from_clause(&self, entity: &str, predicate: Option<&Predicate>) -> Result<FromClause<'s>> {
        let root = self.schema.table(entity)?;
        let mut from = FromClause {
            root,
            joins: Vec::new(),
            sql: format!(" FROM {} {ROOT_ALIAS}", quote_ident(&root.table)),
        };

        let Some(predicate) = predicate else {
            return Ok(from);
        };

        for path in predicate.paths() {
            let segments = path.segments();
            for depth in 1..segments.len() {
                let prefix = &segments[..depth];
                if from.table_for(prefix).is_some() {
                    continue;
                }

                let (parent_alias, parent) = from
                    .table_for(&prefix[..depth - 1])
                    .map(|(alias, table)| (alias.to_string(), table))
                    .ok_or_else(|| Error::Execution(format!("no join for {path}")))?;
                let attribute = &prefix[depth - 1];
                let relation = parent.relation(attribute).ok_or_else(|| {
                    Error::Execution(format!("{} has no relation {attribute}", parent.entity))
                })?;
                let target = self.schema.table(&relation.target)?;
                let alias = format!("t{}", from.joins.len() + 1);

                from.sql.push_str(&format!(
                    " INNER JOIN {} {alias} ON {} = {}",
                    quote_ident(&target.table),
                    qualified(&alias, &relation.target_column),
                    qualified(&parent_alias, &relation.local_column),
                ));
                from.joins.push(Join {
                    prefix: prefix.to_vec(),
                    alias,
                    table: target,
                });
            }
        }

        Ok(from)
    }
}

/// `'attr', alias."column"` pairs for every scalar column of `table`.
fn json_fields(table: &TableMapping, alias: &str) -> Vec<String> {
    table
        .columns
        .iter()
        .map(|c| format!("{}, {}", quote_literal(&c.attribute), qualified(alias, &c.column)))
        .collect()
}

/// Append ` WHERE a AND b AND ...` for the predicate's leaves.
fn push_where(
    sql: &mut String,
    from: &FromClause<'_>,
    predicate: Option<&Predicate>,
    bind_params: &mut Vec<BindValue>,
) -> Result<()> {
    let Some(predicate) = predicate else {
        return Ok(());
    };

    let mut conditions = Vec::new();
    for leaf in predicate.leaves() {
        let condition = match leaf {
            Predicate::Equals { path, value } => {
                let (column, scalar_type) = from.column(path)?;
                let idx = push_value(bind_params, value);
                format!("{} = ${idx}", comparable(column, scalar_type))
            }
            Predicate::In { values, .. } if values.is_empty() => "FALSE".to_string(),
            Predicate::In { path, values } => {
                let (column, scalar_type) = from.column(path)?;
                let idx = push_array(bind_params, values[0].scalar_type(), values);
                format!("{} = ANY(${idx})", comparable(column, scalar_type))
            }
            Predicate::And(..) => continue,
        };
        conditions.push(condition);
    }

    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    Ok(())
}

/// Text values compare against the column's text form, so columns of types
/// the engine does not model still accept string filters and string keys.
fn comparable(column: String, scalar_type: ScalarType) -> String {
    match scalar_type {
        ScalarType::Text => format!("{column}::text"),
        _ => column,
    }
}
