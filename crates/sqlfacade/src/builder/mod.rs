//! Statement builder: accumulated state rendered into literal SQL.
//!
//! [`BuilderState`] keeps the table, conditions, ordering, limit, group-by and
//! the last UPDATE field map across calls until it is cleared. Rendering reads
//! only this state, so two builders with equal state render identical SQL.

mod clauses;


pub use clauses::{ClearScope, Direction, LimitSpec, OrderSet, OrderSpec};

use crate::condition::{ConditionSet, ConditionSpec};
use crate::escape::{self, Value};

/// What a render call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// SQL text ready to execute.
    Statement(String),
    /// Safemode blocked an UPDATE/DELETE without conditions.
    GuardRejected,
    /// Nothing to render (e.g. an INSERT/UPDATE without fields).
    Empty,
}

impl Rendered {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Rendered::Statement(sql) => Some(sql),
            _ => None,
        }
    }
}

/// Collect `(field, value)` pairs, keeping their order.
pub fn fields<I, K, V>(pairs: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Mutable builder state shared by every statement a facade renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderState {
    table: String,
    conditions: ConditionSet,
    orders: OrderSet,
    limit: Option<LimitSpec>,
    group_by: Option<String>,
    updates: Vec<(String, String)>,
    sql: String,
}

impl BuilderState {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== State ====================

    /// Set the table name (last write wins).
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Append one WHERE condition.
    pub fn and_where(&mut self, spec: impl Into<ConditionSpec>) -> &mut Self {
        self.conditions.add(spec);
        self
    }

    /// Append several WHERE conditions.
    pub fn and_where_all<I, S>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConditionSpec>,
    {
        self.conditions.add_all(specs);
        self
    }

    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    /// Append one ORDER BY item.
    pub fn order(&mut self, spec: impl Into<OrderSpec>) -> &mut Self {
        self.orders.add(spec);
        self
    }

    /// Append several ORDER BY items.
    pub fn order_all<I, S>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OrderSpec>,
    {
        self.orders.add_all(specs);
        self
    }

    pub fn orders(&self) -> &OrderSet {
        &self.orders
    }

    pub fn limit(&mut self, limit: impl Into<LimitSpec>) -> &mut Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn limit_spec(&self) -> Option<LimitSpec> {
        self.limit
    }

    /// Set the GROUP BY expression, replacing any previous one.
    pub fn group_by(&mut self, expr: impl Into<String>) -> &mut Self {
        let expr = expr.into();
        self.group_by = (!expr.is_empty()).then_some(expr);
        self
    }

    pub fn group_by_expr(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    /// The field map of the last rendered UPDATE.
    pub fn updates(&self) -> &[(String, String)] {
        &self.updates
    }

    /// The most recently rendered or recorded SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    /// Reset one scope. [`ClearScope::All`] resets limit, group-by,
    /// conditions and ordering; the table name is kept.
    pub fn clear(&mut self, scope: impl Into<ClearScope>) -> &mut Self {
        match scope.into() {
            ClearScope::Limit => self.limit = None,
            ClearScope::GroupBy => self.group_by = None,
            ClearScope::Where => self.conditions.clear(),
            ClearScope::Order => self.orders.clear(),
            ClearScope::All => {
                self.limit = None;
                self.group_by = None;
                self.conditions.clear();
                self.orders.clear();
            }
        }
        self
    }

    // ==================== Rendering ====================

    /// The WHERE clause for the current conditions, or an empty string.
    pub fn where_clause(&self) -> String {
        self.conditions.render()
    }

    /// Render `SELECT fields FROM table [WHERE] [GROUP BY] [ORDER BY] [LIMIT]`.
    ///
    /// An empty `fields` slice selects `*`. Fields are joined verbatim.
    pub fn render_select(&mut self, fields: &[&str]) -> String {
        let cols = if fields.is_empty() {
            "*".to_string()
        } else {
            fields.join(", ")
        };

        let mut parts = vec![format!("SELECT {} FROM {}", cols, self.table)];
        parts.push(self.where_clause());
        if let Some(group_by) = &self.group_by {
            parts.push(format!("GROUP BY {group_by}"));
        }
        parts.push(self.orders.render());
        if let Some(limit) = &self.limit {
            parts.push(limit.render());
        }

        let sql = join_parts(parts);
        self.sql = sql.clone();
        sql
    }

    /// Render `INSERT INTO table (keys) VALUES (values)`.
    ///
    /// Values are escaped when `escape` is set and `literal` is not; `literal`
    /// emits them unquoted.
    pub fn render_insert(
        &mut self,
        values: Vec<(String, Value)>,
        escape: bool,
        literal: bool,
    ) -> Rendered {
        if values.is_empty() {
            return Rendered::Empty;
        }

        let mut keys = Vec::with_capacity(values.len());
        let mut rendered = Vec::with_capacity(values.len());
        for (key, value) in values {
            keys.push(key);
            rendered.push(value_text(&value, escape, literal));
        }

        let values_sql = if literal {
            rendered.join(", ")
        } else {
            rendered
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            keys.join(", "),
            values_sql
        );
        self.sql = sql.clone();
        Rendered::Statement(sql)
    }

    /// Render `UPDATE table SET k = 'v', ... [WHERE]`.
    ///
    /// With `safemode` and no conditions nothing is rendered and the stored
    /// field map is left untouched.
    pub fn render_update(
        &mut self,
        values: Vec<(String, Value)>,
        safemode: bool,
        escape: bool,
        literal: bool,
    ) -> Rendered {
        let where_clause = self.where_clause();
        if safemode && where_clause.is_empty() {
            return Rendered::GuardRejected;
        }
        if values.is_empty() {
            return Rendered::Empty;
        }

        self.updates = values
            .iter()
            .map(|(k, v)| (k.clone(), value_text(v, escape, literal)))
            .collect();

        let set = self
            .updates
            .iter()
            .map(|(k, v)| {
                if literal {
                    format!("{k} = {v}")
                } else {
                    format!("{k} = '{v}'")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let sql = join_parts(vec![
            format!("UPDATE {} SET {}", self.table, set),
            where_clause,
        ]);
        self.sql = sql.clone();
        Rendered::Statement(sql)
    }

    /// Render `DELETE FROM table [WHERE]`, subject to the same safemode guard
    /// as [`BuilderState::render_update`].
    pub fn render_delete(&mut self, safemode: bool) -> Rendered {
        let where_clause = self.where_clause();
        if safemode && where_clause.is_empty() {
            return Rendered::GuardRejected;
        }

        let sql = join_parts(vec![format!("DELETE FROM {}", self.table), where_clause]);
        self.sql = sql.clone();
        Rendered::Statement(sql)
    }
}

fn value_text(value: &Value, escaped: bool, literal: bool) -> String {
    if escaped && !literal {
        escape::escape(value).to_sql_text()
    } else {
        value.to_sql_text()
    }
}

fn join_parts(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
