//! Filter conditions for WHERE clauses.
//!
//! Conditions are kept in insertion order and AND-joined in that order.
//! Escaping is applied when a condition is added; quoting is applied when the
//! clause is rendered.

use crate::escape::{Value, escape};

/// One stored filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Left-hand side, emitted verbatim.
    pub field: String,
    /// Right-hand side, already escaped if escaping was requested.
    pub value: String,
    /// Comparison operator, emitted verbatim.
    pub operator: String,
    /// `true` emits `value` unquoted.
    pub literal: bool,
}

impl Condition {
    /// Render as `field op value`, quoting non-literal values.
    pub fn render(&self) -> String {
        if self.literal {
            format!("{} {} {}", self.field, self.operator, self.value)
        } else {
            format!("{} {} '{}'", self.field, self.operator, self.value)
        }
    }
}

/// Arguments for adding one condition.
///
/// Defaults: operator `=`, escaping on, quoted (non-literal) value.
///
/// # Example
/// ```ignore
/// let spec = ConditionSpec::new("NOW()", "DATE_ADD(created_at, INTERVAL 10 SECOND)")
///     .op("<")
///     .literal(true);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSpec {
    field: String,
    value: Value,
    operator: String,
    escape: bool,
    literal: bool,
}

impl ConditionSpec {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator: "=".to_string(),
            escape: true,
            literal: false,
        }
    }

    /// Set the comparison operator (not validated).
    pub fn op(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    /// Enable or disable quote escaping of the value.
    pub fn escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    /// Emit the value unquoted. Literal values are never escaped.
    pub fn literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    fn into_condition(self) -> Condition {
        let value = if self.escape && !self.literal {
            escape(&self.value).to_sql_text()
        } else {
            self.value.to_sql_text()
        };
        Condition {
            field: self.field,
            value,
            operator: self.operator,
            literal: self.literal,
        }
    }
}

impl<F, V> From<(F, V)> for ConditionSpec
where
    F: Into<String>,
    V: Into<Value>,
{
    fn from((field, value): (F, V)) -> Self {
        ConditionSpec::new(field, value)
    }
}

impl<F, V, O> From<(F, V, O)> for ConditionSpec
where
    F: Into<String>,
    V: Into<Value>,
    O: Into<String>,
{
    fn from((field, value, operator): (F, V, O)) -> Self {
        ConditionSpec::new(field, value).op(operator)
    }
}

impl<F, V, O> From<(F, V, O, bool)> for ConditionSpec
where
    F: Into<String>,
    V: Into<Value>,
    O: Into<String>,
{
    fn from((field, value, operator, escape): (F, V, O, bool)) -> Self {
        ConditionSpec::new(field, value).op(operator).escape(escape)
    }
}

impl<F, V, O> From<(F, V, O, bool, bool)> for ConditionSpec
where
    F: Into<String>,
    V: Into<Value>,
    O: Into<String>,
{
    fn from((field, value, operator, escape, literal): (F, V, O, bool, bool)) -> Self {
        ConditionSpec::new(field, value)
            .op(operator)
            .escape(escape)
            .literal(literal)
    }
}

/// Ordered, AND-joined set of conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one condition.
    pub fn add(&mut self, spec: impl Into<ConditionSpec>) -> &mut Self {
        self.conditions.push(spec.into().into_condition());
        self
    }

    /// Append several conditions, each defaulted independently.
    pub fn add_all<I, S>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ConditionSpec>,
    {
        for spec in specs {
            self.add(spec);
        }
        self
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }

    /// Render the WHERE clause, or an empty string when there are no conditions.
    pub fn render(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self.conditions.iter().map(Condition::render).collect();
        format!("WHERE {}", parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_renders_nothing() {
        assert_eq!(ConditionSet::new().render(), "");
    }

    #[test]
    fn test_defaults_quote_and_escape() {
        let mut set = ConditionSet::new();
        set.add(("name", "O'Brien"));
        let cond = set.iter().next().unwrap();
        assert_eq!(cond.value, "O\\'Brien");
        assert_eq!(cond.operator, "=");
        assert!(!cond.literal);
        assert_eq!(set.render(), "WHERE name = 'O\\'Brien'");
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut set = ConditionSet::new();
        set.add(("b", 2)).add(("a", 1));
        assert_eq!(set.render(), "WHERE b = '2' AND a = '1'");
    }

    #[test]
    fn test_batch_defaults_apply_per_tuple() {
        let mut set = ConditionSet::new();
        set.add_all([
            ConditionSpec::from(("id", 7)),
            ConditionSpec::from(("email", "x'y", "like", false)),
            ConditionSpec::from(("NOW()", "DATE_ADD(d, INTERVAL 1 DAY)", "<", false, true)),
        ]);
        assert_eq!(
            set.render(),
            "WHERE id = '7' AND email like 'x'y' AND NOW() < DATE_ADD(d, INTERVAL 1 DAY)"
        );
    }

    #[test]
    fn test_literal_values_are_not_escaped() {
        let mut set = ConditionSet::new();
        set.add(ConditionSpec::new("label", "it's").literal(true));
        assert_eq!(set.render(), "WHERE label = it's");
    }

    #[test]
    fn test_operator_is_verbatim() {
        let mut set = ConditionSet::new();
        set.add(("age", 3, "=>"));
        assert_eq!(set.render(), "WHERE age => '3'");
    }
}
