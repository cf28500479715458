//! ORDER BY, LIMIT and clear-scope primitives.

use std::fmt;
use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: String,
    pub direction: Direction,
}

impl OrderSpec {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl From<&str> for OrderSpec {
    fn from(field: &str) -> Self {
        OrderSpec::new(field, Direction::Asc)
    }
}

impl From<String> for OrderSpec {
    fn from(field: String) -> Self {
        OrderSpec::new(field, Direction::Asc)
    }
}

impl<F: Into<String>> From<(F, Direction)> for OrderSpec {
    fn from((field, direction): (F, Direction)) -> Self {
        OrderSpec::new(field, direction)
    }
}

/// Ordered list of sort items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSet {
    items: Vec<OrderSpec>,
}

impl OrderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spec: impl Into<OrderSpec>) -> &mut Self {
        self.items.push(spec.into());
        self
    }

    pub fn add_all<I, S>(&mut self, specs: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OrderSpec>,
    {
        self.items.extend(specs.into_iter().map(Into::into));
        self
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Render `ORDER BY f1 dir1, f2 dir2`, or an empty string.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|o| format!("{} {}", o.field, o.direction))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

/// Row cap, optionally with an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSpec {
    Count(u64),
    OffsetCount(u64, u64),
}

impl LimitSpec {
    /// Render `LIMIT n` or `LIMIT offset,count`.
    pub fn render(&self) -> String {
        match self {
            LimitSpec::Count(n) => format!("LIMIT {n}"),
            LimitSpec::OffsetCount(offset, count) => format!("LIMIT {offset},{count}"),
        }
    }
}

impl From<u64> for LimitSpec {
    fn from(n: u64) -> Self {
        LimitSpec::Count(n)
    }
}

impl From<(u64, u64)> for LimitSpec {
    fn from((offset, count): (u64, u64)) -> Self {
        LimitSpec::OffsetCount(offset, count)
    }
}

/// Which part of the builder state `clear` resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearScope {
    Limit,
    GroupBy,
    Where,
    Order,
    /// Limit, group-by, conditions and ordering. The table is kept.
    #[default]
    All,
}

impl FromStr for ClearScope {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to [`ClearScope::All`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "limit" => ClearScope::Limit,
            "group_by" => ClearScope::GroupBy,
            "where" | "wheres" => ClearScope::Where,
            "order" | "orders" => ClearScope::Order,
            _ => ClearScope::All,
        })
    }
}

impl From<&str> for ClearScope {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(scope) => scope,
            Err(never) => match never {},
        }
    }
}
