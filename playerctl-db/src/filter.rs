//! Declarative row filters
//!
//! A [`Filter`] is a conjunction of `{field, operator, value}` predicates.
//! It is rendered into a MySQL `WHERE` clause with bound parameters, so
//! column names only ever come from [`PlayerField`].

use std::fmt;
use std::str::FromStr;

use sqlx::{MySql, QueryBuilder};
use thiserror::Error;

use crate::models::Player;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("unknown field '{0}' (expected id, coins or goods)")]
    UnknownField(String),

    #[error("unknown comparison '{0}'")]
    UnknownComparison(String),

    #[error("invalid value '{0}': expected an integer")]
    InvalidValue(String),

    #[error("cannot parse predicate '{0}': expected '<field> <op> <value>'")]
    Malformed(String),
}

/// Filterable player columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Id,
    Coins,
    Goods,
}

impl PlayerField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Coins => "coins",
            Self::Goods => "goods",
        }
    }

    fn value_of(self, player: &Player) -> i32 {
        match self {
            Self::Id => player.id,
            Self::Coins => player.coins,
            Self::Goods => player.goods,
        }
    }
}

impl fmt::Display for PlayerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for PlayerField {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "coins" => Ok(Self::Coins),
            "goods" => Ok(Self::Goods),
            _ => Err(FilterParseError::UnknownField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    pub fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

impl FromStr for Comparison {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(Self::Eq),
            "ne" | "!=" | "<>" => Ok(Self::Ne),
            "gt" | ">" => Ok(Self::Gt),
            "ge" | "gte" | ">=" => Ok(Self::Ge),
            "lt" | "<" => Ok(Self::Lt),
            "le" | "lte" | "<=" => Ok(Self::Le),
            _ => Err(FilterParseError::UnknownComparison(s.to_string())),
        }
    }
}

/// One `{field, operator, value}` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub field: PlayerField,
    pub op: Comparison,
    pub value: i32,
}

impl Predicate {
    pub fn new(field: PlayerField, op: Comparison, value: i32) -> Self {
        Self { field, op, value }
    }

    /// Evaluate against a row already in memory.
    pub fn matches(&self, player: &Player) -> bool {
        self.op.holds(self.field.value_of(player), self.value)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// Accepts `coins > 300`, `coins>300` and `coins gt 300`.
impl FromStr for Predicate {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FilterParseError::Malformed(s.to_string());
        let trimmed = s.trim();

        let (field, op, value) = match trimmed.find(&['<', '>', '=', '!'][..]) {
            Some(start) => {
                let rest = &trimmed[start..];
                let op_len = rest
                    .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
                    .ok_or_else(malformed)?;
                (&trimmed[..start], &rest[..op_len], &rest[op_len..])
            }
            None => {
                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                match parts.as_slice() {
                    [field, op, value] => (*field, *op, *value),
                    _ => return Err(malformed()),
                }
            }
        };

        if field.trim().is_empty() {
            return Err(malformed());
        }
        let value = value.trim();

        Ok(Self {
            field: field.parse()?,
            op: op.parse()?,
            value: value
                .parse()
                .map_err(|_| FilterParseError::InvalidValue(value.to_string()))?,
        })
    }
}

/// Conjunction of predicates. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-predicate filter.
    pub fn when(field: PlayerField, op: Comparison, value: i32) -> Self {
        Self::new().and(field, op, value)
    }

    pub fn and(mut self, field: PlayerField, op: Comparison, value: i32) -> Self {
        self.predicates.push(Predicate::new(field, op, value));
        self
    }

    pub fn matches(&self, player: &Player) -> bool {
        self.predicates.iter().all(|p| p.matches(player))
    }

    /// Append ` WHERE a AND b ...` with bound values. Nothing for an empty filter.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, MySql>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder.push(predicate.field.column());
            builder.push(" ");
            builder.push(predicate.op.sql());
            builder.push(" ");
            builder.push_bind(predicate.value);
        }
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
        }
    }
}

impl FromIterator<Predicate> for Filter {
    fn from_iter<I: IntoIterator<Item = Predicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return f.write_str("all rows");
        }
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}
