//! Limit and offset.

use crate::error::{Result, SqlError};

/// How many rows the caller expects back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultArity {
    /// Every row.
    #[default]
    Many,
    /// The first row, if any.
    First,
    /// The first row; zero rows is an error.
    FirstOrFail,
}

/// Holds limit, offset and result arity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitBuilder {
    limit: Option<u64>,
    offset: Option<u64>,
    arity: ResultArity,
}

impl LimitBuilder {
    /// Creates a builder without limit or offset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the limit.
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Returns the offset.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns the result arity.
    #[must_use]
    pub fn arity(&self) -> ResultArity {
        self.arity
    }
}

fn positive(kind: &str, count: i64) -> Result<u64> {
    match u64::try_from(count) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SqlError::invalid_argument(format!(
            "{kind} must be greater than zero, got {count}"
        ))),
    }
}

/// Limit operations shared by select builders.
pub trait LimitClause {
    /// Returns the embedded limit builder.
    fn limit_builder(&self) -> &LimitBuilder;

    /// Returns the embedded limit builder mutably.
    fn limit_builder_mut(&mut self) -> &mut LimitBuilder;

    /// Returns at most `count` rows.
    fn take(&mut self, count: i64) -> Result<&mut Self> {
        self.limit_builder_mut().limit = Some(positive("take", count)?);
        Ok(self)
    }

    /// Skips the first `count` rows.
    fn skip(&mut self, count: i64) -> Result<&mut Self> {
        self.limit_builder_mut().offset = Some(positive("skip", count)?);
        Ok(self)
    }

    /// Returns only the first row, if any.
    fn first(&mut self) -> &mut Self {
        let builder = self.limit_builder_mut();
        builder.limit = Some(1);
        builder.arity = ResultArity::First;
        self
    }

    /// Returns only the first row; zero rows is an error at execution.
    fn first_or_fail(&mut self) -> &mut Self {
        let builder = self.limit_builder_mut();
        builder.limit = Some(1);
        builder.arity = ResultArity::FirstOrFail;
        self
    }

    /// Removes limit, offset and arity.
    fn clear_limit(&mut self) -> &mut Self {
        *self.limit_builder_mut() = LimitBuilder::default();
        self
    }
}

impl LimitClause for LimitBuilder {
    fn limit_builder(&self) -> &LimitBuilder {
        self
    }

    fn limit_builder_mut(&mut self) -> &mut LimitBuilder {
        self
    }
}
