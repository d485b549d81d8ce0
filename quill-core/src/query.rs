use crate::value::Value;

/// Row window for `find_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most `n` rows.
    Count(u64),
    /// `count` rows starting after `offset` rows.
    Range { offset: u64, count: u64 },
}

/// Clauses appended to a model's SELECT template.
///
/// `filter` and `order_by` are spliced into the statement verbatim. Only pass
/// fragments written in code; user input belongs in [`FindOptions::bind`].
///
/// ```
/// use quill_core::{FindOptions, Value};
///
/// let options = FindOptions::new()
///     .filter("`blog_id`=?")
///     .bind("b1")
///     .order_by("`created_at` desc")
///     .page(20, 10);
/// let (sql, args) = options.render("SELECT `id` FROM `comments`");
/// assert_eq!(
///     sql,
///     "SELECT `id` FROM `comments` WHERE `blog_id`=? ORDER BY `created_at` desc LIMIT ? OFFSET ?"
/// );
/// assert_eq!(args, vec![Value::from("b1"), Value::Int(10), Value::Int(20)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    filter: Option<String>,
    order_by: Option<String>,
    limit: Option<Limit>,
    args: Vec<Value>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw WHERE clause with `?` placeholders.
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(clause.into());
        self
    }

    /// Appends a positional argument for the filter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Raw ORDER BY clause.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(Limit::Count(count));
        self
    }

    pub fn page(mut self, offset: u64, count: u64) -> Self {
        self.limit = Some(Limit::Range { offset, count });
        self
    }

    /// Appends the clauses to `base` and returns the statement with its arguments.
    pub fn render(&self, base: &str) -> (String, Vec<Value>) {
        let mut sql = String::with_capacity(base.len() + 64);
        sql.push_str(base);
        let mut args = self.args.clone();

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        match self.limit {
            Some(Limit::Count(count)) => {
                sql.push_str(" LIMIT ?");
                args.push(Value::Int(clamp(count)));
            }
            Some(Limit::Range { offset, count }) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                args.push(Value::Int(clamp(count)));
                args.push(Value::Int(clamp(offset)));
            }
            None => {}
        }
        (sql, args)
    }
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_leave_template_alone() {
        let (sql, args) = FindOptions::new().render("SELECT 1");
        assert_eq!(sql, "SELECT 1");
        assert!(args.is_empty());
    }

    #[test]
    fn count_limit_binds_one_argument() {
        let (sql, args) = FindOptions::new()
            .order_by("`id`")
            .limit(5)
            .render("SELECT `id` FROM `t`");
        assert_eq!(sql, "SELECT `id` FROM `t` ORDER BY `id` LIMIT ?");
        assert_eq!(args, vec![Value::Int(5)]);
    }

    #[test]
    fn last_window_wins() {
        let (sql, args) = FindOptions::new().limit(3).page(6, 3).render("SELECT 1");
        assert_eq!(sql, "SELECT 1 LIMIT ? OFFSET ?");
        assert_eq!(args, vec![Value::Int(3), Value::Int(6)]);
    }
}
