//! `@name` parameter markers: discovery and rewriting into backend placeholder syntax.
//!
//! Markers inside quoted strings, quoted identifiers, comments, and dollar-quoted blocks are
//! ignored. A doubled marker (`@@IDENTITY`) is a server variable, not a parameter.

use std::borrow::Cow;

mod scanner;

use scanner::scan;

/// Positional placeholder syntax understood by a backend driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// SQL Server RPC style `@P1`.
    Mssql,
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

impl PlaceholderStyle {
    /// Render the placeholder for the 1-based `position`.
    #[must_use]
    pub fn render(self, position: usize) -> String {
        match self {
            PlaceholderStyle::Mssql => format!("@P{position}"),
            PlaceholderStyle::Postgres => format!("${position}"),
            PlaceholderStyle::Sqlite => format!("?{position}"),
        }
    }
}

/// Parameter names in order of first occurrence, duplicates kept, marker included.
///
/// ```rust
/// use sql_connector::placeholders::extract_parameter_names;
///
/// let names = extract_parameter_names("SELECT * FROM t WHERE a = @x AND b = @y OR c = @x");
/// assert_eq!(names, vec!["@x", "@y", "@x"]);
/// ```
#[must_use]
pub fn extract_parameter_names(sql: &str) -> Vec<String> {
    scan(sql)
        .into_iter()
        .map(|token| sql[token.start..token.end].to_string())
        .collect()
}

/// Replace every `@name` marker with the positional placeholder for its occurrence index.
///
/// Each occurrence gets its own position, matching how values are bound. Returns a borrowed
/// `Cow` when the text has no markers.
#[must_use]
pub fn rewrite_placeholders(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    let tokens = scan(sql);
    if tokens.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + tokens.len() * 2);
    let mut last = 0;
    for (idx, token) in tokens.iter().enumerate() {
        out.push_str(&sql[last..token.start]);
        out.push_str(&style.render(idx + 1));
        last = token.end;
    }
    out.push_str(&sql[last..]);
    Cow::Owned(out)
}
