/// A parameter marker found in command text; `start..end` covers the marker and the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    pub(super) start: usize,
    pub(super) end: usize,
}

/// Cursor over command text yielding `@name` markers outside literals and comments.
///
/// Each region that cannot hold a parameter (quoted text, comments, dollar-quoted bodies) is
/// skipped in one step. A run of two or more `@` (`@@ROWCOUNT`) is never a parameter.
struct Markers<'a> {
    sql: &'a str,
    pos: usize,
}

impl<'a> Markers<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.sql.as_bytes()
    }

    /// Offset just past a quoted run opened at `pos`; a doubled quote is an escape.
    fn past_quoted(&self, quote: u8) -> usize {
        let bytes = self.bytes();
        let mut i = self.pos + 1;
        while let Some(&b) = bytes.get(i) {
            if b == quote {
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
            i += 1;
        }
        bytes.len()
    }

    fn past_line_comment(&self) -> usize {
        self.sql[self.pos..]
            .find('\n')
            .map_or(self.sql.len(), |nl| self.pos + nl + 1)
    }

    /// Block comments nest, as in PostgreSQL and SQL Server.
    fn past_block_comment(&self) -> usize {
        let bytes = self.bytes();
        let mut depth = 0usize;
        let mut i = self.pos;
        while i + 1 < bytes.len() {
            match &bytes[i..i + 2] {
                b"/*" => {
                    depth += 1;
                    i += 2;
                }
                b"*/" => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => i += 1,
            }
        }
        bytes.len()
    }

    /// Offset past a `$tag$ ... $tag$` body, or `None` when `$` does not open one
    /// (`$1` placeholders, money literals).
    fn past_dollar_quoted(&self) -> Option<usize> {
        let rest = &self.sql[self.pos + 1..];
        let tag_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if rest.as_bytes().get(tag_len) != Some(&b'$')
            || rest.as_bytes().first().is_some_and(u8::is_ascii_digit)
        {
            return None;
        }
        let delimiter = &self.sql[self.pos..self.pos + tag_len + 2];
        let body = self.pos + delimiter.len();
        Some(
            self.sql[body..]
                .find(delimiter)
                .map_or(self.sql.len(), |end| body + end + delimiter.len()),
        )
    }

    /// End of the parameter name following a single marker at `pos`.
    fn name_end(&self) -> usize {
        let start = self.pos + 1;
        self.sql[start..]
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(self.sql.len(), |(offset, _)| start + offset)
    }
}

impl Iterator for Markers<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.pos < self.sql.len() {
            let rest = &self.bytes()[self.pos..];
            self.pos = match rest {
                [b'\'', ..] => self.past_quoted(b'\''),
                [b'"', ..] => self.past_quoted(b'"'),
                [b'-', b'-', ..] => self.past_line_comment(),
                [b'/', b'*', ..] => self.past_block_comment(),
                [b'$', ..] => self.past_dollar_quoted().unwrap_or(self.pos + 1),
                [b'@', b'@', ..] => {
                    self.pos + rest.iter().take_while(|b| **b == b'@').count()
                }
                [b'@', ..] => {
                    let end = self.name_end();
                    if end > self.pos + 1 {
                        let token = Token {
                            start: self.pos,
                            end,
                        };
                        self.pos = end;
                        return Some(token);
                    }
                    self.pos + 1
                }
                _ => self.pos + 1,
            };
        }
        None
    }
}

/// Every marker in `sql`, in order of occurrence.
pub(super) fn scan(sql: &str) -> Vec<Token> {
    Markers { sql, pos: 0 }.collect()
}
