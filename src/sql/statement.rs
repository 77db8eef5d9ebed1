//! Compiled statement: SQL text with positional placeholders and their values.

use crate::sql::PgBindValue;

/// Placeholders are only ever produced by `push_param`, so their count always
/// equals `params.len()`.
#[derive(Clone, Debug, Default)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl CompiledStatement {
    pub fn new() -> Self {
        CompiledStatement::default()
    }

    /// Record a value and return its placeholder (`$n`).
    pub fn push_param(&mut self, v: PgBindValue) -> String {
        self.params.push(v);
        format!("${}", self.params.len())
    }

    /// Placeholder numbers in order of appearance in the SQL text.
    pub fn placeholders(&self) -> Vec<usize> {
        let bytes = self.sql.as_bytes();
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if let Ok(n) = self.sql[start..end].parse() {
                    out.push(n);
                }
                i = end.max(i + 1);
            } else {
                i += 1;
            }
        }
        out
    }

    /// Every value is referenced exactly once and no placeholder is left unbound.
    pub fn placeholders_match_params(&self) -> bool {
        let mut found = self.placeholders();
        found.sort_unstable();
        found == (1..=self.params.len()).collect::<Vec<_>>()
    }
}
