//! Validated SQL identifiers. The only way a name reaches SQL text.

use crate::error::AppError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern"))
}

pub fn is_valid_identifier(s: &str) -> bool {
    identifier_re().is_match(s)
}

/// A bare identifier that passed validation. Cannot be built any other way.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: &str) -> Result<Self, AppError> {
        if is_valid_identifier(name) {
            Ok(Ident(name.to_string()))
        } else {
            Err(AppError::InvalidIdentifier(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form. Validation guarantees no quote characters inside.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// `"qualifier"."self"`
    pub fn qualified(&self, qualifier: &Ident) -> String {
        format!("{}.{}", qualifier.quoted(), self.quoted())
    }

    /// Foreign-key column derived from a relation alias.
    pub fn fk_suffixed(&self) -> Ident {
        Ident(format!("{}_id", self.0))
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
