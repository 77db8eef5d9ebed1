//! Safe SQL compilation: identifiers validated, values as parameters.

mod builder;
pub mod filter;
mod ident;
pub mod join;
pub mod params;
pub mod request;
mod statement;

pub use builder::*;
pub use filter::{compile_equality_filters, compile_filters, compile_or_group, FilterClause, FilterOp};
pub use ident::{is_valid_identifier, Ident};
pub use join::{resolve_joins, JoinSpec, Projection, RelationFields, RelationMeta, ResolvedJoins};
pub use params::*;
pub use request::{RequestParams, RESERVED_PARAMS};
pub use statement::CompiledStatement;
