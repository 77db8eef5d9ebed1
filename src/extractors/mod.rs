//! Request extractors.

pub mod tenant;
pub use tenant::TENANT_ID_HEADER;
