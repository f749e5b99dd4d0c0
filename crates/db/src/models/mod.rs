//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/update DTOs where the table is writable over HTTP

pub mod customer;
pub mod eligibility_criteria;
pub mod tier;
pub mod transaction;
