//! Data layer: core types, loading, and grouped extraction.
//!
//! Architecture:
//! ```text
//!  .csv (comma / semicolon)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → DataTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ DataTable  │  Vec<Row>, column index, stable row indices
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  groups   │  partition by level / restrict to cleaned rows
//!   └──────────┘
//! ```

pub mod groups;
pub mod loader;
pub mod model;
