//! SQL compilation for OData query options.
//!
//! Walks the validated query-options model plus the described column set and
//! emits a parameterized statement. Injection safety is an invariant, not a
//! convention: every literal becomes a `?` placeholder with its value in the
//! ordered parameter list, and every identifier is quoted. The emitted SQL is
//! dialect-neutral (`?` placeholders, ANSI double-quoted identifiers,
//! `LIMIT`/`OFFSET`); adapters rewrite placeholders where their driver needs
//! numbered ones.

pub mod compiler;
pub mod params;

pub use compiler::{CompiledQuery, compile_count, compile_select};
pub use params::SqlParam;
