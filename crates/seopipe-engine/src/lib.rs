//! Deterministic SEO keyword engine: density math, tiered mention
//! budgeting, and structured-output recovery from LLM text.
//!
//! Everything in this crate is pure and synchronous: no I/O, no shared
//! mutable state, bit-identical output for identical input. The surrounding
//! orchestration layer (HTTP handlers, LLM process spawning, prompt
//! construction) lives elsewhere and calls in through `density::keyword_density`,
//! `allocate::allocate`, and `extract::extract_structured`.

pub mod allocate;
pub mod density;
pub mod extract;
pub mod schema;
pub mod textprep;
