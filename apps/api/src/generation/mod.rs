//! Stage 3 — creative content generation with cascading fallback.
//!
//! One cascade instance per meal slot: cache → LLM → database → static
//! default. The static tier cannot fail, which is the module's correctness
//! guarantee: a structurally valid recipe comes back for every slot under
//! any combination of upstream failures.

pub mod cascade;
pub mod prompts;
pub mod recipe_parser;
pub mod snacks;
