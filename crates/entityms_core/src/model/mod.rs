//! Domain model shared by the generic entity commands.
//!
//! # Responsibility
//! - Define the entity/resource contracts the commands are generic over.
//! - Define lookup values (typed, ordered attribute rows) and projections.
//!
//! # Invariants
//! - `guid` is assigned once at creation and never reused; numeric ids stay
//!   internal and never appear on resources.
//! - Resources are values: `with_*` helpers return a new value.

pub mod entity;
pub mod lookup_value;
pub mod projection;
pub mod thing;
