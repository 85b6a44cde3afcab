//! Entity command services.
//!
//! # Responsibility
//! - Compose mapping functions, repositories and lookup utilities into the
//!   generic Create/Find/List commands.
//! - Classify failures into the [`EntityError`] taxonomy.
//!
//! # Invariants
//! - No error is swallowed or retried here; retry is a caller concern.
//! - A create resolves only after every lookup row is written or the whole
//!   command has failed.

pub mod command;
pub mod entity_utils;
pub mod error;
pub mod thing_commands;
