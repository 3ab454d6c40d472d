//! # wdx-core
//!
//! Core types for the WDX graph explorer.
//!
//! This crate defines the record model, error taxonomy, and response
//! normalizer shared by all other WDX crates:
//! - Records ([`EntityRef`], [`PropertyRef`], [`SearchHit`], [`Statement`],
//!   [`HierarchyNode`], [`QueryResultSet`])
//! - Error hierarchy ([`WdxError`], [`Stage`])
//! - Normalizer ([`normalize`]) — pure functions from raw upstream JSON to
//!   the record model

pub mod error;
pub mod normalize;
pub mod record;

pub use error::{Result, Stage, WdxError};
pub use record::{
    EntityClaims, EntityKind, EntityRef, HierarchyNode, PropertyRef, Qualifier, QueryResultSet,
    Rank, Reference, SearchHit, SearchSource, SearchTarget, Statement,
};
