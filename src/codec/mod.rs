//! Conversion between config trees and domain plans.
//!
//! [`expand`] turns an operator-authored [`PlanTree`](crate::config::PlanTree)
//! into a [`Plan`](crate::model::Plan), validating as it goes. [`flatten`]
//! goes the other way and never fails.
//!
//! `expand(&flatten(&p)) == Ok(canonicalize(p))` for every valid plan `p`
//! whose routing controls are all `On` and whose scaling resource sets each
//! hold a single namespace. Those are the two shapes the tree cannot carry.

pub mod canonical;
pub mod error;
pub mod expand;
mod fields;
pub mod flatten;
pub mod structural;

pub use canonical::{canonicalize, Canonicalize};
pub use error::{ExpandError, ExpandErrorKind, FieldPath};
pub use expand::{expand, expand_with, ExpandOptions, UnionPolicy};
pub use flatten::flatten;
