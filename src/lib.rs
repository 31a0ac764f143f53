//! Codec for region switch plans.
//!
//! Operators author a plan as a config tree ([`config::PlanTree`]); the
//! service speaks the domain model ([`model::Plan`]). [`codec::expand`] and
//! [`codec::flatten`] convert between the two.

pub mod cli;
pub mod codec;
pub mod config;
pub mod model;

pub use codec::{canonicalize, expand, expand_with, flatten, ExpandError, ExpandOptions};
pub use config::{ConfigError, PlanTree};
pub use model::Plan;
