//! Layered integrity and feasibility checks for VEPS events.
//!
//! Every event on the integrity path runs through a pipeline of checks:
//! causality (against the persisted context), actor existence, type-specific
//! business rules, and temporal sanity. Unlike a fail-fast gate, the
//! pipeline always runs **every** check so a caller receives the complete
//! list of failures in one pass.
//!
//! Checks read from the [`ContextStore`](veps_store::ContextStore) but never
//! mutate any state; an outcome is a deterministic function of the event,
//! the visible store state, and the wall clock.

pub mod check;
pub mod checks;
pub mod config;
pub mod error;
pub mod validator;

pub use check::{CheckDecision, EventCheck};
pub use checks::actor::{ActorCheck, ActorPolicy, PermissiveActorPolicy};
pub use checks::business::{BusinessRulesCheck, TypeRule};
pub use checks::causality::CausalityCheck;
pub use checks::temporal::TemporalCheck;
pub use config::ValidatorConfig;
pub use error::{ValidatorError, ValidatorResult};
pub use validator::Validator;
