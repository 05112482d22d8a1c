// src/lib.rs
// GOVLINK CORE
// Routes civic-services questions to an official link: curated answers first,
// model tiers second, the national portal as the last resort.

pub mod api;
pub mod brain;
pub mod config;
pub mod curated;
pub mod error;
pub mod link;
pub mod matcher;
pub mod normalizer;
pub mod query_log;
pub mod resolver;

pub use config::Config;
pub use resolver::{OutcomeSource, ResolutionOutcome, Resolver};
