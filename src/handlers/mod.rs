//! Built-in handlers and externally defined preset searches.
//!
//! | name             | pipeline                          |
//! |------------------|-----------------------------------|
//! | `context_search` | scan, rank, truncate, render      |
//! | `search_tests`   | as above, test file globs         |
//! | `search_config`  | as above, config file globs       |
//! | `rank_matches`   | merge, rank, truncate, render     |
//!
//! Additional preset searches are read from YAML files (see
//! [`definitions`]).

pub mod definitions;
pub mod preset;
pub mod rank;
pub mod search;

use chrono::Utc;

use crate::dispatcher::HandlerRegistry;
use crate::error::Result;
use crate::scorer::Criteria;
use crate::types::HandlerArgs;

pub use definitions::{load_definitions, HandlerDefinition};
pub use rank::RankMatchesHandler;
pub use search::SearchHandler;

/// Register the built-in handlers.
pub fn register_builtin(registry: &mut HandlerRegistry) -> Result<()> {
    registry.register(SearchHandler::context_search())?;
    registry.register(preset::search_tests()?)?;
    registry.register(preset::search_config()?)?;
    registry.register(RankMatchesHandler::new())?;
    Ok(())
}

/// Criteria from the `criteria` argument, or `fallback` when absent.
/// Recency without a reference time is anchored to now.
pub(crate) fn resolve_criteria(args: &HandlerArgs, fallback: &Criteria) -> Result<Criteria> {
    let criteria = match args.get("criteria") {
        Some(value) if !value.is_null() => Criteria::from_value(value)?,
        _ => fallback.clone(),
    };

    if criteria.needs_reference_time() {
        Ok(criteria.with_reference_time(Utc::now()))
    } else {
        Ok(criteria)
    }
}
