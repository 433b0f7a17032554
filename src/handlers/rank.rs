//! `rank_matches`: rank caller-supplied matches without scanning.

use async_trait::async_trait;

use crate::dispatcher::handler::{get_optional_usize_arg, get_typed_arg, Handler, HandlerResult};
use crate::dispatcher::ExecutionContext;
use crate::handlers::resolve_criteria;
use crate::scorer::Criteria;
use crate::types::{merge_matches, HandlerArgs, Match};

#[derive(Debug, Clone, Default)]
pub struct RankMatchesHandler;

impl RankMatchesHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for RankMatchesHandler {
    fn name(&self) -> &str {
        "rank_matches"
    }

    fn description(&self) -> &str {
        "Merge, rank and render a caller-supplied list of matches using the given criteria."
    }

    async fn handle(&self, args: &HandlerArgs, context: ExecutionContext) -> HandlerResult {
        let matches: Vec<Match> = get_typed_arg(args, "matches")?;
        let criteria = resolve_criteria(args, &Criteria::default())?;
        let max_results = get_optional_usize_arg(args, "max_results")?;

        let merged = merge_matches(matches);
        let mut ranked = context.scorer().rank(&merged, &criteria);
        if let Some(max) = max_results {
            ranked.truncate(max);
        }
        context.render(&ranked)
    }
}
