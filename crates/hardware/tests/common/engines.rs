use std::collections::VecDeque;

use memhier_core::EngineError;
use memhier_core::sim::{Engine, ExitEvent};
use memhier_core::soc::FinalizedGraph;
use mockall::mock;

mock! {
    pub SimEngine {}
    impl Engine for SimEngine {
        fn instantiate(&mut self, graph: &FinalizedGraph) -> Result<(), EngineError>;
        fn simulate(&mut self, graph: &FinalizedGraph) -> Result<ExitEvent, EngineError>;
    }
}

/// Fake engine replaying scripted results and counting calls.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    instantiate_results: VecDeque<Result<(), EngineError>>,
    exits: VecDeque<Result<ExitEvent, EngineError>>,
    /// Number of `instantiate` calls received.
    pub instantiate_calls: usize,
    /// Number of `simulate` calls received.
    pub simulate_calls: usize,
    /// Components in the last graph seen.
    pub last_graph_size: Option<usize>,
}

impl ScriptedEngine {
    /// Engine that accepts the graph and exits with `event`.
    pub fn exiting(event: ExitEvent) -> Self {
        Self::default().then_exit(Ok(event))
    }

    /// Queues the result of the next `instantiate`.
    pub fn then_instantiate(mut self, result: Result<(), EngineError>) -> Self {
        self.instantiate_results.push_back(result);
        self
    }

    /// Queues the result of the next `simulate`.
    pub fn then_exit(mut self, result: Result<ExitEvent, EngineError>) -> Self {
        self.exits.push_back(result);
        self
    }
}

impl Engine for ScriptedEngine {
    fn instantiate(&mut self, graph: &FinalizedGraph) -> Result<(), EngineError> {
        self.instantiate_calls += 1;
        self.last_graph_size = Some(graph.graph().len());
        self.instantiate_results.pop_front().unwrap_or(Ok(()))
    }

    fn simulate(&mut self, graph: &FinalizedGraph) -> Result<ExitEvent, EngineError> {
        self.simulate_calls += 1;
        self.last_graph_size = Some(graph.graph().len());
        self.exits
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::new("no scripted exit left")))
    }
}
