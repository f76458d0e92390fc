//! State graph: stages + explicit edges (from → to) + conditional edges.
//!
//! Add stages with `add_node`, designate the entry with `add_edge(START, id)`, connect stages
//! with `add_edge`, `add_conditional_edges` or `add_quality_gate` (use `END` as the terminal
//! sentinel), then `compile` or `compile_with_checkpointer` to get a `CompiledStateGraph`.
//! The topology is validated once at compile time and never changes afterwards.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::gate::{GateRouter, GateRoutes, GateStage, QualityGate};
use crate::graph::compile_error::TopologyError;
use crate::graph::compiled::{CompiledStateGraph, ConditionalEdge, Edge};
use crate::graph::router::Router;
use crate::graph::stage::Stage;
use crate::graph::stage_middleware::StageMiddleware;
use crate::memory::Checkpointer;
use crate::state::{GateState, GraphState};

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, entry_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as a destination to end the run.
pub const END: &str = "__end__";

/// Engine safety cap on stage visits per run, so a misconfigured router cannot loop forever.
pub const DEFAULT_MAX_STEPS: usize = 1000;

/// State graph builder: stages plus unconditional and conditional edges.
///
/// Generic over state type `S`. Every node must have exactly one outgoing edge, either
/// unconditional or conditional; conditional routers declare their outcome labels so that
/// each label can be checked against the destination map.
///
/// **Interaction**: Accepts `Arc<dyn Stage<S>>` and `Arc<dyn Router<S>>`; produces
/// `CompiledStateGraph<S>`.
pub struct StateGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Stage<S>>>,
    /// Registration order; keeps validation errors deterministic.
    node_order: Vec<String>,
    edges: Vec<(String, String)>,
    conditional: Vec<(String, ConditionalEdge<S>)>,
    middleware: Option<Arc<dyn StageMiddleware<S>>>,
    max_steps: usize,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> StateGraph<S> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            node_order: Vec::new(),
            edges: Vec::new(),
            conditional: Vec::new(),
            middleware: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Adds a stage; id must be unique. Replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, stage: Arc<dyn Stage<S>>) -> &mut Self {
        let id = id.into();
        if self.nodes.insert(id.clone(), stage).is_none() {
            self.node_order.push(id);
        }
        self
    }

    /// Adds an unconditional edge from `from_id` to `to_id`.
    ///
    /// `add_edge(START, id)` designates the entry node; `add_edge(id, END)` ends the run
    /// after `id`.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds a conditional edge: after `source` runs, `router` picks an outcome label and
    /// `routes` maps it to the next node (or `END`).
    pub fn add_conditional_edges<I, K, V>(
        &mut self,
        source: impl Into<String>,
        router: Arc<dyn Router<S>>,
        routes: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let routes = routes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.conditional
            .push((source.into(), ConditionalEdge { router, routes }));
        self
    }

    /// Wraps every stage invocation with `middleware` in the compiled graph.
    pub fn with_middleware(mut self, middleware: Arc<dyn StageMiddleware<S>>) -> Self {
        self.middleware = Some(middleware);
        self
    }

    /// Overrides the per-run stage visit cap (default [`DEFAULT_MAX_STEPS`]).
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Builds the executable graph after validating the topology.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, TopologyError> {
        self.compile_internal(None)
    }

    /// Builds the executable graph with a checkpointer: the state is saved under the run id
    /// at run start and after every stage.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, TopologyError> {
        self.compile_internal(Some(checkpointer))
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledStateGraph<S>, TopologyError> {
        let known = |id: &str| self.nodes.contains_key(id);

        for (from, to) in &self.edges {
            if from != START && !known(from) {
                return Err(TopologyError::NodeNotFound(from.clone()));
            }
            if to != END && !known(to) {
                return Err(TopologyError::NodeNotFound(to.clone()));
            }
        }
        for (source, edge) in &self.conditional {
            if !known(source) {
                return Err(TopologyError::NodeNotFound(source.clone()));
            }
            for to in edge.routes.values() {
                if to != END && !known(to) {
                    return Err(TopologyError::NodeNotFound(to.clone()));
                }
            }
        }

        let entries: Vec<String> = self
            .edges
            .iter()
            .filter(|(from, _)| from == START)
            .map(|(_, to)| to.clone())
            .collect();
        let entry = match entries.as_slice() {
            [] => return Err(TopologyError::MissingEntry),
            [only] if only != END => only.clone(),
            [_] => return Err(TopologyError::NodeNotFound(END.to_string())),
            _ => return Err(TopologyError::MultipleEntries(entries)),
        };

        let mut direct: HashMap<String, String> = HashMap::new();
        for (from, to) in self.edges.iter().filter(|(from, _)| from != START) {
            if direct.insert(from.clone(), to.clone()).is_some() {
                return Err(TopologyError::DuplicateEdge(from.clone()));
            }
        }
        let mut conditional: HashMap<String, ConditionalEdge<S>> = HashMap::new();
        for (source, edge) in self.conditional {
            if direct.contains_key(&source) {
                return Err(TopologyError::ConflictingEdges(source));
            }
            for label in edge.router.outcomes() {
                if !edge.routes.contains_key(*label) {
                    return Err(TopologyError::MissingRoute {
                        node_id: source,
                        label: label.to_string(),
                    });
                }
            }
            if conditional.insert(source.clone(), edge).is_some() {
                return Err(TopologyError::DuplicateEdge(source));
            }
        }

        let mut edges: HashMap<String, Edge<S>> = HashMap::new();
        for id in &self.node_order {
            let edge = match (direct.remove(id), conditional.remove(id)) {
                (Some(to), None) => Edge::Direct(to),
                (None, Some(edge)) => Edge::Conditional(edge),
                (Some(_), Some(_)) => return Err(TopologyError::ConflictingEdges(id.clone())),
                (None, None) => return Err(TopologyError::MissingOutgoingEdge(id.clone())),
            };
            edges.insert(id.clone(), edge);
        }

        let reachable = reachable_from(&entry, &edges);
        if let Some(id) = self.node_order.iter().find(|id| !reachable.contains(id.as_str())) {
            return Err(TopologyError::Unreachable(id.clone()));
        }

        let shared = S::shared_fields();
        let mut owners: HashMap<&'static str, &str> = HashMap::new();
        for id in &self.node_order {
            for field in self.nodes[id].writes() {
                if shared.contains(field) {
                    continue;
                }
                if let Some(first) = owners.insert(field, id.as_str()) {
                    if first != id {
                        return Err(TopologyError::SharedField {
                            field: field.to_string(),
                            first: first.to_string(),
                            second: id.clone(),
                        });
                    }
                }
            }
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            edges,
            entry,
            checkpointer,
            middleware: self.middleware,
            max_steps: self.max_steps,
        })
    }
}

impl<S: GateState> StateGraph<S> {
    /// Adds a quality gate as node `id` plus its three-way conditional edge.
    ///
    /// The node runs the gate's contract check and evaluator and owns the state's gate
    /// fields; the edge routes `retry` / `halt` / `passed` to `routes`.
    pub fn add_quality_gate(
        &mut self,
        id: impl Into<String>,
        gate: QualityGate<S>,
        routes: GateRoutes,
    ) -> &mut Self {
        let id = id.into();
        let gate = Arc::new(gate);
        self.add_node(
            id.clone(),
            Arc::new(GateStage {
                id: id.clone(),
                gate: gate.clone(),
            }),
        );
        self.add_conditional_edges(id, Arc::new(GateRouter::new(gate)), routes.into_pairs())
    }
}

fn reachable_from<'a, S: GraphState>(
    entry: &'a str,
    edges: &'a HashMap<String, Edge<S>>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::from([entry]);
    let mut queue = VecDeque::from([entry]);
    while let Some(id) = queue.pop_front() {
        let targets: Vec<&str> = match edges.get(id) {
            Some(Edge::Direct(to)) => vec![to.as_str()],
            Some(Edge::Conditional(edge)) => edge.routes.values().map(String::as_str).collect(),
            None => Vec::new(),
        };
        for to in targets {
            if to != END && seen.insert(to) {
                queue.push_back(to);
            }
        }
    }
    seen
}
