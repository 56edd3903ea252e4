//! Plugin registry and dependency-ordered scheduler.
//!
//! Plugins form a directed graph with an edge from every dependency to its
//! dependent. Planning removes plugins whose dependencies are missing,
//! disabled or part of a cycle, then orders the rest with Kahn's algorithm,
//! breaking ties by registration order.

use crate::ast::Block;
use crate::pipeline::context::CompilerContext;
use crate::pipeline::messages::{Category, Message, MessageCollector, Severity};
use crate::pipeline::plugin::{FnPlugin, Plugin, PluginDescriptor};
use crate::utils::errors::{Pl0Error, Pl0Result};
use indexmap::{IndexMap, IndexSet};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};

const SCHEDULER: &str = "scheduler";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    MissingDependency { dependency: String },
    DisabledDependency { dependency: String },
    DependencyCycle { cycle: Vec<String> },
    DependencySkipped { dependency: String },
    DependencyFailed { dependency: String },
}

impl SkipReason {
    pub fn severity(&self) -> Severity {
        match self {
            SkipReason::Disabled => Severity::Debug,
            SkipReason::DisabledDependency { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    fn message(&self, plugin: &str) -> Message {
        let text = match self {
            SkipReason::Disabled => format!("Plugin '{}' is disabled", plugin),
            SkipReason::MissingDependency { dependency } => format!(
                "Plugin '{}' depends on '{}', which is not registered; skipping '{}'",
                plugin, dependency, plugin
            ),
            SkipReason::DisabledDependency { dependency } => format!(
                "Plugin '{}' skipped because its dependency '{}' is disabled or waits on a disabled plugin",
                plugin, dependency
            ),
            SkipReason::DependencyCycle { cycle } => format!(
                "Plugin '{}' skipped: it is part of the dependency cycle {}",
                plugin,
                cycle.join(" -> ")
            ),
            SkipReason::DependencySkipped { dependency } => format!(
                "Plugin '{}' skipped because its dependency '{}' did not run",
                plugin, dependency
            ),
            SkipReason::DependencyFailed { dependency } => format!(
                "Plugin '{}' skipped because its dependency '{}' failed",
                plugin, dependency
            ),
        };
        let message = Message::new(self.severity(), Category::Scheduling, text).with_source(SCHEDULER);
        match self {
            SkipReason::MissingDependency { dependency } => message.with_suggestion(format!(
                "register a plugin named '{}' or remove it from the dependencies of '{}'",
                dependency, plugin
            )),
            _ => message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Plugins to run, every dependency before its dependents.
    pub order: Vec<String>,
    pub skipped: IndexMap<String, SkipReason>,
    /// One representative path per dependency cycle, first name repeated at the end.
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub executed: Vec<String>,
    pub skipped: IndexMap<String, SkipReason>,
    pub failed: Vec<String>,
}

impl ExecutionReport {
    pub fn ran(&self, plugin: &str) -> bool {
        self.executed.iter().any(|p| p == plugin)
    }

    pub fn position(&self, plugin: &str) -> Option<usize> {
        self.executed.iter().position(|p| p == plugin)
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
    descriptors: Vec<PluginDescriptor>,
    index: HashMap<String, usize>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Pl0Result<()> {
        let descriptor = plugin.descriptor();
        if self.index.contains_key(&descriptor.name) {
            return Err(Pl0Error::DuplicatePlugin {
                name: descriptor.name,
            });
        }
        debug!(plugin = %descriptor.name, deps = ?descriptor.dependencies, "registered plugin");
        self.index.insert(descriptor.name.clone(), self.plugins.len());
        self.descriptors.push(descriptor);
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn register_fn<F>(&mut self, descriptor: PluginDescriptor, run: F) -> Pl0Result<()>
    where
        F: Fn(&Block, &mut CompilerContext, &mut MessageCollector) -> Pl0Result<Option<Value>> + 'static,
    {
        self.register(Box::new(FnPlugin::new(descriptor, run)))
    }

    pub fn enable_plugin(&mut self, name: &str, enabled: bool) -> Pl0Result<()> {
        let idx = *self.index.get(name).ok_or_else(|| Pl0Error::UnknownPlugin {
            name: name.to_string(),
        })?;
        self.descriptors[idx].enabled = enabled;
        Ok(())
    }

    pub fn list_plugins(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Decide what runs and in which order, without running anything.
    pub fn execution_plan(&self) -> Pl0Result<ExecutionPlan> {
        let mut plan = ExecutionPlan::default();
        let mut skipped: HashMap<usize, SkipReason> = HashMap::new();

        // enabled plugins only, keyed by registry index
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut nodes: HashMap<usize, NodeIndex> = HashMap::new();
        for (idx, descriptor) in self.descriptors.iter().enumerate() {
            if descriptor.enabled {
                nodes.insert(idx, graph.add_node(idx));
            } else {
                skipped.insert(idx, SkipReason::Disabled);
            }
        }

        let mut enabled: Vec<(usize, NodeIndex)> = nodes.iter().map(|(i, n)| (*i, *n)).collect();
        enabled.sort();
        for (idx, node) in enabled {
            for dependency in &self.descriptors[idx].dependencies {
                match self.index.get(dependency) {
                    None => {
                        skipped.entry(idx).or_insert_with(|| SkipReason::MissingDependency {
                            dependency: dependency.clone(),
                        });
                    }
                    Some(dep_idx) => match nodes.get(dep_idx) {
                        Some(&dep_node) => {
                            graph.update_edge(dep_node, node, ());
                        }
                        None => {
                            skipped.entry(idx).or_insert_with(|| SkipReason::DisabledDependency {
                                dependency: dependency.clone(),
                            });
                        }
                    },
                }
            }
        }

        let mut components = tarjan_scc(&graph);
        components.sort_by_key(|scc| scc.iter().map(|n| graph[*n]).min());
        for scc in components {
            let is_cycle = scc.len() > 1 || graph.find_edge(scc[0], scc[0]).is_some();
            if !is_cycle {
                continue;
            }
            let cycle = self.cycle_path(&graph, &scc);
            for node in &scc {
                skipped.insert(graph[*node], SkipReason::DependencyCycle { cycle: cycle.clone() });
            }
            plan.cycles.push(cycle);
        }

        // Anything downstream of a skipped plugin cannot run either.
        loop {
            let mut changed = false;
            for node in graph.node_indices() {
                let idx = graph[node];
                if skipped.contains_key(&idx) {
                    continue;
                }
                let blocked = self.dependency_nodes(&graph, node).into_iter().find(|dep| skipped.contains_key(&graph[*dep]));
                if let Some(dep) = blocked {
                    let dependency = self.descriptors[graph[dep]].name.clone();
                    let reason = match skipped.get(&graph[dep]) {
                        Some(SkipReason::Disabled | SkipReason::DisabledDependency { .. }) => {
                            SkipReason::DisabledDependency { dependency }
                        }
                        _ => SkipReason::DependencySkipped { dependency },
                    };
                    skipped.insert(idx, reason);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Kahn's algorithm over the survivors, lowest registration index first
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        let mut ready = BTreeSet::new();
        for node in graph.node_indices() {
            if skipped.contains_key(&graph[node]) {
                continue;
            }
            let degree = graph.neighbors_directed(node, Direction::Incoming).count();
            if degree == 0 {
                ready.insert((graph[node], node));
            }
            in_degree.insert(node, degree);
        }
        let total = in_degree.len();
        while let Some((idx, node)) = ready.pop_first() {
            plan.order.push(self.descriptors[idx].name.clone());
            for dependent in graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((graph[dependent], dependent));
                    }
                }
            }
        }
        if plan.order.len() != total {
            return Err(Pl0Error::SchedulingError(format!(
                "{} of {} plugins could not be ordered",
                total - plan.order.len(),
                total
            )));
        }

        let mut skipped: Vec<_> = skipped.into_iter().collect();
        skipped.sort_by_key(|(idx, _)| *idx);
        plan.skipped = skipped
            .into_iter()
            .map(|(idx, reason)| (self.descriptors[idx].name.clone(), reason))
            .collect();
        Ok(plan)
    }

    fn dependency_nodes(&self, graph: &DiGraph<usize, ()>, node: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<_> = graph.neighbors_directed(node, Direction::Incoming).collect();
        deps.sort_by_key(|n| graph[*n]);
        deps
    }

    /// Shortest dependency path from the earliest registered member of `scc`
    /// back to itself, as plugin names.
    fn cycle_path(&self, graph: &DiGraph<usize, ()>, scc: &[NodeIndex]) -> Vec<String> {
        let members: IndexSet<NodeIndex> = scc.iter().copied().collect();
        let start = scc.iter().copied().min_by_key(|n| graph[*n]).unwrap_or(scc[0]);
        let name = |n: NodeIndex| self.descriptors[graph[n]].name.clone();

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        let mut last = None;
        'search: while let Some(current) = queue.pop_front() {
            for dep in self.dependency_nodes(graph, current) {
                if !members.contains(&dep) {
                    continue;
                }
                if dep == start {
                    last = Some(current);
                    break 'search;
                }
                if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(dep) {
                    e.insert(current);
                    queue.push_back(dep);
                }
            }
        }

        let mut path = vec![name(start)];
        let mut tail = Vec::new();
        let mut cursor = last;
        while let Some(node) = cursor {
            if node == start {
                break;
            }
            tail.push(name(node));
            cursor = parent.get(&node).copied();
        }
        tail.reverse();
        path.extend(tail);
        path.push(name(start));
        path
    }

    /// Run every schedulable plugin in dependency order.
    ///
    /// Never aborts: scheduling anomalies and plugin failures become messages
    /// and the affected plugins are skipped.
    pub fn run_all(&self, ast: &Block, context: &mut CompilerContext, messages: &mut MessageCollector) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let plan = match self.execution_plan() {
            Ok(plan) => plan,
            Err(e) => {
                messages.fatal(Category::Scheduling, SCHEDULER, e.to_string());
                return report;
            }
        };

        for cycle in &plan.cycles {
            let mut members: Vec<&str> = cycle.iter().map(String::as_str).collect();
            members.pop();
            messages.push(
                Message::new(
                    Severity::Error,
                    Category::Scheduling,
                    format!(
                        "Dependency cycle detected: {}; skipping {}",
                        cycle.join(" -> "),
                        members.join(", ")
                    ),
                )
                .with_source(SCHEDULER),
            );
        }
        for (name, reason) in &plan.skipped {
            match reason {
                // reported once per cycle above
                SkipReason::DependencyCycle { .. } => {}
                _ => messages.push(reason.message(name)),
            }
        }
        report.skipped = plan.skipped;

        for name in plan.order {
            let Some(&idx) = self.index.get(&name) else {
                continue;
            };
            let descriptor = &self.descriptors[idx];
            let failed_dep = descriptor
                .dependencies
                .iter()
                .find(|dep| report.failed.contains(*dep) || report.skipped.contains_key(*dep));
            if let Some(dep) = failed_dep {
                let reason = SkipReason::DependencyFailed {
                    dependency: dep.clone(),
                };
                messages.push(reason.message(&name));
                report.skipped.insert(name, reason);
                continue;
            }

            info!(plugin = %name, "running plugin");
            match self.plugins[idx].run(ast, context, messages) {
                Ok(result) => {
                    if let Some(value) = result {
                        context.set_result(&name, value);
                    }
                    report.executed.push(name);
                }
                Err(e) => {
                    let failure = Pl0Error::plugin_error(name.as_str(), e.to_string());
                    messages.push(
                        Message::new(Severity::Error, Category::Internal, failure.to_string()).with_source(name.as_str()),
                    );
                    report.failed.push(name);
                }
            }
        }
        report
    }
}
