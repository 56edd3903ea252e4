//! Control-flow graph over basic blocks.
//!
//! The program body and every procedure get their own entry/exit subgraph;
//! calls do not add edges, so each subgraph is one connected component.

use crate::ast::{Block, Expression, Statement};
use crate::utils::string_utils::heading;
use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use serde_json::{json, Value};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum BlockKind {
    Entry,
    Exit,
    Basic,
    Condition,
    LoopHeader,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum EdgeKind {
    Flow,
    True,
    False,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicBlock {
    pub id: String,
    pub kind: BlockKind,
    pub procedure: String,
    pub statements: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    pub graph: DiGraph<BasicBlock, EdgeKind>,
    /// (procedure name, entry, exit); the program body is named `main`.
    pub routines: Vec<(String, NodeIndex, NodeIndex)>,
}

struct Builder {
    graph: DiGraph<BasicBlock, EdgeKind>,
    counter: usize,
    procedure: String,
    prefix: String,
    routines: Vec<(String, NodeIndex, NodeIndex)>,
}

impl Builder {
    fn block(&mut self, suffix: &str, kind: BlockKind) -> NodeIndex {
        let id = format!("{}{}_{}", self.prefix, suffix, self.counter);
        self.counter += 1;
        self.graph.add_node(BasicBlock {
            id,
            kind,
            procedure: self.procedure.clone(),
            statements: Vec::new(),
        })
    }

    fn edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) {
        self.graph.update_edge(from, to, kind);
    }

    fn routine(&mut self, name: &str, prefix: String, body: &Block) {
        for procedure in &body.procedures {
            let saved = (self.procedure.clone(), self.prefix.clone());
            self.procedure = procedure.name.clone();
            self.routine(&procedure.name, format!("proc_{}_", procedure.name), &procedure.body);
            (self.procedure, self.prefix) = saved;
        }
        self.procedure = name.to_string();
        self.prefix = prefix;
        let entry = self.block("entry", BlockKind::Entry);
        let last = self.statement(&body.statement, entry);
        let exit = self.block("exit", BlockKind::Exit);
        self.edge(last, exit, EdgeKind::Flow);
        self.routines.push((name.to_string(), entry, exit));
    }

    fn statement(&mut self, stmt: &Statement, current: NodeIndex) -> NodeIndex {
        match stmt {
            Statement::Assign { .. } | Statement::Call { .. } | Statement::Read { .. } | Statement::Write { .. } => {
                self.graph[current].statements.push(stmt.to_string());
                current
            }
            Statement::Compound { statements } | Statement::NestedBlock { statements, .. } => {
                statements.iter().fold(current, |block, s| self.statement(s, block))
            }
            Statement::If { condition, then } => {
                let cond = self.condition_block("if_cond", BlockKind::Condition, condition);
                self.edge(current, cond, EdgeKind::Flow);
                let then_block = self.block("then", BlockKind::Basic);
                self.edge(cond, then_block, EdgeKind::True);
                let then_end = self.statement(then, then_block);
                let merge = self.block("merge", BlockKind::Merge);
                self.edge(then_end, merge, EdgeKind::Flow);
                self.edge(cond, merge, EdgeKind::False);
                merge
            }
            Statement::While { condition, body } => {
                let header = self.condition_block("while_header", BlockKind::LoopHeader, condition);
                self.edge(current, header, EdgeKind::Flow);
                let body_block = self.block("while_body", BlockKind::Basic);
                self.edge(header, body_block, EdgeKind::True);
                let body_end = self.statement(body, body_block);
                self.edge(body_end, header, EdgeKind::Back);
                let exit = self.block("while_exit", BlockKind::Merge);
                self.edge(header, exit, EdgeKind::False);
                exit
            }
        }
    }

    fn condition_block(&mut self, suffix: &str, kind: BlockKind, condition: &Expression) -> NodeIndex {
        let node = self.block(suffix, kind);
        self.graph[node].statements.push(condition.to_string());
        node
    }
}

impl ControlFlowGraph {
    pub fn build(program: &Block) -> Self {
        let mut builder = Builder {
            graph: DiGraph::new(),
            counter: 0,
            procedure: "main".to_string(),
            prefix: String::new(),
            routines: Vec::new(),
        };
        builder.routine("main", String::new(), program);
        Self {
            graph: builder.graph,
            routines: builder.routines,
        }
    }

    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn components(&self) -> usize {
        connected_components(&self.graph)
    }

    /// E - N + 2P
    pub fn cyclomatic_complexity(&self) -> i64 {
        self.edge_count() as i64 - self.block_count() as i64 + 2 * self.components() as i64
    }

    pub fn block(&self, id: &str) -> Option<&BasicBlock> {
        self.graph.node_weights().find(|b| b.id == id)
    }

    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(node) = self.graph.node_indices().find(|n| self.graph[*n].id == id) else {
            return Vec::new();
        };
        let mut ids: Vec<(usize, &str)> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| (n.index(), self.graph[n].id.as_str()))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn count_edges(&self, kind: EdgeKind) -> usize {
        self.graph.edge_weights().filter(|k| **k == kind).count()
    }

    pub fn count_blocks(&self, kind: BlockKind) -> usize {
        self.graph.node_weights().filter(|b| b.kind == kind).count()
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph CFG {\n");
        out.push_str("    node [shape=box, fontname=\"Courier\"];\n");
        for (name, entry, _) in &self.routines {
            out.push_str(&format!("    // {} starts at {}\n", name, self.graph[*entry].id));
        }
        for block in self.graph.node_weights() {
            let color = match block.kind {
                BlockKind::Entry => "lightgreen",
                BlockKind::Exit => "lightcoral",
                BlockKind::Condition | BlockKind::LoopHeader => "lightyellow",
                BlockKind::Basic | BlockKind::Merge => "lightblue",
            };
            let shape = match block.kind {
                BlockKind::Condition | BlockKind::LoopHeader => ", shape=diamond",
                _ => "",
            };
            let mut label = block.id.clone();
            for stmt in &block.statements {
                label.push_str("\\n");
                label.push_str(stmt);
            }
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\", style=filled, fillcolor={}{}];\n",
                block.id,
                escape_dot(&label),
                color,
                shape
            ));
        }
        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()].id;
            let to = &self.graph[edge.target()].id;
            match edge.weight() {
                EdgeKind::Flow => out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to)),
                EdgeKind::Back => out.push_str(&format!("    \"{}\" -> \"{}\" [label=\"back\", style=dashed];\n", from, to)),
                kind => out.push_str(&format!("    \"{}\" -> \"{}\" [label=\"{}\"];\n", from, to, kind)),
            }
        }
        out.push_str("}\n");
        out
    }

    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        for block in self.graph.node_weights() {
            let mut label = block.id.clone();
            for stmt in &block.statements {
                label.push_str("<br/>");
                label.push_str(stmt);
            }
            let label = escape_mermaid(&label);
            match block.kind {
                BlockKind::Condition | BlockKind::LoopHeader => {
                    out.push_str(&format!("    {}{{\"{}\"}}\n", block.id, label))
                }
                BlockKind::Entry | BlockKind::Exit => out.push_str(&format!("    {}([\"{}\"])\n", block.id, label)),
                _ => out.push_str(&format!("    {}[\"{}\"]\n", block.id, label)),
            }
        }
        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()].id;
            let to = &self.graph[edge.target()].id;
            match edge.weight() {
                EdgeKind::Flow => out.push_str(&format!("    {} --> {}\n", from, to)),
                EdgeKind::Back => out.push_str(&format!("    {} -.->|back| {}\n", from, to)),
                kind => out.push_str(&format!("    {} -->|{}| {}\n", from, kind, to)),
            }
        }
        out
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Control Flow Graph Report");
        out.push_str(&format!("Basic blocks:          {}\n", self.block_count()));
        out.push_str(&format!("Edges:                 {}\n", self.edge_count()));
        out.push_str(&format!("Connected components:  {}\n", self.components()));
        out.push_str(&format!("Cyclomatic complexity: {}\n", self.cyclomatic_complexity()));
        out.push_str(&format!("Decision points:       {}\n", self.count_blocks(BlockKind::Condition)));
        out.push_str(&format!("Loops:                 {}\n", self.count_edges(EdgeKind::Back)));
        out.push_str("\nRoutines:\n");
        for (name, _, _) in &self.routines {
            let blocks = self.graph.node_weights().filter(|b| &b.procedure == name).count();
            out.push_str(&format!("  {:<16} {} blocks\n", name, blocks));
        }
        out
    }

    pub fn analysis(&self) -> String {
        let mut out = String::new();
        heading(&mut out, "Detailed CFG Analysis");
        for block in self.graph.node_weights() {
            out.push_str(&format!("\n{} [{}] in {}\n", block.id, block.kind, block.procedure));
            for stmt in &block.statements {
                out.push_str(&format!("    {}\n", stmt));
            }
            let preds = self.predecessors(&block.id);
            let succs = self.successors(&block.id);
            out.push_str(&format!("  predecessors: {}\n", list_or_none(&preds)));
            out.push_str(&format!("  successors:   {}\n", list_or_none(&succs)));
        }
        out
    }

    pub fn stats(&self) -> Value {
        let routines: Vec<Value> = self
            .routines
            .iter()
            .map(|(name, entry, exit)| {
                json!({
                    "name": name,
                    "entry": self.graph[*entry].id,
                    "exit": self.graph[*exit].id,
                })
            })
            .collect();
        json!({
            "blocks": self.block_count(),
            "edges": self.edge_count(),
            "components": self.components(),
            "cyclomatic_complexity": self.cyclomatic_complexity(),
            "loops": self.count_edges(EdgeKind::Back),
            "routines": routines,
        })
    }
}

fn list_or_none(ids: &[&str]) -> String {
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(", ")
    }
}

fn escape_dot(label: &str) -> String {
    label.replace('"', "\\\"")
}

fn escape_mermaid(label: &str) -> String {
    label.replace('"', "#quot;").replace('<', "#lt;").replace('>', "#gt;").replace("#lt;br/#gt;", "<br/>")
}
