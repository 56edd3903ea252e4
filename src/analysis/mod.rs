pub mod cfg;
pub mod metrics;
pub mod perf;

pub use cfg::{BasicBlock, BlockKind, ControlFlowGraph, EdgeKind};
pub use metrics::{CodeMetrics, ProcedureMetrics};
pub use perf::{Hotspot, HotspotKind, LoopProfile, PerformanceProfile};
