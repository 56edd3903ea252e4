// Abstract Syntax Tree definitions for PL/0 programs.
// Every node owns its children; rewrites build new trees.

mod nodes;
mod printer;

pub use nodes::{BinaryOp, Block, Expression, Procedure, Statement};
pub use printer::pretty;
