// Text backends lowering the program tree to target languages.
pub mod asm;
pub mod c;
pub mod emitter;
pub mod llvm;
pub mod names;
pub mod python;
pub mod tac;

use crate::ast::Block;
use crate::utils::errors::Pl0Result;

pub use asm::{AsmGenerator, AsmMetrics};
pub use c::CGenerator;
pub use llvm::LlvmGenerator;
pub use python::PythonGenerator;
pub use tac::TacGenerator;

/// A backend consumes itself to lower one program.
pub trait CodeGenerator {
    fn language(&self) -> &'static str;

    fn generate(self, program: &Block) -> Pl0Result<String>
    where
        Self: Sized;
}
