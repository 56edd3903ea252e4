use std::{fs::File, io::Read, path::Path};

pub mod analysis;
pub mod ast;
pub mod backend;
pub mod frontend;
pub mod optimizer;
pub mod pipeline;
pub mod plugins;
pub mod semantic;
pub mod utils;

pub use pipeline::{CompileOptions, CompileResult, Compiler};
pub use utils::errors::{Pl0Error, Pl0Result};

pub const VERSION: &str = "0.1.0";

pub struct LineNumber {
    pub line: usize,
}

impl Default for LineNumber {
    fn default() -> Self {
        Self { line: 1 }
    }
}

pub fn read(filename: &Path) -> Pl0Result<String> {
    let path = Path::new(filename);

    match path.extension() {
        Some(ext) if ext == "pl0" => {}
        _ => {
            return Err(Pl0Error::FileReadError("File must have a .pl0 extension".to_string()));
        }
    }
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}
