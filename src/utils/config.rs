// Optimizer constants
pub mod optimizer {
    // Upper bound on fold + DCE rounds before giving up on a fixpoint
    pub const MAX_ITERATIONS: usize = 10;
}

// Code generation constants
pub mod codegen {
    pub const INDENT: &str = "    ";
    pub const WORD_SIZE: usize = 8;
    pub const STACK_ALIGNMENT: usize = 16;

    // Alignment helpers
    pub fn align_to_16(size: usize) -> usize {
        size.div_ceil(STACK_ALIGNMENT) * STACK_ALIGNMENT
    }

    pub fn align_stack_size(slot_count: usize) -> usize {
        align_to_16(slot_count * WORD_SIZE)
    }
}

// Identifier mangling for the text backends
pub mod names {
    use lazy_static::lazy_static;
    use std::collections::HashSet;

    lazy_static! {
        pub static ref C_RESERVED: HashSet<&'static str> = [
            "auto", "break", "case", "char", "const", "continue", "default", "do", "double",
            "else", "enum", "extern", "float", "for", "goto", "if", "int", "long", "register",
            "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
            "union", "unsigned", "void", "volatile", "while", "main", "printf", "scanf",
        ]
        .into_iter()
        .collect();
        pub static ref INSTRUMENTED_C_RESERVED: HashSet<&'static str> = C_RESERVED
            .iter()
            .copied()
            .chain([
                "operation_count", "procedure_calls", "io_operations", "start_time", "end_time",
                "print_profile_results", "gettimeofday", "PROFILE_START", "PROFILE_END",
                "PROFILE_OP", "PROFILE_CALL", "PROFILE_IO",
            ])
            .collect();
        pub static ref PYTHON_RESERVED: HashSet<&'static str> = [
            "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
            "continue", "def", "del", "elif", "else", "except", "finally", "for", "from",
            "global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass",
            "raise", "return", "try", "while", "with", "yield", "print", "input", "int", "main",
        ]
        .into_iter()
        .collect();
        pub static ref ASM_RESERVED: HashSet<&'static str> = [
            "main", "printf", "scanf", "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "rbp", "rsp",
            "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
        ]
        .into_iter()
        .collect();
        pub static ref LLVM_RESERVED: HashSet<&'static str> = ["main", "printf", "scanf"].into_iter().collect();
        pub static ref NO_RESERVED: HashSet<&'static str> = HashSet::new();
    }

    pub fn rename_identifier(name: &str, reserved: &HashSet<&'static str>) -> String {
        if reserved.contains(name) || name.starts_with('_') {
            format!("v_{}", name)
        } else {
            name.to_string()
        }
    }
}

// Artifact names and the files they are written to
pub mod artifacts {
    pub const C_CODE: &str = "c_code";
    pub const OPT_C_CODE: &str = "opt_c_code";
    pub const OPT_C_ANALYSIS: &str = "opt_c_analysis";
    pub const PY_CODE: &str = "py_code";
    pub const PY_OPT_ANALYSIS: &str = "py_opt_analysis";
    pub const ASM_CODE: &str = "asm_code";
    pub const ASM_METRICS: &str = "asm_metrics";
    pub const TAC_CODE: &str = "tac_code";
    pub const CFG_DOT: &str = "cfg_dot";
    pub const CFG_MERMAID: &str = "cfg_mermaid";
    pub const CFG_REPORT: &str = "cfg_report";
    pub const CFG_ANALYSIS: &str = "cfg_analysis";
    pub const TYPE_REPORT: &str = "type_report";
    pub const TYPE_ANALYSIS: &str = "type_analysis";
    pub const TYPE_ERRORS: &str = "type_errors";
    pub const METRICS_REPORT: &str = "metrics_report";
    pub const OPTIMIZED_AST: &str = "optimized_ast";
    pub const OPTIMIZATION_REPORT: &str = "optimization_report";
    pub const LLVM_CODE: &str = "llvm_code";
    pub const PERF_PROFILE: &str = "perf_profile";
    pub const INSTR_C_CODE: &str = "instr_c_code";

    const SUFFIXES: &[(&str, &str)] = &[
        (C_CODE, ".c"),
        (OPT_C_CODE, "_optimized.c"),
        (PY_CODE, ".py"),
        (TAC_CODE, ".tac"),
        (ASM_CODE, ".s"),
        (LLVM_CODE, ".ll"),
        (INSTR_C_CODE, "_instrumented.c"),
        (CFG_DOT, "_cfg.dot"),
        (CFG_MERMAID, "_cfg.mmd"),
    ];

    /// File suffix appended to the source base name for an artifact.
    pub fn file_suffix(artifact: &str) -> String {
        SUFFIXES
            .iter()
            .find(|(name, _)| *name == artifact)
            .map(|(_, suffix)| suffix.to_string())
            .unwrap_or_else(|| format!("_{}.txt", artifact))
    }
}

// Builtin plugin names
pub mod plugins {
    pub const TYPE_CHECKER: &str = "type_checker";
    pub const AST_OPTIMIZER: &str = "ast_optimizer";
    pub const CFG_BUILDER: &str = "cfg_builder";
    pub const CODE_METRICS: &str = "code_metrics";
    pub const TAC_GENERATOR: &str = "tac_generator";
    pub const C_GENERATOR: &str = "c_generator";
    pub const OPT_C_GENERATOR: &str = "opt_c_generator";
    pub const PYTHON_GENERATOR: &str = "python_generator";
    pub const ASSEMBLY_GENERATOR: &str = "assembly_generator";
    pub const LLVM_GENERATOR: &str = "llvm_generator";
    pub const PERFORMANCE_PROFILER: &str = "performance_profiler";
}
