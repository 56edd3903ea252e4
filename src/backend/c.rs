//! C backend.
//!
//! Every variable becomes a zero-initialised file-scope `long` and every
//! procedure a `void f(void)` at file scope, so nested procedures can reach
//! the variables of their enclosing scopes. Recursive procedures therefore
//! share one copy of their locals.
//!
//! The instrumented flavour counts operations, procedure entries and I/O at
//! run time and prints the counters with the elapsed time on exit.

use super::emitter::CodeBuffer;
use super::names::NameResolver;
use super::CodeGenerator;
use crate::ast::{BinaryOp, Block, Expression, Statement};
use crate::semantic::SymbolKind;
use crate::utils::config::names::{C_RESERVED, INSTRUMENTED_C_RESERVED};
use crate::utils::errors::Pl0Result;

const PROFILE_PRELUDE: &[&str] = &[
    "static unsigned long operation_count = 0;",
    "static unsigned long procedure_calls = 0;",
    "static unsigned long io_operations = 0;",
    "static struct timeval start_time, end_time;",
    "",
    "#define PROFILE_START() gettimeofday(&start_time, NULL)",
    "#define PROFILE_END() gettimeofday(&end_time, NULL)",
    "#define PROFILE_OP() operation_count++",
    "#define PROFILE_CALL() procedure_calls++",
    "#define PROFILE_IO() io_operations++",
    "",
    "static void print_profile_results(void) {",
    "    double elapsed = (end_time.tv_sec - start_time.tv_sec)",
    "                     + (end_time.tv_usec - start_time.tv_usec) / 1000000.0;",
    "    printf(\"\\n--- Performance Profile ---\\n\");",
    "    printf(\"Execution time: %.6f seconds\\n\", elapsed);",
    "    printf(\"Operations: %lu\\n\", operation_count);",
    "    printf(\"Procedure calls: %lu\\n\", procedure_calls);",
    "    printf(\"I/O operations: %lu\\n\", io_operations);",
    "    printf(\"Ops/second: %.0f\\n\", elapsed > 0 ? operation_count / elapsed : 0.0);",
    "}",
];

pub struct CGenerator {
    resolver: NameResolver,
    globals: Vec<String>,
    prototypes: Vec<String>,
    functions: Vec<String>,
    banner: String,
    instrumented: bool,
}

impl Default for CGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CGenerator {
    pub fn new() -> Self {
        Self::with_banner("Generated by pl0pipe")
    }

    pub fn with_banner(banner: impl Into<String>) -> Self {
        Self {
            resolver: NameResolver::new(&C_RESERVED),
            globals: Vec::new(),
            prototypes: Vec::new(),
            functions: Vec::new(),
            banner: banner.into(),
            instrumented: false,
        }
    }

    /// C with run-time profiling counters.
    pub fn instrumented() -> Self {
        Self {
            resolver: NameResolver::new(&INSTRUMENTED_C_RESERVED),
            instrumented: true,
            ..Self::with_banner("Generated by pl0pipe (instrumented)")
        }
    }

    fn profile(&self, buf: &mut CodeBuffer, hook: &str) {
        if self.instrumented {
            buf.line(format!("{}();", hook));
        }
    }

    fn routine(&mut self, block: &Block, signature: &str, is_main: bool) {
        for name in &block.variables {
            let label = self.resolver.declare(name, SymbolKind::Variable);
            self.globals.push(label);
        }
        let labels: Vec<String> = block
            .procedures
            .iter()
            .map(|p| self.resolver.declare(&p.name, SymbolKind::Procedure))
            .collect();
        for (procedure, label) in block.procedures.iter().zip(labels) {
            self.resolver.enter_procedure(&procedure.name);
            let signature = format!("void {}(void)", label);
            self.routine(&procedure.body, &signature, false);
            self.prototypes.push(format!("{};", signature));
            self.resolver.leave_procedure();
        }

        let mut buf = CodeBuffer::new();
        buf.line(format!("{} {{", signature));
        buf.indent();
        self.profile(&mut buf, if is_main { "PROFILE_START" } else { "PROFILE_CALL" });
        self.statement(&mut buf, &block.statement);
        if is_main {
            self.profile(&mut buf, "PROFILE_END");
            self.profile(&mut buf, "print_profile_results");
            buf.line("return 0;");
        }
        buf.dedent();
        buf.line("}");
        self.functions.push(buf.finish());
    }

    fn statement(&mut self, buf: &mut CodeBuffer, stmt: &Statement) {
        match stmt {
            Statement::Assign { var, expr } => {
                self.profile(buf, "PROFILE_OP");
                let value = self.expression(expr);
                buf.line(format!("{} = {};", self.resolver.resolve(var), value));
            }
            Statement::Call { proc } => buf.line(format!("{}();", self.resolver.resolve(proc))),
            Statement::Read { var } => {
                self.profile(buf, "PROFILE_IO");
                buf.line(format!("scanf(\"%ld\", &{});", self.resolver.resolve(var)));
            }
            Statement::Write { expr } => {
                self.profile(buf, "PROFILE_IO");
                let value = self.expression(expr);
                buf.line(format!("printf(\"%ld\\n\", (long)({}));", value));
            }
            Statement::Compound { statements } => {
                for s in statements {
                    self.statement(buf, s);
                }
            }
            Statement::NestedBlock {
                variables,
                statements,
            } => {
                self.resolver.enter_block();
                buf.line("{");
                buf.indent();
                for name in variables {
                    let label = self.resolver.declare(name, SymbolKind::Variable);
                    buf.line(format!("{} = 0;", label));
                    self.globals.push(label);
                }
                for s in statements {
                    self.statement(buf, s);
                }
                buf.dedent();
                buf.line("}");
                self.resolver.leave_block();
            }
            Statement::If { condition, then } => {
                self.profile(buf, "PROFILE_OP");
                let cond = self.expression(condition);
                buf.line(format!("if ({}) {{", cond));
                buf.indent();
                self.statement(buf, then);
                buf.dedent();
                buf.line("}");
            }
            Statement::While { condition, body } => {
                let cond = self.expression(condition);
                buf.line(format!("while ({}) {{", cond));
                buf.indent();
                self.profile(buf, "PROFILE_OP");
                self.statement(buf, body);
                buf.dedent();
                buf.line("}");
            }
        }
    }

    fn expression(&self, expr: &Expression) -> String {
        match expr {
            Expression::Number(n) => c_literal(*n),
            Expression::Variable(name) => self.resolver.resolve(name),
            Expression::Operation { op, left, right } => {
                let op = match op {
                    BinaryOp::Eq => "==".to_string(),
                    other => other.to_string(),
                };
                format!("({} {} {})", self.expression(left), op, self.expression(right))
            }
        }
    }
}

fn c_literal(n: i64) -> String {
    if n == i64::MIN {
        "(-9223372036854775807L - 1)".to_string()
    } else if n < 0 {
        format!("({}L)", n)
    } else {
        format!("{}L", n)
    }
}

impl CodeGenerator for CGenerator {
    fn language(&self) -> &'static str {
        "C"
    }

    fn generate(mut self, program: &Block) -> Pl0Result<String> {
        self.routine(program, "int main(void)", true);

        let mut out = CodeBuffer::new();
        out.raw(format!("/* {} */", self.banner));
        out.raw("#include <stdio.h>");
        if self.instrumented {
            out.raw("#include <sys/time.h>");
            out.blank();
            for line in PROFILE_PRELUDE {
                out.raw(line);
            }
        }
        out.blank();
        if !self.globals.is_empty() {
            for label in &self.globals {
                out.raw(format!("long {} = 0;", label));
            }
            out.blank();
        }
        if !self.prototypes.is_empty() {
            for prototype in &self.prototypes {
                out.raw(prototype);
            }
            out.blank();
        }
        let count = self.functions.len();
        let mut text = out.finish();
        for (i, function) in self.functions.iter().enumerate() {
            text.push_str(function);
            if i + 1 < count {
                text.push('\n');
            }
        }
        Ok(text)
    }
}
