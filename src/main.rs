use clap::Parser;
use colored::Colorize;
use pl0pipe::{
    self,
    ast::pretty,
    frontend::parse_source,
    optimizer::OptimizerOptions,
    pipeline::{Message, Severity},
    read,
    utils::config::artifacts::file_suffix,
    CompileOptions, CompileResult, Compiler, Pl0Error, Pl0Result,
};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::Level;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "PL/0 compiler driven by a dependency-ordered plugin pipeline",
    long_about = "PL/0 compiler driven by a dependency-ordered plugin pipeline.\n\
                 Parses a PL/0 program, checks it, optimizes it and runs every enabled\n\
                 analysis and code generation plugin, writing each artifact to disk.\n\
                 \n\
                 Example usage:\n\
                 pl0pipe input.pl0                        # Run every plugin\n\
                 pl0pipe input.pl0 -o out                 # Write artifacts under out/\n\
                 pl0pipe input.pl0 --disable c_generator  # Skip one plugin\n\
                 pl0pipe input.pl0 --no-optimize          # Keep the tree as written\n\
                 pl0pipe input.pl0 --timing               # Show compilation timing\n\
                 pl0pipe --list-plugins                   # Show registered plugins"
)]
struct Cli {
    // The path to the file to compile
    #[arg(required_unless_present = "list_plugins")]
    path: Option<PathBuf>,

    // Directory receiving the `<base>_compilation` folder
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    // List registered plugins and exit
    #[arg(long)]
    list_plugins: bool,

    // Disable a plugin by name (repeatable)
    #[arg(short, long = "disable", value_name = "PLUGIN")]
    disable: Vec<String>,

    // Turn every optimizer rule off
    #[arg(long)]
    no_optimize: bool,

    // Print Debug and Info messages too
    #[arg(long)]
    debug: bool,

    // Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    // Show compilation timing
    #[arg(short, long)]
    timing: bool,

    // Show AST after parsing
    #[arg(long)]
    show_ast: bool,
}

// Compilation statistics for performance analysis
#[derive(Debug, Default)]
struct CompilationStats {
    read_time: f64,
    pipeline_time: f64,
    write_time: f64,
    total_time: f64,
    source_bytes: usize,
    plugins_run: usize,
    plugins_skipped: usize,
    artifacts: usize,
    messages: usize,
}

// Print error message and exit with error code
fn fatal(msg: &str) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), msg);
    std::process::exit(1);
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn options(args: &Cli) -> CompileOptions {
    CompileOptions {
        optimizer: if args.no_optimize {
            OptimizerOptions::disabled()
        } else {
            OptimizerOptions::default()
        },
        disabled: args.disable.clone(),
    }
}

fn list_plugins(compiler: &Compiler) {
    println!("Registered plugins:");
    for plugin in compiler.list_plugins() {
        let state = if plugin.enabled { "enabled".green() } else { "disabled".yellow() };
        let deps = if plugin.dependencies.is_empty() {
            "-".to_string()
        } else {
            plugin.dependencies.join(", ")
        };
        println!(
            "  {:<20} v{:<5} [{}] depends on: {}\n      {}",
            plugin.name.bold(),
            plugin.version,
            state,
            deps,
            plugin.description
        );
    }
}

fn print_message(message: &Message, debug: bool) {
    if message.severity < Severity::Warning && !debug {
        return;
    }
    let tag = match message.severity {
        Severity::Debug => "DEBUG".dimmed(),
        Severity::Info => "INFO".blue(),
        Severity::Warning => "WARNING".yellow().bold(),
        Severity::Error => "ERROR".red().bold(),
        Severity::Fatal => "FATAL".magenta().bold(),
    };
    let source = message.source.as_deref().unwrap_or("core");
    let location = match message.line {
        Some(line) => format!(" (line {})", line),
        None => String::new(),
    };
    eprintln!("[{}] [{}] {}: {}{}", tag, message.category, source, message.text, location);
    if let Some(suggestion) = &message.suggestion {
        eprintln!("    {} {}", "hint:".cyan(), suggestion);
    }
}

fn base_name(path: &Path) -> Pl0Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Pl0Error::FileReadError(format!("Cannot derive a base name from {}", path.display())))
}

fn write_file(path: &Path, contents: &str) -> Pl0Result<()> {
    fs::write(path, contents).map_err(|e| Pl0Error::FileWriteError(format!("{}: {}", path.display(), e)))
}

fn summary(base: &str, result: &CompileResult) -> Pl0Result<String> {
    let mut out = String::new();
    pl0pipe::utils::heading(&mut out, &format!("Compilation summary for {}", base));
    out.push_str(&format!("Success: {}\n\n", result.success));
    out.push_str("Artifacts:\n");
    for (name, text) in result.outputs() {
        out.push_str(&format!("  {:<22} {}{} ({} lines)\n", name, base, file_suffix(&name), text.lines().count()));
    }
    out.push_str("\nPlugin results:\n");
    for (plugin, value) in result.plugin_results() {
        let json = serde_json::to_string(&value).map_err(|e| e.to_string())?;
        out.push_str(&format!("  {}: {}\n", plugin, json));
    }
    if !result.execution.skipped.is_empty() {
        out.push_str("\nSkipped plugins:\n");
        for (plugin, reason) in &result.execution.skipped {
            out.push_str(&format!("  {}: {:?}\n", plugin, reason));
        }
    }
    out.push_str(&format!(
        "\nMessages: {} errors, {} warnings\n",
        result.messages.count(Severity::Error) + result.messages.count(Severity::Fatal),
        result.messages.count(Severity::Warning)
    ));
    Ok(out)
}

fn write_artifacts(input: &Path, source: &str, result: &CompileResult, args: &Cli) -> Pl0Result<usize> {
    let base = base_name(input)?;
    let root = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let dir = root.join(format!("{}_compilation", base));
    fs::create_dir_all(&dir).map_err(|e| Pl0Error::FileWriteError(format!("{}: {}", dir.display(), e)))?;

    let mut written = 0;
    for (name, text) in result.outputs() {
        let path = dir.join(format!("{}{}", base, file_suffix(&name)));
        write_file(&path, &text)?;
        written += 1;
        if args.verbose {
            println!("  wrote {}", path.display());
        }
    }
    write_file(&dir.join(format!("{}_source.pl0", base)), source)?;
    write_file(&dir.join(format!("{}_summary.txt", base)), &summary(&base, result)?)?;
    if args.verbose {
        println!("Artifacts written to: {}", dir.display());
    }
    Ok(written)
}

fn compile(input: &Path, compiler: &Compiler, args: &Cli) -> Pl0Result<(CompileResult, CompilationStats)> {
    let start_time = Instant::now();
    let mut stats = CompilationStats::default();

    if !input.exists() {
        return Err(Pl0Error::compilation_error(
            "file not found",
            format!("Input file does not exist: {}", input.display()),
        ));
    }

    let read_start = Instant::now();
    let source = read(input)?;
    stats.read_time = read_start.elapsed().as_secs_f64();
    stats.source_bytes = source.len();
    if args.verbose {
        println!("Read {} bytes from {}", source.len(), input.display());
    }

    if args.show_ast {
        println!("\n Abstract Syntax Tree:");
        match parse_source(&source) {
            Ok(ast) => println!("{}", pretty(&ast)),
            Err(e) => println!("  (unavailable: {})", e),
        }
    }

    let pipeline_start = Instant::now();
    let result = compiler.compile_source(&source);
    stats.pipeline_time = pipeline_start.elapsed().as_secs_f64();
    stats.plugins_run = result.execution.executed.len();
    stats.plugins_skipped = result.execution.skipped.len();
    stats.messages = result.messages.len();

    let write_start = Instant::now();
    stats.artifacts = write_artifacts(input, &source, &result, args)?;
    stats.write_time = write_start.elapsed().as_secs_f64();

    stats.total_time = start_time.elapsed().as_secs_f64();
    Ok((result, stats))
}

// Print detailed compilation statistics
fn print_stats(stats: &CompilationStats) {
    println!("\n Compilation Statistics:");
    println!("+---------------------+-----------+");
    println!("| Phase               | Time (s)  |");
    println!("+---------------------+-----------+");
    println!("| Read source         | {:>9.3} |", stats.read_time);
    println!("| Plugin pipeline     | {:>9.3} |", stats.pipeline_time);
    println!("| Write artifacts     | {:>9.3} |", stats.write_time);
    println!("+---------------------+-----------+");
    println!("| Total Time          | {:>9.3} |", stats.total_time);
    println!("+---------------------+-----------+");

    println!("\n Pipeline Metrics:");
    println!("  - Source bytes:       {}", stats.source_bytes);
    println!("  - Plugins run:        {}", stats.plugins_run);
    println!("  - Plugins skipped:    {}", stats.plugins_skipped);
    println!("  - Artifacts:          {}", stats.artifacts);
    println!("  - Messages:           {}", stats.messages);
}

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);

    let compiler = Compiler::with_options(options(&args));
    if args.list_plugins {
        list_plugins(&compiler);
        return;
    }
    let Some(path) = args.path.as_deref() else {
        fatal("no input file given");
    };

    match compile(path, &compiler, &args) {
        Ok((result, stats)) => {
            for message in result.messages.messages() {
                print_message(message, args.debug);
            }
            if args.timing {
                print_stats(&stats);
            }
            if !result.success {
                fatal("Compilation failed");
            }
            if args.verbose {
                println!("{}", "Compilation successful!".green());
            }
        }
        Err(e) => fatal(&format!("Compilation failed: {}", e)),
    }
}
