//! flowlang compiler CLI
//!
//! Runs the whole pipeline on one source file and emits either the
//! control flow graph dump or LLVM IR.

use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    time::Instant,
};

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use flowlang::{
    ast::ast::Program,
    compiler::{cfg::CfgBuilder, compiler::compile},
    display_error,
    errors::{diagnostics::Diagnostics, errors::Error},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

#[derive(Parser)]
#[command(name = "flowlang")]
#[command(about = "Compile flowlang programs to a control flow graph or LLVM IR", long_about = None)]
#[command(version)]
struct Cli {
    /// Source file to compile
    file: PathBuf,

    /// What to emit
    #[arg(long, value_enum, default_value_t = Emit::Cfg)]
    emit: Emit,

    /// Write the output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log compiler phases to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Textual dump of the backend-agnostic CFG
    Cfg,
    /// LLVM IR (requires the `llvm` feature)
    Llvm,
}

/// Source text and display name, used to render errors.
struct SourceFile {
    name: String,
    text: String,
}

impl SourceFile {
    fn fail(&self, error: &Error) -> anyhow::Error {
        eprint!("{}", display_error(error, &self.text, &self.name));
        anyhow!("could not compile `{}`", self.name)
    }

    fn check(&self, diagnostics: &Diagnostics, phase: &str) -> Result<()> {
        if !diagnostics.has_errors() {
            return Ok(());
        }

        for error in diagnostics.errors() {
            eprint!("{}", display_error(error, &self.text, &self.name));
        }
        bail!(
            "{} of `{}` failed with {} error(s)",
            phase,
            self.name,
            diagnostics.error_count()
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let text = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());
    let source = SourceFile { name, text };

    let start = Instant::now();
    let program = analyze(&source)?;

    match cli.emit {
        Emit::Cfg => {
            let (backend, diagnostics) =
                compile(&program, CfgBuilder::new()).map_err(|error| source.fail(&error))?;
            source.check(&diagnostics, "lowering")?;
            write_output(cli.output.as_deref(), &backend.into_graph().to_string())?;
        }
        Emit::Llvm => emit_llvm(&program, &source, cli.output.as_deref())?,
    }
    info!(elapsed = ?start.elapsed(), "compiled {}", source.name);

    Ok(())
}

/// Writes `output` to `path`, or to stdout without one.
fn write_output(path: Option<&Path>, output: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            print!("{}", output);
            Ok(())
        }
    }
}

/// Tokenizes, parses and analyzes the source. Any analysis error fails the run.
fn analyze(source: &SourceFile) -> Result<Program> {
    let phase_start = Instant::now();
    let tokens = tokenize(source.text.clone(), Some(source.name.clone()))
        .map_err(|error| source.fail(&error))?;
    info!(elapsed = ?phase_start.elapsed(), tokens = tokens.len(), "tokenized");

    let phase_start = Instant::now();
    let mut program =
        parse(tokens, Rc::new(source.name.clone())).map_err(|error| source.fail(&error))?;
    info!(elapsed = ?phase_start.elapsed(), statements = program.statements.len(), "parsed");

    let phase_start = Instant::now();
    let type_checker = type_check(&mut program).map_err(|error| source.fail(&error))?;
    info!(elapsed = ?phase_start.elapsed(), "type checked");
    source.check(type_checker.diagnostics(), "analysis")?;

    Ok(program)
}

#[cfg(feature = "llvm")]
fn emit_llvm(program: &Program, source: &SourceFile, output: Option<&Path>) -> Result<()> {
    use flowlang::compiler::llvm::LlvmBackend;
    use inkwell::context::Context;

    let context = Context::create();
    let backend = LlvmBackend::new(&context, &source.name).map_err(|error| source.fail(&error))?;
    let (backend, diagnostics) = compile(program, backend).map_err(|error| source.fail(&error))?;
    source.check(&diagnostics, "lowering")?;

    backend.verify().map_err(|error| source.fail(&error))?;
    match output {
        Some(path) => backend
            .save_module_to_file(path)
            .with_context(|| format!("failed to write {}", path.display())),
        None => write_output(None, &backend.print_to_string()),
    }
}

#[cfg(not(feature = "llvm"))]
fn emit_llvm(_program: &Program, _source: &SourceFile, _output: Option<&Path>) -> Result<()> {
    bail!("flowlang was built without the `llvm` feature, rebuild with `--features llvm`")
}
