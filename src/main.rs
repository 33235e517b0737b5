use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mailrule_compiler::compiler::{CompileResult, CompilerConfig, ExpansionConfig, RuleCompiler};
use mailrule_compiler::config::{Actions, Config, FilterNode, RuleSpec};
use mailrule_compiler::simplify::DefaultSimplifier;

/// Mail rule compiler
#[derive(Parser, Debug)]
#[command(name = "mailrule-compiler")]
#[command(about = "Compile mail filter rules into expressible criteria")]
#[command(version)]
struct Args {
    /// JSON rule configuration; starts an interactive prompt when omitted
    config: Option<PathBuf>,

    /// Pretty-print the compiled rules
    #[arg(short, long)]
    pretty: bool,

    /// Merge sibling leaves of the same field during simplification
    #[arg(long)]
    group_leaves: bool,

    /// Keep the original field on leaves split from a multi-value leaf
    #[arg(long)]
    keep_leaf_function: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let compiler = RuleCompiler::from_config(CompilerConfig {
        expansion: ExpansionConfig {
            keep_leaf_function: args.keep_leaf_function,
        },
        simplifier: DefaultSimplifier {
            group_leaves: args.group_leaves,
        },
    });

    match &args.config {
        Some(path) => compile_file(&compiler, path, args.pretty),
        None => run_prompt(&compiler),
    }
}

fn compile_file(compiler: &RuleCompiler, path: &Path, pretty: bool) -> Result<()> {
    let config = Config::from_json_file(path)?;
    tracing::info!("loaded {} rules from {}", config.rules.len(), path.display());

    let result = compiler
        .compile(&config)
        .map_err(|e| {
            let details = e.details();
            anyhow::Error::new(e).context(details)
        })
        .with_context(|| format!("compiling {}", path.display()))?;

    let output = if pretty {
        serde_json::to_string_pretty(&result.rules)?
    } else {
        serde_json::to_string(&result.rules)?
    };
    println!("{}", output);
    Ok(())
}

/// Compile one JSON filter node per line, with a placeholder action
fn run_prompt(compiler: &RuleCompiler) -> Result<()> {
    println!("--- Mail rule compiler ---");
    println!("Enter a JSON filter, e.g. {{\"or\": [{{\"from\": \"a\"}}, {{\"from\": \"b\"}}]}}");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                match compile_line(compiler, line) {
                    Ok(result) => print_result(&result),
                    Err(e) => println!("✗ {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn compile_line(compiler: &RuleCompiler, line: &str) -> Result<CompileResult> {
    let filter: FilterNode = serde_json::from_str(line).context("invalid filter JSON")?;
    let spec = RuleSpec {
        filter,
        actions: Actions {
            archive: true,
            ..Default::default()
        },
    };
    Ok(compiler.compile_rules(&[spec])?)
}

fn print_result(result: &CompileResult) {
    for (i, rule) in result.rules.iter().enumerate() {
        println!("  {}: {}", i + 1, rule.criteria);
    }
    for expansion in &result.expansions {
        println!("  • {:?}", expansion);
    }
}
