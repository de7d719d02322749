//! Check command implementation.
//!
//! Compiles a criteria string and reports its clauses and diagnostics
//! without reading any records.

use std::fmt::Display;

use sift_expr_rs::{CompiledExpression, ExpressionCompiler, Severity, Test};

use super::{CommandContext, Result};

/// Renders a test for the terminal.
fn describe(test: &Test) -> String {
    match test {
        Test::Exact { expected } => format!("= {expected:?}"),
        Test::Not { inner } => format!("not ({})", describe(inner)),
        Test::DateEquals { date } => format!("on {}", or_invalid(date.as_ref())),
        Test::DateRange { low, high } => format!(
            "between {} and {}",
            or_invalid(low.as_ref()),
            or_invalid(high.as_ref())
        ),
        Test::NumberRange { low, high } => format!(
            "between {} and {}",
            or_invalid(low.as_ref()),
            or_invalid(high.as_ref())
        ),
        Test::Fuzzy { pattern } => format!("~ {:?}", pattern.as_str()),
        Test::Search { pattern } => format!("any ~ {:?}", pattern.as_str()),
    }
}

fn or_invalid<T: Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "<invalid>".to_string(), ToString::to_string)
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

/// Executes the check command.
///
/// # Errors
///
/// With `strict`, returns the first diagnostic that strict compilation rejects.
pub fn execute(
    ctx: &CommandContext,
    expression: &str,
    strict: bool,
    compiler: &ExpressionCompiler,
) -> Result<()> {
    let compiled = compiler.compile(expression);

    if ctx.json_output {
        println!("{}", ctx.to_json(&*compiled)?);
    } else if !ctx.quiet {
        print!("{}", render(&compiled));
    }

    if strict {
        compiled.check()?;
    }
    Ok(())
}

/// Formats clauses and diagnostics for the terminal.
fn render(compiled: &CompiledExpression) -> String {
    let mut out = String::new();

    if compiled.is_empty() {
        out.push_str("No clauses; every record matches.\n");
    } else {
        out.push_str("Clauses:\n");
        for clause in compiled.clauses() {
            out.push_str(&format!(
                "  {:<12} {:<10} {}\n",
                clause.key.as_str(),
                clause.test.operator(),
                describe(&clause.test)
            ));
        }
    }

    if !compiled.diagnostics().is_empty() {
        out.push_str("\nDiagnostics:\n");
        for diagnostic in compiled.diagnostics() {
            out.push_str(&format!(
                "  {}: {}\n",
                severity_label(diagnostic.severity()),
                diagnostic
            ));
        }
    }

    out
}
