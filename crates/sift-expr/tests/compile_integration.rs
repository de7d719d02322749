//! Integration tests for compiling and applying criteria strings through the
//! public API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value as Json};
use sift_expr_rs::{
    encode_segments, Diagnostic, ExpressionCompiler, Record, Segment, Severity, Value,
};

fn people() -> Vec<Json> {
    vec![
        json!({"name": "Ada Lovelace", "born": "1815-12-10", "field": "math", "papers": 1}),
        json!({"name": "Grace Hopper", "born": "1906-12-09", "field": "computing", "papers": 12}),
        json!({"name": "Alan Turing", "born": "1912-06-23", "field": "math", "papers": 30}),
        json!({"name": "Edsger Dijkstra", "born": "1930-05-11", "field": "computing", "papers": 45}),
    ]
}

fn names<'a>(records: &[&'a Json]) -> Vec<&'a str> {
    records
        .iter()
        .copied()
        .map(|r| r["name"].as_str().unwrap_or_default())
        .collect()
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_filter_by_exact_and_range() {
    let compiler = ExpressionCompiler::new();
    let data = people();

    let expr = compiler.compile("field:MATH;papers:10..100");
    assert_eq!(names(&expr.filter(&data)), vec!["Alan Turing"]);
}

#[test]
fn test_filter_by_date_range_and_negation() {
    let compiler = ExpressionCompiler::new();
    let data = people();

    let expr = compiler.compile("born:@1900-01-01..@1920-12-31;field:!math");
    assert_eq!(names(&expr.filter(&data)), vec!["Grace Hopper"]);
}

#[test]
fn test_filter_by_search_across_fields() {
    let compiler = ExpressionCompiler::new();
    let data = people();

    let expr = compiler.compile("name,field:?cmpt");
    assert_eq!(
        names(&expr.filter(&data)),
        vec!["Grace Hopper", "Edsger Dijkstra"]
    );
}

#[test]
fn test_filter_with_assembled_segments() {
    let compiler = ExpressionCompiler::new();
    let data = people();

    let input = encode_segments(&[
        Segment::new("name", "~turing"),
        Segment::search(["field"], "mat"),
    ]);
    assert_eq!(input, "name:~turing;field:?mat");
    assert_eq!(names(&compiler.compile(&input).filter(&data)), vec!["Alan Turing"]);
}

#[test]
fn test_empty_criteria_keep_everything() {
    let compiler = ExpressionCompiler::new();
    let data = people();
    assert_eq!(compiler.compile("").filter(&data).len(), data.len());
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_diagnostics_do_not_abort_compilation() {
    let compiler = ExpressionCompiler::new();
    let expr = compiler.compile("field:math;broken;papers:x..5;field:!physics");

    assert_eq!(expr.len(), 3);
    let kinds: Vec<Severity> = expr.diagnostics().iter().map(Diagnostic::severity).collect();
    assert_eq!(kinds, vec![Severity::Warning, Severity::Error, Severity::Warning]);

    // The bad range fails closed, so nothing matches.
    assert!(expr.filter(&people()).is_empty());
}

// ============================================================================
// Custom records
// ============================================================================

struct Book {
    title: String,
    pages: u32,
}

impl Record for Book {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "title" => Some(Value::from(self.title.as_str())),
            "pages" => Some(Value::from(f64::from(self.pages))),
            _ => None,
        }
    }
}

#[test]
fn test_custom_record_type() {
    let books = vec![
        Book {
            title: "Structure and Interpretation".to_string(),
            pages: 657,
        },
        Book {
            title: "The Little Schemer".to_string(),
            pages: 216,
        },
    ];

    let compiler = ExpressionCompiler::new();
    let expr = compiler.compile("title:~schemer;pages:100..300");
    let matching = expr.filter(&books);
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].title, "The Little Schemer");
}

#[test]
fn test_owned_value_map_record() {
    let mut row: BTreeMap<String, Value<'static>> = BTreeMap::new();
    row.insert("qty".to_string(), Value::from(3_i64));
    row.insert("sku".to_string(), Value::from("AB-12".to_string()));

    let compiler = ExpressionCompiler::new();
    assert!(compiler.compile("qty:1..5;sku:ab-12").matches(&row));
}

// ============================================================================
// Shared compiler
// ============================================================================

#[test]
fn test_shared_compiler_across_threads() {
    let compiler = Arc::new(ExpressionCompiler::with_capacity(16));
    let data = Arc::new(people());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let compiler = Arc::clone(&compiler);
            let data = Arc::clone(&data);
            thread::spawn(move || compiler.compile("field:computing").filter(&data).len())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(compiler.len(), 1);
}
