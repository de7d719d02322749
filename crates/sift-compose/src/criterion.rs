//! Single criteria and their conjunction.

use std::sync::Arc;

use sift_expr_rs::{CompiledExpression, Record};

type TestFn<R> = dyn Fn(&R) -> bool + Send + Sync;

/// One active filter condition over records of type `R`.
///
/// A criterion pairs a field selector (record to mapped value) with a value
/// test closed over the producer's current input. The mapped type is erased
/// when the criterion is built, so criteria over different field types can
/// sit side by side in one registry.
pub struct Criterion<R> {
    test: Arc<TestFn<R>>,
    label: Option<Arc<str>>,
}

impl<R> Clone for Criterion<R> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
            label: self.label.clone(),
        }
    }
}

impl<R> std::fmt::Debug for Criterion<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Criterion")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<R: 'static> Criterion<R> {
    /// Creates a criterion from a field selector and a test on the selected value.
    ///
    /// # Example
    ///
    /// ```
    /// use sift_compose_rs::Criterion;
    ///
    /// struct Row { age: u32 }
    ///
    /// let adult = Criterion::new(|row: &Row| row.age, |age: &u32| *age >= 18);
    /// assert!(adult.matches(&Row { age: 30 }));
    /// assert!(!adult.matches(&Row { age: 12 }));
    /// ```
    pub fn new<M, S, T>(select: S, test: T) -> Self
    where
        S: Fn(&R) -> M + Send + Sync + 'static,
        T: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Self::from_fn(move |record| test(&select(record)))
    }

    /// Creates a criterion from a plain record test.
    pub fn from_fn<F>(test: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
            label: None,
        }
    }

    /// Attaches a human-readable label, shown in logs and `Debug` output.
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl<R: Record + 'static> Criterion<R> {
    /// Creates a criterion that passes records matching a compiled expression.
    ///
    /// The expression's source text becomes the label.
    pub fn from_expression(expression: Arc<CompiledExpression>) -> Self {
        let label: Arc<str> = Arc::from(expression.source());
        Self::from_fn(move |record: &R| expression.matches(record)).with_label(label)
    }
}

impl<R> Criterion<R> {
    /// Returns true if the record passes.
    pub fn matches(&self, record: &R) -> bool {
        (self.test)(record)
    }

    /// Returns the label, if one was attached.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// The conjunction of every criterion that was active when it was built.
///
/// Built from a point-in-time snapshot: later changes to producers do not
/// affect a predicate that was already delivered. Cloning is cheap.
pub struct CombinedPredicate<R> {
    criteria: Arc<[Criterion<R>]>,
}

impl<R> Clone for CombinedPredicate<R> {
    fn clone(&self) -> Self {
        Self {
            criteria: Arc::clone(&self.criteria),
        }
    }
}

impl<R> std::fmt::Debug for CombinedPredicate<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedPredicate")
            .field("criteria", &self.criteria)
            .finish()
    }
}

impl<R> Default for CombinedPredicate<R> {
    fn default() -> Self {
        Self::always()
    }
}

impl<R> CombinedPredicate<R> {
    /// Returns the predicate that passes every record.
    pub fn always() -> Self {
        Self {
            criteria: Arc::from(Vec::new()),
        }
    }

    /// Combines the given criteria.
    pub fn from_criteria(criteria: Vec<Criterion<R>>) -> Self {
        Self {
            criteria: Arc::from(criteria),
        }
    }

    /// Returns true if the record passes every criterion.
    ///
    /// With no criteria, every record passes.
    pub fn matches(&self, record: &R) -> bool {
        self.criteria.iter().all(|criterion| criterion.matches(record))
    }

    /// Filters a slice of records, returning only those that match.
    pub fn filter<'a>(&self, records: &'a [R]) -> Vec<&'a R> {
        records.iter().filter(|record| self.matches(record)).collect()
    }

    /// Returns the number of criteria in the conjunction.
    pub fn active_criteria(&self) -> usize {
        self.criteria.len()
    }

    /// Returns true if no criterion is active.
    pub fn is_always(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Returns the labels of the labelled criteria.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().filter_map(Criterion::label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_expr_rs::ExpressionCompiler;
    use std::collections::HashMap;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_criterion_new_selects_then_tests() {
        let criterion = Criterion::new(
            |r: &HashMap<String, String>| r.get("a").cloned(),
            |a: &Option<String>| a.as_deref() == Some("x"),
        );
        assert!(criterion.matches(&row(&[("a", "x")])));
        assert!(!criterion.matches(&row(&[("a", "y")])));
        assert!(!criterion.matches(&row(&[])));
    }

    #[test]
    fn test_criterion_label() {
        let criterion = Criterion::from_fn(|_: &u32| true).with_label("anything");
        assert_eq!(criterion.label(), Some("anything"));
        assert!(format!("{criterion:?}").contains("anything"));
    }

    #[test]
    fn test_criterion_from_expression() {
        let compiler = ExpressionCompiler::new();
        let criterion: Criterion<HashMap<String, String>> =
            Criterion::from_expression(compiler.compile("a:asdf;d:1..10"));

        assert_eq!(criterion.label(), Some("a:asdf;d:1..10"));
        assert!(criterion.matches(&row(&[("a", "ASDF"), ("d", "3")])));
        assert!(!criterion.matches(&row(&[("a", "ASDF"), ("d", "30")])));
    }

    #[test]
    fn test_always_predicate() {
        let predicate: CombinedPredicate<u32> = CombinedPredicate::always();
        assert!(predicate.is_always());
        assert!(predicate.matches(&0));
        assert_eq!(predicate.filter(&[1, 2, 3]).len(), 3);
    }

    #[test]
    fn test_default_is_always() {
        let predicate: CombinedPredicate<u32> = CombinedPredicate::default();
        assert_eq!(predicate.active_criteria(), 0);
    }

    #[test]
    fn test_predicate_is_conjunction() {
        let predicate = CombinedPredicate::from_criteria(vec![
            Criterion::from_fn(|n: &u32| *n > 2),
            Criterion::from_fn(|n: &u32| *n % 2 == 0),
        ]);

        assert_eq!(predicate.active_criteria(), 2);
        let data = [1, 2, 3, 4, 5, 6];
        let kept: Vec<u32> = predicate.filter(&data).into_iter().copied().collect();
        assert_eq!(kept, vec![4, 6]);
    }

    #[test]
    fn test_predicate_labels() {
        let predicate = CombinedPredicate::from_criteria(vec![
            Criterion::from_fn(|_: &u32| true).with_label("first"),
            Criterion::from_fn(|_: &u32| true),
            Criterion::from_fn(|_: &u32| true).with_label("third"),
        ]);
        let labels: Vec<&str> = predicate.labels().collect();
        assert_eq!(labels, vec!["first", "third"]);
    }
}
