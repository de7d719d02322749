//! Stock producers.
//!
//! Each control holds its input behind a lock, registers an accessor on a
//! [`Coordinator`] with [`attach`](TextControl::attach), and pushes an update
//! whenever its input changes. Dropping a control detaches it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sift_expr_rs::{CompiledExpression, ExpressionCompiler, FuzzyPattern, Record, Segment, Value};

use crate::coordinator::{Coordinator, Registration};
use crate::criterion::Criterion;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Anything that can report its current criterion.
trait Source<R>: Send + Sync + 'static {
    fn criterion(&self) -> Option<Criterion<R>>;
}

/// A control's slot in a coordinator.
struct Attachment<R> {
    registration: Mutex<Option<Arc<Registration<R>>>>,
}

impl<R> Default for Attachment<R> {
    fn default() -> Self {
        Self {
            registration: Mutex::new(None),
        }
    }
}

impl<R: 'static> Attachment<R> {
    fn attach<S: Source<R>>(&self, coordinator: &Coordinator<R>, source: &Arc<S>) {
        self.detach();
        let source = Arc::clone(source);
        let registration = coordinator.register_control(move || source.criterion());
        tracing::debug!(control = %registration.id(), "attached control");
        *lock(&self.registration) = Some(Arc::new(registration));
    }
}

impl<R> Attachment<R> {
    fn update(&self) {
        // The guard must be released before notifying: a listener may call
        // back into the same control.
        let registration = lock(&self.registration).clone();
        if let Some(registration) = registration {
            registration.update();
        }
    }

    fn detach(&self) {
        let registration = lock(&self.registration).take();
        if let Some(registration) = registration {
            tracing::debug!(control = %registration.id(), "detached control");
            registration.remove();
        }
    }

    fn is_attached(&self) -> bool {
        lock(&self.registration).is_some()
    }
}

impl<R> Drop for Attachment<R> {
    fn drop(&mut self) {
        self.detach();
    }
}

// ============================================================================
// TextControl
// ============================================================================

type Build<R> = dyn Fn(&str) -> Criterion<R> + Send + Sync;

struct TextSource<R> {
    value: Mutex<String>,
    build: Box<Build<R>>,
}

impl<R: 'static> Source<R> for TextSource<R> {
    fn criterion(&self) -> Option<Criterion<R>> {
        let value = lock(&self.value).clone();
        (!value.is_empty()).then(|| (self.build)(&value))
    }
}

/// A single text input.
///
/// Active while its value is non-empty. How the value tests a record depends
/// on the constructor.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use sift_compose_rs::{control::TextControl, Coordinator};
///
/// let coordinator: Coordinator<Value> = Coordinator::new();
/// let name = TextControl::fuzzy("name");
/// name.attach(&coordinator);
///
/// name.set_value("jdo");
/// let predicate = coordinator.predicate();
/// assert!(predicate.matches(&json!({"name": "John Doe"})));
/// assert!(!predicate.matches(&json!({"name": "Jane Smith"})));
/// ```
pub struct TextControl<R> {
    source: Arc<TextSource<R>>,
    attachment: Attachment<R>,
}

impl<R> std::fmt::Debug for TextControl<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextControl")
            .field("value", &*lock(&self.source.value))
            .field("attached", &self.attachment.is_attached())
            .finish()
    }
}

impl<R: Record + 'static> TextControl<R> {
    /// Passes records whose field text equals the value exactly, case included.
    pub fn exact(field: impl Into<String>) -> Self {
        let field: Arc<str> = Arc::from(field.into());
        Self::with_builder(move |value: &str| {
            let field = Arc::clone(&field);
            let expected = value.to_string();
            let label = Segment::new(&*field, value).to_string();
            Criterion::from_fn(move |record: &R| {
                record
                    .field(&field)
                    .is_some_and(|found| found.to_text() == expected.as_str())
            })
            .with_label(label)
        })
    }

    /// Passes records whose field text contains the value's characters in order,
    /// ignoring case.
    pub fn fuzzy(field: impl Into<String>) -> Self {
        let field: Arc<str> = Arc::from(field.into());
        Self::with_builder(move |value: &str| {
            let field = Arc::clone(&field);
            let pattern = FuzzyPattern::new(value);
            let label = Segment::new(&*field, format!("~{value}")).to_string();
            Criterion::from_fn(move |record: &R| {
                record
                    .field(&field)
                    .is_some_and(|found| pattern.is_match(&found.to_text()))
            })
            .with_label(label)
        })
    }

    /// Passes records where any of the fields contains the value, ignoring case.
    ///
    /// Fields missing from a record are skipped.
    pub fn search<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Arc<[String]> = fields.into_iter().map(Into::into).collect();
        Self::with_builder(move |value: &str| {
            let fields = Arc::clone(&fields);
            let needle = value.to_lowercase();
            let label = Segment::search(fields.iter(), value).to_string();
            Criterion::from_fn(move |record: &R| {
                fields.iter().any(|name| {
                    record
                        .field(name)
                        .is_some_and(|found| found.to_text().to_lowercase().contains(&needle))
                })
            })
            .with_label(label)
        })
    }
}

impl<R: 'static> TextControl<R> {
    /// Creates a control from a selector and a comparison against the value.
    ///
    /// # Example
    ///
    /// ```
    /// use sift_compose_rs::control::TextControl;
    ///
    /// struct Track { artist: String }
    ///
    /// let artist = TextControl::custom(
    ///     |track: &Track| track.artist.clone(),
    ///     |artist: &String, value: &str| artist.starts_with(value),
    /// );
    /// artist.set_value("Nin");
    /// let criterion = artist.criterion().unwrap();
    /// assert!(criterion.matches(&Track { artist: "Nina Simone".into() }));
    /// ```
    pub fn custom<M, S, C>(select: S, compare: C) -> Self
    where
        S: Fn(&R) -> M + Send + Sync + 'static,
        C: Fn(&M, &str) -> bool + Send + Sync + 'static,
    {
        let select = Arc::new(select);
        let compare = Arc::new(compare);
        Self::with_builder(move |value: &str| {
            let select = Arc::clone(&select);
            let compare = Arc::clone(&compare);
            let value = value.to_string();
            Criterion::new(move |record: &R| select(record), move |mapped: &M| {
                compare(mapped, &value)
            })
        })
    }

    fn with_builder<B>(build: B) -> Self
    where
        B: Fn(&str) -> Criterion<R> + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(TextSource {
                value: Mutex::new(String::new()),
                build: Box::new(build),
            }),
            attachment: Attachment::default(),
        }
    }

    /// Sets the initial value.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        *lock(&self.source.value) = value.into();
        self
    }

    /// Registers this control on a coordinator, leaving any previous one.
    pub fn attach(&self, coordinator: &Coordinator<R>) {
        self.attachment.attach(coordinator, &self.source);
    }

    /// Stores a new value and notifies the coordinator, if attached.
    pub fn set_value(&self, value: impl Into<String>) {
        *lock(&self.source.value) = value.into();
        self.attachment.update();
    }

    /// Clears the value, making the control inactive.
    pub fn clear(&self) {
        self.set_value(String::new());
    }

    /// Returns the current criterion, or `None` while the control is inactive.
    pub fn criterion(&self) -> Option<Criterion<R>> {
        self.source.criterion()
    }
}

impl<R> TextControl<R> {
    /// Returns the current value.
    pub fn value(&self) -> String {
        lock(&self.source.value).clone()
    }

    /// Returns true while the value is non-empty.
    pub fn is_active(&self) -> bool {
        !lock(&self.source.value).is_empty()
    }

    /// Removes this control from its coordinator.
    pub fn detach(&self) {
        self.attachment.detach();
    }

    /// Returns true while the control is registered on a coordinator.
    pub fn is_attached(&self) -> bool {
        self.attachment.is_attached()
    }
}

// ============================================================================
// RangeControl
// ============================================================================

type Select<R> = dyn Fn(&R) -> Option<f64> + Send + Sync;

#[derive(Default)]
struct Bounds {
    low: String,
    high: String,
}

impl Bounds {
    fn parsed(&self) -> Option<(f64, f64)> {
        let low = Value::text(self.low.as_str()).as_number()?;
        let high = Value::text(self.high.as_str()).as_number()?;
        (low < high).then_some((low, high))
    }
}

struct RangeSource<R> {
    label: Arc<str>,
    bounds: Mutex<Bounds>,
    select: Arc<Select<R>>,
}

impl<R: 'static> Source<R> for RangeSource<R> {
    fn criterion(&self) -> Option<Criterion<R>> {
        let (low, high) = lock(&self.bounds).parsed()?;
        let select = Arc::clone(&self.select);
        let label = Segment::new(&*self.label, format!("{low}..{high}")).to_string();
        Some(
            Criterion::new(move |record: &R| select(record), move |found: &Option<f64>| {
                found.is_some_and(|n| low <= n && n <= high)
            })
            .with_label(label),
        )
    }
}

/// A pair of numeric bounds held as text, the way a form holds them.
///
/// Active only while both bounds parse as numbers and `low < high`; then it
/// passes records whose value lies within `[low, high]`.
pub struct RangeControl<R> {
    source: Arc<RangeSource<R>>,
    attachment: Attachment<R>,
}

impl<R> std::fmt::Debug for RangeControl<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bounds = lock(&self.source.bounds);
        f.debug_struct("RangeControl")
            .field("field", &self.source.label)
            .field("low", &bounds.low)
            .field("high", &bounds.high)
            .finish()
    }
}

impl<R: Record + 'static> RangeControl<R> {
    /// Creates a range over a record field's numeric form.
    pub fn new(field: impl Into<String>) -> Self {
        let field: Arc<str> = Arc::from(field.into());
        let name = Arc::clone(&field);
        Self::from_selector(field, move |record: &R| {
            record.field(&name).and_then(|value| value.as_number())
        })
    }
}

impl<R: 'static> RangeControl<R> {
    /// Creates a range over a computed number, labelled `label` in logs.
    pub fn from_selector<F>(label: impl Into<Arc<str>>, select: F) -> Self
    where
        F: Fn(&R) -> Option<f64> + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(RangeSource {
                label: label.into(),
                bounds: Mutex::new(Bounds::default()),
                select: Arc::new(select),
            }),
            attachment: Attachment::default(),
        }
    }

    /// Registers this control on a coordinator, leaving any previous one.
    pub fn attach(&self, coordinator: &Coordinator<R>) {
        self.attachment.attach(coordinator, &self.source);
    }

    /// Stores a new lower bound and notifies the coordinator, if attached.
    pub fn set_low(&self, low: impl Into<String>) {
        lock(&self.source.bounds).low = low.into();
        self.attachment.update();
    }

    /// Stores a new upper bound and notifies the coordinator, if attached.
    pub fn set_high(&self, high: impl Into<String>) {
        lock(&self.source.bounds).high = high.into();
        self.attachment.update();
    }

    /// Sets both bounds with a single notification.
    pub fn set_range(&self, low: impl Into<String>, high: impl Into<String>) {
        {
            let mut bounds = lock(&self.source.bounds);
            bounds.low = low.into();
            bounds.high = high.into();
        }
        self.attachment.update();
    }

    /// Returns the current criterion, or `None` while the control is inactive.
    pub fn criterion(&self) -> Option<Criterion<R>> {
        self.source.criterion()
    }
}

impl<R> RangeControl<R> {
    /// Returns the lower bound as entered.
    pub fn low(&self) -> String {
        lock(&self.source.bounds).low.clone()
    }

    /// Returns the upper bound as entered.
    pub fn high(&self) -> String {
        lock(&self.source.bounds).high.clone()
    }

    /// Returns the parsed bounds while the control is active.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        lock(&self.source.bounds).parsed()
    }

    /// Returns true while both bounds parse and `low < high`.
    pub fn is_active(&self) -> bool {
        self.bounds().is_some()
    }

    /// Removes this control from its coordinator.
    pub fn detach(&self) {
        self.attachment.detach();
    }

    /// Returns true while the control is registered on a coordinator.
    pub fn is_attached(&self) -> bool {
        self.attachment.is_attached()
    }
}

// ============================================================================
// ExpressionControl
// ============================================================================

struct ExpressionSource {
    compiler: Arc<ExpressionCompiler>,
    input: Mutex<String>,
}

impl ExpressionSource {
    fn compiled(&self) -> Option<Arc<CompiledExpression>> {
        let input = lock(&self.input).clone();
        (!input.is_empty()).then(|| self.compiler.compile(&input))
    }
}

impl<R: Record + 'static> Source<R> for ExpressionSource {
    fn criterion(&self) -> Option<Criterion<R>> {
        self.compiled().map(Criterion::from_expression)
    }
}

/// A whole criteria string as one producer.
///
/// Compiles through a shared [`ExpressionCompiler`], so controls holding the
/// same string share one compiled expression. Active while the string is
/// non-empty.
pub struct ExpressionControl<R> {
    source: Arc<ExpressionSource>,
    attachment: Attachment<R>,
}

impl<R> std::fmt::Debug for ExpressionControl<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionControl")
            .field("expression", &*lock(&self.source.input))
            .field("attached", &self.attachment.is_attached())
            .finish()
    }
}

impl<R: Record + 'static> ExpressionControl<R> {
    /// Creates an empty, inactive control compiling through `compiler`.
    pub fn new(compiler: Arc<ExpressionCompiler>) -> Self {
        Self {
            source: Arc::new(ExpressionSource {
                compiler,
                input: Mutex::new(String::new()),
            }),
            attachment: Attachment::default(),
        }
    }

    /// Sets the initial criteria string.
    pub fn with_expression(self, input: impl Into<String>) -> Self {
        *lock(&self.source.input) = input.into();
        self
    }

    /// Registers this control on a coordinator, leaving any previous one.
    pub fn attach(&self, coordinator: &Coordinator<R>) {
        self.attachment.attach(coordinator, &self.source);
    }

    /// Replaces the criteria string and notifies the coordinator, if attached.
    pub fn set_expression(&self, input: impl Into<String>) {
        *lock(&self.source.input) = input.into();
        self.attachment.update();
    }

    /// Returns the current criterion, or `None` while the string is empty.
    pub fn criterion(&self) -> Option<Criterion<R>> {
        self.source.criterion()
    }
}

impl<R> ExpressionControl<R> {
    /// Returns the current criteria string.
    pub fn expression(&self) -> String {
        lock(&self.source.input).clone()
    }

    /// Returns the compiled form of the current string, if it is non-empty.
    pub fn compiled(&self) -> Option<Arc<CompiledExpression>> {
        self.source.compiled()
    }

    /// Returns true while the criteria string is non-empty.
    pub fn is_active(&self) -> bool {
        !lock(&self.source.input).is_empty()
    }

    /// Removes this control from its coordinator.
    pub fn detach(&self) {
        self.attachment.detach();
    }

    /// Returns true while the control is registered on a coordinator.
    pub fn is_attached(&self) -> bool {
        self.attachment.is_attached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::CombinedPredicate;
    use serde_json::{json, Value as Json};

    fn people() -> Vec<Json> {
        vec![
            json!({"name": "John Doe", "team": "Core", "age": 34}),
            json!({"name": "Jane Smith", "team": "core", "age": 28}),
            json!({"name": "Joan Dorsey", "team": "Tools", "age": 51}),
        ]
    }

    fn names(predicate: &CombinedPredicate<Json>, data: &[Json]) -> Vec<String> {
        predicate
            .filter(data)
            .into_iter()
            .map(|r| r["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    // ==================== TextControl Tests ====================

    #[test]
    fn test_text_control_inactive_when_empty() {
        let control: TextControl<Json> = TextControl::exact("team");
        assert!(!control.is_active());
        assert!(control.criterion().is_none());

        control.set_value("Core");
        assert!(control.is_active());
        control.clear();
        assert!(control.criterion().is_none());
    }

    #[test]
    fn test_exact_control_is_case_sensitive() {
        let control: TextControl<Json> = TextControl::exact("team").with_value("Core");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&people()[0]));
        assert!(!criterion.matches(&people()[1]));
        assert_eq!(criterion.label(), Some("team:Core"));
    }

    #[test]
    fn test_fuzzy_control() {
        let control: TextControl<Json> = TextControl::fuzzy("name").with_value("JDo");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&people()[0]));
        assert!(!criterion.matches(&people()[1]));
        assert!(criterion.matches(&people()[2]));
    }

    #[test]
    fn test_search_control_is_substring_over_fields() {
        let control: TextControl<Json> = TextControl::search(["name", "team"]).with_value("CORE");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&people()[0]));
        assert!(criterion.matches(&people()[1]));
        assert!(!criterion.matches(&people()[2]));
        assert_eq!(criterion.label(), Some("name,team:?CORE"));

        // Substring, not subsequence.
        let control: TextControl<Json> = TextControl::search(["name"]).with_value("jdo");
        assert!(!control.criterion().unwrap().matches(&people()[0]));
    }

    #[test]
    fn test_search_control_skips_missing_fields() {
        let control: TextControl<Json> = TextControl::search(["nickname", "name"]).with_value("smith");
        assert!(control.criterion().unwrap().matches(&people()[1]));
    }

    #[test]
    fn test_custom_control() {
        let control = TextControl::custom(|n: &u32| n.to_string(), |text: &String, value: &str| {
            text.ends_with(value)
        });
        control.set_value("5");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&15));
        assert!(!criterion.matches(&16));
    }

    #[test]
    fn test_set_value_notifies_subscribers() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        let latest = Arc::new(Mutex::new(CombinedPredicate::always()));
        let sink = Arc::clone(&latest);
        let _subscription = coordinator.subscribe(move |p| *sink.lock().unwrap() = p);

        let team = TextControl::exact("team");
        team.attach(&coordinator);
        assert!(team.is_attached());
        assert_eq!(names(&latest.lock().unwrap(), &people()).len(), 3);

        team.set_value("core");
        assert_eq!(names(&latest.lock().unwrap(), &people()), vec!["Jane Smith"]);
    }

    #[test]
    fn test_detach_removes_control() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        let team = TextControl::exact("team").with_value("Tools");
        team.attach(&coordinator);
        assert_eq!(coordinator.predicate().active_criteria(), 1);

        team.detach();
        assert!(!team.is_attached());
        assert_eq!(coordinator.control_count(), 0);

        // Changes after detaching are local only.
        team.set_value("Core");
        assert_eq!(coordinator.control_count(), 0);
    }

    #[test]
    fn test_drop_detaches_control() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        {
            let team = TextControl::exact("team").with_value("Tools");
            team.attach(&coordinator);
            assert_eq!(coordinator.control_count(), 1);
        }
        assert_eq!(coordinator.control_count(), 0);
    }

    #[test]
    fn test_reattach_moves_control() {
        let first: Coordinator<Json> = Coordinator::new();
        let second: Coordinator<Json> = Coordinator::new();
        let team = TextControl::exact("team").with_value("Tools");

        team.attach(&first);
        team.attach(&second);
        assert_eq!(first.control_count(), 0);
        assert_eq!(second.control_count(), 1);
    }

    #[test]
    fn test_unsubscribing_last_holder_detaches_control() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        let team = Arc::new(TextControl::exact("team").with_value("Core"));
        team.attach(&coordinator);

        let control = Arc::clone(&team);
        let subscription = coordinator.subscribe(move |_| {
            let _ = control.value();
        });
        drop(team);
        assert_eq!(coordinator.control_count(), 1);

        subscription.unsubscribe();
        assert_eq!(coordinator.control_count(), 0);
        assert!(coordinator.predicate().is_always());
    }

    #[test]
    fn test_set_value_from_listener_does_not_deadlock() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        let team = Arc::new(TextControl::exact("team"));
        team.attach(&coordinator);

        let control = Arc::clone(&team);
        let _subscription = coordinator.subscribe(move |_| {
            if control.value().is_empty() {
                control.set_value("Core");
            }
        });

        assert_eq!(coordinator.predicate().filter(&people()).len(), 1);
    }

    // ==================== RangeControl Tests ====================

    #[test]
    fn test_range_control_activity() {
        let control: RangeControl<Json> = RangeControl::new("age");
        assert!(!control.is_active());

        control.set_low("30");
        assert!(!control.is_active());

        control.set_high("x");
        assert!(!control.is_active());

        control.set_high("30");
        assert!(!control.is_active(), "low must be strictly below high");

        control.set_high("60");
        assert_eq!(control.bounds(), Some((30.0, 60.0)));
    }

    #[test]
    fn test_range_control_inclusive() {
        let control: RangeControl<Json> = RangeControl::new("age");
        control.set_range("28", "34");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&people()[0]));
        assert!(criterion.matches(&people()[1]));
        assert!(!criterion.matches(&people()[2]));
        assert!(!criterion.matches(&json!({"name": "No Age"})));
    }

    #[test]
    fn test_range_control_from_selector() {
        let control = RangeControl::from_selector("len", |s: &String| Some(s.len() as f64));
        control.set_range("2", "3");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&"abc".to_string()));
        assert!(!criterion.matches(&"abcd".to_string()));
        assert_eq!(criterion.label(), Some("len:2..3"));
    }

    #[test]
    fn test_set_range_notifies_once() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        let _subscription = coordinator.subscribe(move |_| *counter.lock().unwrap() += 1);

        let age = RangeControl::new("age");
        age.attach(&coordinator);
        age.set_range("1", "2");
        assert_eq!(*count.lock().unwrap(), 3);
    }

    // ==================== ExpressionControl Tests ====================

    #[test]
    fn test_expression_control() {
        let compiler = Arc::new(ExpressionCompiler::new());
        let control: ExpressionControl<Json> = ExpressionControl::new(Arc::clone(&compiler));
        assert!(!control.is_active());
        assert!(control.criterion().is_none());

        control.set_expression("team:core;age:30..60");
        let criterion = control.criterion().unwrap();
        assert!(criterion.matches(&people()[0]));
        assert!(!criterion.matches(&people()[1]));
        assert_eq!(criterion.label(), Some("team:core;age:30..60"));
    }

    #[test]
    fn test_expression_controls_share_compiled_form() {
        let compiler = Arc::new(ExpressionCompiler::new());
        let a: ExpressionControl<Json> =
            ExpressionControl::new(Arc::clone(&compiler)).with_expression("age:1..40");
        let b: ExpressionControl<Json> =
            ExpressionControl::new(Arc::clone(&compiler)).with_expression("age:1..40");

        assert!(Arc::ptr_eq(&a.compiled().unwrap(), &b.compiled().unwrap()));
        assert_eq!(compiler.len(), 1);
    }

    #[test]
    fn test_mixed_controls_combine() {
        let coordinator: Coordinator<Json> = Coordinator::new();
        let compiler = Arc::new(ExpressionCompiler::new());

        let team = TextControl::search(["team"]).with_value("core");
        let age = RangeControl::new("age");
        let expr = ExpressionControl::new(compiler).with_expression("name:~jd");
        team.attach(&coordinator);
        age.attach(&coordinator);
        expr.attach(&coordinator);

        assert_eq!(names(&coordinator.predicate(), &people()), vec!["John Doe"]);

        age.set_range("40", "60");
        assert!(coordinator.predicate().filter(&people()).is_empty());

        team.clear();
        assert_eq!(names(&coordinator.predicate(), &people()), vec!["Joan Dorsey"]);
    }
}
