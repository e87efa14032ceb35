//! Integration tests for the schema -> controller -> submit pipeline.
//!
//! These tests drive a complete form through its public API, covering:
//! 1. Render order and widget binding
//! 2. Mount fetches and the loading flag
//! 3. Cascading country -> state -> city/postalCode options
//! 4. Stale fetch handling
//! 5. Submission

use std::sync::Mutex;

use async_trait::async_trait;

use dynform_core::{FetchError, FormResult};
use dynform_forms::{
    FetchOutcome, FetchStatus, FieldSpec, FieldType, FieldValue, FormController, FormSchema,
    FormValues, Layout, MemoryOptionSource, Rule, SelectOption, SubmitAction, SubmitHandler,
    SubmitOutcome,
};

// ============================================================================
// Shared helpers
// ============================================================================

const COUNTRIES: &str = "http://api.test/countries";
const STATES: &str = "http://api.test/states?country=";
const CITIES: &str = "http://api.test/cities?state=";
const POSTAL: &str = "http://api.test/postal?state=";

/// Records every payload it receives.
#[derive(Default)]
struct RecordingHandler {
    calls: Mutex<Vec<FormValues>>,
}

impl RecordingHandler {
    fn calls(&self) -> Vec<FormValues> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmitHandler for RecordingHandler {
    async fn submit(&self, values: &FormValues) -> FormResult<SubmitAction> {
        self.calls.lock().unwrap().push(values.clone());
        Ok(SubmitAction::Keep)
    }
}

fn auto(name: &str, label: &str, order: i64) -> FieldSpec {
    FieldSpec::new(name, label, FieldType::Autocomplete, order).layout(Layout::half())
}

/// A profile form with a required name, age, and remote country.
fn profile_schema() -> FormSchema {
    FormSchema::new(vec![
        FieldSpec::new("firstName", "First name", FieldType::Text, 1)
            .layout(Layout::half())
            .rule(Rule::string().required("First name is required")),
        FieldSpec::new("age", "Age", FieldType::Number, 2)
            .layout(Layout::half())
            .rule(
                Rule::number()
                    .required("Age is required")
                    .positive("Age must be a positive number")
                    .integer("Age must be an integer"),
            ),
        auto("country", "Country", 3)
            .remote(COUNTRIES)
            .rule(Rule::string().required("Country is required")),
    ])
}

/// Country -> state -> {city, postalCode}.
fn location_schema() -> FormSchema {
    FormSchema::new(vec![
        auto("country", "Country", 1)
            .remote(COUNTRIES)
            .dependent("state", STATES),
        auto("state", "State", 2)
            .dependent("city", CITIES)
            .dependent("postalCode", POSTAL),
        auto("city", "City", 3),
        auto("postalCode", "Postal code", 4),
    ])
}

fn location_source() -> MemoryOptionSource {
    MemoryOptionSource::new()
        .with_options(
            COUNTRIES,
            vec![SelectOption::new("1", "USA"), SelectOption::new("2", "Canada")],
        )
        .with_options(
            format!("{STATES}1"),
            vec![SelectOption::new("10", "Texas"), SelectOption::new("11", "Ohio")],
        )
        .with_options(format!("{STATES}2"), vec![SelectOption::new("20", "Ontario")])
        .with_options(format!("{CITIES}10"), vec![SelectOption::new("100", "Austin")])
        .with_options(format!("{POSTAL}10"), vec![SelectOption::new("73301", "73301")])
}

fn location_form() -> FormController<MemoryOptionSource, RecordingHandler> {
    FormController::new(location_schema(), location_source(), RecordingHandler::default())
        .unwrap()
}

// ============================================================================
// 1. Render order and widget binding
// ============================================================================

#[test]
fn test_render_order_is_stable() {
    let schema = FormSchema::new(vec![
        FieldSpec::new("d", "D", FieldType::Text, 4).layout(Layout::full()),
        FieldSpec::new("a", "A", FieldType::Text, 1).layout(Layout::full()),
        FieldSpec::new("country", "Country", FieldType::Text, 4).layout(Layout::full()),
        FieldSpec::new("b", "B", FieldType::Text, 2).layout(Layout::full()),
    ]);
    let form = FormController::new(schema, MemoryOptionSource::new(), RecordingHandler::default())
        .unwrap();
    let names: Vec<String> = form.bound_fields().into_iter().map(|f| f.name).collect();
    assert_eq!(names, ["a", "b", "d", "country"]);
}

#[test]
fn test_select_option_stores_id() {
    let mut form = location_form();
    let canada = SelectOption::new("2", "Canada");
    form.select_option("country", Some(&canada)).unwrap();
    assert_eq!(form.value("country").unwrap(), &FieldValue::from("2"));

    form.select_option("country", None).unwrap();
    assert!(form.value("country").unwrap().is_null());
}

#[test]
fn test_unknown_type_renders_as_text() {
    let schema: FormSchema = serde_json::from_str(
        r#"{"fields": [{"name": "email", "label": "Email", "type": "email", "order": 1,
            "layout": {"xs": 12, "sm": 12, "md": 12, "lg": 12, "xl": 12}}]}"#,
    )
    .unwrap();
    let form = FormController::new(schema, MemoryOptionSource::new(), RecordingHandler::default())
        .unwrap();
    assert!(form.render().contains(r#"<input type="text" name="email" value="""#));
}

// ============================================================================
// 2. Mount fetches and the loading flag
// ============================================================================

#[tokio::test]
async fn test_mount_populates_independent_options() {
    let mut form = location_form();
    let outcomes = form.mount().await;

    assert_eq!(outcomes, [FetchOutcome::Applied]);
    assert_eq!(form.source().requests(), [COUNTRIES]);
    assert_eq!(form.options("country").unwrap().len(), 2);
    assert!(form.options("state").unwrap().is_empty());
    assert!(!form.is_loading());
    assert!(form.render().contains(r#"<option value="2">Canada</option>"#));
}

#[test]
fn test_loading_flag_tracks_mount_fetches() {
    let mut form = location_form();
    assert!(!form.is_loading());

    let requests = form.begin_mount();
    assert_eq!(requests.len(), 1);
    assert!(form.is_loading());
    assert!(form.render().contains(r#"aria-busy="true""#));

    form.complete_fetch(&requests[0], Ok(vec![SelectOption::new("1", "USA")]));
    assert!(!form.is_loading());
}

#[tokio::test]
async fn test_mount_failure_leaves_options_empty_and_refetch_recovers() {
    let source = MemoryOptionSource::new().with_error(COUNTRIES, FetchError::Status(503));
    let mut form =
        FormController::new(location_schema(), source, RecordingHandler::default()).unwrap();

    assert_eq!(form.mount().await, [FetchOutcome::Failed]);
    assert!(form.options("country").unwrap().is_empty());
    assert_eq!(form.fetch_status("country").unwrap(), FetchStatus::Failed);
    assert!(!form.is_loading());

    let request = form.refetch("country").unwrap().unwrap();
    assert_eq!(request.url, COUNTRIES);
    let outcome = form.complete_fetch(&request, Ok(vec![SelectOption::new("1", "USA")]));
    assert_eq!(outcome, FetchOutcome::Applied);
    assert_eq!(form.options("country").unwrap().len(), 1);
}

#[tokio::test]
async fn test_mount_with_parent_default_fetches_child() {
    let schema = location_schema().with_default("country", "1");
    let mut form = FormController::new(schema, location_source(), RecordingHandler::default())
        .unwrap();
    form.mount().await;
    assert_eq!(form.source().requests(), [COUNTRIES.to_string(), format!("{STATES}1")]);
    assert_eq!(form.options("state").unwrap().len(), 2);
}

// ============================================================================
// 3. Cascading options
// ============================================================================

#[tokio::test]
async fn test_country_change_fetches_state_only() {
    let mut form = location_form();
    form.mount().await;

    let requests = form.change("country", "1").unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, format!("{STATES}1"));
    assert_eq!(form.fetch_status("state").unwrap(), FetchStatus::Fetching);
    assert_eq!(form.fetch_status("city").unwrap(), FetchStatus::Idle);
    assert_eq!(form.fetch_status("postalCode").unwrap(), FetchStatus::Idle);

    form.resolve(requests).await;
    assert_eq!(form.options("state").unwrap().len(), 2);
    assert!(form.options("city").unwrap().is_empty());
}

#[tokio::test]
async fn test_cascade_fetch_marks_form_busy() {
    let mut form = location_form();
    form.mount().await;
    assert!(!form.is_fetching());
    assert!(!form.render().contains(r#"novalidate aria-busy="true""#));

    let requests = form.change("country", "1").unwrap();
    assert!(!form.is_loading());
    assert!(form.is_fetching());
    assert!(form.render().contains(r#"novalidate aria-busy="true""#));

    form.resolve(requests).await;
    assert!(!form.is_fetching());
}

#[tokio::test]
async fn test_state_change_fetches_city_and_postal_code() {
    let mut form = location_form();
    form.mount().await;
    form.change_and_resolve("country", "1").await.unwrap();

    let outcomes = form.change_and_resolve("state", "10").await.unwrap();
    assert_eq!(outcomes, [FetchOutcome::Applied, FetchOutcome::Applied]);
    assert_eq!(form.options("city").unwrap()[0].value, "Austin");
    assert_eq!(form.options("postalCode").unwrap()[0].id, "73301");
}

#[tokio::test]
async fn test_country_change_clears_whole_chain() {
    let mut form = location_form();
    form.mount().await;
    form.change_and_resolve("country", "1").await.unwrap();
    form.change_and_resolve("state", "10").await.unwrap();
    form.change("city", "100").unwrap();
    form.change("postalCode", "73301").unwrap();

    let requests = form.change("country", "2").unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, format!("{STATES}2"));
    for name in ["state", "city", "postalCode"] {
        assert!(form.value(name).unwrap().is_null(), "{name} should be cleared");
    }
    for name in ["city", "postalCode"] {
        assert!(form.options(name).unwrap().is_empty(), "{name} options should be cleared");
        assert_eq!(form.fetch_status(name).unwrap(), FetchStatus::Idle);
    }
}

#[tokio::test]
async fn test_clearing_parent_fetches_nothing() {
    let mut form = location_form();
    form.mount().await;
    form.change_and_resolve("country", "1").await.unwrap();

    let requests = form.select_option("country", None).unwrap();
    assert!(requests.is_empty());
    assert!(form.options("state").unwrap().is_empty());
}

#[tokio::test]
async fn test_same_value_does_not_cascade() {
    let mut form = location_form();
    form.mount().await;
    form.change_and_resolve("country", "1").await.unwrap();
    form.change("state", "10").unwrap();

    let requests = form.change("country", "1").unwrap();
    assert!(requests.is_empty());
    assert_eq!(form.value("state").unwrap(), &FieldValue::from("10"));
    assert_eq!(form.options("state").unwrap().len(), 2);
}

// ============================================================================
// 4. Stale fetch handling
// ============================================================================

#[test]
fn test_only_current_state_fetch_is_applied() {
    let mut form = location_form();

    let first = form.change("country", "1").unwrap().remove(0);
    let second = form.change("country", "2").unwrap().remove(0);

    // The newer fetch lands first, then the older one.
    let ontario = vec![SelectOption::new("20", "Ontario")];
    assert_eq!(form.complete_fetch(&second, Ok(ontario.clone())), FetchOutcome::Applied);
    assert_eq!(
        form.complete_fetch(&first, Ok(vec![SelectOption::new("10", "Texas")])),
        FetchOutcome::Stale
    );
    assert_eq!(form.options("state").unwrap(), ontario.as_slice());
}

#[test]
fn test_stale_fetch_in_reverse_order() {
    let mut form = location_form();

    let first = form.change("country", "1").unwrap().remove(0);
    let second = form.change("country", "2").unwrap().remove(0);

    assert_eq!(
        form.complete_fetch(&first, Ok(vec![SelectOption::new("10", "Texas")])),
        FetchOutcome::Stale
    );
    assert!(form.options("state").unwrap().is_empty());
    assert_eq!(
        form.complete_fetch(&second, Ok(vec![SelectOption::new("20", "Ontario")])),
        FetchOutcome::Applied
    );
    assert_eq!(form.options("state").unwrap()[0].value, "Ontario");
}

// ============================================================================
// 5. Submission
// ============================================================================

#[tokio::test]
async fn test_invalid_submission_blocks_handler() {
    let mut form = FormController::new(
        profile_schema(),
        MemoryOptionSource::new(),
        RecordingHandler::default(),
    )
    .unwrap();
    form.change("firstName", "").unwrap();
    form.change("age", -1).unwrap();

    let outcome = form.submit().await.unwrap();
    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected validation to fail");
    };
    assert_eq!(errors.len(), 3);
    assert_eq!(errors["firstName"].message, "First name is required");
    assert_eq!(errors["age"].message, "Age must be a positive number");
    assert_eq!(errors["country"].message, "Country is required");
    assert!(form.handler().calls().is_empty());

    let html = form.render();
    assert!(html.contains(r#"<p id="id_age_helper" class="helper-text error">Age must be a positive number</p>"#));
}

#[tokio::test]
async fn test_valid_submission_calls_handler_once() {
    let mut form = FormController::new(
        profile_schema(),
        MemoryOptionSource::new(),
        RecordingHandler::default(),
    )
    .unwrap();
    form.change("firstName", "Ana").unwrap();
    form.change("age", 30).unwrap();
    form.select_option("country", Some(&SelectOption::new("1", "USA")))
        .unwrap();

    let outcome = form.submit().await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Submitted(SubmitAction::Keep));
    assert!(form.errors().is_empty());

    let calls = form.handler().calls();
    assert_eq!(calls.len(), 1);
    let mut expected = FormValues::new();
    expected.insert("firstName".into(), FieldValue::from("Ana"));
    expected.insert("age".into(), FieldValue::Int(30));
    expected.insert("country".into(), FieldValue::from("1"));
    assert_eq!(calls[0], expected);

    // Values survive a Keep answer.
    assert_eq!(form.values(), expected);
}

#[tokio::test]
async fn test_fixing_errors_after_blocked_submit() {
    let mut form = FormController::new(
        profile_schema(),
        MemoryOptionSource::new(),
        RecordingHandler::default(),
    )
    .unwrap();
    assert!(!form.submit().await.unwrap().is_submitted());

    // Fields are touched by submit, so each change re-validates.
    form.change("firstName", "Ana").unwrap();
    assert!(form.error("firstName").unwrap().is_none());
    assert_eq!(form.errors().len(), 2);
}
