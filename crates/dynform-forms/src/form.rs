//! The form controller.
//!
//! [`FormController`] owns a form's [`FormState`] and [`OptionsCache`] and
//! reacts to events: field changes, blurs, option selections, fetch
//! completions, and submit. Every reaction runs on `&mut self`, one at a
//! time, so the only suspension points are the option fetches themselves.
//!
//! The synchronous methods ([`change`](FormController::change),
//! [`complete_fetch`](FormController::complete_fetch), ...) return the
//! [`FetchRequest`]s to perform and accept their results, which makes the
//! ordering of concurrent fetches explicit. The async conveniences
//! ([`mount`](FormController::mount),
//! [`change_and_resolve`](FormController::change_and_resolve)) drive those
//! requests through the configured [`OptionSource`].

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tracing::Instrument;

use dynform_core::logging::form_span;
use dynform_core::utils::html::escape_html;
use dynform_core::{FetchError, FormResult, ValidationError};

use crate::bound_field::BoundField;
use crate::dependency::DependencyGraph;
use crate::resolver::{fetch_all, FetchOutcome, FetchRequest, OptionResolver, OptionSource};
use crate::schema::{FieldId, FormSchema, SelectOption};
use crate::state::{FetchStatus, FormState, OptionsCache};
use crate::validation::{build_validator, CompositeValidator};
use crate::value::{FieldValue, FormValues};
use crate::widgets;

/// What the form does with its state after a successful submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitAction {
    /// Leave values as they are.
    #[default]
    Keep,
    /// Restore the configured defaults.
    Reset,
}

/// Result of [`FormController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler received the payload and answered with this action.
    Submitted(SubmitAction),
    /// Validation failed; the handler was not called.
    Invalid(BTreeMap<String, ValidationError>),
}

impl SubmitOutcome {
    /// Returns `true` if the payload reached the handler.
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Receives the validated payload of a form.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Handles one submission. An error is returned from
    /// [`FormController::submit`] unchanged.
    async fn submit(&self, values: &FormValues) -> FormResult<SubmitAction>;
}

/// Logs the payload as JSON and keeps the form's values.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubmitHandler;

#[async_trait]
impl SubmitHandler for LoggingSubmitHandler {
    async fn submit(&self, values: &FormValues) -> FormResult<SubmitAction> {
        let payload = serde_json::to_string(values)?;
        tracing::info!(%payload, "Form submitted");
        Ok(SubmitAction::Keep)
    }
}

/// Adapts a closure into a [`SubmitHandler`].
pub struct FnSubmitHandler<F>(pub F);

#[async_trait]
impl<F> SubmitHandler for FnSubmitHandler<F>
where
    F: Fn(&FormValues) -> FormResult<SubmitAction> + Send + Sync,
{
    async fn submit(&self, values: &FormValues) -> FormResult<SubmitAction> {
        (self.0)(values)
    }
}

/// Drives one form instance.
pub struct FormController<S, H> {
    form_id: String,
    schema: FormSchema,
    validator: CompositeValidator,
    resolver: OptionResolver,
    state: FormState,
    cache: OptionsCache,
    loading: HashSet<FieldId>,
    source: S,
    handler: H,
}

impl<S: OptionSource, H: SubmitHandler> FormController<S, H> {
    /// Creates a controller, rejecting a defective schema.
    pub fn new(schema: FormSchema, source: S, handler: H) -> FormResult<Self> {
        schema.validate()?;
        let graph = DependencyGraph::build(&schema)?;
        Ok(Self {
            form_id: "form".to_string(),
            validator: build_validator(&schema.fields),
            resolver: OptionResolver::new(graph),
            state: FormState::new(&schema),
            cache: OptionsCache::new(&schema),
            loading: HashSet::new(),
            schema,
            source,
            handler,
        })
    }

    /// Sets the identifier carried by this form's log events.
    #[must_use]
    pub fn with_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = form_id.into();
        self
    }

    /// The schema this form was built from.
    pub const fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// The option source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The submit handler.
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    // ── Mount and fetches ───────────────────────────────────────────

    /// Issues the mount fetches and raises the loading flag for them.
    pub fn begin_mount(&mut self) -> Vec<FetchRequest> {
        let requests = self
            .resolver
            .mount_requests(&self.schema, &self.state, &mut self.cache);
        self.loading.extend(requests.iter().map(|r| r.field));
        tracing::debug!(form = %self.form_id, fetches = requests.len(), "Mounting form");
        requests
    }

    /// Mounts the form and waits for every mount fetch to settle.
    pub async fn mount(&mut self) -> Vec<FetchOutcome> {
        let span = form_span(&self.form_id);
        let requests = span.in_scope(|| self.begin_mount());
        self.resolve(requests).instrument(span).await
    }

    /// Applies the result of one fetch.
    pub fn complete_fetch(
        &mut self,
        request: &FetchRequest,
        result: Result<Vec<SelectOption>, FetchError>,
    ) -> FetchOutcome {
        let outcome = self
            .resolver
            .complete(&self.schema, &mut self.cache, request, result);
        if outcome != FetchOutcome::Stale {
            self.loading.remove(&request.field);
        }
        outcome
    }

    /// Performs `requests` concurrently and applies each result.
    pub async fn resolve(&mut self, requests: Vec<FetchRequest>) -> Vec<FetchOutcome> {
        let results = fetch_all(&self.source, requests).await;
        results
            .into_iter()
            .map(|(request, result)| self.complete_fetch(&request, result))
            .collect()
    }

    /// Re-issues the fetch for one field, e.g. after a failure.
    ///
    /// Returns `None` when the field has no source or its parent is empty.
    pub fn refetch(&mut self, name: &str) -> FormResult<Option<FetchRequest>> {
        let id = self.schema.require_field(name)?;
        Ok(self
            .resolver
            .refetch(&self.schema, &self.state, &mut self.cache, id))
    }

    // ── Field events ────────────────────────────────────────────────

    /// Sets a field's value and cascades to its dependents.
    ///
    /// Setting a field to its current value does nothing. Returns the
    /// fetches to perform for direct dependents.
    pub fn change(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> FormResult<Vec<FetchRequest>> {
        let id = self.schema.require_field(name)?;
        let value = value.into();
        if *self.state.value(id) == value {
            return Ok(Vec::new());
        }

        self.state.set_value(id, value);
        if self.state.is_touched(id) {
            self.revalidate(id);
        }

        if self.resolver.graph().dependents(id).is_empty() {
            return Ok(Vec::new());
        }
        let (requests, cleared) =
            self.resolver
                .propagate(&self.schema, &mut self.state, &mut self.cache, id);
        for field in cleared {
            self.loading.remove(&field);
        }
        Ok(requests)
    }

    /// Converts raw input text through the field's widget, then changes it.
    pub fn input(&mut self, name: &str, raw: Option<&str>) -> FormResult<Vec<FetchRequest>> {
        let id = self.schema.require_field(name)?;
        let widget = widgets::create_widget(self.schema.field(id), self.cache.options(id));
        let value = widget.value_from_input(raw);
        self.change(name, value)
    }

    /// Stores the selected option's id, or `Null` when cleared.
    pub fn select_option(
        &mut self,
        name: &str,
        option: Option<&SelectOption>,
    ) -> FormResult<Vec<FetchRequest>> {
        self.change(name, option.map(|o| o.id.clone()))
    }

    /// Changes a field and waits for the resulting dependent fetches.
    pub async fn change_and_resolve(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> FormResult<Vec<FetchOutcome>> {
        let span = form_span(&self.form_id);
        let requests = span.in_scope(|| self.change(name, value))?;
        Ok(self.resolve(requests).instrument(span).await)
    }

    /// Marks a field touched and re-validates it alone.
    pub fn blur(&mut self, name: &str) -> FormResult<Option<ValidationError>> {
        let id = self.schema.require_field(name)?;
        self.state.touch(id);
        self.revalidate(id);
        Ok(self.state.error(id).cloned())
    }

    fn revalidate(&mut self, id: FieldId) {
        let name = &self.schema.field(id).name;
        let error = self.validator.validate_field(name, self.state.value(id));
        self.state.set_error(id, error);
    }

    // ── Submit ──────────────────────────────────────────────────────

    /// Validates every field and hands the payload to the submit handler.
    ///
    /// On failure all per-field errors are stored and returned and the
    /// handler is not called. On success the handler is called exactly
    /// once; values are reset only when it answers [`SubmitAction::Reset`].
    pub async fn submit(&mut self) -> FormResult<SubmitOutcome> {
        let span = form_span(&self.form_id);
        let values = self.state.values();
        let report = self.validator.validate(&values);

        for id in self.schema.ids() {
            self.state.touch(id);
            let error = report.error(&self.schema.field(id).name).cloned();
            self.state.set_error(id, error);
        }

        if self.state.has_errors() {
            span.in_scope(|| {
                tracing::info!(errors = report.error_count(), "Submission blocked by validation");
            });
            return Ok(SubmitOutcome::Invalid(report.errors()));
        }

        let action = self.handler.submit(&values).instrument(span.clone()).await?;
        if action == SubmitAction::Reset {
            let requests = span.in_scope(|| self.reset());
            self.resolve(requests).instrument(span).await;
        }
        Ok(SubmitOutcome::Submitted(action))
    }

    /// Restores default values and clears errors.
    ///
    /// Dependent option lists are cleared; the returned requests refetch
    /// those whose parent default is set.
    pub fn reset(&mut self) -> Vec<FetchRequest> {
        self.state = FormState::new(&self.schema);
        let dependents: Vec<FieldId> = self
            .schema
            .ids()
            .filter(|id| self.resolver.graph().has_parent(*id))
            .collect();
        let mut requests = Vec::new();
        for id in dependents {
            self.cache.clear(id);
            self.loading.remove(&id);
            if let Some(request) =
                self.resolver
                    .refetch(&self.schema, &self.state, &mut self.cache, id)
            {
                requests.push(request);
            }
        }
        tracing::debug!(form = %self.form_id, "Form reset");
        requests
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Snapshot of every value keyed by field name.
    pub fn values(&self) -> FormValues {
        self.state.values()
    }

    /// The current value of one field.
    pub fn value(&self, name: &str) -> FormResult<&FieldValue> {
        let id = self.schema.require_field(name)?;
        Ok(self.state.value(id))
    }

    /// Every current error keyed by field name.
    pub fn errors(&self) -> BTreeMap<String, ValidationError> {
        self.schema
            .ids()
            .filter_map(|id| {
                self.state
                    .error(id)
                    .map(|e| (self.schema.field(id).name.clone(), e.clone()))
            })
            .collect()
    }

    /// The current error of one field.
    pub fn error(&self, name: &str) -> FormResult<Option<&ValidationError>> {
        let id = self.schema.require_field(name)?;
        Ok(self.state.error(id))
    }

    /// Resolved options of one field.
    pub fn options(&self, name: &str) -> FormResult<&[SelectOption]> {
        let id = self.schema.require_field(name)?;
        Ok(self.cache.options(id))
    }

    /// Fetch status of one field's options.
    pub fn fetch_status(&self, name: &str) -> FormResult<FetchStatus> {
        let id = self.schema.require_field(name)?;
        Ok(self.cache.slot(id).status)
    }

    /// Whether any mount fetch is still outstanding.
    pub fn is_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Whether any option fetch, from mount or a cascade, is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.cache.any_fetching()
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Bound fields in render order.
    pub fn bound_fields(&self) -> Vec<BoundField> {
        self.schema
            .sorted_ids()
            .into_iter()
            .map(|id| self.bind(id))
            .collect()
    }

    /// The bound field for one name.
    pub fn bound_field(&self, name: &str) -> FormResult<BoundField> {
        let id = self.schema.require_field(name)?;
        Ok(self.bind(id))
    }

    fn bind(&self, id: FieldId) -> BoundField {
        BoundField::new(
            self.schema.field(id),
            self.state.value(id).clone(),
            self.state.error(id).cloned(),
            self.cache.options(id),
            self.cache.slot(id).status == FetchStatus::Fetching,
        )
    }

    /// Renders the whole form: grid container, fields, submit row.
    pub fn render(&self) -> String {
        let config = &self.schema.config;
        let button = &config.submit_button;
        let busy = if self.is_loading() || self.is_fetching() {
            r#" aria-busy="true""#
        } else {
            ""
        };

        let mut html = format!(
            r#"<form id="{}" class="dynform" novalidate{busy}>"#,
            escape_html(&self.form_id)
        );
        html.push_str(&format!(
            r#"<div class="grid-container spacing-{}">"#,
            config.grid_container.spacing
        ));
        for field in self.bound_fields() {
            html.push_str(&field.as_grid_item());
        }
        html.push_str("</div>");
        html.push_str(&format!(
            r#"<div class="submit-row" style="display: {}; justify-content: {}"><button type="submit" class="button button-{} button-{}">{}</button></div>"#,
            escape_html(&button.display),
            escape_html(&button.justify_content),
            escape_html(&button.variant),
            escape_html(&button.color),
            escape_html(&button.label),
        ));
        html.push_str("</form>");
        html
    }
}
