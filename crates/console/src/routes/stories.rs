//! Portfolio and testimonial route handlers.
//!
//! Both are titled galleries with the same fields, so one set of views and
//! one form serve both; [`StoryKind`] picks the API calls and paths.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atelier_core::{PortfolioId, TestimonialId, slugify};

use crate::{
    api::{Ack, ApiError, ApiSession, Story, StoryInput},
    error::AppError,
    filters,
    media::{ImageResolver, Viewport},
    middleware::RequireConsoleAuth,
    models::ConsoleSession,
    notification::{self, Notification},
    state::AppState,
    views::{FieldErrors, Layout, checkbox, non_blank, removed_refs, render, split_list},
};

/// Build the portfolio and testimonial router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(portfolio_index).post(save_portfolio))
        .route("/portfolio/new", get(new_portfolio))
        .route("/portfolio/{id}/edit", get(edit_portfolio))
        .route("/portfolio/{id}/delete", post(delete_portfolio))
        .route("/testimonials", get(testimonial_index).post(save_testimonial))
        .route("/testimonials/new", get(new_testimonial))
        .route("/testimonials/{id}/edit", get(edit_testimonial))
}

/// Which gallery a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryKind {
    Portfolio,
    Testimonial,
}

impl StoryKind {
    #[must_use]
    pub const fn base_path(self) -> &'static str {
        match self {
            Self::Portfolio => "/portfolio",
            Self::Testimonial => "/testimonials",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Portfolio => "Portfolio",
            Self::Testimonial => "Testimonials",
        }
    }

    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Portfolio => "portfolio",
            Self::Testimonial => "testimonial",
        }
    }

    /// Testimonials cannot be deleted from the console.
    #[must_use]
    pub const fn can_delete(self) -> bool {
        matches!(self, Self::Portfolio)
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone)]
pub struct StoryView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Cover and pictures, one per line, for removal on delete.
    pub media: String,
    pub cover_url: String,
    pub picture_count: usize,
    pub is_visible: bool,
}

impl StoryView {
    fn new<Id: ToString>(story: &Story<Id>, media: &ImageResolver, compact: bool) -> Self {
        Self {
            id: story.id.to_string(),
            title: story.title.clone(),
            slug: story.slug.clone(),
            description: story.description.clone(),
            media: story
                .cover_image
                .iter()
                .chain(&story.pictures)
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
            cover_url: media.resolve(story.cover_image.as_deref(), compact),
            picture_count: story.pictures.len(),
            is_visible: story.is_visible,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "stories/index.html")]
struct StoryListTemplate {
    layout: Layout,
    title: &'static str,
    noun: &'static str,
    base_path: &'static str,
    can_delete: bool,
    stories: Vec<StoryView>,
}

#[derive(Template)]
#[template(path = "stories/form.html")]
struct StoryFormTemplate {
    layout: Layout,
    noun: &'static str,
    base_path: &'static str,
    values: StoryFormInput,
    errors: FieldErrors,
    previews: Vec<String>,
}

/// Portfolio/testimonial form values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryFormInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
    /// One picture reference per line.
    #[serde(default)]
    pub pictures: String,
    #[serde(default)]
    pub original_pictures: String,
    #[serde(default)]
    pub original_cover: String,
    pub is_visible: Option<String>,
}

impl<Id: ToString> From<&Story<Id>> for StoryFormInput {
    fn from(story: &Story<Id>) -> Self {
        let pictures = story.pictures.join("\n");
        let cover = story.cover_image.clone().unwrap_or_default();
        Self {
            id: story.id.to_string(),
            title: story.title.clone(),
            description: story.description.clone(),
            cover_image: cover.clone(),
            pictures: pictures.clone(),
            original_pictures: pictures,
            original_cover: cover,
            is_visible: story.is_visible.then(|| "on".to_string()),
        }
    }
}

impl StoryFormInput {
    fn blank() -> Self {
        Self {
            is_visible: Some("on".to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_edit(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Validate the form into a save payload. The slug follows the title.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> Result<StoryInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Title is required");
        }
        let cover = self.cover_image.trim();
        if cover.is_empty() {
            errors.add("cover_image", "Cover image is required");
        }
        let pictures = split_list(&self.pictures);
        if pictures.is_empty() {
            errors.add("pictures", "Add at least one picture");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(StoryInput {
            id: non_blank(&self.id),
            title: title.to_string(),
            slug: slugify(title),
            description: self.description.trim().to_string(),
            cover_image: cover.to_string(),
            pictures,
            is_visible: checkbox(self.is_visible.as_deref()),
        })
    }

    /// Media dropped from the form since it was opened, cover included.
    #[must_use]
    pub fn removed_media(&self) -> Vec<String> {
        let mut removed = removed_refs(&split_list(&self.original_pictures), &split_list(&self.pictures));
        let original_cover = self.original_cover.trim();
        if !original_cover.is_empty() && original_cover != self.cover_image.trim() {
            removed.push(original_cover.to_string());
        }
        removed
    }
}

// =============================================================================
// Shared handlers
// =============================================================================

async fn list(
    kind: StoryKind,
    state: &AppState,
    session: &Session,
    operator: &ConsoleSession,
    viewport: Viewport,
) -> Result<Response, AppError> {
    let api = state.api_for(operator);
    let media = state.media();
    let stories = match kind {
        StoryKind::Portfolio => api
            .portfolios()
            .await?
            .iter()
            .map(|s| StoryView::new(s, media, viewport.compact))
            .collect(),
        StoryKind::Testimonial => api
            .testimonials()
            .await?
            .iter()
            .map(|s| StoryView::new(s, media, viewport.compact))
            .collect(),
    };

    let template = StoryListTemplate {
        layout: Layout::new(session, operator, kind.base_path()).await,
        title: kind.title(),
        noun: kind.noun(),
        base_path: kind.base_path(),
        can_delete: kind.can_delete(),
        stories,
    };
    Ok(template.into_response())
}

fn form_template(
    kind: StoryKind,
    state: &AppState,
    viewport: Viewport,
    layout: Layout,
    values: StoryFormInput,
    errors: FieldErrors,
) -> StoryFormTemplate {
    let previews = split_list(&values.pictures)
        .iter()
        .map(|r| state.media().resolve(Some(r), viewport.compact))
        .collect();
    StoryFormTemplate {
        layout,
        noun: kind.noun(),
        base_path: kind.base_path(),
        values,
        errors,
        previews,
    }
}

async fn show_form(
    kind: StoryKind,
    state: &AppState,
    session: &Session,
    operator: &ConsoleSession,
    viewport: Viewport,
    values: StoryFormInput,
) -> Response {
    let layout = Layout::new(session, operator, kind.base_path()).await;
    let template = form_template(kind, state, viewport, layout, values, FieldErrors::default());
    render(&template).into_response()
}

async fn send_story(kind: StoryKind, api: &ApiSession, input: &StoryInput) -> Result<Ack, ApiError> {
    match kind {
        StoryKind::Portfolio => api.save_portfolio(input).await,
        StoryKind::Testimonial => api.save_testimonial(input).await,
    }
}

async fn save(
    kind: StoryKind,
    state: &AppState,
    session: &Session,
    operator: &ConsoleSession,
    viewport: Viewport,
    values: StoryFormInput,
) -> Result<Response, AppError> {
    let api = state.api_for(operator);

    let (errors, message) = match values.validate() {
        Ok(input) => match send_story(kind, &api, &input).await {
            Ok(ack) => {
                tracing::info!(kind = kind.noun(), slug = %input.slug, "Story saved");
                let removed = values.removed_media();
                super::remove_media(&api, &removed).await?;
                notification::notify_success(session, ack.message_or("Saved successfully")).await;
                return Ok(Redirect::to(kind.base_path()).into_response());
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, kind = kind.noun(), "Failed to save story");
                let errors = e.field_errors().map(FieldErrors::from).unwrap_or_default();
                (errors, e.user_message())
            }
        },
        Err(errors) => (errors, "Please check the form for errors".to_string()),
    };

    let layout = Layout::new(session, operator, kind.base_path())
        .await
        .with_notification(Notification::error(message));
    let template = form_template(kind, state, viewport, layout, values, errors);
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
}

// =============================================================================
// Portfolio
// =============================================================================

#[instrument(skip(operator, state, session))]
pub async fn portfolio_index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
) -> Result<Response, AppError> {
    list(StoryKind::Portfolio, &state, &session, &operator, viewport).await
}

#[instrument(skip(operator, state, session))]
pub async fn new_portfolio(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
) -> Response {
    show_form(StoryKind::Portfolio, &state, &session, &operator, viewport, StoryFormInput::blank()).await
}

#[instrument(skip(operator, state, session))]
pub async fn edit_portfolio(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<PortfolioId>,
) -> Result<Response, AppError> {
    let story = state.api_for(&operator).portfolio(&id).await?;
    let values = StoryFormInput::from(&story);
    Ok(show_form(StoryKind::Portfolio, &state, &session, &operator, viewport, values).await)
}

#[instrument(skip(operator, state, session, values))]
pub async fn save_portfolio(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Form(values): Form<StoryFormInput>,
) -> Result<Response, AppError> {
    save(StoryKind::Portfolio, &state, &session, &operator, viewport, values).await
}

/// Hidden fields posted with the delete button.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteStoryForm {
    #[serde(default)]
    pub media: String,
}

/// Delete a portfolio entry and its pictures.
#[instrument(skip(operator, state, session, form))]
pub async fn delete_portfolio(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PortfolioId>,
    Form(form): Form<DeleteStoryForm>,
) -> Result<Redirect, AppError> {
    let api = state.api_for(&operator);
    match api.delete_portfolio(&id).await {
        Ok(ack) => {
            tracing::info!(portfolio_id = %id, "Portfolio deleted");
            let media = split_list(&form.media);
            super::remove_media(&api, &media).await?;
            notification::notify_success(&session, ack.message_or("Portfolio deleted")).await;
        }
        Err(e) => super::report(&session, e).await?,
    }
    Ok(Redirect::to(StoryKind::Portfolio.base_path()))
}

// =============================================================================
// Testimonials
// =============================================================================

#[instrument(skip(operator, state, session))]
pub async fn testimonial_index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
) -> Result<Response, AppError> {
    list(StoryKind::Testimonial, &state, &session, &operator, viewport).await
}

#[instrument(skip(operator, state, session))]
pub async fn new_testimonial(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
) -> Response {
    show_form(StoryKind::Testimonial, &state, &session, &operator, viewport, StoryFormInput::blank()).await
}

#[instrument(skip(operator, state, session))]
pub async fn edit_testimonial(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Path(id): Path<TestimonialId>,
) -> Result<Response, AppError> {
    let story = state.api_for(&operator).testimonial(&id).await?;
    let values = StoryFormInput::from(&story);
    Ok(show_form(StoryKind::Testimonial, &state, &session, &operator, viewport, values).await)
}

#[instrument(skip(operator, state, session, values))]
pub async fn save_testimonial(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
    Form(values): Form<StoryFormInput>,
) -> Result<Response, AppError> {
    save(StoryKind::Testimonial, &state, &session, &operator, viewport, values).await
}
