//! Admin account route handlers (super admin only).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use atelier_core::{AdminId, AdminRole, Email};

use crate::{
    api::{Admin, AdminFilter, AdminInput, AdminPage},
    error::AppError,
    filters,
    guard::{ADMIN_ACCOUNTS, guard},
    middleware::RequireConsoleAuth,
    models::ConsoleSession,
    notification::{self, Notification},
    state::AppState,
    views::{FieldErrors, Layout, checkbox, non_blank, render},
};

use super::account::check_new_password;

/// Build the admin accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admins", get(index).post(create))
        .route("/admins/new", get(new_admin))
        .route("/admins/{id}", post(update))
        .route("/admins/{id}/edit", get(edit))
        .route("/admins/{id}/delete", post(delete))
}

fn require_admin_accounts(operator: &ConsoleSession) -> Result<(), AppError> {
    guard(Some(operator), ADMIN_ACCOUNTS, || ()).or_access_denied()
}

// =============================================================================
// List
// =============================================================================

/// `GET /admins` filters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub search: String,
    /// `"true"`, `"false"` or blank for either.
    #[serde(default)]
    pub active: String,
}

impl AdminListQuery {
    #[must_use]
    pub fn filter(&self) -> AdminFilter {
        AdminFilter::default()
            .with_role(self.role.parse().ok())
            .with_search(non_blank(&self.search))
            .with_active(match self.active.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            })
            .with_page(self.page.unwrap_or(1))
    }

    /// Link to `page` keeping the other filters.
    #[must_use]
    pub fn href(&self, page: u32) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in [
            ("role", self.role.trim()),
            ("search", self.search.trim()),
            ("active", self.active.trim()),
        ] {
            if !value.is_empty() {
                query.append_pair(key, value);
            }
        }
        query.append_pair("page", &page.to_string());
        format!("/admins?{}", query.finish())
    }
}

#[derive(Debug, Clone)]
pub struct AdminRow {
    pub id: String,
    pub email: String,
    pub role: &'static str,
    pub is_active: bool,
    pub created: String,
    pub is_self: bool,
}

impl AdminRow {
    fn new(admin: &Admin, operator: &ConsoleSession) -> Self {
        Self {
            id: admin.id.to_string(),
            email: admin.email.clone(),
            role: admin.role.label(),
            is_active: admin.is_active,
            created: admin
                .created_at
                .map(|t| t.format("%d %b %Y").to_string())
                .unwrap_or_default(),
            is_self: admin.email.eq_ignore_ascii_case(&operator.email),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn role_options(selected: Option<AdminRole>) -> Vec<RoleOption> {
    AdminRole::ALL
        .iter()
        .map(|&r| RoleOption {
            value: r.as_str(),
            label: r.label(),
            selected: selected == Some(r),
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "admins/index.html")]
struct AdminListTemplate {
    layout: Layout,
    admins: Vec<AdminRow>,
    roles: Vec<RoleOption>,
    query: AdminListQuery,
    page: u32,
    pages: Option<u32>,
    prev_href: Option<String>,
    next_href: Option<String>,
}

/// Previous/next links for a page of admins.
///
/// Without pagination from the backend, a full page implies there may be
/// another one.
fn page_links(
    query: &AdminListQuery,
    filter: &AdminFilter,
    page: &AdminPage,
) -> (Option<String>, Option<String>) {
    let current = filter.page;
    let has_next = page.pagination.map_or_else(
        || u32::try_from(page.admins.len()).unwrap_or(u32::MAX) >= filter.limit,
        |p| current < p.pages,
    );
    let prev = (current > 1).then(|| query.href(current - 1));
    let next = has_next.then(|| query.href(current + 1));
    (prev, next)
}

/// Admin account list.
#[instrument(skip(operator, state, session))]
pub async fn index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AdminListQuery>,
) -> Result<Response, AppError> {
    require_admin_accounts(&operator)?;

    let filter = query.filter();
    let page = state.api_for(&operator).admins(&filter).await?;
    let (prev_href, next_href) = page_links(&query, &filter, &page);

    let template = AdminListTemplate {
        layout: Layout::new(&session, &operator, "/admins").await,
        admins: page.admins.iter().map(|a| AdminRow::new(a, &operator)).collect(),
        roles: role_options(filter.role),
        page: filter.page,
        pages: page.pagination.map(|p| p.pages),
        prev_href,
        next_href,
        query,
    };
    Ok(template.into_response())
}

// =============================================================================
// Form
// =============================================================================

/// Admin create/edit form values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminFormInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    pub is_active: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl From<&Admin> for AdminFormInput {
    fn from(admin: &Admin) -> Self {
        Self {
            email: admin.email.clone(),
            role: admin.role.as_str().to_string(),
            is_active: admin.is_active.then(|| "on".to_string()),
            ..Self::default()
        }
    }
}

impl AdminFormInput {
    fn blank() -> Self {
        Self {
            role: AdminRole::Admin.as_str().to_string(),
            is_active: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// Validate into a save payload.
    ///
    /// A password is required on create. On update it is optional, but
    /// when given it follows the same rules.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self, creating: bool) -> Result<AdminInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        let role = self
            .role
            .parse::<AdminRole>()
            .map_err(|_| errors.add("role", "Please choose a role"))
            .ok();

        let password = if creating || !self.password.is_empty() {
            if let Err(message) = check_new_password(&self.password, &self.confirm_password) {
                errors.add("password", message);
            }
            Some(self.password.clone())
        } else {
            None
        };

        match (email, role) {
            (Some(email), Some(role)) if errors.is_empty() => Ok(AdminInput {
                email: email.into_inner(),
                role,
                is_active: checkbox(self.is_active.as_deref()),
                password,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Template)]
#[template(path = "admins/form.html")]
struct AdminFormTemplate {
    layout: Layout,
    values: AdminFormInput,
    errors: FieldErrors,
    roles: Vec<RoleOption>,
    admin_id: Option<String>,
}

impl AdminFormTemplate {
    fn new(
        layout: Layout,
        values: AdminFormInput,
        errors: FieldErrors,
        admin_id: Option<&AdminId>,
    ) -> Self {
        let roles = role_options(values.role.parse().ok());
        Self {
            layout,
            values,
            errors,
            roles,
            admin_id: admin_id.map(ToString::to_string),
        }
    }

    fn action(&self) -> String {
        self.admin_id
            .as_ref()
            .map_or_else(|| "/admins".to_string(), |id| format!("/admins/{id}"))
    }
}

/// New admin form.
#[instrument(skip(operator, session))]
pub async fn new_admin(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    session: Session,
) -> Result<Response, AppError> {
    require_admin_accounts(&operator)?;

    let layout = Layout::new(&session, &operator, "/admins").await;
    let template = AdminFormTemplate::new(
        layout,
        AdminFormInput::blank(),
        FieldErrors::default(),
        None,
    );
    Ok(render(&template).into_response())
}

/// Edit admin form.
#[instrument(skip(operator, state, session))]
pub async fn edit(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdminId>,
) -> Result<Response, AppError> {
    require_admin_accounts(&operator)?;

    let admin = state.api_for(&operator).admin(&id).await?;
    let layout = Layout::new(&session, &operator, "/admins").await;
    let template = AdminFormTemplate::new(
        layout,
        AdminFormInput::from(&admin),
        FieldErrors::default(),
        Some(&id),
    );
    Ok(render(&template).into_response())
}

async fn save(
    state: &AppState,
    session: &Session,
    operator: &ConsoleSession,
    id: Option<AdminId>,
    values: AdminFormInput,
) -> Result<Response, AppError> {
    let api = state.api_for(operator);

    let (errors, message) = match values.validate(id.is_none()) {
        Ok(input) => {
            let result = match &id {
                Some(id) => api.update_admin(id, &input).await,
                None => api.create_admin(&input).await,
            };
            match result {
                Ok(ack) => {
                    tracing::info!(admin_id = ?id, role = %input.role, "Admin account saved");
                    notification::notify_success(session, ack.message_or("Admin saved")).await;
                    return Ok(Redirect::to("/admins").into_response());
                }
                Err(e) if e.is_unauthorized() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save admin account");
                    let errors = e.field_errors().map(FieldErrors::from).unwrap_or_default();
                    (errors, e.user_message())
                }
            }
        }
        Err(errors) => (errors, "Please check the form for errors".to_string()),
    };

    let layout = Layout::new(session, operator, "/admins")
        .await
        .with_notification(Notification::error(message));
    let template = AdminFormTemplate::new(
        layout,
        AdminFormInput {
            password: String::new(),
            confirm_password: String::new(),
            ..values
        },
        errors,
        id.as_ref(),
    );
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
}

/// Create an admin account.
#[instrument(skip(operator, state, session, values))]
pub async fn create(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Form(values): Form<AdminFormInput>,
) -> Result<Response, AppError> {
    require_admin_accounts(&operator)?;
    save(&state, &session, &operator, None, values).await
}

/// Update an admin account.
#[instrument(skip(operator, state, session, values))]
pub async fn update(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdminId>,
    Form(values): Form<AdminFormInput>,
) -> Result<Response, AppError> {
    require_admin_accounts(&operator)?;
    save(&state, &session, &operator, Some(id), values).await
}

/// Delete an admin account.
#[instrument(skip(operator, state, session))]
pub async fn delete(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<AdminId>,
) -> Result<Redirect, AppError> {
    require_admin_accounts(&operator)?;

    match state.api_for(&operator).delete_admin(&id).await {
        Ok(ack) => {
            tracing::info!(admin_id = %id, "Admin account deleted");
            notification::notify_success(&session, ack.message_or("Admin deleted")).await;
        }
        Err(e) => super::report(&session, e).await?,
    }
    Ok(Redirect::to("/admins"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Pagination;

    fn form(email: &str, password: &str, confirm: &str) -> AdminFormInput {
        AdminFormInput {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            ..AdminFormInput::blank()
        }
    }

    #[test]
    fn test_create_requires_matching_password() {
        let errors = form("ops@atelier.test", "short", "short")
            .validate(true)
            .unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );

        let errors = form("ops@atelier.test", "long-enough", "different")
            .validate(true)
            .unwrap_err();
        assert_eq!(errors.get("password"), Some("Passwords do not match"));

        let input = form("ops@atelier.test", "long-enough", "long-enough")
            .validate(true)
            .unwrap();
        assert_eq!(input.role, AdminRole::Admin);
        assert_eq!(input.password.as_deref(), Some("long-enough"));
        assert!(input.is_active);
    }

    #[test]
    fn test_update_keeps_password_when_blank() {
        let input = form("ops@atelier.test", "", "").validate(false).unwrap();
        assert_eq!(input.password, None);

        let errors = form("not an email", "", "").validate(false).unwrap_err();
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_list_query_filter() {
        let query = AdminListQuery {
            page: Some(3),
            role: "PRODUCT".to_string(),
            search: "  ops ".to_string(),
            active: "false".to_string(),
        };
        let filter = query.filter();
        assert_eq!(filter.page, 3);
        assert_eq!(filter.role, Some(AdminRole::Product));
        assert_eq!(filter.search.as_deref(), Some("ops"));
        assert_eq!(filter.is_active, Some(false));
        assert_eq!(
            query.href(4),
            "/admins?role=PRODUCT&search=ops&active=false&page=4"
        );
    }

    #[test]
    fn test_page_links_with_and_without_pagination() {
        let query = AdminListQuery::default();
        let filter = AdminFilter::default().with_page(2);

        let paged = AdminPage {
            admins: Vec::new(),
            pagination: Some(Pagination {
                page: 2,
                limit: 10,
                total: 20,
                pages: 2,
            }),
        };
        assert_eq!(
            page_links(&query, &filter, &paged),
            (Some("/admins?page=1".to_string()), None)
        );

        let plain = AdminPage {
            admins: Vec::new(),
            pagination: None,
        };
        assert_eq!(
            page_links(&query, &AdminFilter::default(), &plain),
            (None, None)
        );
    }
}
