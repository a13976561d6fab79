//! Banner route handlers.

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

use atelier_core::BannerId;

use crate::{
    api::{Banner, BannerInput, CatalogApi, Category, HOME_BANNER},
    error::AppError,
    filters,
    media::{ImageResolver, Viewport},
    middleware::RequireConsoleAuth,
    notification::{self, Notification},
    state::AppState,
    views::{FieldErrors, Layout, non_blank, render},
};

/// Build the banners router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/banners", get(index).post(create))
        .route("/banners/new", get(new_banner))
        .route("/banners/{id}/delete", post(delete))
}

/// Banner row for the list.
#[derive(Debug, Clone)]
pub struct BannerView {
    pub id: String,
    pub image: String,
    pub image_url: String,
    pub placement: String,
}

/// A placement choice in the banner form.
#[derive(Debug, Clone)]
pub struct PlacementOption {
    pub value: String,
    pub label: String,
}

/// Where a banner shows, by name.
fn placement_name(banner: &Banner, categories: &[Category]) -> String {
    match banner.category_id.as_deref() {
        None | Some(HOME_BANNER) => "Home".to_string(),
        Some(id) => find_category(categories, id)
            .map_or_else(|| format!("Unknown category ({id})"), |c| c.name.clone()),
    }
}

fn find_category<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
    categories.iter().find_map(|c| {
        if c.id.as_str() == id {
            Some(c)
        } else {
            find_category(&c.sub_categories, id)
        }
    })
}

/// Home, then every category and sub-category.
fn placement_options(categories: &[Category]) -> Vec<PlacementOption> {
    fn walk(categories: &[Category], depth: usize, out: &mut Vec<PlacementOption>) {
        for c in categories {
            out.push(PlacementOption {
                value: c.id.to_string(),
                label: format!("{}{}", "- ".repeat(depth), c.name),
            });
            walk(&c.sub_categories, depth + 1, out);
        }
    }

    let mut out = vec![PlacementOption {
        value: HOME_BANNER.to_string(),
        label: "Home".to_string(),
    }];
    walk(categories, 0, &mut out);
    out
}

fn banner_views(
    banners: &[Banner],
    categories: &[Category],
    media: &ImageResolver,
    compact: bool,
) -> Vec<BannerView> {
    banners
        .iter()
        .map(|b| BannerView {
            id: b.id.to_string(),
            image: b.image.clone(),
            image_url: media.resolve(Some(&b.image), compact),
            placement: placement_name(b, categories),
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "banners/index.html")]
struct BannerListTemplate {
    layout: Layout,
    banners: Vec<BannerView>,
}

#[derive(Template)]
#[template(path = "banners/form.html")]
struct BannerFormTemplate {
    layout: Layout,
    values: BannerFormInput,
    errors: FieldErrors,
    placements: Vec<PlacementOption>,
}

/// Banner form values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannerFormInput {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub placement: String,
}

impl BannerFormInput {
    /// # Errors
    ///
    /// Returns the per-field messages when the image is missing.
    pub fn validate(&self) -> Result<BannerInput, FieldErrors> {
        let Some(image) = non_blank(&self.image) else {
            let mut errors = FieldErrors::default();
            errors.add("image", "Banner image is required");
            return Err(errors);
        };
        Ok(BannerInput {
            image,
            category_id: Some(non_blank(&self.placement).unwrap_or_else(|| HOME_BANNER.to_string())),
        })
    }
}

/// Banner list.
#[instrument(skip(operator, state, session))]
pub async fn index(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    viewport: Viewport,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);
    let (banners, categories) = tokio::try_join!(api.banners(), api.categories())?;

    let template = BannerListTemplate {
        layout: Layout::new(&session, &operator, "/banners").await,
        banners: banner_views(&banners, &categories, state.media(), viewport.compact),
    };
    Ok(template.into_response())
}

/// New banner form.
#[instrument(skip(operator, state, session))]
pub async fn new_banner(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let categories = state.api_for(&operator).categories().await?;
    let template = BannerFormTemplate {
        layout: Layout::new(&session, &operator, "/banners").await,
        values: BannerFormInput {
            placement: HOME_BANNER.to_string(),
            ..BannerFormInput::default()
        },
        errors: FieldErrors::default(),
        placements: placement_options(&categories),
    };
    Ok(render(&template).into_response())
}

/// Create a banner.
#[instrument(skip(operator, state, session, values))]
pub async fn create(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Form(values): Form<BannerFormInput>,
) -> Result<Response, AppError> {
    let api = state.api_for(&operator);

    let (errors, message) = match values.validate() {
        Ok(input) => match api.create_banner(&input).await {
            Ok(ack) => {
                tracing::info!(placement = ?input.category_id, "Banner created");
                notification::notify_success(&session, ack.message_or("Banner added")).await;
                return Ok(Redirect::to("/banners").into_response());
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create banner");
                let errors = e.field_errors().map(FieldErrors::from).unwrap_or_default();
                (errors, e.user_message())
            }
        },
        Err(errors) => (errors, "Please check the form for errors".to_string()),
    };

    let categories = api.categories().await?;
    let template = BannerFormTemplate {
        layout: Layout::new(&session, &operator, "/banners")
            .await
            .with_notification(Notification::error(message)),
        values,
        errors,
        placements: placement_options(&categories),
    };
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
}

/// Hidden fields posted with the delete button.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteBannerForm {
    #[serde(default)]
    pub image: String,
}

/// Delete a banner and its image.
#[instrument(skip(operator, state, session, form))]
pub async fn delete(
    RequireConsoleAuth(operator): RequireConsoleAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BannerId>,
    Form(form): Form<DeleteBannerForm>,
) -> Result<Redirect, AppError> {
    let api = state.api_for(&operator);
    match api.delete_banner(&id).await {
        Ok(ack) => {
            tracing::info!(banner_id = %id, "Banner deleted");
            let images: Vec<String> = non_blank(&form.image).into_iter().collect();
            super::remove_media(&api, &images).await?;
            notification::notify_success(&session, ack.message_or("Banner deleted")).await;
        }
        Err(e) => super::report(&session, e).await?,
    }
    Ok(Redirect::to("/banners"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        serde_json::from_value(serde_json::json!([
            {
                "_id": "c1",
                "name": "Lighting",
                "subCategories": [{ "_id": "c2", "name": "Lamps" }]
            }
        ]))
        .unwrap()
    }

    fn banner(category: Option<&str>) -> Banner {
        Banner {
            id: BannerId::new("b1"),
            image: "banners/hero.png".to_string(),
            category_id: category.map(str::to_string),
        }
    }

    #[test]
    fn test_placement_names() {
        let categories = categories();
        assert_eq!(placement_name(&banner(None), &categories), "Home");
        assert_eq!(placement_name(&banner(Some("home")), &categories), "Home");
        assert_eq!(placement_name(&banner(Some("c2")), &categories), "Lamps");
        assert_eq!(
            placement_name(&banner(Some("gone")), &categories),
            "Unknown category (gone)"
        );
    }

    #[test]
    fn test_placement_options_start_with_home() {
        let options = placement_options(&categories());
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["home", "c1", "c2"]);
        assert_eq!(options[2].label, "- Lamps");
    }

    #[test]
    fn test_banner_image_required() {
        let errors = BannerFormInput::default().validate().unwrap_err();
        assert_eq!(errors.get("image"), Some("Banner image is required"));

        let input = BannerFormInput {
            image: " banners/a.png ".to_string(),
            placement: String::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(input.image, "banners/a.png");
        assert_eq!(input.category_id.as_deref(), Some("home"));
    }
}
