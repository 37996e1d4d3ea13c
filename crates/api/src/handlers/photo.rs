//! Handlers for `/photos`: multipart upload and metadata management.
//!
//! Bytes go to the configured [`ImageStore`](ortho_media::ImageStore); the
//! `photos` table keeps the key, URLs and descriptive fields.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ortho_core::error::CoreError;
use ortho_core::photo::{
    storage_key, validate_content_type, validate_size, PhotoType, MAX_CAPTION_LENGTH,
};
use ortho_core::types::{DbId, Timestamp};
use ortho_db::models::photo::{CreatePhoto, Photo, UpdatePhoto};
use ortho_db::repositories::{PatientRepo, PhotoRepo, TreatmentPlanRepo};
use ortho_media::inspect_image;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::ensure_patient;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::middleware::validation::ValidatedJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /patients/{id}/photos`.
#[derive(Debug, Deserialize)]
pub struct PhotoListParams {
    pub photo_type: Option<String>,
}

/// Request body for `PUT /photos/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePhotoRequest {
    pub photo_type: Option<String>,
    #[validate(length(max = 500, message = "caption must be at most 500 characters"))]
    pub caption: Option<String>,
    pub taken_at: Option<Timestamp>,
    pub treatment_plan_id: Option<DbId>,
}

/// Fields collected from the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    declared_type: Option<String>,
    patient_id: Option<DbId>,
    photo_type: Option<String>,
    treatment_plan_id: Option<DbId>,
    taken_at: Option<Timestamp>,
    caption: Option<String>,
}

fn bad_field(name: &str, detail: impl std::fmt::Display) -> AppError {
    AppError::Core(CoreError::Validation(format!("Invalid '{name}' field: {detail}")))
}

async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            form.declared_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.file = Some(bytes.to_vec());
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match name.as_str() {
            "patient_id" => {
                form.patient_id = Some(text.parse().map_err(|e| bad_field(&name, e))?)
            }
            "treatment_plan_id" => {
                form.treatment_plan_id = Some(text.parse().map_err(|e| bad_field(&name, e))?)
            }
            "photo_type" => form.photo_type = Some(text.to_string()),
            "taken_at" => {
                let parsed = chrono::DateTime::parse_from_rfc3339(text)
                    .map_err(|e| bad_field(&name, e))?;
                form.taken_at = Some(parsed.with_timezone(&chrono::Utc));
            }
            "caption" => form.caption = Some(text.to_string()),
            other => tracing::debug!(field = other, "Ignoring unknown upload field"),
        }
    }

    Ok(form)
}

fn required<T>(value: Option<T>, name: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Core(CoreError::Validation(format!("'{name}' is required"))))
}

fn validate_caption(caption: Option<&str>) -> AppResult<()> {
    match caption {
        Some(c) if c.chars().count() > MAX_CAPTION_LENGTH => Err(AppError::Core(
            CoreError::Validation(format!(
                "Caption must be at most {MAX_CAPTION_LENGTH} characters"
            )),
        )),
        _ => Ok(()),
    }
}

/// Reject a plan that does not exist or belongs to another patient.
async fn check_plan_owner(state: &AppState, plan_id: DbId, patient_id: DbId) -> AppResult<()> {
    match TreatmentPlanRepo::find_by_id(&state.pool, plan_id).await? {
        Some(plan) if plan.patient_id == patient_id => Ok(()),
        Some(_) => Err(AppError::Core(CoreError::Validation(format!(
            "Treatment plan {plan_id} belongs to a different patient"
        )))),
        None => Err(AppError::InvalidReference {
            entity: "Treatment plan",
            id: plan_id,
        }),
    }
}

fn photo_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Photo", id })
}

/// POST /api/photos (multipart)
///
/// Fields: `file` (required), `patient_id`, `photo_type`, optional
/// `treatment_plan_id`, `taken_at` (RFC 3339) and `caption`. The image
/// format is detected from the bytes; the declared content type only has to
/// be an accepted image type when present.
pub async fn upload(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Photo>)> {
    let form = read_form(multipart).await?;

    let bytes = required(form.file, "file")?;
    let patient_id = required(form.patient_id, "patient_id")?;
    let photo_type = PhotoType::parse(&required(form.photo_type, "photo_type")?)?;
    validate_caption(form.caption.as_deref())?;
    validate_size(bytes.len(), state.config.media.max_upload_bytes)?;
    if let Some(declared) = form.declared_type.as_deref() {
        if declared != "application/octet-stream" {
            validate_content_type(declared)?;
        }
    }
    let info = inspect_image(&bytes)?;

    if PatientRepo::find_by_id(&state.pool, patient_id).await?.is_none() {
        return Err(AppError::InvalidReference {
            entity: "Patient",
            id: patient_id,
        });
    }
    if let Some(plan_id) = form.treatment_plan_id {
        check_plan_owner(&state, plan_id, patient_id).await?;
    }

    let key = storage_key(patient_id, photo_type, Uuid::new_v4(), info.content_type);
    let size_bytes = bytes.len() as i64;
    let stored = state
        .image_store
        .upload(&key, bytes, info.content_type)
        .await?;

    let dto = CreatePhoto {
        patient_id,
        treatment_plan_id: form.treatment_plan_id,
        photo_type: photo_type.as_str().to_string(),
        storage_key: stored.key.clone(),
        url: stored.url,
        thumbnail_url: stored.thumbnail_url,
        content_type: info.content_type.to_string(),
        size_bytes,
        width: i32::try_from(info.width).ok(),
        height: i32::try_from(info.height).ok(),
        caption: form.caption,
        taken_at: form.taken_at,
        uploaded_by: Some(user.user_id),
    };

    let photo = match PhotoRepo::create(&state.pool, &dto).await {
        Ok(photo) => photo,
        Err(e) => {
            if let Err(cleanup) = state.image_store.delete(&stored.key).await {
                tracing::warn!(key = %stored.key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        photo_id = photo.id,
        patient_id,
        bytes = size_bytes,
        backend = state.image_store.name(),
        user_id = user.user_id,
        "Photo uploaded"
    );
    Ok((StatusCode::CREATED, Json(photo)))
}

/// GET /api/photos/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<Json<Photo>> {
    let photo = PhotoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| photo_not_found(id))?;
    Ok(Json(photo))
}

/// GET /api/patients/{id}/photos?photo_type=
pub async fn list_for_patient(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(patient_id): Path<DbId>,
    Query(params): Query<PhotoListParams>,
) -> AppResult<Json<DataResponse<Vec<Photo>>>> {
    ensure_patient(&state, patient_id).await?;
    let photo_type = params
        .photo_type
        .as_deref()
        .map(PhotoType::parse)
        .transpose()?;
    let data =
        PhotoRepo::list_by_patient(&state.pool, patient_id, photo_type.map(PhotoType::as_str))
            .await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/photos/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdatePhotoRequest>,
) -> AppResult<Json<Photo>> {
    let current = PhotoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| photo_not_found(id))?;

    let photo_type = input
        .photo_type
        .as_deref()
        .map(PhotoType::parse)
        .transpose()?;
    if let Some(plan_id) = input.treatment_plan_id {
        check_plan_owner(&state, plan_id, current.patient_id).await?;
    }

    let dto = UpdatePhoto {
        treatment_plan_id: input.treatment_plan_id,
        photo_type: photo_type.map(|t| t.as_str().to_string()),
        caption: input.caption,
        taken_at: input.taken_at,
    };
    let photo = PhotoRepo::update(&state.pool, id, &dto)
        .await?
        .ok_or_else(|| photo_not_found(id))?;

    tracing::info!(photo_id = id, user_id = user.user_id, "Photo updated");
    Ok(Json(photo))
}

/// DELETE /api/photos/{id}
///
/// Removes the stored object first, then the row. A storage failure is
/// logged and the row is deleted anyway so the chart never points at a
/// photo staff asked to remove.
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let photo = PhotoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| photo_not_found(id))?;

    if let Err(e) = state.image_store.delete(&photo.storage_key).await {
        tracing::error!(
            photo_id = id,
            key = %photo.storage_key,
            error = %e,
            "Failed to delete stored image; removing metadata anyway"
        );
    }

    if !PhotoRepo::delete(&state.pool, id).await? {
        return Err(photo_not_found(id));
    }

    tracing::info!(photo_id = id, user_id = user.user_id, "Photo deleted");
    Ok(StatusCode::NO_CONTENT)
}
