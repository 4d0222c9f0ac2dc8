use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    Extension, Form, Json,
};

use crate::action::registry::ActionDescriptor;
use crate::action::ActionState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schema::{FormData, UploadedFile};
use crate::server::AppState;
use crate::session::SessionCredentials;

/// Request body as `FormData`: multipart (with files) or urlencoded
pub struct SubmittedForm(pub FormData);

#[async_trait]
impl<S> FromRequest<S> for SubmittedForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return read_multipart(multipart).await.map(SubmittedForm);
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| match e.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(e.body_text()),
                _ => ApiError::bad_request(e.body_text()),
            })?;
        Ok(SubmittedForm(pairs.into_iter().collect()))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormData, ApiError> {
    let mut form = FormData::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.append_file(name, UploadedFile::new(Some(filename), content_type, bytes.to_vec()));
            }
            None => {
                let text = field.text().await.map_err(multipart_error)?;
                form.append_text(name, text);
            }
        }
    }

    Ok(form)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(e.body_text()),
        _ => ApiError::bad_request(e.body_text()),
    }
}

/// GET /actions
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ActionDescriptor>> {
    Ok(ApiResponse::success(state.actions.describe()))
}

/// POST /actions/:name
///
/// Pipeline outcomes (validation, sign-in, capability) come back as an
/// `ActionState` with 200. Only handler failures turn into 500.
pub async fn invoke(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(credentials): Extension<SessionCredentials>,
    SubmittedForm(form): SubmittedForm,
) -> Result<Json<ActionState>, ApiError> {
    let action = state
        .actions
        .get(&name)
        .ok_or_else(|| ApiError::not_found(format!("Unknown action: {}", name)))?;

    match action
        .invoke(&state.context, &credentials, &ActionState::default(), form)
        .await
    {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!("Action '{}' failed: {:#}", name, e);
            Err(ApiError::internal_server_error("The action could not be completed"))
        }
    }
}
