use axum::{
	Json, Router,
	extract::{
		DefaultBodyLimit, Multipart, Path, State,
		multipart::{MultipartError, MultipartRejection},
		rejection::{JsonRejection, PathRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::state::AppState;
use folio_service::{
	AskRequest, AskResponse, Error as ServiceError, HealthResponse, ResetResponse, StatusResponse,
	SummaryRequest, SummaryResponse, UploadRequest, UploadResponse,
};

const UPLOAD_FIELD: &str = "file";
// Headers and boundaries around the file part.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1_024;

pub fn router(state: AppState) -> Router {
	let body_limit = usize::try_from(state.service.cfg.ingest.max_upload_bytes)
		.unwrap_or(usize::MAX)
		.saturating_add(MULTIPART_OVERHEAD_BYTES);
	let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

	Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/upload-pdf", post(upload_pdf))
		.route("/processing-status/{document_id}", get(processing_status))
		.route("/ask-question", post(ask_question))
		.route("/generate-summary", post(generate_summary))
		.route("/reset/{document_id}", delete(reset))
		.layer(DefaultBodyLimit::max(body_limit))
		.layer(cors)
		.with_state(state)
}

#[derive(Debug, Serialize)]
struct RootResponse {
	message: &'static str,
}

async fn root() -> Json<RootResponse> {
	Json(RootResponse { message: "Backend is running!" })
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
	let response = state.service.health().await?;

	Ok(Json(response))
}

async fn upload_pdf(
	State(state): State<AppState>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
	let mut multipart = multipart.map_err(|err| {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	})?;
	let request = read_upload(&mut multipart).await?;
	let response = state.service.upload(request).await?;

	Ok(Json(response))
}

async fn processing_status(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
	let Path(document_id) = path.map_err(invalid_document_id)?;
	let response = state.service.status(document_id).await?;

	Ok(Json(response))
}

async fn ask_question(
	State(state): State<AppState>,
	payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
	let Json(payload) = payload.map_err(invalid_json)?;
	let response = state.service.ask(payload).await?;

	Ok(Json(response))
}

async fn generate_summary(
	State(state): State<AppState>,
	payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
	let Json(payload) = payload.map_err(invalid_json)?;
	let response = state.service.summarize(payload).await?;

	Ok(Json(response))
}

async fn reset(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ResetResponse>, ApiError> {
	let Path(document_id) = path.map_err(invalid_document_id)?;
	let response = state.service.reset(document_id).await?;

	Ok(Json(response))
}

/// Reads the first `file` part; other parts are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<UploadRequest, ApiError> {
	while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
		if field.name() != Some(UPLOAD_FIELD) {
			continue;
		}

		let file_name = field.file_name().unwrap_or_default().to_string();
		let content_type = field.content_type().map(str::to_string);
		let bytes = field.bytes().await.map_err(multipart_error)?;

		return Ok(UploadRequest { file_name, content_type, bytes: bytes.to_vec() });
	}

	Err(json_error(
		StatusCode::BAD_REQUEST,
		"INVALID_REQUEST",
		"Multipart field `file` is required.",
		Some(vec![UPLOAD_FIELD.to_string()]),
	))
}

fn multipart_error(err: MultipartError) -> ApiError {
	let status = err.status();
	let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
		"PAYLOAD_TOO_LARGE"
	} else {
		"INVALID_REQUEST"
	};

	json_error(status, code, err.body_text(), None)
}

fn invalid_json(err: JsonRejection) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
}

fn invalid_document_id(err: PathRejection) -> ApiError {
	json_error(
		StatusCode::BAD_REQUEST,
		"INVALID_REQUEST",
		err.body_text(),
		Some(vec!["document_id".to_string()]),
	)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::NotReady { message } =>
				json_error(StatusCode::CONFLICT, "NOT_READY", message, None),
			ServiceError::LeaseLost { message } =>
				json_error(StatusCode::CONFLICT, "LEASE_LOST", message, None),
			ServiceError::PayloadTooLarge { message } =>
				json_error(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", message, None),
			ServiceError::Provider { message } => {
				tracing::warn!(error = %message, "Provider call failed.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage operation failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Storage operation failed.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
