//! Request DTOs and route handlers. Each handler validates its input,
//! acquires a client from the registry, performs exactly one store
//! operation via `mongo::*`, and wraps the outcome in the response
//! envelope. No driver error escapes past this layer.

use axum::extract::{FromRequest, Request, State};
use axum::Json;
use chrono::Utc;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::response::ApiResponse;
use crate::app::state::AppState;
use crate::error::ApiError;
use crate::mongo::registry::ConnectionInfo;
use crate::mongo::{admin, aggregation, crud, query};
use crate::utils::export::{self, ExportFormat};
use crate::utils::json::{document_to_json, inserted_id_to_json, json_to_document};
use crate::utils::oid::coerce_object_ids;

/// JSON extractor whose rejection comes back as the validation envelope
/// instead of axum's default body.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

// ---------------------------------------------------------------------------
// Request payloads

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub connection_string: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRequest {
    pub connection_string: String,
    pub database: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub projection: Option<Value>,
    #[serde(default)]
    pub sort: Option<Value>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDocumentRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub document: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub update: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub pipeline: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocumentsRequest {
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub sort: Option<Value>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Response payloads

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPayload {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectPayload {
    pub disconnected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsPayload {
    pub connections: Vec<ConnectionInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabasesPayload {
    pub databases: Vec<admin::DatabaseSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionsPayload {
    pub collections: Vec<admin::CollectionSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsPage {
    pub documents: Vec<Value>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedPayload {
    pub inserted_id: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedPayload {
    pub modified_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountPayload {
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationPayload {
    pub results: Vec<Value>,
    pub execution_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CreatedPayload {
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedPayload {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub format: &'static str,
    pub content_type: &'static str,
    pub content: String,
}

// ---------------------------------------------------------------------------
// Handlers

type HandlerResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn health() -> Json<ApiResponse<HealthPayload>> {
    Json(ApiResponse::ok(HealthPayload {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    }))
}

pub async fn test_connection(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ConnectionRequest>,
) -> HandlerResult<TestConnectionOutcome> {
    let outcome = match state.registry.acquire(&req.connection_string).await {
        Ok(client) => match client.list_database_names(None, None).await {
            Ok(names) => TestConnectionOutcome {
                ok: true,
                database_names: Some(names),
                error: None,
            },
            Err(err) => TestConnectionOutcome {
                ok: false,
                database_names: None,
                error: Some(err.to_string()),
            },
        },
        Err(ApiError::Connection(message)) => TestConnectionOutcome {
            ok: false,
            database_names: None,
            error: Some(message),
        },
        Err(other) => return Err(other),
    };
    Ok(Json(ApiResponse::ok(outcome)))
}

pub async fn disconnect(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ConnectionRequest>,
) -> HandlerResult<DisconnectPayload> {
    let disconnected = state.registry.release(&req.connection_string).await;
    Ok(Json(ApiResponse::ok(DisconnectPayload { disconnected })))
}

pub async fn list_connections(
    State(state): State<AppState>,
) -> Json<ApiResponse<ConnectionsPayload>> {
    let connections = state.registry.connections().await;
    Json(ApiResponse::ok(ConnectionsPayload { connections }))
}

pub async fn list_databases(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ConnectionRequest>,
) -> HandlerResult<DatabasesPayload> {
    let client = state.registry.acquire(&req.connection_string).await?;
    let databases = admin::list_databases(&client).await?;
    Ok(Json(ApiResponse::ok(DatabasesPayload { databases })))
}

pub async fn create_database(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DatabaseRequest>,
) -> HandlerResult<CreatedPayload> {
    require("database", &req.database)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    admin::create_database(&client, &req.database).await?;
    Ok(Json(ApiResponse::ok(CreatedPayload { created: true })))
}

pub async fn drop_database(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DatabaseRequest>,
) -> HandlerResult<DeletedPayload> {
    require("database", &req.database)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    admin::drop_database(&client, &req.database).await?;
    Ok(Json(ApiResponse::ok(DeletedPayload { deleted: true })))
}

pub async fn database_stats(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DatabaseRequest>,
) -> HandlerResult<Value> {
    require("database", &req.database)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    let stats = admin::database_stats(&client, &req.database).await?;
    Ok(Json(ApiResponse::ok(document_to_json(&stats))))
}

pub async fn list_collections(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DatabaseRequest>,
) -> HandlerResult<CollectionsPayload> {
    require("database", &req.database)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    let collections = admin::list_collections(&client, &req.database).await?;
    Ok(Json(ApiResponse::ok(CollectionsPayload { collections })))
}

pub async fn create_collection(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CollectionRequest>,
) -> HandlerResult<CreatedPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    admin::create_collection(&client, &req.database, &req.collection).await?;
    Ok(Json(ApiResponse::ok(CreatedPayload { created: true })))
}

pub async fn drop_collection(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CollectionRequest>,
) -> HandlerResult<DeletedPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    admin::drop_collection(&client, &req.database, &req.collection).await?;
    Ok(Json(ApiResponse::ok(DeletedPayload { deleted: true })))
}

pub async fn collection_stats(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CollectionRequest>,
) -> HandlerResult<Value> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let client = state.registry.acquire(&req.connection_string).await?;
    let stats = admin::collection_stats(&client, &req.database, &req.collection).await?;
    Ok(Json(ApiResponse::ok(document_to_json(&stats))))
}

pub async fn list_documents(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ListDocumentsRequest>,
) -> HandlerResult<DocumentsPage> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let filter = parse_filter(req.filter.as_ref())?;
    let projection = parse_optional_doc(req.projection.as_ref())?;
    let sort = parse_optional_doc(req.sort.as_ref())?;
    let limit = parse_limit(req.limit)?;
    let skip = req.skip.unwrap_or(0);

    let client = state.registry.acquire(&req.connection_string).await?;
    let page = query::find_page(
        &client,
        &req.database,
        &req.collection,
        filter,
        projection,
        sort,
        limit,
        skip,
    )
    .await?;

    Ok(Json(ApiResponse::ok(DocumentsPage {
        documents: page.documents.iter().map(document_to_json).collect(),
        total: page.total,
    })))
}

pub async fn insert_document(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<InsertDocumentRequest>,
) -> HandlerResult<InsertedPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let document = req
        .document
        .as_ref()
        .ok_or_else(|| ApiError::Validation("document is required".to_string()))?;
    let document = json_to_document(document)?;

    let client = state.registry.acquire(&req.connection_string).await?;
    let inserted_id = crud::insert_one(&client, &req.database, &req.collection, document).await?;

    Ok(Json(ApiResponse::ok(InsertedPayload {
        inserted_id: inserted_id_to_json(inserted_id),
    })))
}

pub async fn update_document(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateDocumentRequest>,
) -> HandlerResult<UpdatedPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let filter = req
        .filter
        .as_ref()
        .ok_or_else(|| ApiError::Validation("filter is required".to_string()))?;
    let update = req
        .update
        .as_ref()
        .ok_or_else(|| ApiError::Validation("update is required".to_string()))?;
    let filter = coerce_object_ids(json_to_document(filter)?);
    let update = coerce_object_ids(json_to_document(update)?);

    let client = state.registry.acquire(&req.connection_string).await?;
    let modified_count =
        crud::update_one(&client, &req.database, &req.collection, filter, update).await?;

    Ok(Json(ApiResponse::ok(UpdatedPayload { modified_count })))
}

pub async fn delete_document(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeleteDocumentRequest>,
) -> HandlerResult<DeletedCountPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let filter = req
        .filter
        .as_ref()
        .ok_or_else(|| ApiError::Validation("filter is required".to_string()))?;
    let filter = coerce_object_ids(json_to_document(filter)?);

    let client = state.registry.acquire(&req.connection_string).await?;
    let deleted_count = crud::delete_one(&client, &req.database, &req.collection, filter).await?;

    Ok(Json(ApiResponse::ok(DeletedCountPayload { deleted_count })))
}

pub async fn run_aggregation(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AggregationRequest>,
) -> HandlerResult<AggregationPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let stages = req
        .pipeline
        .as_ref()
        .ok_or_else(|| ApiError::Validation("pipeline is required".to_string()))?;
    let pipeline: Vec<Document> = stages
        .iter()
        .map(json_to_document)
        .collect::<Result<_, _>>()?;

    let client = state.registry.acquire(&req.connection_string).await?;
    let outcome =
        aggregation::run_pipeline(&client, &req.database, &req.collection, pipeline).await?;

    Ok(Json(ApiResponse::ok(AggregationPayload {
        results: outcome.results.iter().map(document_to_json).collect(),
        execution_time_ms: outcome.execution_time_ms,
    })))
}

pub async fn export_documents(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ExportDocumentsRequest>,
) -> HandlerResult<ExportPayload> {
    require("database", &req.database)?;
    require("collection", &req.collection)?;
    let format: ExportFormat = req.format.as_deref().unwrap_or("json").parse()?;
    let filter = parse_filter(req.filter.as_ref())?;
    let sort = parse_optional_doc(req.sort.as_ref())?;
    let limit = parse_limit(req.limit)?;
    let skip = req.skip.unwrap_or(0);

    let client = state.registry.acquire(&req.connection_string).await?;
    let page = query::find_page(
        &client,
        &req.database,
        &req.collection,
        filter,
        None,
        sort,
        limit,
        skip,
    )
    .await?;

    let documents: Vec<Value> = page.documents.iter().map(document_to_json).collect();
    let content = export::render(&documents, format)?;

    Ok(Json(ApiResponse::ok(ExportPayload {
        format: format.as_str(),
        content_type: format.content_type(),
        content,
    })))
}

// ---------------------------------------------------------------------------
// Validation helpers

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Missing filter means match-all; a present filter must be an object and
/// gets ObjectId coercion before dispatch.
fn parse_filter(filter: Option<&Value>) -> Result<Document, ApiError> {
    match filter {
        Some(value) => Ok(coerce_object_ids(json_to_document(value)?)),
        None => Ok(Document::new()),
    }
}

fn parse_optional_doc(value: Option<&Value>) -> Result<Option<Document>, ApiError> {
    value.map(json_to_document).transpose()
}

fn parse_limit(limit: Option<i64>) -> Result<i64, ApiError> {
    let limit = limit.unwrap_or(query::DEFAULT_PAGE_LIMIT);
    if limit <= 0 {
        return Err(ApiError::Validation("limit must be positive".to_string()));
    }
    Ok(limit)
}
