use super::{
    FetchAcceptedResponse, FileMetadataResponse, FileQuery, HealthResponse, ListFilesResponse,
    ListedFile, NodeItem, NodesResponse, PutFileQuery, ServerState, SyncResponse, response_error,
    status_string,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use packstore_core::{FileKind, StoreError, WriteRequest, normalize_store_path, split_parent};
use std::sync::Arc;

pub(crate) async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        node_id: state.node.node_id().to_string(),
        address: state.node.address().to_string(),
    })
}

pub(crate) async fn nodes(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let nodes = match state.membership.get_nodes().await {
        Ok(nodes) => nodes,
        Err(error) => return response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    let payload = NodesResponse {
        nodes: nodes
            .into_iter()
            .map(|node| NodeItem {
                node_id: node.node_id,
                address: node.address,
                status: status_string(&node.status).to_string(),
            })
            .collect(),
    };

    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn get_file(
    State(state): State<Arc<ServerState>>,
    Path(raw_path): Path<String>,
    Query(query): Query<FileQuery>,
) -> Response {
    let path = match normalize_store_path(&raw_path) {
        Ok(path) => path,
        Err(error) => return response_error(StatusCode::BAD_REQUEST, error.to_string()),
    };

    if query.sync.unwrap_or(false) {
        return match state.sync.sync_to_all_nodes(&path).await {
            Ok(report) => (
                StatusCode::OK,
                Json(SyncResponse {
                    path,
                    dispatched: report.dispatched,
                    unreachable: report.unreachable,
                }),
            )
                .into_response(),
            Err(StoreError::NotFound(_)) => {
                response_error(StatusCode::NOT_FOUND, "file not found")
            }
            Err(error) => response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        };
    }

    if let Some(source) = query.get_from {
        // The download continues on the fetch pool after this response is
        // sent; the handle is dropped, not awaited.
        return match state.sync.fetch(&path, &source) {
            Ok(_handle) => (
                StatusCode::OK,
                Json(FetchAcceptedResponse {
                    path,
                    source,
                    accepted: true,
                }),
            )
                .into_response(),
            Err(error) => response_error(StatusCode::BAD_REQUEST, error.to_string()),
        };
    }

    let kind = match state.file_store.resolve_type(&path).await {
        Ok(kind) => kind,
        Err(error) => return response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    match kind {
        FileKind::Missing => response_error(StatusCode::NOT_FOUND, "file not found"),
        FileKind::Directory => list_directory(&state, &path).await,
        FileKind::File => {
            if query.meta.unwrap_or(false) {
                file_metadata(&state, &path).await
            } else {
                stream_file(&state, &path).await
            }
        }
    }
}

pub(crate) async fn put_file(
    State(state): State<Arc<ServerState>>,
    Path(raw_path): Path<String>,
    Query(query): Query<PutFileQuery>,
    body: Bytes,
) -> Response {
    let path = match normalize_store_path(&raw_path) {
        Ok(path) => path,
        Err(error) => return response_error(StatusCode::BAD_REQUEST, error.to_string()),
    };

    let signatures: Vec<String> = query
        .sig
        .map(|raw| {
            raw.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let request = WriteRequest {
        body,
        signatures,
        ..Default::default()
    };

    match state.file_store.write(&path, request).await {
        Ok(metadata) => (
            StatusCode::CREATED,
            Json(FileMetadataResponse {
                name: split_parent(&path).1.to_string(),
                metadata,
            }),
        )
            .into_response(),
        Err(StoreError::InvalidPath(message)) => {
            response_error(StatusCode::BAD_REQUEST, message)
        }
        Err(error) => response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

pub(crate) async fn delete_file(
    State(state): State<Arc<ServerState>>,
    Path(raw_path): Path<String>,
) -> Response {
    let path = match normalize_store_path(&raw_path) {
        Ok(path) => path,
        Err(error) => return response_error(StatusCode::BAD_REQUEST, error.to_string()),
    };

    match state.file_store.delete_local(&path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(StoreError::NotFound(_)) => response_error(StatusCode::NOT_FOUND, "file not found"),
        Err(error) => response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

async fn list_directory(state: &ServerState, path: &str) -> Response {
    let details = match state.file_store.list(path, None).await {
        Ok(details) => details,
        Err(error) => return response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    let files = details
        .into_iter()
        .map(|entry| ListedFile {
            name: entry.name,
            directory: entry.directory.then_some(true),
            metadata: entry.metadata,
        })
        .collect();

    (
        StatusCode::OK,
        Json(ListFilesResponse {
            path: path.to_string(),
            files,
        }),
    )
        .into_response()
}

async fn file_metadata(state: &ServerState, path: &str) -> Response {
    let metadata = match state.file_store.metadata_of(path).await {
        Ok(Some(metadata)) => metadata,
        Ok(None) => return response_error(StatusCode::NOT_FOUND, "file not found"),
        Err(error) => return response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    (
        StatusCode::OK,
        Json(FileMetadataResponse {
            name: split_parent(path).1.to_string(),
            metadata,
        }),
    )
        .into_response()
}

async fn stream_file(state: &ServerState, path: &str) -> Response {
    let (_, body) = match state.file_store.read(path).await {
        Ok(found) => found,
        Err(StoreError::NotFound(_)) => {
            return response_error(StatusCode::NOT_FOUND, "file not found");
        }
        Err(error) => return response_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    };

    let length = body.len();
    let mut response = Response::new(body.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        response.headers_mut().insert(header::CONTENT_LENGTH, value);
    }

    response
}
