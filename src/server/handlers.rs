use super::types::{ChatReply, ChatRequest, ErrorResponse};
use crate::{
    Error,
    relay::{ChatRelay, caller_identity},
};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State, rejection::BytesRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
    pub max_body_bytes: usize,
}

pub async fn chat(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatReply>, (StatusCode, Json<ErrorResponse>)> {
    let identity = caller_identity(&headers, peer.map(|ConnectInfo(addr)| addr));
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, %identity);

    async move {
        let body = body.map_err(|rejection| reject(body_error(rejection, state.max_body_bytes)))?;
        info!("Received chat request ({} bytes)", body.len());

        // Fields are read one at a time; a malformed sibling never hides the message.
        let request = ChatRequest::from_body(&body);
        match state.relay.handle(&identity, &request).await {
            Ok(reply) => Ok(Json(reply)),
            Err(e) => Err(reject(e)),
        }
    }
    .instrument(span)
    .await
}

/// Fallback for every method other than POST on the chat routes.
pub async fn method_not_allowed(method: Method) -> Response {
    let (status, body) = reject(Error::MethodNotAllowed {
        method: method.to_string(),
    });

    (
        status,
        [(header::ALLOW, HeaderValue::from_static("POST"))],
        body,
    )
        .into_response()
}

fn body_error(rejection: BytesRejection, limit: usize) -> Error {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit }
    } else {
        Error::InvalidBody(rejection.body_text())
    }
}

fn reject(e: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = e.status_code();
    if status.is_server_error() {
        error!("Failed to process chat request: {}", e);
    } else {
        warn!("Rejected chat request: {}", e);
    }

    (status, Json(ErrorResponse::from(&e)))
}
