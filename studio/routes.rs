use std::io::Cursor;
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::debug;

use crate::state::SharedState;
use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn json_header() -> Header {
    Header::from_bytes(b"Content-Type", b"application/json").expect("static header is valid")
}

pub fn json_response<T: Serialize>(status: u16, value: &T) -> Response<Cursor<Vec<u8>>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let len = bytes.len();
            Response::new(StatusCode(status), vec![json_header()], Cursor::new(bytes), Some(len), None)
        }
        Err(e) => error_response(500, &e.to_string()),
    }
}

pub fn ok<T: Serialize>(value: &T) -> Response<Cursor<Vec<u8>>> {
    json_response(200, value)
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let bytes = serde_json::to_vec(&ErrorBody { error: message })
        .unwrap_or_else(|_| b"{\"error\":\"internal\"}".to_vec());
    let len = bytes.len();
    Response::new(StatusCode(status), vec![json_header()], Cursor::new(bytes), Some(len), None)
}

/// Maps an engine error to a response: caller mistakes are 400, a dead
/// session is 503, anything else 500.
pub fn engine_error(err: &fdnet::Error) -> Response<Cursor<Vec<u8>>> {
    let status = match err {
        fdnet::Error::WidthMismatch { .. }
        | fdnet::Error::ShapeMismatch(_)
        | fdnet::Error::InvalidLabel { .. }
        | fdnet::Error::InvalidTopology(_) => 400,
        fdnet::Error::SessionClosed => 503,
        _ => 500,
    };
    error_response(status, &err.to_string())
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    error_response(404, "not found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches one request to its handler and sends the response.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p.to_owned(), q.to_owned()),
        None => (url.clone(), String::new()),
    };
    debug!(?method, %path, "request");

    let response = match (method, path.as_str()) {
        // ── Inference ────────────────────────────────────────────────────
        (Method::Get,  "/cost")         => handlers::inference::handle_cost(&state),
        (Method::Get,  "/points")       => handlers::inference::handle_points(&state),
        (Method::Get,  "/layers/0")     => handlers::inference::handle_first_layer(&query, &state),
        (Method::Post, "/classify")     => handlers::inference::handle_classify(&mut request, &state),

        // ── Training ─────────────────────────────────────────────────────
        (Method::Get,  "/status")       => handlers::train::handle_status(&state),
        (Method::Post, "/train/step")   => handlers::train::handle_step(&state),
        (Method::Post, "/train/start")  => handlers::train::handle_start(&state),
        (Method::Post, "/train/stop")   => handlers::train::handle_stop(&state),

        // ── 404 ──────────────────────────────────────────────────────────
        _ => not_found(),
    };

    let _ = request.respond(response);
}
