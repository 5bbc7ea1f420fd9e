use std::io::Cursor;
use serde::Serialize;
use tiny_http::{Request, Response};

use crate::routes::{engine_error, error_response, ok};
use crate::state::SharedState;
use crate::util::form::{form_get, parse_inputs};

#[derive(Serialize)]
struct CostBody {
    cost: f64,
}

#[derive(Serialize)]
struct ClassifyBody {
    inputs: Vec<f64>,
    class: usize,
}

#[derive(Serialize)]
struct LayerBody {
    inputs: Vec<f64>,
    outputs: Vec<f64>,
}

/// `GET /cost` — mean cost over the training dataset.
pub fn handle_cost(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    match state.session.mean_cost() {
        Ok(cost) => ok(&CostBody { cost }),
        Err(e) => engine_error(&e),
    }
}

/// `GET /points` — every dataset point with its predicted class, plus the
/// mean cost. This is the data a scatter plot of the classifier needs.
pub fn handle_points(state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    match state.session.report() {
        Ok(report) => ok(&report),
        Err(e) => engine_error(&e),
    }
}

/// `POST /classify` — form body `inputs=1.5,20`.
pub fn handle_classify(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        return error_response(400, "request body is not valid UTF-8");
    }
    let inputs = match form_get(&body, "inputs").map(|raw| parse_inputs(&raw)) {
        Some(Ok(inputs)) => inputs,
        Some(Err(msg)) => return error_response(400, &msg),
        None => return error_response(400, "missing field: inputs"),
    };
    match state.session.classify(inputs.clone()) {
        Ok(class) => ok(&ClassifyBody { inputs, class }),
        Err(e) => engine_error(&e),
    }
}

/// `GET /layers/0?inputs=1.5,20` — raw outputs of the first layer alone.
pub fn handle_first_layer(query: &str, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let inputs = match form_get(query, "inputs").map(|raw| parse_inputs(&raw)) {
        Some(Ok(inputs)) => inputs,
        Some(Err(msg)) => return error_response(400, &msg),
        None => return error_response(400, "missing query parameter: inputs"),
    };
    match state.session.layer_outputs(0, inputs.clone()) {
        Ok(outputs) => ok(&LayerBody { inputs, outputs }),
        Err(e) => engine_error(&e),
    }
}
