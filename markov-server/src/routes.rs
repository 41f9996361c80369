use std::sync::Mutex;

use actix_web::{HttpResponse, Responder, get, put, web};
use rand::Rng;
use serde::Deserialize;

use markov_core::{MarkovError, Model, Node, TextState};

/// Model shared between workers, always accessed through a `Mutex`.
pub struct SharedData {
	model: Model<TextState>,
	separator: String,
	max_len: usize,
}

impl SharedData {
	pub fn new(separator: String, max_len: usize) -> Self {
		Self { model: Model::new(), separator, max_len }
	}
}

/// Query parameters for the `/v1/observe` endpoint
#[derive(Deserialize)]
struct ObserveParams {
	states: Option<String>,
	restart: Option<bool>,
}

/// Query parameters for the `/v1/cursor` endpoint (no state means the sentinel)
#[derive(Deserialize)]
struct CursorParams {
	state: Option<String>,
}

/// Query parameters for the `/v1/walk` endpoint
#[derive(Deserialize)]
struct WalkParams {
	p: Option<f64>,
	advance: Option<bool>,
}

#[derive(Deserialize)]
struct GenerateParams {
	max_len: Option<usize>,
}

#[derive(Deserialize)]
struct WeightParams {
	from: Option<String>,
	to: Option<String>,
}

/// Registers every endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(put_observe)
		.service(put_restart)
		.service(put_cursor)
		.service(get_walk)
		.service(get_generated)
		.service(get_size)
		.service(get_weight);
}

fn node_of(state: Option<&str>) -> Node<TextState> {
	match state {
		Some(s) => Node::State(TextState::from(s)),
		None => Node::Start,
	}
}

fn error_response(e: &MarkovError) -> HttpResponse {
	match e {
		MarkovError::OutOfRange { .. } => HttpResponse::BadRequest().body(e.to_string()),
		MarkovError::EmptyRow => HttpResponse::Conflict().body(e.to_string()),
		MarkovError::UnknownStartState { .. } => HttpResponse::NotFound().body(e.to_string()),
		_ => {
			tracing::error!(error = %e, "model failure");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

/// HTTP PUT endpoint `/v1/observe`
///
/// Feeds the comma-separated `states` to the model, in order, and returns
/// the new model size. With `restart=true` the sequence starts from the
/// sentinel instead of the current cursor.
#[put("/v1/observe")]
async fn put_observe(data: web::Data<Mutex<SharedData>>, query: web::Query<ObserveParams>) -> impl Responder {
	let states: Vec<&str> = match &query.states {
		Some(s) => s.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect(),
		None => Vec::new(),
	};
	if states.is_empty() {
		return HttpResponse::BadRequest().body("Missing or empty states");
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	if query.restart.unwrap_or(false) {
		shared_data.model.restart();
	}
	for state in &states {
		shared_data.model.add_state(TextState::from(*state));
	}
	tracing::debug!(observed = states.len(), "observed states");

	HttpResponse::Ok().body(shared_data.model.size().to_string())
}

#[put("/v1/restart")]
async fn put_restart(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model.restart();
	HttpResponse::Ok().body("Cursor reset")
}

#[put("/v1/cursor")]
async fn put_cursor(data: web::Data<Mutex<SharedData>>, query: web::Query<CursorParams>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match shared_data.model.set_current_state(node_of(query.state.as_deref())) {
		Ok(()) => HttpResponse::Ok().body(shared_data.model.current_state().to_string()),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/walk`
///
/// Samples the state following the cursor. Without `p` the sampling value
/// is drawn at random. With `advance=true` the cursor moves to the result.
#[get("/v1/walk")]
async fn get_walk(data: web::Data<Mutex<SharedData>>, query: web::Query<WalkParams>) -> impl Responder {
	let p = query.p.unwrap_or_else(|| rand::rng().random());

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let result = if query.advance.unwrap_or(false) {
		shared_data.model.advance(p)
	} else {
		shared_data.model.walk(p)
	};
	match result {
		Ok(state) => HttpResponse::Ok().body(state.as_str().to_owned()),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Walks a sequence from the sentinel and joins it with the configured
/// separator. The cursor is left where it was. `max_len` defaults to, and
/// may not exceed, the configured maximum.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let max_len = match query.max_len {
		Some(n) if n > shared_data.max_len => {
			return HttpResponse::BadRequest().body(format!("max_len must not exceed {}", shared_data.max_len));
		}
		Some(n) => n,
		None => shared_data.max_len,
	};

	match shared_data.model.generate(max_len, &mut rand::rng()) {
		Ok(sequence) => {
			let words: Vec<&str> = sequence.iter().map(TextState::as_str).collect();
			HttpResponse::Ok().body(words.join(shared_data.separator.as_str()))
		}
		Err(e) => error_response(&e),
	}
}

#[get("/v1/size")]
async fn get_size(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model.size().to_string())
}

#[get("/v1/weight")]
async fn get_weight(data: web::Data<Mutex<SharedData>>, query: web::Query<WeightParams>) -> impl Responder {
	let to = match &query.to {
		Some(s) if !s.trim().is_empty() => TextState::from(s.trim()),
		_ => return HttpResponse::BadRequest().body("Missing or empty destination"),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let weight = shared_data.model.state_weight(&node_of(query.from.as_deref()), &to);
	HttpResponse::Ok().body(weight.to_string())
}
