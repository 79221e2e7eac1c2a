//! Endpoints other instances dispatch to.

use axum::{
    extract::{Path, RawQuery, State},
    Json,
};
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

/// Acknowledgement of an element call.
#[derive(Debug, Serialize)]
pub struct AtomResponse {
    pub symbol: String,
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

/// Acknowledgement of an orbit hop.
#[derive(Debug, Serialize)]
pub struct OrbitResponse {
    pub orbit: String,
    pub molecule: String,
    pub max_orbit: u32,
    pub received_at: DateTime<Utc>,
}

/// Percent-decoded value of `key` in a query string.
///
/// Molecules use `+` as an operator, so form decoding (which turns `+` into
/// a space) is not applied; `%XX` escapes are.
fn raw_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| percent_decode_str(v).decode_utf8_lossy().into_owned())
}

/// `GET {base}/atom/:symbol?symbol=<payload>`
pub async fn atom(
    Path(symbol): Path<String>,
    RawQuery(query): RawQuery,
) -> Json<AtomResponse> {
    let payload = raw_param(query.as_deref(), "symbol").unwrap_or_else(|| symbol.clone());
    info!(%symbol, %payload, "atom called");

    Json(AtomResponse {
        symbol,
        payload,
        received_at: Utc::now(),
    })
}

/// `GET {base}/orbit/:orbit?molecule=<expr>`
pub async fn orbit(
    State(state): State<AppState>,
    Path(orbit): Path<String>,
    RawQuery(query): RawQuery,
) -> Json<OrbitResponse> {
    let molecule = raw_param(query.as_deref(), "molecule").unwrap_or_default();
    info!(%orbit, %molecule, "orbit called");

    Json(OrbitResponse {
        orbit,
        molecule,
        max_orbit: state.config.max_orbit,
        received_at: Utc::now(),
    })
}
