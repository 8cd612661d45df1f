//! Domain handlers, one module per route family.
//!
//! Every handler follows the same shape: validate the request on the
//! network side, run the editor work on the privileged thread through
//! [`AppState::run`](crate::state::AppState::run), and wrap the result
//! in the success envelope.

use std::collections::BTreeMap;

use axum::extract::Query;

pub mod asset;
pub mod blueprint;
pub mod material;
pub mod mesh;
pub mod optimize;
pub mod pcg;
pub mod scene;
pub mod sequencer;
pub mod stream;
pub mod system;
pub mod viewport;

/// Query parameters of a `GET` request.
pub type Params = Query<BTreeMap<String, String>>;
