use axum::routing::{get, post};
use axum::Router;
use http::header::{ACCEPT, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod client;
mod error;
pub mod public_key;
pub mod send_to_peer;
pub mod upload;

pub use error::HandlerError;

use common::transfer::{PUBLIC_KEY_PATH, UPLOAD_PATH, UPLOAD_PLAIN_PATH};

use crate::ServiceState;

/// Local endpoint a node's own client uses to push a file to a peer
pub const SEND_TO_PEER_PATH: &str = "/send-to-peer";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    // anyone may fetch our key; it is public by definition
    let key_cors = CorsLayer::new()
        .allow_methods(vec![Method::GET])
        .allow_headers(vec![ACCEPT, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    let key_routes = Router::new()
        .route(PUBLIC_KEY_PATH, get(public_key::handler))
        .layer(key_cors);

    Router::new()
        .merge(key_routes)
        .route(UPLOAD_PATH, post(upload::encrypted_handler))
        .route(UPLOAD_PLAIN_PATH, post(upload::plain_handler))
        .route(SEND_TO_PEER_PATH, post(send_to_peer::handler))
        .with_state(state)
}
