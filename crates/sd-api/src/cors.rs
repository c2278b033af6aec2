// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::Method;
use tower_http::cors::{self, AllowOrigin, CorsLayer};

/// Builds the CORS layer from the configured allowed origins. `["*"]`
/// (the default) allows any origin; anything else is taken as an
/// explicit allow-list.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(allow_origin(allowed_origins))
}

fn allow_origin(allowed_origins: &[String]) -> AllowOrigin {
    if allowed_origins.iter().any(|o| o == "*") {
        cors::Any.into()
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    }
}
