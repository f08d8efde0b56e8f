use axum::{http::Request, middleware::Next, response::Response, extract::State, body::Body};
use axum::http::Method;
use std::sync::Arc;
use tracing::{warn, error};
use crate::model::user::UserRole;
use crate::repository::user_repo::UserRepository;
use crate::util::error::{HandlerError, HandlerErrorKind};
use crate::util::jwt::{JwtTokenUtilsImpl, JwtTokenUtils};
use bson::oid::ObjectId;

/// How much proof a route demands before the handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Public,
    Authenticated,
    Admin,
}

/// One row of the route policy table: method, path pattern, required level.
/// Pattern segments wrapped in braces match any single path segment.
struct RoutePolicy {
    method: Method,
    pattern: &'static str,
    level: AccessLevel,
}

/// Every protected route in one place. Rows are checked top to bottom, so
/// literal paths sit above their `{param}` siblings.
fn policy_table() -> Vec<RoutePolicy> {
    use AccessLevel::*;
    vec![
        RoutePolicy { method: Method::POST, pattern: "/products", level: Admin },
        RoutePolicy { method: Method::PUT, pattern: "/products/{id}", level: Admin },
        RoutePolicy { method: Method::DELETE, pattern: "/products/{id}", level: Admin },
        RoutePolicy { method: Method::POST, pattern: "/orders", level: Authenticated },
        RoutePolicy { method: Method::GET, pattern: "/orders/myorders", level: Authenticated },
        RoutePolicy { method: Method::GET, pattern: "/orders/{id}", level: Authenticated },
        RoutePolicy { method: Method::GET, pattern: "/orders", level: Admin },
        RoutePolicy { method: Method::GET, pattern: "/users", level: Admin },
        RoutePolicy { method: Method::GET, pattern: "/users/{id}", level: Admin },
        RoutePolicy { method: Method::DELETE, pattern: "/users/{id}", level: Admin },
        RoutePolicy { method: Method::PUT, pattern: "/users/{id}/role", level: Admin },
    ]
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if pattern_segments.len() != path_segments.len() {
        return false;
    }
    pattern_segments.iter().zip(path_segments.iter()).all(|(pat, seg)| {
        pat.starts_with('{') || pat == seg
    })
}

/// Routes missing from the table need no token; the router itself turns
/// unknown paths into 404s.
pub fn required_access(method: &Method, path: &str) -> AccessLevel {
    policy_table()
        .iter()
        .find(|p| p.method == *method && pattern_matches(p.pattern, path))
        .map(|p| p.level)
        .unwrap_or(AccessLevel::Public)
}

/// Verified identity attached to the request once the gate lets it through
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

pub struct AccessGateState {
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub user_repo: Arc<dyn UserRepository>,
}

fn unauthorized(message: &str) -> HandlerError {
    HandlerError {
        error: HandlerErrorKind::Unauthorized,
        message: message.to_string(),
        details: None,
    }
}

/// Single checkpoint in front of the whole API. Looks up the route in the
/// policy table, and for protected routes verifies the bearer token, re-loads
/// the account it names, and stashes an [`AuthUser`] extension for handlers.
pub async fn access_gate(
    State(state): State<Arc<AccessGateState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    let level = required_access(req.method(), req.uri().path());
    if level == AccessLevel::Public {
        return Ok(next.run(req).await);
    }

    let auth_header = match req.headers().get("authorization").and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => {
            warn!("Rejected {} {}: no authorization header", req.method(), req.uri().path());
            return Err(unauthorized("Not authorized, no token"));
        }
    };

    let token = match state.jwt_utils.extract_token_from_header(auth_header) {
        Ok(t) => t,
        Err(_) => return Err(unauthorized("Not authorized, no token")),
    };
    let claims = match state.jwt_utils.validate_token(&token) {
        Ok(c) => c,
        Err(e) => {
            warn!("Rejected token: {}", e);
            return Err(unauthorized("Not authorized, token failed"));
        }
    };

    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| unauthorized("Not authorized, token failed"))?;

    // The token only proves who signed in; the account itself may have been
    // deleted or demoted since, so the store is the authority.
    let user = match state.user_repo.find_by_id(&user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("Token names user {} but no such account exists", user_id);
            return Err(unauthorized("Not authorized, token failed"));
        }
        Err(e) => {
            warn!("Token names user {} but lookup failed: {}", user_id, e);
            return Err(unauthorized("Not authorized, token failed"));
        }
    };

    if !user.is_verified {
        warn!("Rejected unverified account {}", user_id);
        return Err(unauthorized("Account not verified"));
    }

    if level == AccessLevel::Admin && !user.role.is_admin() {
        error!("User {} lacks admin role for {} {}", user_id, req.method(), req.uri().path());
        return Err(HandlerError {
            error: HandlerErrorKind::Forbidden,
            message: "Not authorized as admin".to_string(),
            details: None,
        });
    }

    req.extensions_mut().insert(AuthUser {
        id: user_id,
        username: user.username,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(req).await)
}
