//! Identity extraction. Authentication itself is an external collaborator;
//! the engine only needs "who did this" for `loggedBy`/`performedBy`, carried
//! in the `X-Actor-Id` header by the fronting gateway.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};

use crate::error::AppError;

pub const ACTOR_HEADER: &str = "X-Actor-Id";

#[derive(Debug, Clone)]
pub struct Actor(pub String);

impl Actor {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req
            .headers()
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Actor(value.to_string()))
            .ok_or_else(|| AppError::MissingField(format!("{ACTOR_HEADER} header")));
        ready(actor)
    }
}
