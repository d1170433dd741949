use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::{
    services::{Actor, AuthorityProfile},
    types::UserId,
};

#[derive(Debug, Serialize)]
pub struct AuthorityResponse {
    pub user_id: UserId,
    pub name: String,
    pub role: &'static str,
    #[serde(flatten)]
    pub profile: AuthorityProfile,
}

impl From<&Actor> for AuthorityResponse {
    fn from(actor: &Actor) -> Self {
        Self {
            user_id: actor.id(),
            name: actor.user.name.clone(),
            role: actor.role_label(),
            profile: actor.profile.clone(),
        }
    }
}

pub async fn my_authority(Extension(actor): Extension<Actor>) -> Json<AuthorityResponse> {
    Json(AuthorityResponse::from(&actor))
}
