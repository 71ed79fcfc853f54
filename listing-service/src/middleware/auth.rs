use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::Role, services::AccessTokenClaims, AppState};

/// Rejects requests without a valid bearer token and stores the token's
/// claims in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state.jwt.validate_access_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Authenticated caller, taken from the claims placed by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// 403 unless the caller holds one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                role = %self.role,
                "Role not permitted for operation"
            );
            Err(AppError::forbidden(format!(
                "Role '{}' is not permitted to perform this action",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 403 unless the caller owns the resource or is an admin.
    pub fn require_owner_or_admin(&self, owner_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::forbidden("Only the owner or an admin may modify this resource"))
        }
    }
}

impl From<AccessTokenClaims> for CurrentUser {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccessTokenClaims>()
            .cloned()
            .map(CurrentUser::from)
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Not authenticated")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: "u1".into(),
            email: "u1@example.com".into(),
            role,
        }
    }

    #[test]
    fn require_rejects_roles_outside_the_set() {
        let vendor = user(Role::Vendor);
        assert!(vendor.require(&[Role::Vendor, Role::Admin]).is_ok());

        let err = vendor.require(&[Role::Admin]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn owner_or_admin_check() {
        assert!(user(Role::Owner).require_owner_or_admin("u1").is_ok());
        assert!(user(Role::Owner).require_owner_or_admin("u2").is_err());
        assert!(user(Role::Admin).require_owner_or_admin("u2").is_ok());
    }
}
