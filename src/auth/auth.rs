use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};
use std::str::FromStr;

/// Identity of the caller, as vouched for by the identity provider's token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    /// Decodes a raw `Authorization` header value.
    pub fn from_header(header: &str, secret: &str) -> Result<Self, &'static str> {
        let token = header
            .strip_prefix("Bearer ")
            .ok_or("Authorization header must start with Bearer")?;

        let claims = verify_token(token, secret).map_err(|_| "Invalid or expired token")?;
        let role = Role::from_str(&claims.role).map_err(|_| "Invalid role")?;

        Ok(AuthUser {
            user_id: claims.sub,
            role,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already resolved by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let header = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
        {
            Some(h) => h,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        ready(AuthUser::from_header(header, &config.jwt_secret).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// The user may act on their own data; admins on anyone's.
    pub fn require_self_or_admin(&self, user_id: &str) -> actix_web::Result<()> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Insufficient permissions"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;

    #[test]
    fn decodes_bearer_header() {
        let header = format!("Bearer {}", issue_token("u-9", "employee", "k"));
        let user = AuthUser::from_header(&header, "k").unwrap();

        assert_eq!(user.user_id, "u-9");
        assert_eq!(user.role, Role::Employee);
    }

    #[test]
    fn ignores_extra_provider_claims() {
        use jsonwebtoken::{EncodingKey, Header, encode};

        let claims = serde_json::json!({
            "sub": "u-4",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "role": "admin",
            "exp": chrono::Utc::now().timestamp() + 3600,
        });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap();
        let user = AuthUser::from_header(&format!("Bearer {}", token), "k").unwrap();

        assert_eq!(user.user_id, "u-4");
        assert!(user.is_admin());
    }

    #[test]
    fn rejects_missing_scheme_and_unknown_role() {
        let token = issue_token("u-9", "employee", "k");
        assert!(AuthUser::from_header(&token, "k").is_err());

        let header = format!("Bearer {}", issue_token("u-9", "superuser", "k"));
        assert_eq!(AuthUser::from_header(&header, "k").unwrap_err(), "Invalid role");
    }

    #[test]
    fn self_or_admin_guard() {
        let employee = AuthUser {
            user_id: "u-1".into(),
            role: Role::Employee,
        };
        assert!(employee.require_self_or_admin("u-1").is_ok());
        assert!(employee.require_self_or_admin("u-2").is_err());
        assert!(employee.require_admin().is_err());

        let admin = AuthUser {
            role: Role::Admin,
            ..employee
        };
        assert!(admin.require_self_or_admin("u-2").is_ok());
    }
}
