use crate::auth::auth::AuthUser;
use crate::model::office::OfficeConfig;
use crate::store::AttendanceStore;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde_json::json;
use tracing::{error, info};

/// Current office geofence
#[utoipa::path(
    get,
    path = "/api/settings/office",
    responses(
        (status = 200, description = "Office location, radius and geofence flag", body = OfficeConfig),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn get_office(
    _auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
) -> actix_web::Result<impl Responder> {
    let config = store.load_office_config().await.map_err(|e| {
        error!(error = %e, "Failed to load office config");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(config))
}

/// Replace the office geofence (admin)
#[utoipa::path(
    put,
    path = "/api/settings/office",
    request_body = OfficeConfig,
    responses(
        (status = 200, description = "Saved office config", body = OfficeConfig),
        (status = 400, description = "Invalid coordinates or radius", body = Object, example = json!({
            "message": "radius must be greater than zero"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn update_office(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    payload: web::Json<OfficeConfig>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let config = payload.into_inner();
    if let Err(message) = config.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    store.save_office_config(&config).await.map_err(|e| {
        error!(error = %e, "Failed to save office config");
        ErrorInternalServerError("Internal Server Error")
    })?;

    info!(
        updated_by = %auth.user_id,
        center = %config.center,
        radius = config.radius_meters,
        enabled = config.enabled,
        "Office config updated"
    );

    Ok(HttpResponse::Ok().json(config))
}
