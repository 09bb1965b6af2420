/// Chirp Routes

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::database::{Database, SortDirection};
use crate::error::{AppError, AuthError, StoreError};
use crate::middleware::AuthenticatedUser;
use crate::validators::{clean_chirp_body, validate_chirp_body};

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(Serialize)]
pub struct CleanedChirpResponse {
    pub cleaned_body: String,
}

/// Query string of GET /api/chirps
///
/// Both keys are optional. An unparseable `author_id` lists every author and
/// any `sort` other than `desc` (in any case) sorts ascending.
#[derive(Deserialize)]
pub struct ChirpsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

impl ChirpsQuery {
    fn author_id(&self) -> Option<u64> {
        self.author_id.as_deref().and_then(|id| id.trim().parse().ok())
    }

    fn sort(&self) -> SortDirection {
        match self.sort.as_deref() {
            Some(sort) if sort.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// POST /api/validate_chirp
pub async fn validate_chirp(form: web::Json<ChirpRequest>) -> Result<HttpResponse, AppError> {
    validate_chirp_body(&form.body)?;

    Ok(HttpResponse::Ok().json(CleanedChirpResponse {
        cleaned_body: clean_chirp_body(&form.body),
    }))
}

/// GET /api/chirps?author_id=&sort=asc|desc
pub async fn get_chirps(
    query: web::Query<ChirpsQuery>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let (author_id, sort) = (query.author_id(), query.sort());

    let chirps = web::block(move || db.get_chirps(author_id, sort)).await??;

    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<u64>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = path.into_inner();

    let chirp = web::block(move || db.get_chirp_by_id(chirp_id))
        .await??
        .ok_or_else(|| StoreError::NotFound(format!("chirp {}", chirp_id)))?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// POST /api/chirps
///
/// Requires an access token; the caller becomes the author.
pub async fn create_chirp(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<ChirpRequest>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(author_id) = caller.into_inner();
    let ChirpRequest { body } = form.into_inner();
    validate_chirp_body(&body)?;

    let chirp = web::block(move || db.create_chirp(&body, author_id)).await??;

    tracing::info!(chirp_id = chirp.id, author_id = author_id, "Chirp created");
    Ok(HttpResponse::Created().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 403: the caller is not the author
/// - 404: no such chirp
pub async fn delete_chirp(
    caller: web::ReqData<AuthenticatedUser>,
    path: web::Path<u64>,
    db: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user_id) = caller.into_inner();
    let chirp_id = path.into_inner();

    let lookup = db.clone();
    let chirp = web::block(move || lookup.get_chirp_by_id(chirp_id))
        .await??
        .ok_or_else(|| StoreError::NotFound(format!("chirp {}", chirp_id)))?;

    if chirp.author_id != user_id {
        tracing::warn!(chirp_id = chirp_id, user_id = user_id, "Refusing to delete another user's chirp");
        return Err(AppError::Auth(AuthError::Forbidden));
    }

    web::block(move || db.delete_chirp(chirp_id)).await??;

    tracing::info!(chirp_id = chirp_id, user_id = user_id, "Chirp deleted");
    Ok(HttpResponse::NoContent().finish())
}
