use actix_web::{http::header::ContentType, web, HttpResponse};

use super::{
    error::{handle_blocking_error, ApplicationError},
    first_value, ApplicationContext, QueryPairs,
};

/// `GET /cve?id=..`: detail of a single CVE as pretty printed JSON.
pub async fn detail(
    ctx: web::Data<ApplicationContext>,
    query: web::Query<QueryPairs>,
) -> Result<HttpResponse, ApplicationError> {
    let Some(id) = first_value(&query, "id") else {
        return Err(ApplicationError::NotFound);
    };

    let body = web::block(move || {
        ctx.get_repository()
            .query_cve(&id)
            .and_then(|found| match found {
                Some(detail) => Ok(Some(detail.to_json()?)),
                None => {
                    log::debug!("{} not found", id);
                    Ok(None)
                }
            })
            .map_err(|e| ctx.internal_server_error(e))
    })
    .await
    .map_err(handle_blocking_error)??;

    match body {
        Some(body) => Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .body(body)),
        None => Err(ApplicationError::NotFound),
    }
}
