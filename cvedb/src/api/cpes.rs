use actix_web::{http::header::ContentType, web, HttpResponse};

use super::{
    error::{handle_blocking_error, ApplicationError},
    first_value, ApplicationContext, QueryPairs,
};

/// `GET /cpe?vendor=..&product=..`: space separated ids of the matching CVEs.
pub async fn search(
    ctx: web::Data<ApplicationContext>,
    query: web::Query<QueryPairs>,
) -> Result<HttpResponse, ApplicationError> {
    let vendor = first_value(&query, "vendor");
    let product = first_value(&query, "product");

    if vendor.is_none() && product.is_none() {
        return Err(ApplicationError::NotFound);
    }

    let cves = web::block(move || {
        ctx.get_repository()
            .query_cpe(vendor.as_deref(), product.as_deref())
            .map_err(|e| ctx.internal_server_error(e))
    })
    .await
    .map_err(handle_blocking_error)??;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(cves))
}
