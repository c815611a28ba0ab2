use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use crate::entities::ListingKind;
use crate::error::AppResult;
use crate::middlewares::require_farmer;
use crate::models::*;
use crate::services::{DEFAULT_SEARCH_RADIUS, ListingService};
use crate::utils::SearchRadius;

async fn create(
    service: &ListingService,
    req: &HttpRequest,
    draft: ListingDraft,
) -> Result<HttpResponse> {
    let farmer = match require_farmer(req) {
        Ok(farmer) => farmer,
        Err(e) => return Ok(e.error_response()),
    };
    let kind = draft.kind();
    match service.create_listing(farmer.user_id, &farmer.name, draft).await {
        Ok(listing) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": listing,
            "message": format!("{kind} created successfully.")
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn list_own(
    service: &ListingService,
    req: &HttpRequest,
    kind: ListingKind,
) -> Result<HttpResponse> {
    let farmer = match require_farmer(req) {
        Ok(farmer) => farmer,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_own(farmer.user_id, kind).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn delete(
    service: &ListingService,
    req: &HttpRequest,
    kind: ListingKind,
    id: i64,
) -> Result<HttpResponse> {
    let farmer = match require_farmer(req) {
        Ok(farmer) => farmer,
        Err(e) => return Ok(e.error_response()),
    };
    match service.delete_listing(farmer.user_id, kind, id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("{kind} deleted successfully.")
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn search_nearby(
    service: &ListingService,
    kind: ListingKind,
    query: &NearbyQuery,
    exclude_owner: Option<i64>,
) -> AppResult<Vec<ListingResponse>> {
    let radius = match query.radius {
        Some(r) => SearchRadius::try_from(r)?,
        None => DEFAULT_SEARCH_RADIUS,
    };
    service
        .nearby(kind, query.latitude, query.longitude, radius, exclude_owner)
        .await
}

async fn nearby(
    service: &ListingService,
    kind: ListingKind,
    query: &NearbyQuery,
    exclude_owner: Option<i64>,
) -> Result<HttpResponse> {
    match search_nearby(service, kind, query, exclude_owner).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/jobs",
    tag = "listing",
    request_body = CreateJobRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "发布工作成功", body = JobResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse)
    )
)]
pub async fn create_job(
    service: web::Data<ListingService>,
    req: HttpRequest,
    request: web::Json<CreateJobRequest>,
) -> Result<HttpResponse> {
    create(&service, &req, ListingDraft::Job(request.into_inner())).await
}

#[utoipa::path(
    get,
    path = "/jobs",
    tag = "listing",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我发布的工作", body = [JobResponse]),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse)
    )
)]
pub async fn list_jobs(service: web::Data<ListingService>, req: HttpRequest) -> Result<HttpResponse> {
    list_own(&service, &req, ListingKind::Job).await
}

#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    tag = "listing",
    params(
        ("id" = i64, Path, description = "工作ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse),
        (status = 404, description = "工作不存在", body = ApiErrorResponse)
    )
)]
pub async fn delete_job(
    service: web::Data<ListingService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    delete(&service, &req, ListingKind::Job, path.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/nearby-jobs",
    tag = "listing",
    params(NearbyQuery),
    responses(
        (status = 200, description = "附近的工作", body = [JobResponse]),
        (status = 400, description = "坐标或档位无效", body = ApiErrorResponse)
    )
)]
pub async fn nearby_jobs(
    service: web::Data<ListingService>,
    query: web::Query<NearbyQuery>,
) -> Result<HttpResponse> {
    nearby(&service, ListingKind::Job, &query, None).await
}

#[utoipa::path(
    post,
    path = "/services",
    tag = "listing",
    request_body = CreateServiceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "发布服务成功", body = ServiceResponse),
        (status = 400, description = "参数错误", body = ApiErrorResponse),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse)
    )
)]
pub async fn create_service(
    service: web::Data<ListingService>,
    req: HttpRequest,
    request: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse> {
    create(&service, &req, ListingDraft::Service(request.into_inner())).await
}

#[utoipa::path(
    get,
    path = "/services",
    tag = "listing",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我发布的服务", body = [ServiceResponse]),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse)
    )
)]
pub async fn list_services(
    service: web::Data<ListingService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    list_own(&service, &req, ListingKind::Service).await
}

#[utoipa::path(
    delete,
    path = "/services/{id}",
    tag = "listing",
    params(
        ("id" = i64, Path, description = "服务ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse),
        (status = 404, description = "服务不存在", body = ApiErrorResponse)
    )
)]
pub async fn delete_service(
    service: web::Data<ListingService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    delete(&service, &req, ListingKind::Service, path.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/nearby-services",
    tag = "listing",
    params(NearbyQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "附近其他农场主的服务", body = [ServiceResponse]),
        (status = 400, description = "坐标或档位无效", body = ApiErrorResponse),
        (status = 401, description = "未授权", body = ApiErrorResponse),
        (status = 403, description = "仅限农场主", body = ApiErrorResponse)
    )
)]
pub async fn nearby_services(
    service: web::Data<ListingService>,
    req: HttpRequest,
    query: web::Query<NearbyQuery>,
) -> Result<HttpResponse> {
    let farmer = match require_farmer(&req) {
        Ok(farmer) => farmer,
        Err(e) => return Ok(e.error_response()),
    };
    nearby(&service, ListingKind::Service, &query, Some(farmer.user_id)).await
}

pub fn listing_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/jobs")
            .route("", web::post().to(create_job))
            .route("", web::get().to(list_jobs))
            .route("/{id}", web::delete().to(delete_job)),
    )
    .service(
        web::scope("/services")
            .route("", web::post().to(create_service))
            .route("", web::get().to(list_services))
            .route("/{id}", web::delete().to(delete_service)),
    )
    .route("/nearby-jobs", web::get().to(nearby_jobs))
    .route("/nearby-services", web::get().to(nearby_services));
}
