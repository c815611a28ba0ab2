use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use crate::error::AppResult;
use crate::models::*;
use crate::utils::{GRID_RESOLUTION, SearchRadius, index_cell, neighborhood};

fn build_neighborhood(query: &NeighborhoodQuery) -> AppResult<NeighborhoodResponse> {
    let radius = SearchRadius::try_from(query.radius)?;
    let origin = index_cell(query.latitude, query.longitude)?;
    let cells = neighborhood(query.latitude, query.longitude, radius)?;

    Ok(NeighborhoodResponse {
        origin,
        radius: query.radius,
        k: radius.k(),
        approx_envelope_m: radius.approx_envelope_m(),
        cells: cells.into_iter().collect(),
    })
}

#[utoipa::path(
    get,
    path = "/geo/cell",
    tag = "geo",
    params(CellQuery),
    responses(
        (status = 200, description = "坐标所在网格单元", body = CellResponse),
        (status = 400, description = "坐标超出范围", body = ApiErrorResponse)
    )
)]
pub async fn get_cell(query: web::Query<CellQuery>) -> Result<HttpResponse> {
    match index_cell(query.latitude, query.longitude) {
        Ok(cell) => {
            let data = CellResponse {
                cell,
                resolution: u8::from(GRID_RESOLUTION),
            };
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/geo/neighborhood",
    tag = "geo",
    params(NeighborhoodQuery),
    responses(
        (status = 200, description = "k 圈网格单元", body = NeighborhoodResponse),
        (status = 400, description = "坐标或档位无效", body = ApiErrorResponse)
    )
)]
pub async fn get_neighborhood(query: web::Query<NeighborhoodQuery>) -> Result<HttpResponse> {
    match build_neighborhood(&query) {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn geo_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/geo")
            .route("/cell", web::get().to(get_cell))
            .route("/neighborhood", web::get().to(get_neighborhood)),
    );
}
