use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::utils::GeoCell;

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct CellQuery {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct NeighborhoodQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// 搜索档位 1-10
    pub radius: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CellResponse {
    pub cell: GeoCell,
    pub resolution: u8,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NeighborhoodResponse {
    pub origin: GeoCell,
    pub radius: i64,
    pub k: u32,
    /// 近似覆盖范围（米），不是精确半径
    pub approx_envelope_m: f64,
    pub cells: Vec<GeoCell>,
}
