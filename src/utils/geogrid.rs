//! 六边形网格（H3）地理索引
//!
//! 每条工作/服务在创建时按固定分辨率打上网格单元标记；附近搜索以搜索者所在单元为
//! 中心展开 k 圈邻居，再按单元集合做成员过滤，不做逐行的距离计算。
//!
//! 写入方与查询方必须使用同一个分辨率，否则附近搜索会静默返回空结果。

use std::collections::BTreeSet;
use std::fmt;

use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// 固定网格分辨率
pub const GRID_RESOLUTION: Resolution = Resolution::Eight;

/// 网格单元标识（H3 索引的十六进制字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct GeoCell(String);

impl GeoCell {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<CellIndex> for GeoCell {
    fn from(cell: CellIndex) -> Self {
        GeoCell(cell.to_string())
    }
}

impl fmt::Display for GeoCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 对外暴露的搜索半径档位
///
/// 档位到网格步数 k 的映射是按分辨率手工调出来的查找表，不是公式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SearchRadius {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
}

impl SearchRadius {
    pub const ALL: [SearchRadius; 10] = [
        SearchRadius::R1,
        SearchRadius::R2,
        SearchRadius::R3,
        SearchRadius::R4,
        SearchRadius::R5,
        SearchRadius::R6,
        SearchRadius::R7,
        SearchRadius::R8,
        SearchRadius::R9,
        SearchRadius::R10,
    ];

    /// 网格步数
    pub fn k(self) -> u32 {
        match self {
            SearchRadius::R1 => 1,
            SearchRadius::R2 => 2,
            SearchRadius::R3 => 4,
            SearchRadius::R4 => 5,
            SearchRadius::R5 => 6,
            SearchRadius::R6 => 7,
            SearchRadius::R7 => 8,
            SearchRadius::R8 => 10,
            SearchRadius::R9 => 11,
            SearchRadius::R10 => 12,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            SearchRadius::R1 => 1,
            SearchRadius::R2 => 2,
            SearchRadius::R3 => 3,
            SearchRadius::R4 => 4,
            SearchRadius::R5 => 5,
            SearchRadius::R6 => 6,
            SearchRadius::R7 => 7,
            SearchRadius::R8 => 8,
            SearchRadius::R9 => 9,
            SearchRadius::R10 => 10,
        }
    }

    /// 近似覆盖范围（米）：平均边长 × k，只是候选集的包络，不是精确圆半径
    pub fn approx_envelope_m(self) -> f64 {
        GRID_RESOLUTION.edge_length_m() * f64::from(self.k())
    }

    /// 六边形 k 圈的单元数 3k²+3k+1（靠近五边形时会更少）
    pub fn expected_cell_count(self) -> usize {
        let k = self.k() as usize;
        3 * k * k + 3 * k + 1
    }
}

impl TryFrom<i64> for SearchRadius {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        SearchRadius::ALL
            .into_iter()
            .find(|r| i64::from(r.level()) == value)
            .ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "Radius must be between 1 and 10, got {value}"
                ))
            })
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> AppResult<LatLng> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::ValidationError(format!(
            "Latitude must be between -90 and 90, got {latitude}"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::ValidationError(format!(
            "Longitude must be between -180 and 180, got {longitude}"
        )));
    }

    LatLng::new(latitude, longitude)
        .map_err(|e| AppError::ValidationError(format!("Invalid coordinates: {e}")))
}

/// 计算坐标所在的网格单元
pub fn index_cell(latitude: f64, longitude: f64) -> AppResult<GeoCell> {
    let point = validate_coordinates(latitude, longitude)?;
    Ok(point.to_cell(GRID_RESOLUTION).into())
}

/// 以坐标所在单元为中心，返回 k 圈内（含中心）的全部单元
pub fn neighborhood(
    latitude: f64,
    longitude: f64,
    radius: SearchRadius,
) -> AppResult<BTreeSet<GeoCell>> {
    let origin = validate_coordinates(latitude, longitude)?.to_cell(GRID_RESOLUTION);
    let disk: Vec<CellIndex> = origin.grid_disk(radius.k());
    Ok(disk.into_iter().map(GeoCell::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAT: f64 = 31.2510782;
    const LON: f64 = 75.6997394;

    #[test]
    fn test_index_cell_is_deterministic() {
        let a = index_cell(LAT, LON).unwrap();
        let b = index_cell(LAT, LON).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 15);
    }

    #[test]
    fn test_nearby_points_share_cell() {
        let a = index_cell(31.2510782, 75.6997394).unwrap();
        let b = index_cell(31.2512, 75.6998).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        assert!(matches!(
            index_cell(91.0, 0.0),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            index_cell(0.0, -180.5),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            index_cell(f64::NAN, 0.0),
            Err(AppError::ValidationError(_))
        ));
        assert!(index_cell(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_radius_table() {
        let ks: Vec<u32> = SearchRadius::ALL.iter().map(|r| r.k()).collect();
        assert_eq!(ks, vec![1, 2, 4, 5, 6, 7, 8, 10, 11, 12]);
        assert!(ks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_radius_outside_table_rejected() {
        assert!(matches!(
            SearchRadius::try_from(11),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            SearchRadius::try_from(0),
            Err(AppError::InvalidArgument(_))
        ));
        assert_eq!(SearchRadius::try_from(3).unwrap(), SearchRadius::R3);
    }

    #[test]
    fn test_origin_in_every_neighborhood() {
        let origin = index_cell(LAT, LON).unwrap();
        for radius in SearchRadius::ALL {
            let cells = neighborhood(LAT, LON, radius).unwrap();
            assert!(cells.contains(&origin), "radius {:?}", radius);
        }
    }

    #[test]
    fn test_neighborhood_is_monotonic() {
        let mut previous = BTreeSet::new();
        for radius in SearchRadius::ALL {
            let cells = neighborhood(LAT, LON, radius).unwrap();
            assert!(previous.is_subset(&cells), "radius {:?}", radius);
            previous = cells;
        }
    }

    #[test]
    fn test_ring_two_has_nineteen_cells() {
        let cells = neighborhood(LAT, LON, SearchRadius::R2).unwrap();
        assert_eq!(cells.len(), 19);
        assert_eq!(SearchRadius::R2.expected_cell_count(), 19);
        assert!(cells.contains(&index_cell(31.2512, 75.6998).unwrap()));
    }

    #[test]
    fn test_envelope_grows_with_radius() {
        assert!(SearchRadius::R1.approx_envelope_m() > 0.0);
        assert!(SearchRadius::R10.approx_envelope_m() > SearchRadius::R9.approx_envelope_m());
    }
}
