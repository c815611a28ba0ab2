use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    #[sea_orm(string_value = "job")]
    Job,
    #[sea_orm(string_value = "service")]
    Service,
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingKind::Job => write!(f, "Job"),
            ListingKind::Service => write!(f, "Service"),
        }
    }
}

/// 工作/服务发布记录（同表，按 kind 区分）
///
/// - cell: 创建时按坐标计算的网格单元，之后不再重算（记录只允许创建和删除）
/// - owner_id / owner_name: 发布者（农场主）的用户ID与姓名
/// - title: 工作标题或服务名称
/// - rate: 工作为日薪，服务为费用
/// - number_of_labourers / required_skills / perks / start_date / end_date 仅工作使用
/// - status: 1 开放（有效），0 关闭（停用）
/// - location: 逆地理编码得到的展示用地址
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: ListingKind,
    pub owner_id: i64,
    pub owner_name: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub rate: f64,
    pub number_of_labourers: Option<i32>,
    pub required_skills: Option<Json>,
    pub perks: Option<Json>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: i16,
    pub latitude: f64,
    pub longitude: f64,
    pub cell: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
