use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{ListingKind, listing_entity};

pub const MAX_TITLE_LEN: usize = 30;
/// 工作关闭 / 服务停用
pub const STATUS_CLOSED: i16 = 0;
/// 工作开放 / 服务有效
pub const STATUS_OPEN: i16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateJobRequest {
    #[schema(example = "Wheat harvest")]
    pub title: String,
    #[schema(example = "Need help harvesting 5 acres of wheat")]
    pub description: String,
    #[schema(example = 4)]
    pub number_of_labourers: i32,
    pub required_skills: Option<Vec<String>>,
    #[schema(example = 31.2510782)]
    pub latitude: f64,
    #[schema(example = 75.6997394)]
    pub longitude: f64,
    #[schema(example = 650.0)]
    pub daily_wage: f64,
    pub perks: Option<Vec<String>>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1 开放，0 关闭；默认 1
    pub status: Option<i16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    #[schema(example = "Tractor rental")]
    pub service_name: String,
    pub description: Option<String>,
    #[schema(example = 31.2510782)]
    pub latitude: f64,
    #[schema(example = 75.6997394)]
    pub longitude: f64,
    #[schema(example = 900.0)]
    pub cost: f64,
    /// 1 有效，0 停用；默认 1
    pub status: Option<i16>,
}

/// 待创建的发布记录
#[derive(Debug, Clone)]
pub enum ListingDraft {
    Job(CreateJobRequest),
    Service(CreateServiceRequest),
}

impl ListingDraft {
    pub fn kind(&self) -> ListingKind {
        match self {
            ListingDraft::Job(_) => ListingKind::Job,
            ListingDraft::Service(_) => ListingKind::Service,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// 搜索档位 1-10，默认 2
    pub radius: Option<i64>,
}

/// 对外展示只带发布者ID与姓名，不含邮箱
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub number_of_labourers: i32,
    pub required_skills: Vec<String>,
    pub perks: Vec<String>,
    pub daily_wage: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: i16,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub cell: String,
    pub farmer_id: i64,
    pub farmer_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceResponse {
    pub id: i64,
    pub service_name: String,
    pub description: Option<String>,
    pub cost: f64,
    pub status: i16,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub cell: String,
    pub farmer_id: i64,
    pub farmer_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ListingResponse {
    Job(JobResponse),
    Service(ServiceResponse),
}

impl ListingResponse {
    pub fn id(&self) -> i64 {
        match self {
            ListingResponse::Job(j) => j.id,
            ListingResponse::Service(s) => s.id,
        }
    }

    /// 工作标题或服务名称
    pub fn title(&self) -> &str {
        match self {
            ListingResponse::Job(j) => &j.title,
            ListingResponse::Service(s) => &s.service_name,
        }
    }

    pub fn farmer_id(&self) -> i64 {
        match self {
            ListingResponse::Job(j) => j.farmer_id,
            ListingResponse::Service(s) => s.farmer_id,
        }
    }

    pub fn cell(&self) -> &str {
        match self {
            ListingResponse::Job(j) => &j.cell,
            ListingResponse::Service(s) => &s.cell,
        }
    }
}

fn string_list(value: Option<serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

impl From<listing_entity::Model> for ListingResponse {
    fn from(m: listing_entity::Model) -> Self {
        match m.kind {
            ListingKind::Job => ListingResponse::Job(JobResponse {
                id: m.id,
                title: m.title,
                description: m.description.unwrap_or_default(),
                number_of_labourers: m.number_of_labourers.unwrap_or_default(),
                required_skills: string_list(m.required_skills),
                perks: string_list(m.perks),
                daily_wage: m.rate,
                start_date: m.start_date,
                end_date: m.end_date,
                status: m.status,
                latitude: m.latitude,
                longitude: m.longitude,
                location: m.location,
                cell: m.cell,
                farmer_id: m.owner_id,
                farmer_name: m.owner_name,
                created_at: m.created_at,
            }),
            ListingKind::Service => ListingResponse::Service(ServiceResponse {
                id: m.id,
                service_name: m.title,
                description: m.description,
                cost: m.rate,
                status: m.status,
                latitude: m.latitude,
                longitude: m.longitude,
                location: m.location,
                cell: m.cell,
                farmer_id: m.owner_id,
                farmer_name: m.owner_name,
                created_at: m.created_at,
            }),
        }
    }
}
