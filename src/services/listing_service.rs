use crate::entities::{ListingKind, listing_entity as listings};
use crate::error::{AppError, AppResult};
use crate::external::GeocodingService;
use crate::models::*;
use crate::utils::{SearchRadius, index_cell, neighborhood};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

/// 附近搜索默认档位
pub const DEFAULT_SEARCH_RADIUS: SearchRadius = SearchRadius::R2;

fn validate_title(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() || value.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::ValidationError(format!(
            "{field} length must be between 1 and {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(value)
}

fn validate_amount(field: &str, value: f64) -> AppResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::ValidationError(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}

fn validate_status(status: Option<i16>) -> AppResult<i16> {
    match status.unwrap_or(STATUS_OPEN) {
        s @ (STATUS_CLOSED | STATUS_OPEN) => Ok(s),
        _ => Err(AppError::ValidationError(
            "Status must be 0 or 1".to_string(),
        )),
    }
}

/// 去掉首尾空白，丢弃空项
fn string_list(items: Option<Vec<String>>) -> serde_json::Value {
    let items: Vec<String> = items
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    serde_json::Value::from(items)
}

fn job_model(request: &CreateJobRequest) -> AppResult<listings::ActiveModel> {
    let title = validate_title("Title", &request.title)?;
    let description = request.description.trim().to_string();
    if description.is_empty() {
        return Err(AppError::ValidationError(
            "Description must not be empty".to_string(),
        ));
    }
    if request.number_of_labourers < 1 {
        return Err(AppError::ValidationError(
            "Number of labourers must be at least 1".to_string(),
        ));
    }
    let daily_wage = validate_amount("Daily wage", request.daily_wage)?;
    if let Some(end) = request.end_date
        && end < request.start_date
    {
        return Err(AppError::ValidationError(
            "End date must not be before start date".to_string(),
        ));
    }

    Ok(listings::ActiveModel {
        kind: Set(ListingKind::Job),
        title: Set(title),
        description: Set(Some(description)),
        rate: Set(daily_wage),
        number_of_labourers: Set(Some(request.number_of_labourers)),
        required_skills: Set(Some(string_list(request.required_skills.clone()))),
        perks: Set(Some(string_list(request.perks.clone()))),
        start_date: Set(Some(request.start_date)),
        end_date: Set(request.end_date),
        status: Set(validate_status(request.status)?),
        ..Default::default()
    })
}

fn service_model(request: &CreateServiceRequest) -> AppResult<listings::ActiveModel> {
    let service_name = validate_title("Service name", &request.service_name)?;
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(listings::ActiveModel {
        kind: Set(ListingKind::Service),
        title: Set(service_name),
        description: Set(description),
        rate: Set(validate_amount("Cost", request.cost)?),
        number_of_labourers: Set(None),
        required_skills: Set(None),
        perks: Set(None),
        start_date: Set(None),
        end_date: Set(None),
        status: Set(validate_status(request.status)?),
        ..Default::default()
    })
}

#[derive(Clone)]
pub struct ListingService {
    pool: DatabaseConnection,
    geocoding: GeocodingService,
}

impl ListingService {
    pub fn new(pool: DatabaseConnection, geocoding: GeocodingService) -> Self {
        Self { pool, geocoding }
    }

    /// 创建工作/服务，创建时写入网格单元和发布者姓名
    pub async fn create_listing(
        &self,
        owner_id: i64,
        owner_name: &str,
        draft: ListingDraft,
    ) -> AppResult<ListingResponse> {
        let kind = draft.kind();
        let (mut model, latitude, longitude) = match &draft {
            ListingDraft::Job(r) => (job_model(r)?, r.latitude, r.longitude),
            ListingDraft::Service(r) => (service_model(r)?, r.latitude, r.longitude),
        };

        let cell = index_cell(latitude, longitude)?;
        let location = self.geocoding.reverse_geocode(latitude, longitude).await;

        model.owner_id = Set(owner_id);
        model.owner_name = Set(owner_name.to_string());
        model.latitude = Set(latitude);
        model.longitude = Set(longitude);
        model.cell = Set(cell.into_string());
        model.location = Set(location);
        model.created_at = Set(Utc::now());

        let model = model.insert(&self.pool).await?;
        log::info!("Created {} {} for user {}", kind, model.id, owner_id);
        Ok(model.into())
    }

    /// 发布者自己的工作/服务，按创建时间倒序
    pub async fn list_own(&self, owner_id: i64, kind: ListingKind) -> AppResult<Vec<ListingResponse>> {
        let models = listings::Entity::find()
            .filter(listings::Column::OwnerId.eq(owner_id))
            .filter(listings::Column::Kind.eq(kind))
            .order_by_desc(listings::Column::CreatedAt)
            .order_by_desc(listings::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(models.into_iter().map(ListingResponse::from).collect())
    }

    /// 只能删除自己发布的记录；不存在或不属于调用者都按不存在处理
    pub async fn delete_listing(&self, owner_id: i64, kind: ListingKind, id: i64) -> AppResult<()> {
        let model = listings::Entity::find_by_id(id)
            .filter(listings::Column::OwnerId.eq(owner_id))
            .filter(listings::Column::Kind.eq(kind))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{kind} not found.")))?;

        model.delete(&self.pool).await?;
        log::info!("Deleted {} {} for user {}", kind, id, owner_id);
        Ok(())
    }

    /// 附近搜索：取 k 圈单元集合做成员过滤，结果是候选超集而非精确圆
    ///
    /// `exclude_owner` 用于农场主查附近服务时排除自己发布的
    pub async fn nearby(
        &self,
        kind: ListingKind,
        latitude: f64,
        longitude: f64,
        radius: SearchRadius,
        exclude_owner: Option<i64>,
    ) -> AppResult<Vec<ListingResponse>> {
        let cells: Vec<String> = neighborhood(latitude, longitude, radius)?
            .into_iter()
            .map(|c| c.into_string())
            .collect();

        let mut query = listings::Entity::find()
            .filter(listings::Column::Kind.eq(kind))
            .filter(listings::Column::Cell.is_in(cells));
        if let Some(owner_id) = exclude_owner {
            query = query.filter(listings::Column::OwnerId.ne(owner_id));
        }

        let models = query
            .order_by_desc(listings::Column::CreatedAt)
            .order_by_desc(listings::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(models.into_iter().map(ListingResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeocodingConfig;
    use crate::database::memory_pool;
    use chrono::{Duration, TimeZone};

    async fn service() -> ListingService {
        ListingService::new(
            memory_pool().await,
            GeocodingService::new(GeocodingConfig::default()),
        )
    }

    fn job(title: &str, latitude: f64, longitude: f64) -> CreateJobRequest {
        CreateJobRequest {
            title: title.to_string(),
            description: "Harvest help".to_string(),
            number_of_labourers: 4,
            required_skills: Some(vec![" Harvesting ".to_string(), "".to_string()]),
            latitude,
            longitude,
            daily_wage: 600.0,
            perks: None,
            start_date: Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap(),
            end_date: None,
            status: None,
        }
    }

    fn offer(name: &str, latitude: f64, longitude: f64) -> CreateServiceRequest {
        CreateServiceRequest {
            service_name: name.to_string(),
            description: Some("  ".to_string()),
            latitude,
            longitude,
            cost: 900.0,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_job_tags_cell_and_fields() {
        let svc = service().await;
        let created = svc
            .create_listing(7, "Gurpreet", ListingDraft::Job(job("Wheat harvest", 31.2510782, 75.6997394)))
            .await
            .unwrap();

        let ListingResponse::Job(job) = created else {
            panic!("expected job");
        };
        assert_eq!(job.cell, index_cell(31.2510782, 75.6997394).unwrap().into_string());
        assert_eq!(job.location, "Location: 31.2511, 75.6997");
        assert_eq!(job.farmer_id, 7);
        assert_eq!(job.farmer_name, "Gurpreet");
        assert_eq!(job.number_of_labourers, 4);
        assert_eq!(job.required_skills, vec!["Harvesting".to_string()]);
        assert!(job.perks.is_empty());
        assert_eq!(job.daily_wage, 600.0);
        assert_eq!(job.status, STATUS_OPEN);
    }

    #[tokio::test]
    async fn test_create_service_fields() {
        let svc = service().await;
        let mut request = offer("Tractor rental", 31.25, 75.70);
        request.status = Some(STATUS_CLOSED);
        let created = svc
            .create_listing(7, "Gurpreet", ListingDraft::Service(request))
            .await
            .unwrap();

        let ListingResponse::Service(service) = created else {
            panic!("expected service");
        };
        assert_eq!(service.service_name, "Tractor rental");
        assert_eq!(service.description, None);
        assert_eq!(service.cost, 900.0);
        assert_eq!(service.status, STATUS_CLOSED);
    }

    async fn rejected(svc: &ListingService, request: CreateJobRequest) -> bool {
        matches!(
            svc.create_listing(1, "A", ListingDraft::Job(request)).await,
            Err(AppError::ValidationError(_))
        )
    }

    #[tokio::test]
    async fn test_create_validates_job_input() {
        let svc = service().await;

        assert!(rejected(&svc, job(&"x".repeat(31), 31.0, 75.0)).await);
        assert!(rejected(&svc, job("Sowing", 95.0, 75.0)).await);

        let mut no_labourers = job("Sowing", 31.0, 75.0);
        no_labourers.number_of_labourers = 0;
        assert!(rejected(&svc, no_labourers).await);

        let mut reversed = job("Sowing", 31.0, 75.0);
        reversed.end_date = Some(reversed.start_date - Duration::days(1));
        assert!(rejected(&svc, reversed).await);

        let mut bad_status = job("Sowing", 31.0, 75.0);
        bad_status.status = Some(2);
        assert!(rejected(&svc, bad_status).await);

        let mut negative = job("Sowing", 31.0, 75.0);
        negative.daily_wage = -1.0;
        assert!(rejected(&svc, negative).await);

        assert!(svc.list_own(1, ListingKind::Job).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_service_input() {
        let svc = service().await;

        let mut negative = offer("Sprayer", 31.0, 75.0);
        negative.cost = f64::NAN;
        assert!(matches!(
            svc.create_listing(1, "A", ListingDraft::Service(negative)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_listing(1, "A", ListingDraft::Service(offer(" ", 31.0, 75.0)))
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_nearby_filters_by_ring_and_kind() {
        let svc = service().await;

        svc.create_listing(1, "A", ListingDraft::Job(job("Near job", 31.2512, 75.6998)))
            .await
            .unwrap();
        svc.create_listing(1, "A", ListingDraft::Job(job("Far job", 28.6139, 77.2090)))
            .await
            .unwrap();
        svc.create_listing(1, "A", ListingDraft::Service(offer("Near tractor", 31.2512, 75.6998)))
            .await
            .unwrap();

        let jobs = svc
            .nearby(ListingKind::Job, 31.2510782, 75.6997394, SearchRadius::R2, None)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title(), "Near job");

        let services = svc
            .nearby(ListingKind::Service, 31.2510782, 75.6997394, SearchRadius::R1, None)
            .await
            .unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].title(), "Near tractor");
    }

    #[tokio::test]
    async fn test_nearby_excludes_callers_own_services() {
        let svc = service().await;
        svc.create_listing(1, "Mine", ListingDraft::Service(offer("My tractor", 31.2512, 75.6998)))
            .await
            .unwrap();
        svc.create_listing(2, "Other", ListingDraft::Service(offer("Their sprayer", 31.2512, 75.6998)))
            .await
            .unwrap();

        let found = svc
            .nearby(ListingKind::Service, 31.2510782, 75.6997394, SearchRadius::R2, Some(1))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title(), "Their sprayer");
        assert_eq!(found[0].farmer_id(), 2);
    }

    #[tokio::test]
    async fn test_public_payload_has_no_email() {
        let svc = service().await;
        svc.create_listing(1, "Gurpreet", ListingDraft::Job(job("Weeding", 31.25, 75.70)))
            .await
            .unwrap();

        let found = svc
            .nearby(ListingKind::Job, 31.25, 75.70, SearchRadius::R1, None)
            .await
            .unwrap();
        let payload = serde_json::to_value(&found).unwrap();
        assert_eq!(payload[0]["farmer_name"], "Gurpreet");
        assert!(payload[0].get("email").is_none());
        assert!(!payload.to_string().contains('@'));
    }

    #[tokio::test]
    async fn test_delete_is_owner_only() {
        let svc = service().await;
        let created = svc
            .create_listing(1, "A", ListingDraft::Job(job("Weeding", 31.25, 75.70)))
            .await
            .unwrap();

        assert!(matches!(
            svc.delete_listing(2, ListingKind::Job, created.id()).await,
            Err(AppError::NotFound(_))
        ));
        match svc.delete_listing(1, ListingKind::Service, created.id()).await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Service not found."),
            other => panic!("expected not found, got {other:?}"),
        }

        svc.delete_listing(1, ListingKind::Job, created.id())
            .await
            .unwrap();
        assert!(svc.list_own(1, ListingKind::Job).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_own_only_returns_callers_listings() {
        let svc = service().await;
        svc.create_listing(1, "A", ListingDraft::Service(offer("Tractor", 31.0, 75.0)))
            .await
            .unwrap();
        svc.create_listing(2, "B", ListingDraft::Service(offer("Sprayer", 31.0, 75.0)))
            .await
            .unwrap();

        let mine = svc.list_own(1, ListingKind::Service).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title(), "Tractor");
    }
}
