use crate::entities::{UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::normalize_email;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// 账户：注册时确定角色（农场主 / 劳工），登录只接受已注册邮箱
#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<UserResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Name length must be between 1 and {MAX_NAME_LEN} characters"
            )));
        }
        let email = normalize_email(&request.email)?;
        let role: UserRole = request.role.parse()?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::ValidationError(
                "Email Address is already in use!".to_string(),
            ));
        }

        let user = users::ActiveModel {
            name: Set(name),
            email: Set(email),
            role: Set(role),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Registered {} {}", user.role, user.id);
        Ok(user.into())
    }

    /// 按规范化后的邮箱查找
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?;
        Ok(user)
    }
}
