//! Customer and admin accounts: signup, login, token refresh and the profile
//! CRUD used by the back office.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, verify_password, AuthService, AuthUser, IssuedToken, Role};
use crate::entities::{admin_user, order, profile};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 7, max = 32, message = "Phone number looks invalid"))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 7, max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Public view of a customer profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<profile::Model> for ProfileResponse {
    fn from(model: profile::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at,
        }
    }
}

/// Public view of an admin account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<admin_user::Model> for AdminResponse {
    fn from(model: admin_user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AccountView {
    Customer(ProfileResponse),
    Admin(AdminResponse),
}

/// Body returned by signup, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub role: Role,
    pub user: AccountView,
}

impl AuthResponse {
    fn new(message: &str, issued: IssuedToken, role: Role, user: AccountView) -> Self {
        Self {
            message: message.to_string(),
            token: issued.token,
            token_type: issued.token_type,
            expires_in: issued.expires_in,
            role,
            user,
        }
    }
}

/// Body returned by admin signup. A token is issued only to the first admin,
/// who is activated immediately.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminSignupResponse {
    pub message: String,
    pub admin: AdminResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Customer accounts (`profile` table)
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Creates a profile and signs the customer in
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let existing = profile::Entity::find()
            .filter(profile::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("Email already registered".into()));
        }

        let password = hash_password(&request.password)?;
        let created = profile::ActiveModel {
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            phone: Set(non_blank(request.phone)),
            password: Set(password),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Email already registered"))?;

        info!(profile_id = created.id, "customer signed up");
        let issued = self
            .auth
            .issue_token(created.id, Role::Customer, Some(created.email.clone()))?;
        Ok(AuthResponse::new(
            "Signup successful",
            issued,
            Role::Customer,
            AccountView::Customer(created.into()),
        ))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let found = profile::Entity::find()
            .filter(profile::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;

        let profile = match found {
            Some(p) if verify_password(&request.password, &p.password) => p,
            _ => {
                warn!("customer login rejected");
                return Err(ServiceError::Unauthorized("Invalid email or password".into()));
            }
        };

        let issued = self
            .auth
            .issue_token(profile.id, Role::Customer, Some(profile.email.clone()))?;
        Ok(AuthResponse::new(
            "Login successful",
            issued,
            Role::Customer,
            AccountView::Customer(profile.into()),
        ))
    }

    /// Issues a fresh token while the account behind `user` still qualifies
    #[instrument(skip(self))]
    pub async fn refresh(&self, user: &AuthUser) -> Result<AuthResponse, ServiceError> {
        match user.role {
            Role::Customer => {
                let profile = profile::Entity::find_by_id(user.id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".into()))?;
                let issued = self.auth.issue_token(
                    profile.id,
                    Role::Customer,
                    Some(profile.email.clone()),
                )?;
                Ok(AuthResponse::new(
                    "Token refreshed",
                    issued,
                    Role::Customer,
                    AccountView::Customer(profile.into()),
                ))
            }
            Role::Admin => {
                let admin = self.auth.require_active_admin(user).await?;
                let issued =
                    self.auth
                        .issue_token(admin.id, Role::Admin, Some(admin.email.clone()))?;
                Ok(AuthResponse::new(
                    "Token refreshed",
                    issued,
                    Role::Admin,
                    AccountView::Admin(admin.into()),
                ))
            }
        }
    }

    pub async fn get_profile(&self, id: i32) -> Result<ProfileResponse, ServiceError> {
        profile::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| ServiceError::NotFound(format!("Profile {} not found", id)))
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        id: i32,
        request: UpdateProfileRequest,
    ) -> Result<ProfileResponse, ServiceError> {
        request.validate()?;
        let existing = profile::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Profile {} not found", id)))?;

        let mut model: profile::ActiveModel = existing.into();
        if let Some(name) = non_blank(request.name) {
            model.name = Set(name);
        }
        if let Some(phone) = request.phone {
            model.phone = Set(non_blank(Some(phone)));
        }
        if let Some(password) = request.password {
            model.password = Set(hash_password(&password)?);
        }

        let updated = model.update(&*self.db).await?;
        Ok(updated.into())
    }

    pub async fn list_profiles(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ProfileResponse>, u64), ServiceError> {
        let paginator = profile::Entity::find()
            .order_by_desc(profile::Column::CreatedAt)
            .order_by_desc(profile::Column::Id)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Deletes a profile; its orders stay and become guest orders
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let detached = order::Entity::update_many()
            .col_expr(order::Column::ProfileId, Expr::value(Value::Int(None)))
            .filter(order::Column::ProfileId.eq(id))
            .exec(&txn)
            .await?;

        let result = profile::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Profile {} not found", id)));
        }
        txn.commit().await?;

        info!(
            profile_id = id,
            orders = detached.rows_affected,
            "profile deleted"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdminRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 7, max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(custom = "validate_admin_status")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAdminRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[validate(custom = "validate_admin_status")]
    pub status: Option<String>,
}

fn validate_admin_status(status: &str) -> Result<(), validator::ValidationError> {
    if status == admin_user::STATUS_ACTIVE || status == admin_user::STATUS_INACTIVE {
        Ok(())
    } else {
        Err(validator::ValidationError::new("status must be active or inactive"))
    }
}

/// Admin accounts (`user` table)
#[derive(Clone)]
pub struct AdminService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl AdminService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Registers an admin. The very first admin is active; every later one
    /// waits for activation by an active admin.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<AdminSignupResponse, ServiceError> {
        request.validate()?;
        let email = normalize_email(&request.email);
        let password = hash_password(&request.password)?;

        let txn = self.db.begin().await?;

        let taken = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(email.as_str()))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict("Email already registered".into()));
        }

        let is_first = admin_user::Entity::find().count(&txn).await? == 0;
        let status = if is_first {
            admin_user::STATUS_ACTIVE
        } else {
            admin_user::STATUS_INACTIVE
        };

        let created = admin_user::ActiveModel {
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            phone: Set(non_blank(request.phone)),
            password: Set(password),
            status: Set(status.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Email already registered"))?;

        txn.commit().await?;
        info!(admin_id = created.id, status, "admin signed up");

        let (message, token) = if is_first {
            let issued = self
                .auth
                .issue_token(created.id, Role::Admin, Some(created.email.clone()))?;
            ("Admin account created and activated", Some(issued.token))
        } else {
            ("Admin account created; awaiting activation", None)
        };

        Ok(AdminSignupResponse {
            message: message.to_string(),
            admin: created.into(),
            token,
        })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let found = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;

        let admin = match found {
            Some(a) if verify_password(&request.password, &a.password) => a,
            _ => {
                warn!("admin login rejected");
                return Err(ServiceError::Unauthorized("Invalid email or password".into()));
            }
        };
        if !admin.is_active() {
            return Err(ServiceError::Forbidden("Account is not active".into()));
        }

        let issued = self
            .auth
            .issue_token(admin.id, Role::Admin, Some(admin.email.clone()))?;
        Ok(AuthResponse::new(
            "Login successful",
            issued,
            Role::Admin,
            AccountView::Admin(admin.into()),
        ))
    }

    /// Activates or deactivates an admin. An admin cannot deactivate itself.
    #[instrument(skip(self))]
    pub async fn set_active(
        &self,
        actor_id: i32,
        id: i32,
        active: bool,
    ) -> Result<AdminResponse, ServiceError> {
        if !active && actor_id == id {
            return Err(ServiceError::ValidationError(
                "You cannot deactivate your own account".into(),
            ));
        }
        let existing = self.find(id).await?;
        let status = if active {
            admin_user::STATUS_ACTIVE
        } else {
            admin_user::STATUS_INACTIVE
        };

        let mut model: admin_user::ActiveModel = existing.into();
        model.status = Set(status.to_string());
        let updated = model.update(&*self.db).await?;
        info!(admin_id = id, status, actor_id, "admin status changed");
        Ok(updated.into())
    }

    async fn find(&self, id: i32) -> Result<admin_user::Model, ServiceError> {
        admin_user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    pub async fn get(&self, id: i32) -> Result<AdminResponse, ServiceError> {
        self.find(id).await.map(Into::into)
    }

    pub async fn list(&self) -> Result<Vec<AdminResponse>, ServiceError> {
        let rows = admin_user::Entity::find()
            .order_by_asc(admin_user::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: CreateAdminRequest) -> Result<AdminResponse, ServiceError> {
        request.validate()?;
        let created = admin_user::ActiveModel {
            name: Set(request.name.trim().to_string()),
            email: Set(normalize_email(&request.email)),
            phone: Set(non_blank(request.phone)),
            password: Set(hash_password(&request.password)?),
            status: Set(request
                .status
                .unwrap_or_else(|| admin_user::STATUS_INACTIVE.to_string())),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::conflict_on_unique(e, "Email already registered"))?;
        Ok(created.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateAdminRequest,
    ) -> Result<AdminResponse, ServiceError> {
        request.validate()?;
        let mut model: admin_user::ActiveModel = self.find(id).await?.into();

        if let Some(name) = non_blank(request.name) {
            model.name = Set(name);
        }
        if let Some(email) = request.email {
            model.email = Set(normalize_email(&email));
        }
        if let Some(phone) = request.phone {
            model.phone = Set(non_blank(Some(phone)));
        }
        if let Some(password) = request.password {
            model.password = Set(hash_password(&password)?);
        }
        if let Some(status) = request.status {
            model.status = Set(status);
        }

        let updated = model
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::conflict_on_unique(e, "Email already registered"))?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, actor_id: i32, id: i32) -> Result<(), ServiceError> {
        if actor_id == id {
            return Err(ServiceError::ValidationError(
                "You cannot delete your own account".into(),
            ));
        }
        let result = admin_user::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }
}
