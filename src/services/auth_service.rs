//! 认证服务：注册、登录、当前会话

use super::identity_mirror::{mirror_best_effort, IdentityMirror};
use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::SecurityConfig,
    error::AppError,
    models::{business::Business, user::*},
    repository::{DirectoryStore, Store},
    scope::AccessContext,
};
use std::sync::Arc;

pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
    policy: SecurityConfig,
    mirror: Arc<dyn IdentityMirror>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        jwt_service: Arc<JwtService>,
        hasher: Arc<PasswordHasher>,
        policy: SecurityConfig,
        mirror: Arc<dyn IdentityMirror>,
    ) -> Self {
        Self {
            store,
            jwt_service,
            hasher,
            policy,
            mirror,
        }
    }

    /// 注册业务所有者及其业务（同一事务）
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AppError> {
        PasswordHasher::validate_password_policy(&req.password, &self.policy)?;

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let hash = self.hasher.hash(&req.password)?;
        let owner = User::new(&req.email, &req.name, hash, Role::BusinessOwner);
        let business = Business::new(&req.business_name, owner.id);

        self.store.register_owner(&owner, &business).await?;

        tracing::info!(
            user_id = %owner.id,
            business_id = %business.id,
            "Business owner registered"
        );
        metrics::counter!("registrations_total").increment(1);

        // 主操作已提交，镜像失败不回滚
        let principal = owner.principal();
        mirror_best_effort(self.mirror.as_ref(), &principal).await;

        let token = self.jwt_service.generate_session_token(&principal)?;

        Ok(RegisterResponse {
            token,
            user: owner.into(),
            business,
        })
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let Some(user) = self.store.find_user_by_email(&req.email).await? else {
            // 未知邮箱同样做一次哈希校验，响应时间不暴露账户是否存在
            self.hasher.verify_decoy(&req.password);
            tracing::warn!("Login failed: unknown email");
            return Err(AppError::Unauthorized);
        };

        if let Err(e) = self.hasher.verify(&req.password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "Login failed: bad credentials");
            return Err(e);
        }

        let token = self.jwt_service.generate_session_token(&user.principal())?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse {
            token,
            expires_in: self.jwt_service.expires_in(),
            user: user.into(),
        })
    }

    /// 当前会话信息
    pub async fn me(&self, ctx: &AccessContext) -> Result<MeResponse, AppError> {
        let user = self
            .store
            .find_user(ctx.principal.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(MeResponse {
            user: user.into(),
            business_id: ctx.business_id,
            is_admin: ctx.is_admin(),
        })
    }

    /// 创建平台管理员（命令行引导用）
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, AppError> {
        PasswordHasher::validate_password_policy(password, &self.policy)?;
        let hash = self.hasher.hash(password)?;
        let name = email.split('@').next().unwrap_or(email);
        let admin = User::new(email, name, hash, Role::Admin);

        let created = self.store.create_user(&admin).await?;
        tracing::info!(user_id = %created.id, "Platform administrator created");
        Ok(created)
    }
}
