//! 业务级资源：部门、告警规则、备注、VT 凭证

use super::resource_service::ResourceService;
use crate::{
    auth::ApiKeyGenerator,
    error::AppError,
    models::{
        alert_rule::*,
        credential::*,
        department::*,
        note::*,
        site::{Property, Zone},
    },
    scope::{AccessContext, ResourceKind},
};
use chrono::Utc;
use uuid::Uuid;

pub struct TenantService {
    resources: ResourceService,
}

impl TenantService {
    pub fn new(resources: ResourceService) -> Self {
        Self { resources }
    }

    // ==================== Department ====================

    pub async fn list_departments(&self, ctx: &AccessContext) -> Result<Vec<Department>, AppError> {
        self.resources.list(ctx).await
    }

    pub async fn get_department(&self, ctx: &AccessContext, id: Uuid) -> Result<Department, AppError> {
        self.resources.get(ctx, id).await
    }

    pub async fn create_department(
        &self,
        ctx: &AccessContext,
        req: CreateDepartmentRequest,
    ) -> Result<Department, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::Department)?;
        let business_id = self.resources.target_business(ctx, req.business_id).await?;

        let now = Utc::now();
        self.resources
            .create(Department {
                id: Uuid::new_v4(),
                business_id,
                name: req.name.trim().to_string(),
                description: req.description,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn update_department(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateDepartmentRequest,
    ) -> Result<Department, AppError> {
        let stored: Department = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        if let Some(name) = req.name {
            merged.name = name.trim().to_string();
        }
        if req.description.is_some() {
            merged.description = req.description;
        }

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_department(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<Department>(ctx, id).await
    }

    // ==================== Alert rule ====================

    pub async fn list_alert_rules(&self, ctx: &AccessContext) -> Result<Vec<AlertRule>, AppError> {
        self.resources.list(ctx).await
    }

    pub async fn get_alert_rule(&self, ctx: &AccessContext, id: Uuid) -> Result<AlertRule, AppError> {
        self.resources.get(ctx, id).await
    }

    pub async fn create_alert_rule(
        &self,
        ctx: &AccessContext,
        req: CreateAlertRuleRequest,
    ) -> Result<AlertRule, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::AlertRule)?;
        let business_id = self.resources.target_business(ctx, req.business_id).await?;

        // 区域必须属于规则所在业务
        if let Some(zone_id) = req.zone_id {
            self.resources
                .parent_in_business::<Zone>(business_id, zone_id)
                .await?;
        }

        let now = Utc::now();
        self.resources
            .create(AlertRule {
                id: Uuid::new_v4(),
                business_id,
                zone_id: req.zone_id,
                name: req.name.trim().to_string(),
                trigger: req.trigger,
                severity: req.severity,
                threshold: req.threshold,
                notify_email: req.notify_email,
                is_active: req.is_active,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn update_alert_rule(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateAlertRuleRequest,
    ) -> Result<AlertRule, AppError> {
        let stored: AlertRule = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        if let Some(zone_id) = req.zone_id {
            if Some(zone_id) != stored.zone_id {
                self.resources
                    .parent_in_business::<Zone>(stored.business_id, zone_id)
                    .await?;
                merged.zone_id = Some(zone_id);
            }
        }
        if let Some(name) = req.name {
            merged.name = name.trim().to_string();
        }
        if let Some(trigger) = req.trigger {
            merged.trigger = trigger;
        }
        if let Some(severity) = req.severity {
            merged.severity = severity;
        }
        if req.threshold.is_some() {
            merged.threshold = req.threshold;
        }
        if req.notify_email.is_some() {
            merged.notify_email = req.notify_email;
        }
        if let Some(is_active) = req.is_active {
            merged.is_active = is_active;
        }

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_alert_rule(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<AlertRule>(ctx, id).await
    }

    // ==================== Note ====================

    pub async fn list_notes(&self, ctx: &AccessContext) -> Result<Vec<Note>, AppError> {
        self.resources.list(ctx).await
    }

    pub async fn get_note(&self, ctx: &AccessContext, id: Uuid) -> Result<Note, AppError> {
        self.resources.get(ctx, id).await
    }

    pub async fn create_note(&self, ctx: &AccessContext, req: CreateNoteRequest) -> Result<Note, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::Note)?;
        let property: Property = self.resources.get(ctx, req.property_id).await?;

        let now = Utc::now();
        self.resources
            .create(Note {
                id: Uuid::new_v4(),
                property_id: property.id,
                author_id: ctx.principal.id,
                content: req.content,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn update_note(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateNoteRequest,
    ) -> Result<Note, AppError> {
        let stored: Note = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        merged.content = req.content;

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_note(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<Note>(ctx, id).await
    }

    // ==================== VT credential ====================

    pub async fn list_credentials(&self, ctx: &AccessContext) -> Result<Vec<VtApiCredential>, AppError> {
        self.resources.list(ctx).await
    }

    pub async fn get_credential(&self, ctx: &AccessContext, id: Uuid) -> Result<VtApiCredential, AppError> {
        self.resources.get(ctx, id).await
    }

    /// 明文密钥只在这里返回一次
    pub async fn create_credential(
        &self,
        ctx: &AccessContext,
        req: CreateCredentialRequest,
    ) -> Result<IssuedCredential, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::VtCredential)?;
        let business_id = self.resources.target_business(ctx, req.business_id).await?;

        let key = ApiKeyGenerator::issue();
        let now = Utc::now();
        let credential = self
            .resources
            .create(VtApiCredential {
                id: Uuid::new_v4(),
                business_id,
                label: req.label.trim().to_string(),
                key_prefix: key.prefix,
                key_hash: key.hash,
                created_by: ctx.principal.id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        Ok(IssuedCredential {
            credential,
            api_key: key.plaintext,
        })
    }

    pub async fn update_credential(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateCredentialRequest,
    ) -> Result<VtApiCredential, AppError> {
        let stored: VtApiCredential = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        merged.label = req.label.trim().to_string();

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_credential(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<VtApiCredential>(ctx, id).await
    }
}
