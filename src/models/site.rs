//! 站点层级模型：物业 -> 楼栋 / 区域 -> 摄像头

use crate::{repository::ScopedRecord, scope::ResourceKind};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::not_blank;
use validator::Validate;

/// 视频流地址：rtsp(s) 或 http(s)
static STREAM_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(rtsps?|https?)://[^\s/]+(/\S*)?$").expect("valid stream url regex"));

// ==================== Property ====================

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Property {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for Property {
    const KIND: ResourceKind = ResourceKind::Property;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_ref(&self) -> Uuid {
        self.business_id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePropertyRequest {
    /// 仅平台管理员可指定
    pub business_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub address: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// 物业（含楼栋）
#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    #[serde(flatten)]
    pub property: Property,
    pub buildings: Vec<Building>,
}

// ==================== Building ====================

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Building {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub floors: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for Building {
    const KIND: ResourceKind = ResourceKind::Building;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_ref(&self) -> Uuid {
        self.property_id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateBuildingRequest {
    pub property_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: String,
    #[validate(range(min = 1, max = 300, message = "must be between 1 and 300"))]
    pub floors: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateBuildingRequest {
    pub property_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 300, message = "must be between 1 and 300"))]
    pub floors: Option<i32>,
}

// ==================== Zone ====================

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Zone {
    pub id: Uuid,
    pub property_id: Uuid,
    pub building_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for Zone {
    const KIND: ResourceKind = ResourceKind::Zone;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_ref(&self) -> Uuid {
        self.property_id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateZoneRequest {
    pub property_id: Uuid,
    pub building_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateZoneRequest {
    pub building_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// 区域（含摄像头）
#[derive(Debug, Serialize)]
pub struct ZoneResponse {
    #[serde(flatten)]
    pub zone: Zone,
    pub cameras: Vec<Camera>,
}

// ==================== Camera ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "camera_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraStatus {
    Online,
    Offline,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Camera {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub name: String,
    pub stream_url: String,
    pub status: CameraStatus,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for Camera {
    const KIND: ResourceKind = ResourceKind::Camera;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_ref(&self) -> Uuid {
        self.zone_id
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCameraRequest {
    pub zone_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: String,
    #[validate(regex(path = *STREAM_URL_RE, message = "must be an rtsp(s) or http(s) URL"))]
    pub stream_url: String,
    #[serde(default = "default_camera_status")]
    pub status: CameraStatus,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub model: Option<String>,
}

fn default_camera_status() -> CameraStatus {
    CameraStatus::Offline
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateCameraRequest {
    pub zone_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(regex(path = *STREAM_URL_RE, message = "must be an rtsp(s) or http(s) URL"))]
    pub stream_url: Option<String>,
    pub status: Option<CameraStatus>,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub model: Option<String>,
}
