//! 站点层级服务：物业 / 楼栋 / 区域 / 摄像头

use super::resource_service::ResourceService;
use crate::{
    error::AppError,
    models::site::*,
    scope::{AccessContext, ResourceKind},
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

pub struct SiteService {
    resources: ResourceService,
}

impl SiteService {
    pub fn new(resources: ResourceService) -> Self {
        Self { resources }
    }

    // ==================== Property ====================

    pub async fn list_properties(&self, ctx: &AccessContext) -> Result<Vec<PropertyResponse>, AppError> {
        let properties: Vec<Property> = self.resources.list(ctx).await?;
        let buildings: Vec<Building> = self.resources.list(ctx).await?;

        let mut by_property: HashMap<Uuid, Vec<Building>> = HashMap::new();
        for building in buildings {
            by_property.entry(building.property_id).or_default().push(building);
        }

        Ok(properties
            .into_iter()
            .map(|property| PropertyResponse {
                buildings: by_property.remove(&property.id).unwrap_or_default(),
                property,
            })
            .collect())
    }

    pub async fn get_property(&self, ctx: &AccessContext, id: Uuid) -> Result<PropertyResponse, AppError> {
        let property: Property = self.resources.get(ctx, id).await?;
        let buildings = self.resources.list_by_parent(ctx, property.id).await?;
        Ok(PropertyResponse { property, buildings })
    }

    pub async fn create_property(
        &self,
        ctx: &AccessContext,
        req: CreatePropertyRequest,
    ) -> Result<Property, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::Property)?;
        let business_id = self.resources.target_business(ctx, req.business_id).await?;

        let now = Utc::now();
        self.resources
            .create(Property {
                id: Uuid::new_v4(),
                business_id,
                name: req.name.trim().to_string(),
                address: req.address,
                description: req.description,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn update_property(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdatePropertyRequest,
    ) -> Result<Property, AppError> {
        let stored: Property = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        if let Some(name) = req.name {
            merged.name = name.trim().to_string();
        }
        if req.address.is_some() {
            merged.address = req.address;
        }
        if req.description.is_some() {
            merged.description = req.description;
        }

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_property(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<Property>(ctx, id).await
    }

    // ==================== Building ====================

    pub async fn list_buildings(&self, ctx: &AccessContext) -> Result<Vec<Building>, AppError> {
        self.resources.list(ctx).await
    }


    pub async fn get_building(&self, ctx: &AccessContext, id: Uuid) -> Result<Building, AppError> {
        self.resources.get(ctx, id).await
    }

    pub async fn create_building(
        &self,
        ctx: &AccessContext,
        req: CreateBuildingRequest,
    ) -> Result<Building, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::Building)?;
        let property: Property = self.resources.get(ctx, req.property_id).await?;

        let now = Utc::now();
        self.resources
            .create(Building {
                id: Uuid::new_v4(),
                property_id: property.id,
                name: req.name.trim().to_string(),
                floors: req.floors,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// 更新楼栋；仍有区域挂在该楼栋下时不允许换物业
    pub async fn update_building(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateBuildingRequest,
    ) -> Result<Building, AppError> {
        let stored: Building = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        if let Some(property_id) = req.property_id {
            if property_id != stored.property_id {
                let property: Property = self.resources.get(ctx, property_id).await?;
                self.ensure_no_zones(ctx, &stored).await?;
                merged.property_id = property.id;
            }
        }
        if let Some(name) = req.name {
            merged.name = name.trim().to_string();
        }
        if req.floors.is_some() {
            merged.floors = req.floors;
        }

        self.resources.save(ctx, stored, merged).await
    }

    async fn ensure_no_zones(&self, ctx: &AccessContext, building: &Building) -> Result<(), AppError> {
        let zones: Vec<Zone> = self.resources.list_by_parent(ctx, building.property_id).await?;
        let attached = zones
            .iter()
            .filter(|z| z.building_id == Some(building.id))
            .count();
        if attached > 0 {
            tracing::warn!(
                building_id = %building.id,
                zones = attached,
                "Building move rejected while zones reference it"
            );
            return Err(AppError::conflict(
                "Building still has zones; reassign them before moving it to another property",
            ));
        }
        Ok(())
    }

    pub async fn delete_building(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<Building>(ctx, id).await
    }

    // ==================== Zone ====================

    pub async fn list_zones(&self, ctx: &AccessContext) -> Result<Vec<ZoneResponse>, AppError> {
        let zones: Vec<Zone> = self.resources.list(ctx).await?;
        let cameras: Vec<Camera> = self.resources.list(ctx).await?;

        let mut by_zone: HashMap<Uuid, Vec<Camera>> = HashMap::new();
        for camera in cameras {
            by_zone.entry(camera.zone_id).or_default().push(camera);
        }

        Ok(zones
            .into_iter()
            .map(|zone| ZoneResponse {
                cameras: by_zone.remove(&zone.id).unwrap_or_default(),
                zone,
            })
            .collect())
    }

    pub async fn get_zone(&self, ctx: &AccessContext, id: Uuid) -> Result<ZoneResponse, AppError> {
        let zone: Zone = self.resources.get(ctx, id).await?;
        let cameras = self.resources.list_by_parent(ctx, zone.id).await?;
        Ok(ZoneResponse { zone, cameras })
    }

    /// 区域所在楼栋必须属于同一物业
    async fn check_building(
        &self,
        ctx: &AccessContext,
        building_id: Uuid,
        property_id: Uuid,
    ) -> Result<(), AppError> {
        let building: Building = self.resources.get(ctx, building_id).await?;
        if building.property_id != property_id {
            return Err(AppError::validation(
                "building_id: must belong to the same property as the zone",
            ));
        }
        Ok(())
    }

    pub async fn create_zone(&self, ctx: &AccessContext, req: CreateZoneRequest) -> Result<Zone, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::Zone)?;
        let property: Property = self.resources.get(ctx, req.property_id).await?;
        if let Some(building_id) = req.building_id {
            self.check_building(ctx, building_id, property.id).await?;
        }

        let now = Utc::now();
        self.resources
            .create(Zone {
                id: Uuid::new_v4(),
                property_id: property.id,
                building_id: req.building_id,
                name: req.name.trim().to_string(),
                description: req.description,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn update_zone(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateZoneRequest,
    ) -> Result<Zone, AppError> {
        let stored: Zone = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        if let Some(building_id) = req.building_id {
            if Some(building_id) != stored.building_id {
                self.check_building(ctx, building_id, stored.property_id).await?;
                merged.building_id = Some(building_id);
            }
        }
        if let Some(name) = req.name {
            merged.name = name.trim().to_string();
        }
        if req.description.is_some() {
            merged.description = req.description;
        }

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_zone(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<Zone>(ctx, id).await
    }

    // ==================== Camera ====================

    pub async fn list_cameras(&self, ctx: &AccessContext) -> Result<Vec<Camera>, AppError> {
        self.resources.list(ctx).await
    }

    pub async fn get_camera(&self, ctx: &AccessContext, id: Uuid) -> Result<Camera, AppError> {
        self.resources.get(ctx, id).await
    }

    pub async fn create_camera(
        &self,
        ctx: &AccessContext,
        req: CreateCameraRequest,
    ) -> Result<Camera, AppError> {
        self.resources.authorize_create(ctx, ResourceKind::Camera)?;
        let zone: Zone = self.resources.get(ctx, req.zone_id).await?;

        let now = Utc::now();
        self.resources
            .create(Camera {
                id: Uuid::new_v4(),
                zone_id: zone.id,
                name: req.name.trim().to_string(),
                stream_url: req.stream_url,
                status: req.status,
                model: req.model,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn update_camera(
        &self,
        ctx: &AccessContext,
        id: Uuid,
        req: UpdateCameraRequest,
    ) -> Result<Camera, AppError> {
        let stored: Camera = self.resources.get_for_write(ctx, id).await?;

        let mut merged = stored.clone();
        if let Some(zone_id) = req.zone_id {
            if zone_id != stored.zone_id {
                let zone: Zone = self.resources.get(ctx, zone_id).await?;
                merged.zone_id = zone.id;
            }
        }
        if let Some(name) = req.name {
            merged.name = name.trim().to_string();
        }
        if let Some(stream_url) = req.stream_url {
            merged.stream_url = stream_url;
        }
        if let Some(status) = req.status {
            merged.status = status;
        }
        if req.model.is_some() {
            merged.model = req.model;
        }

        self.resources.save(ctx, stored, merged).await
    }

    pub async fn delete_camera(&self, ctx: &AccessContext, id: Uuid) -> Result<(), AppError> {
        self.resources.delete::<Camera>(ctx, id).await
    }
}
