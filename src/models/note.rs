//! 物业备注模型

use crate::{repository::ScopedRecord, scope::ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::not_blank;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Note {
    pub id: Uuid,
    pub property_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScopedRecord for Note {
    const KIND: ResourceKind = ResourceKind::Note;

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
pub struct CreateNoteRequest {
    pub property_id: Uuid,
    #[validate(length(min = 1, max = 5000, message = "must be 1-5000 characters"), custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 5000, message = "must be 1-5000 characters"), custom(function = "not_blank"))]
    pub content: String,
}
