use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub contact: String,
    pub created_at: DateTimeUtc,
    /// Set when the supplier is logically removed. Removed suppliers keep
    /// their row so that phones supplied by them still resolve a name.
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::phone::Entity")]
    Phones,
}

impl Related<super::phone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_removed(&self) -> bool {
        self.deleted_at.is_some()
    }
}
