//! Database entities for the phone inventory.

use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::{ColumnTrait, Condition, RelationDef};

pub mod customer;
pub mod phone;
pub mod region;
pub mod supplier;
pub mod user;

/// Whether logically removed rows (those with `deleted_at` set) take part
/// in a query. Nothing is filtered implicitly; callers pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovedRecords {
    Exclude,
    Include,
}

impl RemovedRecords {
    /// Filter for a query on the entity that owns `deleted_at`.
    pub fn condition<C: ColumnTrait>(self, deleted_at: C) -> Condition {
        match self {
            RemovedRecords::Include => Condition::all(),
            RemovedRecords::Exclude => Condition::all().add(deleted_at.is_null()),
        }
    }

    /// Narrows a join onto an entity with a `deleted_at` column.
    pub fn scope_join<C>(self, relation: RelationDef, deleted_at: C) -> RelationDef
    where
        C: ColumnTrait + Send + Sync + 'static,
    {
        match self {
            RemovedRecords::Include => relation,
            RemovedRecords::Exclude => relation.on_condition(move |_left, right| {
                Expr::col((right, deleted_at)).is_null().into_condition()
            }),
        }
    }
}
