use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{
        phone::{self, PhoneStatus},
        supplier,
        user, RemovedRecords,
    },
    errors::ServiceError,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Input for registering a phone. Every field is optional so that absent
/// values can be reported together instead of failing on the first one.
#[derive(Debug, Clone, Default)]
pub struct RegisterPhone {
    pub imei: Option<String>,
    pub model: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub supply_date: Option<NaiveDate>,
    pub supplier_id: Option<i32>,
    pub manager_id: Option<i32>,
}

/// A registration whose required fields are all present.
#[derive(Debug)]
struct CompleteRegistration {
    imei: String,
    model: String,
    purchase_price: Decimal,
    supply_date: NaiveDate,
    supplier_id: i32,
    manager_id: i32,
}

impl RegisterPhone {
    /// Field names as callers send them, in request order.
    fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());

        let mut missing = Vec::new();
        if blank(&self.imei) {
            missing.push("imei");
        }
        if blank(&self.model) {
            missing.push("model");
        }
        if self.purchase_price.is_none() {
            missing.push("purchasePrice");
        }
        if self.supply_date.is_none() {
            missing.push("buyDate");
        }
        if self.supplier_id.is_none() {
            missing.push("supplierId");
        }
        if self.manager_id.is_none() {
            missing.push("managerId");
        }
        missing
    }

    fn into_complete(self) -> Result<CompleteRegistration, ServiceError> {
        let missing = self.missing_fields();
        let RegisterPhone {
            imei: Some(imei),
            model: Some(model),
            purchase_price: Some(purchase_price),
            supply_date: Some(supply_date),
            supplier_id: Some(supplier_id),
            manager_id: Some(manager_id),
        } = self
        else {
            return Err(ServiceError::MissingFields(missing));
        };
        if !missing.is_empty() {
            // Present but blank strings.
            return Err(ServiceError::MissingFields(missing));
        }

        if purchase_price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "purchasePrice must be greater than zero".to_string(),
            ));
        }

        Ok(CompleteRegistration {
            imei,
            model,
            purchase_price,
            supply_date,
            supplier_id,
            manager_id,
        })
    }
}

/// Validates and stores new phones.
#[derive(Clone)]
pub struct PhoneRegistry {
    db: Arc<DbPool>,
}

impl PhoneRegistry {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Checks that the caller may register phones at all.
    pub fn authorize(caller: &AuthUser) -> Result<(), ServiceError> {
        if caller.role.can_register_phones() {
            Ok(())
        } else {
            warn!(caller = %caller.user_id, role = %caller.role, "phone registration denied");
            Err(ServiceError::Forbidden(format!(
                "role '{}' cannot register phones",
                caller.role
            )))
        }
    }

    /// Registers a new phone as `active`.
    ///
    /// Checks run in a fixed order so each bad input has one outcome: caller
    /// role, required fields, manager, supplier, then IMEI uniqueness.
    #[instrument(skip(self, caller, input), fields(caller = %caller.user_id))]
    pub async fn register_phone(
        &self,
        caller: &AuthUser,
        input: RegisterPhone,
    ) -> Result<phone::Model, ServiceError> {
        Self::authorize(caller)?;

        let registration = input.into_complete().map_err(|e| {
            warn!(error = %e, "phone registration rejected");
            e
        })?;

        let manager = self.find_manager(registration.manager_id).await?;
        let supplier = self.find_supplier(registration.supplier_id).await?;
        self.ensure_imei_unused(&registration.imei).await?;

        let now = Utc::now();
        let record = phone::ActiveModel {
            imei: Set(registration.imei.clone()),
            model: Set(registration.model),
            purchase_price: Set(registration.purchase_price),
            sale_price: Set(None),
            supply_date: Set(registration.supply_date),
            sale_date: Set(None),
            status: Set(PhoneStatus::Active),
            manager_id: Set(Some(registration.manager_id)),
            supplier_id: Set(Some(registration.supplier_id)),
            customer_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        // A concurrent registration can still win the race; the unique index decides.
        let created = record.insert(&*self.db).await.map_err(|e| {
            let mapped = ServiceError::from_insert_error(
                e,
                format!("a phone with IMEI {} already exists", registration.imei),
            );
            match &mapped {
                ServiceError::Conflict(_) => {
                    warn!(imei = %registration.imei, "duplicate IMEI rejected by store")
                }
                other => error!(error = %other, "failed to store phone"),
            }
            mapped
        })?;

        info!(
            phone_id = created.id,
            imei = %created.imei,
            manager = %manager.full_name(),
            supplier = %supplier.name,
            "phone registered"
        );

        Ok(created)
    }

    /// Users count as managers only if their role can hold phones.
    async fn find_manager(&self, manager_id: i32) -> Result<user::Model, ServiceError> {
        let manager = user::Entity::find_by_id(manager_id)
            .filter(RemovedRecords::Exclude.condition(user::Column::DeletedAt))
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(manager_id, error = %e, "failed to look up manager");
                ServiceError::DatabaseError(e)
            })?;

        manager.filter(|user| user.role.holds_phones()).ok_or_else(|| {
            warn!(manager_id, "manager not found");
            ServiceError::NotFound(format!("manager {} does not exist", manager_id))
        })
    }

    async fn find_supplier(&self, supplier_id: i32) -> Result<supplier::Model, ServiceError> {
        let supplier = supplier::Entity::find_by_id(supplier_id)
            .filter(RemovedRecords::Exclude.condition(supplier::Column::DeletedAt))
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(supplier_id, error = %e, "failed to look up supplier");
                ServiceError::DatabaseError(e)
            })?;

        supplier.ok_or_else(|| {
            warn!(supplier_id, "supplier not found");
            ServiceError::NotFound(format!("supplier {} does not exist", supplier_id))
        })
    }

    /// IMEIs are unique across every status, sold and lost phones included.
    async fn ensure_imei_unused(&self, imei: &str) -> Result<(), ServiceError> {
        let existing = phone::Entity::find()
            .filter(phone::Column::Imei.eq(imei))
            .count(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to check IMEI uniqueness");
                ServiceError::DatabaseError(e)
            })?;

        if existing > 0 {
            warn!(imei, "duplicate IMEI rejected");
            return Err(ServiceError::Conflict(format!(
                "a phone with IMEI {} already exists",
                imei
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;
    use crate::services::testing::{
        caller, migrated_db, seed_manager, seed_phone, seed_supplier, seed_user,
    };
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn request(imei: &str, supplier_id: i32, manager_id: i32) -> RegisterPhone {
        RegisterPhone {
            imei: Some(imei.to_string()),
            model: Some("X1".to_string()),
            purchase_price: Some(dec!(20000)),
            supply_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            supplier_id: Some(supplier_id),
            manager_id: Some(manager_id),
        }
    }

    #[tokio::test]
    async fn registers_active_phone_with_exact_imei() {
        let db = migrated_db().await;
        let supplier = seed_supplier(&db, "Acme", None).await;
        let manager = seed_manager(&db, "Mary", "Major", None).await;
        let registry = PhoneRegistry::new(db.clone());

        let created = registry
            .register_phone(
                &caller(Role::Admin),
                request(" 123456789012345", supplier.id, manager.id),
            )
            .await
            .unwrap();

        assert_eq!(created.status, PhoneStatus::Active);
        assert_eq!(created.imei, " 123456789012345");
        assert_eq!(created.supplier_id, Some(supplier.id));
        assert_eq!(created.manager_id, Some(manager.id));
        assert_eq!(created.purchase_price, dec!(20000));
    }

    #[tokio::test]
    async fn managers_cannot_register() {
        let db = migrated_db().await;
        let registry = PhoneRegistry::new(db);

        let err = registry
            .register_phone(&caller(Role::Manager), RegisterPhone::default())
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::Forbidden(_));
    }

    #[tokio::test]
    async fn missing_fields_are_listed_together() {
        let db = migrated_db().await;
        let registry = PhoneRegistry::new(db);

        let input = RegisterPhone {
            imei: Some("   ".to_string()),
            model: Some("X1".to_string()),
            purchase_price: Some(dec!(10)),
            ..Default::default()
        };
        let err = registry
            .register_phone(&caller(Role::SuperAdmin), input)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::MissingFields(fields) => {
            assert_eq!(fields, vec!["imei", "buyDate", "supplierId", "managerId"]);
        });
    }

    #[test]
    fn blank_text_fields_count_as_missing_when_all_are_present() {
        let mut input = request("  ", 1, 2);
        input.model = Some(String::new());

        let err = input.into_complete().unwrap_err();
        assert_matches!(err, ServiceError::MissingFields(fields) => {
            assert_eq!(fields, vec!["imei", "model"]);
        });
    }

    #[test]
    fn complete_registration_keeps_the_imei_as_given() {
        let complete = request(" 356938035643809", 4, 9).into_complete().unwrap();
        assert_eq!(complete.imei, " 356938035643809");
        assert_eq!(complete.supplier_id, 4);
        assert_eq!(complete.manager_id, 9);
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let db = migrated_db().await;
        let registry = PhoneRegistry::new(db);

        let mut input = request("111", 1, 2);
        input.purchase_price = Some(dec!(0));
        let err = registry
            .register_phone(&caller(Role::Admin), input)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn manager_must_have_manager_role() {
        let db = migrated_db().await;
        let supplier = seed_supplier(&db, "Acme", None).await;
        let admin = seed_user(&db, "Ada", "Admin", Role::Admin, None, None).await;
        let registry = PhoneRegistry::new(db.clone());

        let err = registry
            .register_phone(&caller(Role::Admin), request("222", supplier.id, admin.id))
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::NotFound(msg) => assert!(msg.contains("manager")));
    }

    #[tokio::test]
    async fn manager_is_checked_before_supplier() {
        let db = migrated_db().await;
        let registry = PhoneRegistry::new(db);

        let err = registry
            .register_phone(&caller(Role::Admin), request("333", 404, 405))
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::NotFound(msg) => assert!(msg.contains("manager")));
    }

    #[tokio::test]
    async fn unknown_supplier_is_not_found() {
        let db = migrated_db().await;
        let manager = seed_manager(&db, "Mary", "Major", None).await;
        let registry = PhoneRegistry::new(db.clone());

        let err = registry
            .register_phone(&caller(Role::Admin), request("444", 999, manager.id))
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::NotFound(msg) => assert!(msg.contains("supplier")));
    }

    #[tokio::test]
    async fn removed_supplier_cannot_take_new_phones() {
        let db = migrated_db().await;
        let supplier = seed_supplier(&db, "Gone Ltd", Some(Utc::now())).await;
        assert!(supplier.is_removed());
        let manager = seed_manager(&db, "Mary", "Major", None).await;
        let registry = PhoneRegistry::new(db.clone());

        let err = registry
            .register_phone(&caller(Role::Admin), request("555", supplier.id, manager.id))
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::NotFound(_));
    }

    #[tokio::test]
    async fn duplicate_imei_conflicts_regardless_of_status() {
        let db = migrated_db().await;
        let supplier = seed_supplier(&db, "Acme", None).await;
        let manager = seed_manager(&db, "Mary", "Major", None).await;
        seed_phone(&db, "666", PhoneStatus::Sold, Some(supplier.id), Some(manager.id)).await;
        let registry = PhoneRegistry::new(db.clone());

        let mut input = request("666", supplier.id, manager.id);
        input.model = Some("Another model".to_string());
        let err = registry
            .register_phone(&caller(Role::Admin), input)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn second_registration_of_same_imei_conflicts() {
        let db = migrated_db().await;
        let supplier = seed_supplier(&db, "Acme", None).await;
        let manager = seed_manager(&db, "Mary", "Major", None).await;
        let registry = PhoneRegistry::new(db.clone());

        registry
            .register_phone(&caller(Role::Admin), request("777", supplier.id, manager.id))
            .await
            .unwrap();
        let err = registry
            .register_phone(&caller(Role::Admin), request("777", supplier.id, manager.id))
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::Conflict(_));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
