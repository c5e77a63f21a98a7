use crate::{
    db::DbPool,
    entities::{
        phone::{self, PhoneStatus},
        region, supplier, user, RemovedRecords,
    },
    errors::ServiceError,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

pub const NO_SUPPLIER: &str = "No supplier assigned";
pub const NO_MANAGER: &str = "No manager assigned";
pub const NO_LOCATION: &str = "No location assigned";

const FIRST_PAGE: u64 = 1;

/// Largest offset or limit the store accepts (a signed 64-bit integer).
const MAX_WINDOW: u64 = i64::MAX as u64;

/// A validated page window. Pages are 1-indexed and the window's offset
/// and limit always fit the store's integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
    offset: u64,
}

impl PageRequest {
    /// Absent values fall back to defaults; present values must be positive
    /// integers whose window the store can address.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u64,
    ) -> Result<Self, ServiceError> {
        let page = match page {
            None => FIRST_PAGE,
            Some(raw) => parse_positive(raw)?,
        };
        let limit = match limit {
            None => default_limit,
            Some(raw) => parse_positive(raw)?,
        };
        Self::new(page, limit)
    }

    pub fn new(page: u64, limit: u64) -> Result<Self, ServiceError> {
        if page == 0 || limit == 0 || limit > MAX_WINDOW {
            return Err(invalid_pagination());
        }
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| *offset <= MAX_WINDOW)
            .ok_or_else(|| {
                warn!(page, limit, "pagination window out of range");
                invalid_pagination()
            })?;
        Ok(Self {
            page,
            limit,
            offset,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

fn parse_positive(raw: &str) -> Result<u64, ServiceError> {
    raw.parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| {
            warn!(value = raw, "rejected pagination parameter");
            invalid_pagination()
        })
}

fn invalid_pagination() -> ServiceError {
    ServiceError::ValidationError("invalid pagination parameters".to_string())
}

/// Raw joined row, before sentinels are applied.
#[derive(Debug, FromQueryResult)]
struct PhoneRow {
    imei: String,
    model: String,
    purchase_price: Decimal,
    supply_date: NaiveDate,
    status: PhoneStatus,
    supplier_name: Option<String>,
    manager_first_name: Option<String>,
    manager_last_name: Option<String>,
    manager_location: Option<String>,
    created_at: DateTime<Utc>,
}

/// Flat, display-ready view of a phone.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneListItem {
    pub imei: String,
    pub model: String,
    #[schema(value_type = String, example = "20000")]
    pub purchase_price: Decimal,
    pub buy_date: NaiveDate,
    pub status: PhoneStatus,
    pub supplier_name: String,
    pub manager_name: String,
    pub manager_location: String,
    pub created_at: DateTime<Utc>,
}

impl From<PhoneRow> for PhoneListItem {
    fn from(row: PhoneRow) -> Self {
        let manager_name = match (row.manager_first_name, row.manager_last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name,
            (None, None) => NO_MANAGER.to_string(),
        };

        Self {
            imei: row.imei,
            model: row.model,
            purchase_price: row.purchase_price,
            buy_date: row.supply_date,
            status: row.status,
            supplier_name: row.supplier_name.unwrap_or_else(|| NO_SUPPLIER.to_string()),
            manager_name,
            manager_location: row
                .manager_location
                .unwrap_or_else(|| NO_LOCATION.to_string()),
            created_at: row.created_at,
        }
    }
}

/// One page of phones plus the count of all matching phones.
#[derive(Debug, Clone)]
pub struct PhonePage {
    pub items: Vec<PhoneListItem>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl PhonePage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Read side of the phone inventory.
#[derive(Clone)]
pub struct PhoneQueryService {
    db: Arc<DbPool>,
    default_page_size: u64,
}

impl PhoneQueryService {
    pub fn new(db: Arc<DbPool>, default_page_size: u64) -> Self {
        Self {
            db,
            default_page_size,
        }
    }

    /// Lists phones in `status` (all phones when `None`), one page at a time.
    /// Pagination is validated before the store is touched.
    #[instrument(skip(self))]
    pub async fn list_by_status(
        &self,
        status: Option<PhoneStatus>,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<PhonePage, ServiceError> {
        let window = PageRequest::parse(page, limit, self.default_page_size)?;
        self.fetch_page(status, window).await
    }

    pub async fn fetch_page(
        &self,
        status: Option<PhoneStatus>,
        window: PageRequest,
    ) -> Result<PhonePage, ServiceError> {
        let db = &*self.db;

        let mut matching = phone::Entity::find();
        if let Some(status) = status {
            matching = matching.filter(phone::Column::Status.eq(status));
        }

        let total = matching.clone().count(db).await.map_err(|e| {
            error!(?status, error = %e, "failed to count phones");
            ServiceError::DatabaseError(e)
        })?;

        let rows = Self::projection(matching, RemovedRecords::Include)
            .order_by_asc(phone::Column::Id)
            .offset(window.offset())
            .limit(window.limit())
            .into_model::<PhoneRow>()
            .all(db)
            .await
            .map_err(|e| {
                error!(
                    ?status,
                    page = window.page(),
                    limit = window.limit(),
                    error = %e,
                    "failed to fetch phones"
                );
                ServiceError::DatabaseError(e)
            })?;

        debug!(?status, total, returned = rows.len(), "fetched phones");

        Ok(PhonePage {
            items: rows.into_iter().map(PhoneListItem::from).collect(),
            total,
            page: window.page,
            limit: window.limit,
        })
    }

    /// Phones joined with supplier, manager and the manager's region.
    fn projection(query: Select<phone::Entity>, removed: RemovedRecords) -> Select<phone::Entity> {
        query
            .select_only()
            .columns([
                phone::Column::Imei,
                phone::Column::Model,
                phone::Column::PurchasePrice,
                phone::Column::SupplyDate,
                phone::Column::Status,
                phone::Column::CreatedAt,
            ])
            .column_as(supplier::Column::Name, "supplier_name")
            .column_as(user::Column::FirstName, "manager_first_name")
            .column_as(user::Column::LastName, "manager_last_name")
            .column_as(region::Column::Location, "manager_location")
            .join(
                JoinType::LeftJoin,
                removed.scope_join(phone::Relation::Supplier.def(), supplier::Column::DeletedAt),
            )
            .join(
                JoinType::LeftJoin,
                removed.scope_join(phone::Relation::Manager.def(), user::Column::DeletedAt),
            )
            .join(JoinType::LeftJoin, user::Relation::Region.def())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{
        migrated_db, seed_manager, seed_phone, seed_region, seed_supplier,
    };
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, 10)]
    #[case(Some("3"), None, 3, 10)]
    #[case(None, Some("25"), 1, 25)]
    #[case(Some("2"), Some("5"), 2, 5)]
    fn pagination_defaults_apply_only_when_absent(
        #[case] page: Option<&str>,
        #[case] limit: Option<&str>,
        #[case] expected_page: u64,
        #[case] expected_limit: u64,
    ) {
        let window = PageRequest::parse(page, limit, 10).unwrap();
        assert_eq!(window.page, expected_page);
        assert_eq!(window.limit, expected_limit);
    }

    #[rstest]
    #[case(Some("0"), None)]
    #[case(None, Some("-1"))]
    #[case(Some(""), None)]
    #[case(Some("two"), None)]
    #[case(None, Some("1.5"))]
    fn malformed_pagination_is_rejected(#[case] page: Option<&str>, #[case] limit: Option<&str>) {
        let err = PageRequest::parse(page, limit, 10).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) => {
            assert_eq!(msg, "invalid pagination parameters");
        });
    }

    #[test]
    fn offset_is_zero_based() {
        let window = PageRequest::new(2, 10).unwrap();
        assert_eq!(window.offset(), 10);
    }

    #[rstest]
    #[case("9223372036854775807", "1")]
    #[case("1", "9223372036854775807")]
    #[case("4611686018427387904", "2")]
    fn largest_addressable_windows_are_accepted(#[case] page: &str, #[case] limit: &str) {
        let window = PageRequest::parse(Some(page), Some(limit), 10).unwrap();
        assert!(window.offset() <= i64::MAX as u64);
        assert!(window.limit() <= i64::MAX as u64);
    }

    #[rstest]
    #[case(Some("9223372036854775807"), Some("2"))]
    #[case(None, Some("9223372036854775808"))]
    #[case(None, Some("18446744073709551615"))]
    #[case(Some("18446744073709551615"), Some("18446744073709551615"))]
    #[case(Some("18446744073709551616"), None)]
    fn windows_beyond_the_store_range_are_rejected(
        #[case] page: Option<&str>,
        #[case] limit: Option<&str>,
    ) {
        let err = PageRequest::parse(page, limit, 10).unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) => {
            assert_eq!(msg, "invalid pagination parameters");
        });
    }

    #[tokio::test]
    async fn pagination_is_validated_before_the_store() {
        // No migrations: any query would fail with a database error.
        let db = Arc::new(crate::db::establish_connection("sqlite::memory:").await.unwrap());
        let service = PhoneQueryService::new(db, 10);

        let err = service
            .list_by_status(Some(PhoneStatus::Active), Some("0"), None)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));

        let err = service
            .list_by_status(Some(PhoneStatus::Active), None, Some("-1"))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn store_failures_surface_as_database_errors() {
        let db = Arc::new(crate::db::establish_connection("sqlite::memory:").await.unwrap());
        let service = PhoneQueryService::new(db, 10);

        let err = service
            .list_by_status(Some(PhoneStatus::Active), None, None)
            .await
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn empty_status_is_an_empty_page() {
        let db = migrated_db().await;
        seed_phone(&db, "1", PhoneStatus::Active, None, None).await;
        let service = PhoneQueryService::new(db, 10);

        let page = service
            .list_by_status(Some(PhoneStatus::Sold), None, None)
            .await
            .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn second_page_holds_items_eleven_to_twenty() {
        let db = migrated_db().await;
        for n in 1..=25 {
            seed_phone(&db, &format!("IMEI-{:02}", n), PhoneStatus::Active, None, None).await;
            if n % 5 == 0 {
                seed_phone(&db, &format!("LOST-{:02}", n), PhoneStatus::Lost, None, None).await;
            }
        }
        let service = PhoneQueryService::new(db, 10);

        let page = service
            .list_by_status(Some(PhoneStatus::Active), Some("2"), Some("10"))
            .await
            .unwrap();

        let imeis: Vec<String> = page.items.iter().map(|item| item.imei.clone()).collect();
        let expected: Vec<String> = (11..=20).map(|n| format!("IMEI-{:02}", n)).collect();
        assert_eq!(imeis, expected);
        assert_eq!(page.total, 25);
        assert!(page
            .items
            .iter()
            .all(|item| item.status == PhoneStatus::Active));
    }

    #[tokio::test]
    async fn no_status_matches_every_phone() {
        let db = migrated_db().await;
        seed_phone(&db, "A", PhoneStatus::Active, None, None).await;
        seed_phone(&db, "B", PhoneStatus::Reconcile, None, None).await;
        let service = PhoneQueryService::new(db, 10);

        let page = service.list_by_status(None, None, None).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn joins_resolve_names_and_location() {
        let db = migrated_db().await;
        let region = seed_region(&db, "Central", "Nairobi CBD").await;
        let supplier = seed_supplier(&db, "Acme Phones", None).await;
        let manager = seed_manager(&db, "Mary", "Major", Some(region.id)).await;
        seed_phone(
            &db,
            "123",
            PhoneStatus::Suspended,
            Some(supplier.id),
            Some(manager.id),
        )
        .await;
        let service = PhoneQueryService::new(db, 10);

        let page = service
            .list_by_status(Some(PhoneStatus::Suspended), None, None)
            .await
            .unwrap();

        let item = &page.items[0];
        assert_eq!(item.supplier_name, "Acme Phones");
        assert_eq!(item.manager_name, "Mary Major");
        assert_eq!(item.manager_location, "Nairobi CBD");
    }

    #[tokio::test]
    async fn removed_supplier_and_manager_still_resolve() {
        let db = migrated_db().await;
        let region = seed_region(&db, "Coast", "Mombasa").await;
        let supplier = seed_supplier(&db, "Old Supplier", Some(Utc::now())).await;
        let manager = seed_manager(&db, "Former", "Manager", Some(region.id)).await;
        crate::services::testing::remove_user(&db, manager.id).await;
        seed_phone(&db, "999", PhoneStatus::Lost, Some(supplier.id), Some(manager.id)).await;
        let service = PhoneQueryService::new(db, 10);

        let page = service
            .list_by_status(Some(PhoneStatus::Lost), None, None)
            .await
            .unwrap();

        let item = &page.items[0];
        assert_eq!(item.supplier_name, "Old Supplier");
        assert_eq!(item.manager_name, "Former Manager");
        assert_eq!(item.manager_location, "Mombasa");
    }

    #[tokio::test]
    async fn missing_references_fall_back_to_sentinels() {
        let db = migrated_db().await;
        let manager = seed_manager(&db, "No", "Region", None).await;
        seed_phone(&db, "S1", PhoneStatus::Sold, None, None).await;
        seed_phone(&db, "S2", PhoneStatus::Sold, None, Some(manager.id)).await;
        let service = PhoneQueryService::new(db, 10);

        let page = service
            .list_by_status(Some(PhoneStatus::Sold), None, None)
            .await
            .unwrap();

        assert_eq!(page.items[0].supplier_name, NO_SUPPLIER);
        assert_eq!(page.items[0].manager_name, NO_MANAGER);
        assert_eq!(page.items[0].manager_location, NO_LOCATION);
        assert_eq!(page.items[1].manager_name, "No Region");
        assert_eq!(page.items[1].manager_location, NO_LOCATION);
    }
}
