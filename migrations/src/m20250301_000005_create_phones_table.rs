use sea_orm_migration::prelude::*;

use super::{
    m20250301_000002_create_users_table::Users, m20250301_000003_create_suppliers_table::Suppliers,
    m20250301_000004_create_customers_table::Customers,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Phones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Phones::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Phones::Imei)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Phones::Model).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Phones::PurchasePrice)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Phones::SalePrice).decimal_len(16, 4).null())
                    .col(ColumnDef::new(Phones::SupplyDate).date().not_null())
                    .col(ColumnDef::new(Phones::SaleDate).date().null())
                    .col(
                        ColumnDef::new(Phones::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Phones::ManagerId).integer().null())
                    .col(ColumnDef::new(Phones::SupplierId).integer().null())
                    .col(ColumnDef::new(Phones::CustomerId).integer().null())
                    .col(
                        ColumnDef::new(Phones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Phones::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phones_manager")
                            .from(Phones::Table, Phones::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phones_supplier")
                            .from(Phones::Table, Phones::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phones_customer")
                            .from(Phones::Table, Phones::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phones_status")
                    .table(Phones::Table)
                    .col(Phones::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phones_manager_id")
                    .table(Phones::Table)
                    .col(Phones::ManagerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Phones::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Phones {
    Table,
    Id,
    Imei,
    Model,
    PurchasePrice,
    SalePrice,
    SupplyDate,
    SaleDate,
    Status,
    ManagerId,
    SupplierId,
    CustomerId,
    CreatedAt,
    UpdatedAt,
}
