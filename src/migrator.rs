use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_order_book_table::Migration),
            Box::new(m20240601_000002_create_plan_table::Migration),
            Box::new(m20240601_000003_create_production_table::Migration),
            Box::new(m20240601_000004_create_product_table::Migration),
            Box::new(m20240601_000005_create_users_table::Migration),
        ]
    }
}

mod m20240601_000001_create_order_book_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_order_book_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderBook::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderBook::OrderId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderBook::OrderDate).date().null())
                        .col(ColumnDef::new(OrderBook::CustomerName).string().null())
                        .col(ColumnDef::new(OrderBook::CustomerId).integer().null())
                        .col(ColumnDef::new(OrderBook::Product).string().null())
                        .col(
                            ColumnDef::new(OrderBook::OrderQty)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(OrderBook::OrderQty).gte(0)),
                        )
                        .col(ColumnDef::new(OrderBook::OrderPriority).string().null())
                        .col(ColumnDef::new(OrderBook::ExpDeliveryDate).date().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderBook::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderBook {
        Table,
        OrderId,
        OrderDate,
        CustomerName,
        CustomerId,
        Product,
        OrderQty,
        OrderPriority,
        ExpDeliveryDate,
    }
}

mod m20240601_000002_create_plan_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_plan_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PlanTable::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PlanTable::PlanId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(PlanTable::Location).string().null())
                        .col(ColumnDef::new(PlanTable::Unit).string().null())
                        .col(ColumnDef::new(PlanTable::StartDate).date().null())
                        .col(ColumnDef::new(PlanTable::McNo).string().null())
                        .col(ColumnDef::new(PlanTable::Status).string().null())
                        .col(ColumnDef::new(PlanTable::CustomerName).string().null())
                        .col(ColumnDef::new(PlanTable::Code).string().null())
                        .col(
                            ColumnDef::new(PlanTable::TargetQty)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(PlanTable::TargetQty).gte(0)),
                        )
                        .col(ColumnDef::new(PlanTable::OrderId).integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_plan_table_order_id")
                                .from(PlanTable::Table, PlanTable::OrderId)
                                .to(OrderBook::Table, OrderBook::OrderId)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_plan_table_order_id")
                        .table(PlanTable::Table)
                        .col(PlanTable::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PlanTable::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PlanTable {
        Table,
        PlanId,
        Location,
        Unit,
        StartDate,
        McNo,
        Status,
        CustomerName,
        Code,
        TargetQty,
        OrderId,
    }

    #[derive(DeriveIden)]
    enum OrderBook {
        Table,
        OrderId,
    }
}

mod m20240601_000003_create_production_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_production_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Production::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Production::ProductionId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Production::PlanId).integer().not_null())
                        .col(ColumnDef::new(Production::ProductionDate).date().not_null())
                        .col(ColumnDef::new(Production::Shift).string().null())
                        .col(ColumnDef::new(Production::MachineNumber).string().null())
                        .col(ColumnDef::new(Production::Code).string().null())
                        .col(
                            ColumnDef::new(Production::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(Production::Quantity).gt(0)),
                        )
                        .col(ColumnDef::new(Production::SlipType).string().null())
                        .col(ColumnDef::new(Production::Remarks).string().null())
                        .col(ColumnDef::new(Production::OperatorName).string().null())
                        .col(ColumnDef::new(Production::InChargeName).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_plan_id")
                                .from(Production::Table, Production::PlanId)
                                .to(PlanTable::Table, PlanTable::PlanId)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_plan_id")
                        .table(Production::Table)
                        .col(Production::PlanId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_date_shift")
                        .table(Production::Table)
                        .col(Production::ProductionDate)
                        .col(Production::Shift)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Production::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Production {
        Table,
        ProductionId,
        PlanId,
        ProductionDate,
        Shift,
        MachineNumber,
        Code,
        Quantity,
        SlipType,
        Remarks,
        OperatorName,
        InChargeName,
    }

    #[derive(DeriveIden)]
    enum PlanTable {
        Table,
        PlanId,
    }
}

mod m20240601_000004_create_product_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_product_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Product::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Product::ProductId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Product::ItemCode)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Product::Model).string().null())
                        .col(ColumnDef::new(Product::Material).string().null())
                        .col(ColumnDef::new(Product::WireDia).string().null())
                        .col(ColumnDef::new(Product::BallDia).string().null())
                        .col(ColumnDef::new(Product::BallType).string().null())
                        .col(ColumnDef::new(Product::TipLength).string().null())
                        .col(ColumnDef::new(Product::TipType).string().null())
                        .col(ColumnDef::new(Product::BallRoughness).string().null())
                        .col(ColumnDef::new(Product::Ink).string().null())
                        .col(ColumnDef::new(Product::Ild).string().null())
                        .col(ColumnDef::new(Product::TestParameter).string().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Product::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Product {
        Table,
        ProductId,
        ItemCode,
        Model,
        Material,
        WireDia,
        BallDia,
        BallType,
        TipLength,
        TipType,
        BallRoughness,
        Ink,
        Ild,
        TestParameter,
    }
}

mod m20240601_000005_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        CreatedAt,
    }
}
