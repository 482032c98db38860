use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_account_tables::Migration),
            Box::new(m20240101_000002_create_catalog_tables::Migration),
            Box::new(m20240101_000003_create_coupons_table::Migration),
            Box::new(m20240101_000004_create_orders_tables::Migration),
            Box::new(m20240101_000005_create_contact_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_account_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_account_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Customer accounts
            manager
                .create_table(
                    Table::create()
                        .table(Profile::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Profile::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Profile::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Profile::Email)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Profile::Phone).string_len(32).null())
                        .col(ColumnDef::new(Profile::Password).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Profile::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            // Admin accounts
            manager
                .create_table(
                    Table::create()
                        .table(User::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(User::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(User::Name).string_len(255).not_null())
                        .col(
                            ColumnDef::new(User::Email)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(User::Phone).string_len(32).null())
                        .col(ColumnDef::new(User::Password).string_len(255).not_null())
                        .col(
                            ColumnDef::new(User::Status)
                                .string_len(16)
                                .not_null()
                                .default("inactive"),
                        )
                        .col(
                            ColumnDef::new(User::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(User::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Profile::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Profile {
        Table,
        Id,
        Name,
        Email,
        Phone,
        Password,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum User {
        Table,
        Id,
        Name,
        Email,
        Phone,
        Password,
        Status,
        CreatedAt,
    }
}

mod m20240101_000002_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Category tiles used for top-level navigation
            manager
                .create_table(
                    Table::create()
                        .table(Main::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Main::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Main::Category).string_len(255).not_null())
                        .col(ColumnDef::new(Main::SubCategory).string_len(255).null())
                        .col(ColumnDef::new(Main::Icon).string_len(512).null())
                        .col(ColumnDef::new(Main::Path).string_len(255).null())
                        .col(
                            ColumnDef::new(Main::Status)
                                .string_len(16)
                                .not_null()
                                .default("Active"),
                        )
                        .col(
                            ColumnDef::new(Main::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            // Bookable offerings
            manager
                .create_table(
                    Table::create()
                        .table(Services::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Services::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Services::ServiceCode)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Services::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Services::Description).text().null())
                        .col(ColumnDef::new(Services::Icon).string_len(512).null())
                        .col(
                            ColumnDef::new(Services::Price)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Services::Category).string_len(255).not_null())
                        .col(ColumnDef::new(Services::SubCategory).string_len(255).null())
                        .col(ColumnDef::new(Services::Image).string_len(512).null())
                        .col(ColumnDef::new(Services::Features).json().null())
                        .col(ColumnDef::new(Services::Requirements).json().null())
                        .col(ColumnDef::new(Services::Exclusions).json().null())
                        .col(ColumnDef::new(Services::Pricetable).json().null())
                        .col(
                            ColumnDef::new(Services::Popular)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Services::WhatsappMessage).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_services_category")
                        .table(Services::Table)
                        .col(Services::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Services::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Main::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Main {
        Table,
        Id,
        Category,
        #[sea_orm(iden = "subCategory")]
        SubCategory,
        Icon,
        Path,
        Status,
        #[sea_orm(iden = "createdAt")]
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Services {
        Table,
        Id,
        ServiceCode,
        Name,
        Description,
        Icon,
        Price,
        Category,
        #[sea_orm(iden = "subCategory")]
        SubCategory,
        Image,
        Features,
        Requirements,
        Exclusions,
        Pricetable,
        Popular,
        WhatsappMessage,
    }
}

mod m20240101_000003_create_coupons_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_coupons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Coupons::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Coupons::Code)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Coupons::Discount)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::Expiry)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidFrom)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidUntil)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Coupons::MaxUses).integer().null())
                        .col(
                            ColumnDef::new(Coupons::CurrentUses)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Coupons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Coupons {
        Table,
        Id,
        Code,
        Discount,
        Expiry,
        ValidFrom,
        ValidUntil,
        IsActive,
        MaxUses,
        CurrentUses,
        CreatedAt,
    }
}

mod m20240101_000004_create_orders_tables {
    use super::m20240101_000001_create_account_tables::Profile;
    use super::m20240101_000003_create_coupons_table::Coupons;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::OrderId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::ProfileId).integer().null())
                        .col(ColumnDef::new(Orders::GuestEmail).string_len(255).null())
                        .col(ColumnDef::new(Orders::GuestPhone).string_len(32).null())
                        .col(ColumnDef::new(Orders::FirstName).string_len(255).not_null())
                        .col(ColumnDef::new(Orders::LastName).string_len(255).null())
                        .col(ColumnDef::new(Orders::Email).string_len(255).not_null())
                        .col(ColumnDef::new(Orders::Phone).string_len(32).not_null())
                        .col(ColumnDef::new(Orders::Address).text().not_null())
                        .col(ColumnDef::new(Orders::City).string_len(128).not_null())
                        .col(ColumnDef::new(Orders::State).string_len(128).null())
                        .col(ColumnDef::new(Orders::Pincode).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Orders::PaymentMethod)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::Subtotal)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::ConvenienceFee)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Discount)
                                .decimal_len(10, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Total).decimal_len(10, 2).not_null())
                        .col(ColumnDef::new(Orders::CouponId).integer().null())
                        .col(ColumnDef::new(Orders::ServiceDate).date().null())
                        .col(ColumnDef::new(Orders::TimeSlot).string_len(64).null())
                        .col(ColumnDef::new(Orders::Notes).text().null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(50)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_profile")
                                .from(Orders::Table, Orders::ProfileId)
                                .to(Profile::Table, Profile::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_coupon")
                                .from(Orders::Table, Orders::CouponId)
                                .to(Coupons::Table, Coupons::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::ProductId)
                                .string_len(64)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::ProductName)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::OrderId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_profile_id")
                        .table(Orders::Table)
                        .col(Orders::ProfileId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Orders {
        Table,
        OrderId,
        OrderNumber,
        ProfileId,
        GuestEmail,
        GuestPhone,
        FirstName,
        LastName,
        Email,
        Phone,
        Address,
        City,
        State,
        Pincode,
        PaymentMethod,
        Subtotal,
        ConvenienceFee,
        Discount,
        Total,
        CouponId,
        ServiceDate,
        TimeSlot,
        Notes,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        ProductName,
        Quantity,
        Price,
    }
}

mod m20240101_000005_create_contact_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_contact_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ContactUs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ContactUs::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ContactUs::Name).string_len(255).not_null())
                        .col(ColumnDef::new(ContactUs::Email).string_len(255).not_null())
                        .col(ColumnDef::new(ContactUs::Subject).string_len(255).not_null())
                        .col(ColumnDef::new(ContactUs::Message).text().not_null())
                        .col(
                            ColumnDef::new(ContactUs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ContactUs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum ContactUs {
        Table,
        Id,
        Name,
        Email,
        Subject,
        Message,
        CreatedAt,
    }
}
