use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_mirror_tables::Migration),
            Box::new(m20240301_000002_create_purchase_order_tables::Migration),
            Box::new(m20240301_000003_create_receipt_tables::Migration),
            Box::new(m20240301_000004_create_special_order_tables::Migration),
            Box::new(m20240301_000005_create_product_serials_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_mirror_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_mirror_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductVariants::Id)
                                .big_integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::InventoryItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductVariants::Sku).string().null())
                        .col(ColumnDef::new(ProductVariants::Title).string().not_null())
                        .col(
                            ColumnDef::new(ProductVariants::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductVariants::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .big_integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Locations::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StaffMembers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StaffMembers::Id)
                                .big_integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StaffMembers::Name).string().not_null())
                        .col(
                            ColumnDef::new(StaffMembers::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StaffMembers::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StaffMembers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ProductVariants {
        Table,
        Id,
        ProductId,
        InventoryItemId,
        Sku,
        Title,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Locations {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StaffMembers {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_purchase_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_purchase_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Name).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::PoType).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::VendorName).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::LocationId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Note).string().null())
                        .col(ColumnDef::new(PurchaseOrders::ShipFrom).string().null())
                        .col(ColumnDef::new(PurchaseOrders::ShipTo).string().null())
                        .col(ColumnDef::new(PurchaseOrders::Discount).decimal().null())
                        .col(ColumnDef::new(PurchaseOrders::Tax).decimal().null())
                        .col(ColumnDef::new(PurchaseOrders::Shipping).decimal().null())
                        .col(ColumnDef::new(PurchaseOrders::Deposited).decimal().null())
                        .col(ColumnDef::new(PurchaseOrders::Paid).decimal().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_name")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::Uuid)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::ProductVariantId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::SpecialOrderLineItemId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::SerialId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLineItems::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_po_line_items_po_uuid")
                        .table(PurchaseOrderLineItems::Table)
                        .col(PurchaseOrderLineItems::PurchaseOrderId)
                        .col(PurchaseOrderLineItems::Uuid)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_po_line_items_special_order")
                        .table(PurchaseOrderLineItems::Table)
                        .col(PurchaseOrderLineItems::SpecialOrderLineItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_po_line_items_serial")
                        .table(PurchaseOrderLineItems::Table)
                        .col(PurchaseOrderLineItems::SerialId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderCustomFields::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderCustomFields::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderCustomFields::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderCustomFields::Key)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderCustomFields::Value)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LineItemCustomFields::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LineItemCustomFields::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LineItemCustomFields::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LineItemCustomFields::LineItemUuid)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LineItemCustomFields::Key)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(LineItemCustomFields::Value)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderEmployeeAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderEmployeeAssignments::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderEmployeeAssignments::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderEmployeeAssignments::StaffMemberId)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(PurchaseOrderEmployeeAssignments::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(LineItemCustomFields::Table).to_owned())
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(PurchaseOrderCustomFields::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(
                    Table::drop()
                        .table(PurchaseOrderLineItems::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum PurchaseOrders {
        Table,
        Id,
        Name,
        Status,
        PoType,
        VendorName,
        LocationId,
        Note,
        ShipFrom,
        ShipTo,
        Discount,
        Tax,
        Shipping,
        Deposited,
        Paid,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum PurchaseOrderLineItems {
        Table,
        Id,
        PurchaseOrderId,
        Uuid,
        ProductVariantId,
        Quantity,
        UnitCost,
        SpecialOrderLineItemId,
        SerialId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum PurchaseOrderCustomFields {
        Table,
        Id,
        PurchaseOrderId,
        Key,
        Value,
    }

    #[derive(Iden)]
    enum LineItemCustomFields {
        Table,
        Id,
        PurchaseOrderId,
        LineItemUuid,
        Key,
        Value,
    }

    #[derive(Iden)]
    enum PurchaseOrderEmployeeAssignments {
        Table,
        Id,
        PurchaseOrderId,
        StaffMemberId,
    }
}

mod m20240301_000003_create_receipt_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_receipt_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Receipts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Receipts::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Receipts::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Receipts::Name).string().not_null())
                        .col(ColumnDef::new(Receipts::Status).string().not_null())
                        .col(ColumnDef::new(Receipts::Description).string().null())
                        .col(ColumnDef::new(Receipts::ReceivedAt).timestamp().not_null())
                        .col(ColumnDef::new(Receipts::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Receipts::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_receipts_po_name")
                        .table(Receipts::Table)
                        .col(Receipts::PurchaseOrderId)
                        .col(Receipts::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReceiptLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptLineItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::ReceiptId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::PurchaseOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::LineItemUuid)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_receipt_line_items_po_uuid")
                        .table(ReceiptLineItems::Table)
                        .col(ReceiptLineItems::PurchaseOrderId)
                        .col(ReceiptLineItems::LineItemUuid)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceiptLineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Receipts::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Receipts {
        Table,
        Id,
        PurchaseOrderId,
        Name,
        Status,
        Description,
        ReceivedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ReceiptLineItems {
        Table,
        Id,
        ReceiptId,
        PurchaseOrderId,
        LineItemUuid,
        Quantity,
    }
}

mod m20240301_000004_create_special_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_special_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SpecialOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SpecialOrders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SpecialOrders::Name).string().not_null())
                        .col(
                            ColumnDef::new(SpecialOrders::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialOrders::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_special_orders_name")
                        .table(SpecialOrders::Table)
                        .col(SpecialOrders::Name)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SpecialOrderLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SpecialOrderLineItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialOrderLineItems::SpecialOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialOrderLineItems::Uuid)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialOrderLineItems::ProductVariantId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SpecialOrderLineItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_special_order_line_items_so_uuid")
                        .table(SpecialOrderLineItems::Table)
                        .col(SpecialOrderLineItems::SpecialOrderId)
                        .col(SpecialOrderLineItems::Uuid)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(SpecialOrderLineItems::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(SpecialOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum SpecialOrders {
        Table,
        Id,
        Name,
        LocationId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum SpecialOrderLineItems {
        Table,
        Id,
        SpecialOrderId,
        Uuid,
        ProductVariantId,
        Quantity,
    }
}

mod m20240301_000005_create_product_serials_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_product_serials_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductSerials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductSerials::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductSerials::ProductVariantId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductSerials::Serial).string().not_null())
                        .col(
                            ColumnDef::new(ProductSerials::LocationId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductSerials::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductSerials::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_serials_variant_serial")
                        .table(ProductSerials::Table)
                        .col(ProductSerials::ProductVariantId)
                        .col(ProductSerials::Serial)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductSerials::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum ProductSerials {
        Table,
        Id,
        ProductVariantId,
        Serial,
        LocationId,
        CreatedAt,
        UpdatedAt,
    }
}
