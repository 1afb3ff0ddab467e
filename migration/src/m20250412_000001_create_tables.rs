use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== TA 表 ====================
        // preferences / confirmed_shifts 以 JSON 文档列存储，
        // 存储层按文档集合方式读写（查找、插入、字段合并更新）
        manager
            .create_table(
                Table::create()
                    .table(Tas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tas::TaId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tas::FirstName).string().not_null())
                    .col(ColumnDef::new(Tas::LastName).string().not_null())
                    .col(ColumnDef::new(Tas::IsTf).boolean().not_null())
                    .col(ColumnDef::new(Tas::LabPerm).integer().not_null())
                    .col(ColumnDef::new(Tas::Preferences).json().not_null())
                    .col(ColumnDef::new(Tas::ConfirmedShifts).json().not_null())
                    .col(ColumnDef::new(Tas::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Tas::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ==================== 排班表 ====================
        // 每个工作日一个 JSON 列，对应文档中按天分组的班次数组，
        // 合并更新时只覆盖请求中出现的列
        manager
            .create_table(
                Table::create()
                    .table(Schedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Schedules::ScheduleId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Schedules::StartIntervalTime)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Schedules::EndIntervalTime)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Schedules::ShiftDuration)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Schedules::State).string().not_null())
                    .col(ColumnDef::new(Schedules::Monday).json().not_null())
                    .col(ColumnDef::new(Schedules::Tuesday).json().not_null())
                    .col(ColumnDef::new(Schedules::Wednesday).json().not_null())
                    .col(ColumnDef::new(Schedules::Thursday).json().not_null())
                    .col(ColumnDef::new(Schedules::Friday).json().not_null())
                    .col(ColumnDef::new(Schedules::Saturday).json().not_null())
                    .col(ColumnDef::new(Schedules::Sunday).json().not_null())
                    .col(ColumnDef::new(Schedules::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Schedules::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tas::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Tas {
    #[sea_orm(iden = "tas")]
    Table,
    TaId,
    FirstName,
    LastName,
    IsTf,
    LabPerm,
    Preferences,
    ConfirmedShifts,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Schedules {
    #[sea_orm(iden = "schedules")]
    Table,
    ScheduleId,
    StartIntervalTime,
    EndIntervalTime,
    ShiftDuration,
    State,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    CreatedAt,
    UpdatedAt,
}
