use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserRestrictions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserDeletions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Foreign keys are resolved through repository lookups, so only the
        // lookup columns get indexes.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_tokens_user_id")
                    .table(UserTokens)
                    .col(crate::entities::user_tokens::Column::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_restrictions_user_id")
                    .table(UserRestrictions)
                    .col(crate::entities::user_restrictions::Column::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_deletions_user_id")
                    .table(UserDeletions)
                    .col(crate::entities::user_deletions::Column::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserDeletions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRestrictions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
