use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(string(Movies::Id).primary_key())
                    .col(string(Movies::Title))
                    .col(text_null(Movies::Description))
                    .col(integer(Movies::Year))
                    .col(double(Movies::Rating))
                    .col(integer(Movies::Duration))
                    .col(string_null(Movies::Genre))
                    .col(string_null(Movies::Director))
                    .col(string_null(Movies::PosterUrl))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(string(Directors::Id).primary_key())
                    .col(string_uniq(Directors::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actors::Table)
                    .if_not_exists()
                    .col(string(Actors::Id).primary_key())
                    .col(string(Actors::Name))
                    .col(string_null(Actors::BirthDate))
                    .col(string_null(Actors::Nationality))
                    .col(text_null(Actors::Biography))
                    .col(string_null(Actors::ProfileUrl))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieActors::Table)
                    .if_not_exists()
                    .col(string(MovieActors::MovieId))
                    .col(string(MovieActors::ActorId))
                    .col(string_null(MovieActors::CharacterName))
                    .primary_key(
                        Index::create().col(MovieActors::MovieId).col(MovieActors::ActorId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actors_movie")
                            .from(MovieActors::Table, MovieActors::MovieId)
                            .to(Movies::Table, Movies::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actors_actor")
                            .from(MovieActors::Table, MovieActors::ActorId)
                            .to(Actors::Table, Actors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(string(Reviews::Id).primary_key())
                    .col(string(Reviews::MovieId))
                    .col(string(Reviews::UserName))
                    .col(integer(Reviews::Rating).check(Expr::col(Reviews::Rating).between(1, 5)))
                    .col(text_null(Reviews::Comment))
                    .col(big_integer(Reviews::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_movie")
                            .from(Reviews::Table, Reviews::MovieId)
                            .to(Movies::Table, Movies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reviews::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Directors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Description,
    Year,
    Rating,
    Duration,
    Genre,
    Director,
    PosterUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Directors {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Actors {
    Table,
    Id,
    Name,
    BirthDate,
    Nationality,
    Biography,
    ProfileUrl,
}

#[derive(DeriveIden)]
enum MovieActors {
    Table,
    MovieId,
    ActorId,
    CharacterName,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    MovieId,
    UserName,
    Rating,
    Comment,
    CreatedAt,
}
