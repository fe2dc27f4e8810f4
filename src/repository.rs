use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::debug;

use crate::{
    entities::{actor, movie, movie_actor, review},
    error::{AppError, AppResult, DbResultExt},
    models::{
        Actor, ActorInput, Movie, MovieFilter, MovieInput, MovieWithDetailsInput, PageRequest,
        Review, ReviewCreateInput, ReviewInput, non_blank, now_micros,
    },
};

#[derive(Clone, Debug)]
pub struct MovieRepository {
    db: DatabaseConnection,
}

impl MovieRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_movie(&self, id: &str) -> AppResult<Movie> {
        movie::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .context("query movie")?
            .map(Movie::from)
            .ok_or_else(|| AppError::NotFound(format!("movie {id}")))
    }

    pub async fn movie_exists(&self, id: &str) -> AppResult<bool> {
        let count = movie::Entity::find()
            .filter(movie::Column::Id.eq(id))
            .count(&self.db)
            .await
            .context("query movie")?;
        Ok(count > 0)
    }

    pub async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Movie>, u64)> {
        self.paged(movie::Entity::find().filter(filter_condition(filter)), page).await
    }

    /// A blank query matches every movie.
    pub async fn search_movies(&self, query: &str, page: PageRequest) -> AppResult<(Vec<Movie>, u64)> {
        let cond = Condition::all().add_option(non_blank(Some(query)).map(|q| {
            Condition::any()
                .add(movie::Column::Title.contains(q))
                .add(movie::Column::Description.contains(q))
                .add(movie::Column::Director.contains(q))
                .add(movie::Column::Genre.contains(q))
        }));
        self.paged(movie::Entity::find().filter(cond), page).await
    }

    async fn paged(
        &self,
        select: Select<movie::Entity>,
        page: PageRequest,
    ) -> AppResult<(Vec<Movie>, u64)> {
        let total = select.clone().count(&self.db).await.context("count movies")?;

        let rows = select
            .order_by_desc(movie::Column::CreatedAt)
            .order_by_asc(movie::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.db)
            .await
            .context("query movies")?;

        debug!(total = total, returned = rows.len(), page = page.page, "movies page loaded");

        Ok((rows.into_iter().map(Movie::from).collect(), total))
    }

    pub async fn actors_for_movie(&self, movie_id: &str) -> AppResult<Vec<Actor>> {
        let rows = actor::Entity::find()
            .inner_join(movie_actor::Entity)
            .filter(movie_actor::Column::MovieId.eq(movie_id))
            .order_by_asc(actor::Column::Name)
            .all(&self.db)
            .await
            .context("query actors for movie")?;
        Ok(rows.into_iter().map(Actor::from).collect())
    }

    pub async fn reviews_for_movie(&self, movie_id: &str) -> AppResult<Vec<Review>> {
        let rows = review::Entity::find()
            .filter(review::Column::MovieId.eq(movie_id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await
            .context("query reviews for movie")?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    pub async fn get_review(&self, id: &str) -> AppResult<Review> {
        review::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .context("query review")?
            .map(Review::from)
            .ok_or_else(|| AppError::NotFound(format!("review {id}")))
    }

    /// Inserts a movie and returns its generated id.
    pub async fn create_movie(&self, input: &MovieInput) -> AppResult<String> {
        let id = new_id();
        insert_movie(&self.db, &id, input).await?;
        Ok(id)
    }

    /// Overwrites every editable column. Returns false when no movie has `id`.
    pub async fn update_movie(&self, id: &str, input: &MovieInput) -> AppResult<bool> {
        let changes = movie::ActiveModel {
            id: NotSet,
            title: Set(input.title.clone()),
            description: Set(input.description.clone()),
            year: Set(input.year),
            rating: Set(input.rating),
            duration: Set(input.duration),
            genre: Set(input.genre.clone()),
            director: Set(input.director.clone()),
            poster_url: Set(input.poster_url.clone()),
            created_at: NotSet,
            updated_at: Set(now_micros()),
        };

        let res = movie::Entity::update_many()
            .set(changes)
            .filter(movie::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("update movie")?;

        Ok(res.rows_affected > 0)
    }

    /// Removes the movie with its actor links and reviews in one transaction.
    /// Returns whether a movie row was removed.
    pub async fn delete_movie(&self, id: &str) -> AppResult<bool> {
        let txn = self.db.begin().await.context("begin movie deletion")?;

        movie_actor::Entity::delete_many()
            .filter(movie_actor::Column::MovieId.eq(id))
            .exec(&txn)
            .await
            .context("delete movie actors")?;

        review::Entity::delete_many()
            .filter(review::Column::MovieId.eq(id))
            .exec(&txn)
            .await
            .context("delete reviews")?;

        let res = movie::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await
            .context("delete movie")?;

        txn.commit().await.context("commit movie deletion")?;

        debug!(movie_id = %id, removed = res.rows_affected, "movie deleted");
        Ok(res.rows_affected > 0)
    }

    pub async fn create_review(&self, input: &ReviewInput) -> AppResult<String> {
        let id = new_id();
        let detail = ReviewCreateInput {
            user_name: input.user_name.clone(),
            rating: input.rating,
            comment: input.comment.clone(),
        };
        insert_review(&self.db, &id, &input.movie_id, &detail).await?;
        Ok(id)
    }

    /// Inserts the movie, each actor with its link, and each review as one unit of work.
    pub async fn create_movie_with_details(&self, input: &MovieWithDetailsInput) -> AppResult<String> {
        let movie_id = new_id();
        let txn = self.db.begin().await.context("begin movie creation")?;

        insert_movie(&txn, &movie_id, &input.movie).await?;

        for actor in input.actors() {
            insert_actor_for_movie(&txn, &movie_id, actor).await?;
        }

        for review in input.reviews() {
            insert_review(&txn, &new_id(), &movie_id, review).await?;
        }

        txn.commit().await.context("commit movie creation")?;

        debug!(
            movie_id = %movie_id,
            actors = input.actors().len(),
            reviews = input.reviews().len(),
            "movie created with details"
        );
        Ok(movie_id)
    }
}

fn filter_condition(filter: &MovieFilter) -> Condition {
    Condition::all()
        .add_option(filter.genre().map(|g| movie::Column::Genre.contains(g)))
        .add_option(filter.min_year.map(|y| movie::Column::Year.gte(y)))
        .add_option(filter.max_year.map(|y| movie::Column::Year.lte(y)))
        .add_option(filter.min_rating.map(|r| movie::Column::Rating.gte(r)))
        .add_option(filter.search().map(|s| {
            Condition::any()
                .add(movie::Column::Title.contains(s))
                .add(movie::Column::Description.contains(s))
                .add(movie::Column::Director.contains(s))
        }))
}

async fn insert_movie<C: ConnectionTrait>(db: &C, id: &str, input: &MovieInput) -> AppResult<()> {
    let now = now_micros();
    let model = movie::ActiveModel {
        id: Set(id.to_string()),
        title: Set(input.title.clone()),
        description: Set(input.description.clone()),
        year: Set(input.year),
        rating: Set(input.rating),
        duration: Set(input.duration),
        genre: Set(input.genre.clone()),
        director: Set(input.director.clone()),
        poster_url: Set(input.poster_url.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    movie::Entity::insert(model).exec_without_returning(db).await.context("insert movie")?;
    Ok(())
}

async fn insert_actor_for_movie<C: ConnectionTrait>(
    db: &C,
    movie_id: &str,
    input: &ActorInput,
) -> AppResult<()> {
    let actor_id = new_id();
    let model = actor::ActiveModel {
        id: Set(actor_id.clone()),
        name: Set(input.name.clone()),
        birth_date: Set(input.birth_date.clone()),
        nationality: Set(input.nationality.clone()),
        biography: Set(input.biography.clone()),
        profile_url: Set(input.profile_url.clone()),
    };
    actor::Entity::insert(model).exec_without_returning(db).await.context("insert actor")?;

    let link = movie_actor::ActiveModel {
        movie_id: Set(movie_id.to_string()),
        actor_id: Set(actor_id),
        character_name: Set(input.character_name.clone()),
    };
    movie_actor::Entity::insert(link)
        .exec_without_returning(db)
        .await
        .context("link actor to movie")?;
    Ok(())
}

async fn insert_review<C: ConnectionTrait>(
    db: &C,
    id: &str,
    movie_id: &str,
    input: &ReviewCreateInput,
) -> AppResult<()> {
    let model = review::ActiveModel {
        id: Set(id.to_string()),
        movie_id: Set(movie_id.to_string()),
        user_name: Set(input.user_name.clone()),
        rating: Set(input.rating),
        comment: Set(input.comment.clone()),
        created_at: Set(now_micros()),
    };
    review::Entity::insert(model).exec_without_returning(db).await.context("insert review")?;
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
