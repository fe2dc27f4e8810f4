use tracing::{info, warn};

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        Actor, Movie, MovieFilter, MovieInput, MoviePage, MovieWithDetailsInput, PageRequest,
        Pagination, Review, ReviewInput, non_blank,
    },
    repository::MovieRepository,
};

const MIN_MOVIE_RATING: f64 = 0.0;
const MAX_MOVIE_RATING: f64 = 10.0;
const REVIEW_RATINGS: std::ops::RangeInclusive<i32> = 1..=5;

/// Typed catalog operations: validates arguments, orchestrates repository
/// calls and shapes results. Writes return the reloaded state.
#[derive(Clone, Debug)]
pub struct Catalog {
    store: Store,
    repo: MovieRepository,
    max_page_size: u64,
}

impl Catalog {
    pub fn new(store: Store, max_page_size: u64) -> Self {
        let repo = MovieRepository::new(store.db().clone());
        Self { store, repo, max_page_size }
    }

    /// Loads a movie with its actors and reviews. A failing association is
    /// logged and returned empty rather than failing the lookup.
    pub async fn movie(&self, id: &str) -> AppResult<Movie> {
        required("id", id)?;
        let mut movie = self.repo.get_movie(id).await?;

        let actors = self.repo.actors_for_movie(id).await.unwrap_or_else(|err| {
            warn!(movie_id = %id, error = %err, "failed to load actors");
            Vec::new()
        });
        let reviews = self.repo.reviews_for_movie(id).await.unwrap_or_else(|err| {
            warn!(movie_id = %id, error = %err, "failed to load reviews");
            Vec::new()
        });

        movie.actors = Some(actors);
        movie.reviews = Some(reviews);
        Ok(movie)
    }

    pub async fn movies(
        &self,
        page: Option<i32>,
        limit: Option<i32>,
        filter: Option<MovieFilter>,
    ) -> AppResult<MoviePage> {
        let request = PageRequest::new(page, limit, self.max_page_size);
        let filter = filter.unwrap_or_default();
        let (movies, total) = self.repo.list_movies(&filter, request).await?;
        Ok(MoviePage { movies, pagination: Pagination::new(request, total) })
    }

    pub async fn search_movies(
        &self,
        query: &str,
        page: Option<i32>,
        limit: Option<i32>,
    ) -> AppResult<MoviePage> {
        let request = PageRequest::new(page, limit, self.max_page_size);
        let (movies, total) = self.repo.search_movies(query, request).await?;
        Ok(MoviePage { movies, pagination: Pagination::new(request, total) })
    }

    pub async fn actors_for_movie(&self, movie_id: &str) -> AppResult<Vec<Actor>> {
        self.repo.actors_for_movie(movie_id).await
    }

    pub async fn reviews_for_movie(&self, movie_id: &str) -> AppResult<Vec<Review>> {
        self.repo.reviews_for_movie(movie_id).await
    }

    pub async fn create_movie(&self, input: MovieInput) -> AppResult<Movie> {
        let input = self.prepare_movie(input).await?;
        let id = self.repo.create_movie(&input).await?;
        info!(movie_id = %id, title = %input.title, "movie created");
        self.movie(&id).await
    }

    pub async fn update_movie(&self, id: &str, input: MovieInput) -> AppResult<Movie> {
        required("id", id)?;
        let input = self.prepare_movie(input).await?;
        if !self.repo.update_movie(id, &input).await? {
            return Err(AppError::NotFound(format!("movie {id}")));
        }
        info!(movie_id = %id, "movie updated");
        self.movie(id).await
    }

    pub async fn delete_movie(&self, id: &str) -> AppResult<bool> {
        required("id", id)?;
        let removed = self.repo.delete_movie(id).await?;
        if removed {
            info!(movie_id = %id, "movie deleted");
        }
        Ok(removed)
    }

    pub async fn create_review(&self, input: ReviewInput) -> AppResult<Review> {
        required("movie_id", &input.movie_id)?;
        required("user_name", &input.user_name)?;
        validate_review_rating(input.rating)?;

        if !self.repo.movie_exists(&input.movie_id).await? {
            return Err(AppError::NotFound(format!("movie {}", input.movie_id)));
        }

        let id = self.repo.create_review(&input).await?;
        info!(review_id = %id, movie_id = %input.movie_id, "review created");
        self.repo.get_review(&id).await
    }

    pub async fn create_movie_with_details(&self, input: MovieWithDetailsInput) -> AppResult<Movie> {
        for actor in input.actors() {
            required("actor name", &actor.name)?;
        }
        for review in input.reviews() {
            required("user_name", &review.user_name)?;
            validate_review_rating(review.rating)?;
        }

        let movie = self.prepare_movie(input.movie).await?;
        let input = MovieWithDetailsInput { movie, ..input };

        let id = self.repo.create_movie_with_details(&input).await?;
        info!(
            movie_id = %id,
            actors = input.actors().len(),
            reviews = input.reviews().len(),
            "movie created with details"
        );
        self.movie(&id).await
    }

    /// Validates a movie input, normalizes the director and makes sure the
    /// director row exists before anything else is written.
    async fn prepare_movie(&self, mut input: MovieInput) -> AppResult<MovieInput> {
        required("title", &input.title)?;
        if !(MIN_MOVIE_RATING..=MAX_MOVIE_RATING).contains(&input.rating) {
            return Err(AppError::invalid(format!(
                "rating must be between {MIN_MOVIE_RATING} and {MAX_MOVIE_RATING}"
            )));
        }
        if input.year < 0 {
            return Err(AppError::invalid("year must not be negative"));
        }
        if input.duration < 0 {
            return Err(AppError::invalid("duration must not be negative"));
        }

        input.director = non_blank(input.director.as_deref()).map(str::to_string);
        if let Some(director) = &input.director {
            self.store.ensure_director(director).await?;
        }
        Ok(input)
    }
}

/// Rejects blank arguments. Values are used exactly as given once present.
fn required(name: &str, value: &str) -> AppResult<()> {
    match non_blank(Some(value)) {
        Some(_) => Ok(()),
        None => Err(AppError::invalid(format!("{name} is required"))),
    }
}

fn validate_review_rating(rating: i32) -> AppResult<()> {
    if REVIEW_RATINGS.contains(&rating) {
        Ok(())
    } else {
        Err(AppError::invalid("rating must be between 1 and 5"))
    }
}
