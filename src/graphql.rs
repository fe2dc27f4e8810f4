use async_graphql::{ComplexObject, Context, EmptySubscription, ErrorExtensions, ID, Object, Schema};

use crate::{
    catalog::Catalog,
    models::{Actor, Movie, MoviePage, MovieFilter, MovieInput, MovieWithDetailsInput, Review, ReviewInput},
};

pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(catalog: Catalog) -> CatalogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).data(catalog).finish()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn movie(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Movie> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.movie(&id).await.map_err(|e| e.extend())
    }

    async fn movies(
        &self,
        ctx: &Context<'_>,
        page: Option<i32>,
        limit: Option<i32>,
        filter: Option<MovieFilter>,
    ) -> async_graphql::Result<MoviePage> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.movies(page, limit, filter).await.map_err(|e| e.extend())
    }

    async fn search_movies(
        &self,
        ctx: &Context<'_>,
        query: String,
        page: Option<i32>,
        limit: Option<i32>,
    ) -> async_graphql::Result<MoviePage> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.search_movies(&query, page, limit).await.map_err(|e| e.extend())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_movie(&self, ctx: &Context<'_>, input: MovieInput) -> async_graphql::Result<Movie> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.create_movie(input).await.map_err(|e| e.extend())
    }

    async fn update_movie(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: MovieInput,
    ) -> async_graphql::Result<Movie> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.update_movie(&id, input).await.map_err(|e| e.extend())
    }

    async fn delete_movie(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.delete_movie(&id).await.map_err(|e| e.extend())
    }

    async fn create_review(&self, ctx: &Context<'_>, input: ReviewInput) -> async_graphql::Result<Review> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.create_review(input).await.map_err(|e| e.extend())
    }

    async fn create_movie_with_details(
        &self,
        ctx: &Context<'_>,
        input: MovieWithDetailsInput,
    ) -> async_graphql::Result<Movie> {
        let catalog = ctx.data::<Catalog>()?;
        catalog.create_movie_with_details(input).await.map_err(|e| e.extend())
    }
}

/// Associations come from the preloaded lists when present, otherwise they are
/// fetched per movie.
#[ComplexObject]
impl Movie {
    async fn actors(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Actor>> {
        if let Some(actors) = &self.actors {
            return Ok(actors.clone());
        }
        let catalog = ctx.data::<Catalog>()?;
        catalog.actors_for_movie(&self.id).await.map_err(|e| e.extend())
    }

    async fn reviews(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Review>> {
        if let Some(reviews) = &self.reviews {
            return Ok(reviews.clone());
        }
        let catalog = ctx.data::<Catalog>()?;
        catalog.reviews_for_movie(&self.id).await.map_err(|e| e.extend())
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::{Request, Variables, value};
    use serde_json::json;

    use super::*;
    use crate::db::memory_store;

    async fn schema() -> CatalogSchema {
        build_schema(Catalog::new(memory_store().await, 100))
    }

    const CREATE_WITH_DETAILS: &str = r#"
        mutation Create($input: MovieWithDetailsInput!) {
            createMovieWithDetails(input: $input) {
                id title director poster_url
                actors { name }
                reviews { user_name rating }
            }
        }
    "#;

    fn details_input() -> serde_json::Value {
        json!({
            "movie": {
                "title": "Chungking Express",
                "description": "Two lovesick policemen in Hong Kong.",
                "year": 1994,
                "rating": 8.0,
                "duration": 102,
                "genre": "Drama, Romance",
                "director": "Wong Kar-wai",
                "poster_url": "https://example.com/chungking.jpg"
            },
            "actors": [
                { "name": "Tony Leung", "character_name": "Cop 663" },
                { "name": "Faye Wong", "character_name": "Faye" }
            ],
            "reviews": [ { "user_name": "mei", "rating": 5, "comment": "California Dreamin'" } ]
        })
    }

    fn error_code(resp: &async_graphql::Response) -> Option<async_graphql::Value> {
        resp.errors.first()?.extensions.as_ref()?.get("code").cloned()
    }

    #[tokio::test]
    async fn create_with_details_then_query_by_id() {
        let schema = schema().await;

        let resp = schema
            .execute(
                Request::new(CREATE_WITH_DETAILS)
                    .variables(Variables::from_json(json!({ "input": details_input() }))),
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let data = resp.data.into_json().unwrap();
        let created = &data["createMovieWithDetails"];
        assert_eq!(created["title"], "Chungking Express");
        assert_eq!(created["director"], "Wong Kar-wai");
        assert_eq!(created["actors"], json!([{ "name": "Faye Wong" }, { "name": "Tony Leung" }]));
        assert_eq!(created["reviews"], json!([{ "user_name": "mei", "rating": 5 }]));

        let id = created["id"].as_str().unwrap();
        let resp = schema
            .execute(format!(r#"{{ movie(id: "{id}") {{ title year rating actors {{ name }} }} }}"#))
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data,
            value!({
                "movie": {
                    "title": "Chungking Express",
                    "year": 1994,
                    "rating": 8.0,
                    "actors": [{ "name": "Faye Wong" }, { "name": "Tony Leung" }],
                }
            })
        );
    }

    #[tokio::test]
    async fn listed_movies_resolve_associations_on_demand() {
        let schema = schema().await;
        schema
            .execute(
                Request::new(CREATE_WITH_DETAILS)
                    .variables(Variables::from_json(json!({ "input": details_input() }))),
            )
            .await;

        let resp = schema
            .execute(
                r#"{
                    movies(limit: 5, filter: { genre: "Romance", min_year: 1990 }) {
                        movies { title reviews { rating } }
                        pagination { page limit total total_pages }
                    }
                }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data,
            value!({
                "movies": {
                    "movies": [{ "title": "Chungking Express", "reviews": [{ "rating": 5 }] }],
                    "pagination": { "page": 1, "limit": 5, "total": 1, "total_pages": 1 },
                }
            })
        );
    }

    #[tokio::test]
    async fn search_movies_returns_paged_result() {
        let schema = schema().await;
        schema
            .execute(
                Request::new(CREATE_WITH_DETAILS)
                    .variables(Variables::from_json(json!({ "input": details_input() }))),
            )
            .await;

        let resp = schema
            .execute(r#"{ searchMovies(query: "hong kong") { movies { title } pagination { total } } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data,
            value!({
                "searchMovies": {
                    "movies": [{ "title": "Chungking Express" }],
                    "pagination": { "total": 1 },
                }
            })
        );
    }

    #[tokio::test]
    async fn null_detail_lists_mean_none() {
        let schema = schema().await;
        let mut input = details_input();
        input["actors"] = serde_json::Value::Null;
        input["reviews"] = serde_json::Value::Null;

        let resp = schema
            .execute(Request::new(CREATE_WITH_DETAILS).variables(Variables::from_json(json!({ "input": input }))))
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let data = resp.data.into_json().unwrap();
        assert_eq!(data["createMovieWithDetails"]["actors"], json!([]));
        assert_eq!(data["createMovieWithDetails"]["reviews"], json!([]));

        let resp = schema
            .execute(
                r#"mutation {
                    createMovieWithDetails(input: {
                        movie: { title: "Bare", year: 2000, rating: 6.0, duration: 80 }
                        actors: null
                        reviews: null
                    }) { title actors { name } }
                }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(resp.data, value!({ "createMovieWithDetails": { "title": "Bare", "actors": [] } }));
    }

    #[tokio::test]
    async fn empty_search_query_matches_everything() {
        let schema = schema().await;
        schema
            .execute(
                Request::new(CREATE_WITH_DETAILS)
                    .variables(Variables::from_json(json!({ "input": details_input() }))),
            )
            .await;

        let resp = schema
            .execute(r#"{ searchMovies(query: "") { movies { title } pagination { total } } }"#)
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data,
            value!({
                "searchMovies": {
                    "movies": [{ "title": "Chungking Express" }],
                    "pagination": { "total": 1 },
                }
            })
        );
    }

    #[tokio::test]
    async fn review_rating_out_of_range_is_an_invalid_argument() {
        let schema = schema().await;

        let resp = schema
            .execute(
                r#"mutation {
                    createReview(input: { movie_id: "m1", user_name: "x", rating: 6 }) { id }
                }"#,
            )
            .await;

        assert_eq!(resp.errors.len(), 1);
        assert_eq!(error_code(&resp), Some(async_graphql::Value::from("INVALID_ARGUMENT")));
    }

    #[tokio::test]
    async fn unknown_movie_is_not_found() {
        let schema = schema().await;

        let resp = schema.execute(r#"{ movie(id: "missing") { id } }"#).await;

        assert_eq!(error_code(&resp), Some(async_graphql::Value::from("NOT_FOUND")));
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let schema = schema().await;
        let resp = schema
            .execute(
                r#"mutation {
                    createMovie(input: { title: "Draft", year: 2020, rating: 5.5, duration: 90 }) { id }
                }"#,
            )
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        let id = data["createMovie"]["id"].as_str().unwrap().to_string();

        let resp = schema
            .execute(format!(
                r#"mutation {{
                    updateMovie(id: "{id}", input: {{
                        title: "Final", year: 2021, rating: 6.5, duration: 95, director: "Kelly Reichardt"
                    }}) {{ title year director }}
                }}"#
            ))
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        assert_eq!(
            resp.data,
            value!({ "updateMovie": { "title": "Final", "year": 2021, "director": "Kelly Reichardt" } })
        );

        let delete = format!(r#"mutation {{ deleteMovie(id: "{id}") }}"#);
        assert_eq!(schema.execute(delete.clone()).await.data, value!({ "deleteMovie": true }));
        assert_eq!(schema.execute(delete).await.data, value!({ "deleteMovie": false }));
    }
}
