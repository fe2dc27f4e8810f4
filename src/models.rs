use std::sync::atomic::{AtomicI64, Ordering};

use async_graphql::{InputObject, SimpleObject};
use serde::Serialize;

use crate::entities::{actor, movie, review};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub rating: f64,
    pub duration: i32,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub poster_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Preloaded associations; `None` means "not loaded", not "none exist".
    #[graphql(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<Actor>>,
    #[graphql(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
}

impl From<movie::Model> for Movie {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            year: m.year,
            rating: m.rating,
            duration: m.duration,
            genre: m.genre,
            director: m.director,
            poster_url: m.poster_url,
            created_at: format_micros(m.created_at),
            updated_at: format_micros(m.updated_at),
            actors: None,
            reviews: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    pub profile_url: Option<String>,
}

impl From<actor::Model> for Actor {
    fn from(a: actor::Model) -> Self {
        Self {
            id: a.id,
            name: a.name,
            birth_date: a.birth_date,
            nationality: a.nationality,
            biography: a.biography,
            profile_url: a.profile_url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, SimpleObject)]
#[graphql(rename_fields = "snake_case")]
pub struct Review {
    pub id: String,
    pub movie_id: String,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<review::Model> for Review {
    fn from(r: review::Model) -> Self {
        Self {
            id: r.id,
            movie_id: r.movie_id,
            user_name: r.user_name,
            rating: r.rating,
            comment: r.comment,
            created_at: format_micros(r.created_at),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct MovieInput {
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub rating: f64,
    pub duration: i32,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub poster_url: Option<String>,
}

/// Optional predicates for listing movies. Every present field is applied,
/// including zero values; absent fields are ignored.
#[derive(Clone, Debug, Default, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct MovieFilter {
    pub genre: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
}

impl MovieFilter {
    pub fn genre(&self) -> Option<&str> {
        non_blank(self.genre.as_deref())
    }

    pub fn search(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }
}

#[derive(Clone, Debug, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ReviewInput {
    pub movie_id: String,
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ActorInput {
    pub name: String,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    pub profile_url: Option<String>,
    pub character_name: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ReviewCreateInput {
    pub user_name: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct MovieWithDetailsInput {
    pub movie: MovieInput,
    pub actors: Option<Vec<ActorInput>>,
    pub reviews: Option<Vec<ReviewCreateInput>>,
}

impl MovieWithDetailsInput {
    /// Absent and null lists both mean no actors.
    pub fn actors(&self) -> &[ActorInput] {
        self.actors.as_deref().unwrap_or_default()
    }

    pub fn reviews(&self) -> &[ReviewCreateInput] {
        self.reviews.as_deref().unwrap_or_default()
    }
}

/// A normalized page request: `page` is 1-indexed and both values are at least 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Missing or non-positive values fall back to the defaults; `limit` is capped at `max_limit`.
    pub fn new(page: Option<i32>, limit: Option<i32>, max_limit: u64) -> Self {
        let page = page.filter(|p| *p > 0).map_or(DEFAULT_PAGE, |p| p as u64);
        let limit = limit.filter(|l| *l > 0).map_or(DEFAULT_LIMIT, |l| l as u64);
        Self { page, limit: limit.min(max_limit.max(1)) }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, SimpleObject)]
#[graphql(name = "PaginationInfo", rename_fields = "snake_case")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(request.limit),
        }
    }
}

#[derive(Clone, Debug, Serialize, SimpleObject)]
#[graphql(name = "MoviesResult")]
pub struct MoviePage {
    pub movies: Vec<Movie>,
    pub pagination: Pagination,
}

pub fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

static LAST_MICROS: AtomicI64 = AtomicI64::new(0);

/// Current time in microseconds, strictly increasing within the process so
/// that rows written back to back keep their insertion order.
pub fn now_micros() -> i64 {
    let now = jiff::Timestamp::now().as_microsecond();
    let prev = LAST_MICROS
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| Some(now.max(prev + 1)))
        .unwrap_or_else(|prev| prev);
    now.max(prev + 1)
}

fn format_micros(micros: i64) -> String {
    jiff::Timestamp::from_microsecond(micros).map(|ts| ts.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None, 100), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(-5), 100), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(-3), Some(0), 100).offset(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(500), 100), PageRequest { page: 3, limit: 100 });
        assert_eq!(PageRequest::new(Some(4), Some(7), 100).offset(), 21);
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = PageRequest { page: 1, limit: 4 };
        assert_eq!(Pagination::new(req, 0).total_pages, 0);
        assert_eq!(Pagination::new(req, 8).total_pages, 2);
        assert_eq!(Pagination::new(req, 9).total_pages, 3);
    }

    #[test]
    fn blank_text_filters_are_absent() {
        let filter = MovieFilter {
            genre: Some("  ".into()),
            search: Some(" noir ".into()),
            ..Default::default()
        };
        assert_eq!(filter.genre(), None);
        assert_eq!(filter.search(), Some("noir"));
    }

    #[test]
    fn clock_never_repeats() {
        let a = now_micros();
        let b = now_micros();
        assert!(b > a);
    }

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(format_micros(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_micros(1_500_000), "1970-01-01T00:00:01.5Z");
    }
}
