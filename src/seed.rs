use sea_orm::{EntityTrait, PaginatorTrait, Set, sea_query::OnConflict};
use tracing::{info, warn};

use crate::{
    db::Store,
    entities::{actor, movie, movie_actor, review},
    error::{AppResult, DbResultExt},
    models::now_micros,
};

/// Seeding is skipped once the catalog holds at least this many movies.
const SEEDED_MOVIE_COUNT: u64 = 10;

struct SeedMovie {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    year: i32,
    rating: f64,
    duration: i32,
    genre: &'static str,
    director: &'static str,
    poster: &'static str,
}

#[rustfmt::skip]
const MOVIES: [SeedMovie; 10] = [
    SeedMovie { id: "1", title: "Inception", description: "A thief who steals corporate secrets through dream-sharing technology.", year: 2010, rating: 8.8, duration: 148, genre: "Sci-Fi, Action", director: "Christopher Nolan", poster: "inception" },
    SeedMovie { id: "2", title: "The Shawshank Redemption", description: "Two imprisoned men bond over a number of years.", year: 1994, rating: 9.3, duration: 142, genre: "Drama", director: "Frank Darabont", poster: "shawshank" },
    SeedMovie { id: "3", title: "The Dark Knight", description: "Batman faces the Joker, a criminal mastermind wreaking havoc on Gotham.", year: 2008, rating: 9.0, duration: 152, genre: "Action, Crime", director: "Christopher Nolan", poster: "dark-knight" },
    SeedMovie { id: "4", title: "Interstellar", description: "A team travels through a wormhole in search of a new home for humanity.", year: 2014, rating: 8.6, duration: 169, genre: "Sci-Fi, Adventure", director: "Christopher Nolan", poster: "interstellar" },
    SeedMovie { id: "5", title: "Fight Club", description: "An insomniac forms an underground fight club that evolves into something much more.", year: 1999, rating: 8.8, duration: 139, genre: "Drama", director: "David Fincher", poster: "fight-club" },
    SeedMovie { id: "6", title: "Pulp Fiction", description: "The lives of two mob hitmen, a boxer, and others intertwine in tales of violence and redemption.", year: 1994, rating: 8.9, duration: 154, genre: "Crime, Drama", director: "Quentin Tarantino", poster: "pulp-fiction" },
    SeedMovie { id: "7", title: "Forrest Gump", description: "The life journey of Forrest Gump, a man with a low IQ but a big heart.", year: 1994, rating: 8.8, duration: 142, genre: "Drama, Romance", director: "Robert Zemeckis", poster: "forrest-gump" },
    SeedMovie { id: "8", title: "The Matrix", description: "A hacker learns the shocking truth about reality and his role in the war against its controllers.", year: 1999, rating: 8.7, duration: 136, genre: "Sci-Fi, Action", director: "Lana Wachowski, Lilly Wachowski", poster: "matrix" },
    SeedMovie { id: "9", title: "Gladiator", description: "A former Roman General seeks revenge after being betrayed.", year: 2000, rating: 8.5, duration: 155, genre: "Action, Drama", director: "Ridley Scott", poster: "gladiator" },
    SeedMovie { id: "10", title: "Parasite", description: "A poor family schemes to become employed by a wealthy household.", year: 2019, rating: 8.5, duration: 132, genre: "Thriller, Drama", director: "Bong Joon-ho", poster: "parasite" },
];

// (id, name, birth date, nationality, biography, profile slug)
#[rustfmt::skip]
const ACTORS: [(&str, &str, &str, &str, &str, &str); 6] = [
    ("a1", "Leonardo DiCaprio", "1974-11-11", "American", "Actor and producer.", "leo"),
    ("a2", "Morgan Freeman", "1937-06-01", "American", "Actor, director, narrator.", "morgan"),
    ("a3", "Christian Bale", "1974-01-30", "British", "Actor.", "bale"),
    ("a4", "Keanu Reeves", "1964-09-02", "Canadian", "Actor.", "keanu"),
    ("a5", "Brad Pitt", "1963-12-18", "American", "Actor and producer.", "brad"),
    ("a6", "Tom Hanks", "1956-07-09", "American", "Actor and filmmaker.", "hanks"),
];

// (movie id, actor id, character)
const CAST: [(&str, &str, &str); 6] = [
    ("1", "a1", "Cobb"),
    ("2", "a2", "Red"),
    ("3", "a3", "Bruce Wayne"),
    ("8", "a4", "Neo"),
    ("5", "a5", "Tyler Durden"),
    ("7", "a6", "Forrest Gump"),
];

// (id, movie id, user, rating, comment)
const REVIEWS: [(&str, &str, &str, i32, &str); 5] = [
    ("r1", "1", "alice", 5, "Mind-bending and brilliant."),
    ("r2", "2", "bob", 5, "One of the best movies ever made."),
    ("r3", "3", "charlie", 5, "Legendary superhero film."),
    ("r4", "8", "diana", 4, "A sci-fi classic."),
    ("r5", "10", "eve", 5, "Masterpiece."),
];

/// Inserts the sample catalog unless it already looks populated. Rows that
/// already exist are left alone; individual failures are logged, skipped and
/// counted in the returned total.
pub async fn seed_sample_data(store: &Store) -> AppResult<usize> {
    let db = store.db();
    let existing = movie::Entity::find().count(db).await.context("count movies")?;
    if existing >= SEEDED_MOVIE_COUNT {
        return Ok(0);
    }

    let mut failures = 0usize;

    for m in &MOVIES {
        if let Err(err) = store.ensure_director(m.director).await {
            warn!(director = %m.director, error = %err, "failed to ensure director");
            failures += 1;
        }

        let now = now_micros();
        let model = movie::ActiveModel {
            id: Set(m.id.to_string()),
            title: Set(m.title.to_string()),
            description: Set(Some(m.description.to_string())),
            year: Set(m.year),
            rating: Set(m.rating),
            duration: Set(m.duration),
            genre: Set(Some(m.genre.to_string())),
            director: Set(Some(m.director.to_string())),
            poster_url: Set(Some(format!("https://example.com/{}.jpg", m.poster))),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let res = movie::Entity::insert(model)
            .on_conflict(OnConflict::column(movie::Column::Id).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;
        if let Err(err) = res {
            warn!(movie_id = %m.id, error = %err, "failed to insert movie");
            failures += 1;
        }
    }

    for (id, name, birth_date, nationality, biography, slug) in ACTORS {
        let model = actor::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            birth_date: Set(Some(birth_date.to_string())),
            nationality: Set(Some(nationality.to_string())),
            biography: Set(Some(biography.to_string())),
            profile_url: Set(Some(format!("https://example.com/actors/{slug}"))),
        };
        let res = actor::Entity::insert(model)
            .on_conflict(OnConflict::column(actor::Column::Id).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;
        if let Err(err) = res {
            warn!(actor_id = %id, error = %err, "failed to insert actor");
            failures += 1;
        }
    }

    for (movie_id, actor_id, character) in CAST {
        let model = movie_actor::ActiveModel {
            movie_id: Set(movie_id.to_string()),
            actor_id: Set(actor_id.to_string()),
            character_name: Set(Some(character.to_string())),
        };
        let res = movie_actor::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([movie_actor::Column::MovieId, movie_actor::Column::ActorId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;
        if let Err(err) = res {
            warn!(movie_id = %movie_id, actor_id = %actor_id, error = %err, "failed to link actor");
            failures += 1;
        }
    }

    for (id, movie_id, user, rating, comment) in REVIEWS {
        let model = review::ActiveModel {
            id: Set(id.to_string()),
            movie_id: Set(movie_id.to_string()),
            user_name: Set(user.to_string()),
            rating: Set(rating),
            comment: Set(Some(comment.to_string())),
            created_at: Set(now_micros()),
        };
        let res = review::Entity::insert(model)
            .on_conflict(OnConflict::column(review::Column::Id).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;
        if let Err(err) = res {
            warn!(review_id = %id, error = %err, "failed to insert review");
            failures += 1;
        }
    }

    info!(movies = MOVIES.len(), failures = failures, "sample data seeded");
    Ok(failures)
}
