pub mod actor;
pub mod director;
pub mod movie;
pub mod movie_actor;
pub mod review;
