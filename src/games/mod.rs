pub mod asteroids;
