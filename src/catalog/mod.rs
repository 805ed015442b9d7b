pub mod db;
mod lessons;
pub mod models;
mod presentations;
mod tables;

pub use db::{Database, DatabaseError};
