pub mod auth;
pub mod catalog;
pub mod compose;
pub mod editor;
