pub mod api;
pub mod config;
pub mod links;
pub mod models;
pub mod storage;
pub mod track;
pub mod visits;
