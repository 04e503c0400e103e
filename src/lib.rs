pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod services;
