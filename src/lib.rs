pub mod audit;
pub mod cart;
pub mod collection;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod image;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod storefront;
