//! Multi-tenant point-of-sale backend: invoices with atomic stock movement,
//! products and customers, behind bearer-token auth.

pub mod auth;
pub mod config;
pub mod database;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sales;
pub mod state;
