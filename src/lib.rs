//! GraphQL API backend for an educational content platform.
//!
//! Provides:
//! - A GraphQL schema over lessons, quizzes, playlists, and articles
//! - Windowed batch loading so field resolvers never issue one store
//!   query per row
//! - Google OAuth sign-in backed by a signed viewer cookie
//! - Stripe payments and webhooks, OpenAI quiz drafting, and contact
//!   email delivery
//!
//! The binary reads its configuration from the environment and serves
//! the router assembled in [`http`].

pub mod auth;
pub mod clients;
pub mod config;
pub mod dataloaders;
pub mod error;
pub mod graphql;
pub mod http;
pub mod loaders;
pub mod models;
pub mod pagination;
pub mod scalars;
pub mod store;

pub use dataloaders::{BatchLoader, DataLoader, LoadError};
pub use error::{AppError, AppResult};
pub use pagination::Page;
