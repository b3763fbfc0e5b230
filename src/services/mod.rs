//! Business logic services

pub mod catalog;
pub mod lending;
pub mod stats;
pub mod users;

use chrono::{NaiveDate, Utc};

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub stats: stats::StatsService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), config.lending.clone()),
            stats: stats::StatsService::new(repository.clone(), config.lending.clone()),
            users: users::UsersService::new(repository, config.auth.clone()),
        }
    }
}

/// Calendar date used for due dates, fines and overdue checks
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
