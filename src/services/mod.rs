//! Business logic services

pub mod catalog;
pub mod lending;
pub mod locks;
pub mod records;
pub mod references;
pub mod stats;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub records: records::RecordsService,
    pub lending: lending::LendingService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services over one repository. Lending and deletion share the per-book locks.
    pub fn new(repository: Repository) -> Self {
        let locks = locks::BookLocks::new();
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            records: records::RecordsService::new(repository.clone(), locks.clone()),
            lending: lending::LendingService::new(repository.clone(), locks),
            stats: stats::StatsService::new(repository),
        }
    }
}
