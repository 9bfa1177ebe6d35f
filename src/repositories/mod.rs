pub mod handler_repository;

pub use handler_repository::{
    HandlerRepository, RepositoryError, RepositoryResult, SqliteHandlerRepository,
};

#[cfg(test)]
pub use handler_repository::MockHandlerRepository;
