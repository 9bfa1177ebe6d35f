pub mod reachability_checker;
pub mod registry_service;

pub use reachability_checker::{CheckError, HandlerChecker, HttpReachabilityChecker};
pub use registry_service::RegistryService;
