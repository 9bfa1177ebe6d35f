pub mod registry_handlers;

pub use registry_handlers::{
    get_spec_handler, health, register_handler, unregister_handler, update_handler, use_handler,
};
