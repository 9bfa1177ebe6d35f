pub mod handler;

#[cfg(test)]
mod handler_test;

pub use handler::{
    Handler, HandlerIdRequest, Method, RegisterResponse, Specification, UpdateRequest,
};
