pub mod server;

pub use server::{ConnectionState, Handler, Server};
