//! Command handling - parsing, dispatching and reply texts

pub mod dispatcher;
pub mod parser;
pub mod replies;

pub use dispatcher::MessageDispatcher;
pub use parser::MessageParser;
