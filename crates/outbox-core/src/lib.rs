pub mod config;
pub mod logging;

// Queue subsystem, leaf-first.
pub mod classify;
pub mod entry;
pub mod method;
pub mod policy;
pub mod queue;
pub mod replay;
pub mod scheduler;
pub mod store;

// Transport adapter and the client wrapper that feeds the queue.
pub mod client;
pub mod transport;
