pub mod cache_store;
pub mod diagnostics;
pub mod node_store;
pub mod personio_client;
pub mod remote_file;
