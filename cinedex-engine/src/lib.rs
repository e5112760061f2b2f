pub mod attribute_search;
pub mod catalog;
pub mod config;
pub mod error;
pub mod explorer;
pub mod protocol;
pub mod reco_store;
pub mod scoring;
pub mod server;
pub mod session;
pub mod splay;
pub mod title_index;
pub mod transport;
