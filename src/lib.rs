pub mod app;
pub mod config;
pub mod error;
pub mod schema {
    pub mod document;
    pub mod mappings;
    pub mod setup;
}
pub mod ingest {
    pub mod events;
    pub mod projector;
    pub mod writer;
}
pub mod query {
    pub mod compiler;
    pub mod params;
    pub mod tree;
}
pub mod search {
    pub mod client;
    pub mod executor;
}
pub mod api {
    pub mod errors;
    pub mod events;
    pub mod search;
}
