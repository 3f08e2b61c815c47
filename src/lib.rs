// Library for tests to access modules

pub mod config;
pub mod fetcher;
pub mod models;
pub mod parser;
pub mod poller;
pub mod report;
pub mod routes;
pub mod store;
