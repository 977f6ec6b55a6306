pub mod catalog;
pub mod duration;
pub mod encoder;
pub mod error;
pub mod ladder;
pub mod manifest;
pub mod ports;
pub mod probe;
pub mod publisher;
pub mod scratch;
pub mod service;
pub mod thumbnail;
