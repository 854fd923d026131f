//! HTTP client code for the APOD image cache.
//!
//! This crate provides the APOD API client, which implements
//! [`apod_core::ContentFetcher`], and the fetch pipeline it is built on.

pub mod apod;
pub mod error;
pub mod fetch;

pub use apod::{ApodClient, ApodConfig};
pub use error::ClientError;
pub use fetch::{FetchClient, FetchConfig};
