//! News and daily journal aggregation.
//!
//! Articles come from several external providers consulted in priority order,
//! normalized into one [`article::Article`] model. A daily journal built from
//! quotes is cached per calendar day, and a background [`poller::Poller`]
//! announces new journal content to subscribers. [`service::NewsService`] is
//! the query surface front ends talk to.
pub mod aggregator;
pub mod article;
pub mod clock;
pub mod config;
pub mod events;
pub mod journal;
pub mod poller;
pub mod providers;
pub mod sampling;
pub mod service;
pub mod storage;
pub mod util;

pub use article::{Article, Category, CategorySet};
pub use config::Config;
pub use service::{FeedFilter, NewsService, SortOrder};
