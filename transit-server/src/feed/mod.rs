//! Static GTFS feed loading.
//!
//! The archive is downloaded (or read from disk), its `.txt` members parsed
//! into lenient string tables, normalized into a [`Snapshot`], and published
//! as a new catalog by [`FeedStore`].

mod archive;
mod client;
mod error;
mod snapshot;
mod store;
mod table;

pub use archive::{FeedTables, REQUIRED_TABLES};
pub use client::{DEFAULT_FEED_URL, FeedClient, FeedClientConfig, FeedSource};
pub use error::FeedError;
pub use snapshot::{Route, ShapePoint, Snapshot, Stop, StopScheduleEntry, StopTime, Trip};
pub use store::{FeedStatus, FeedStore, RefreshOutcome};
pub use table::{Row, Table};
