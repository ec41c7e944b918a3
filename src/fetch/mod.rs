//! Fetch-and-flatten routines.
//!
//! [`IssueFetcher`] pages through search results and turns each issue into a
//! row; [`ChangelogFetcher`] turns each field change in an issue's history
//! into a row. Both work against any [`IssueSource`](crate::api::IssueSource).

pub mod changelog;
pub mod fields;
pub mod issues;

pub use changelog::{ChangelogFetcher, ChangelogRecord, CHANGELOG_COLUMNS};
pub use fields::{IssueRecord, DEFAULT_FIELDS};
pub use issues::{project_query, IssueFetcher};
