//! # Livegate
//!
//! An incremental aggregation engine for issue-derived code-quality
//! metrics. Whenever the issue population of a component changes (issue
//! created, resolved, reopened, severity or type changed), a single
//! `refresh` recomputes the affected measures bottom-up along the
//! component's ancestor chain and re-evaluates the project's quality
//! gate, without re-running a full analysis.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use livegate::live::LiveMeasureComputer;
//! use livegate::store::{DataStore, SqliteStore};
//!
//! let store = SqliteStore::new("./data/livegate.db").unwrap();
//! store.initialize().unwrap();
//!
//! // after an issue on `component` changed:
//! let computer = LiveMeasureComputer::new(&store);
//! computer.refresh(&component).unwrap();
//! ```
//!
//! The engine is embedded and blocking: each refresh runs to completion
//! on the calling thread inside one store transaction.

pub mod error;
pub mod gate;
pub mod live;
pub mod metrics;
pub mod store;
pub mod types;
