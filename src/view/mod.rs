//! Attendance views: normalization, filtering, reconciliation and the
//! per-date controller that ties them together.

pub mod controller;
pub mod filter;
pub mod normalizer;
pub mod reconcile;
pub mod session;

pub use controller::{ViewController, ViewKind, ViewSnapshot, ViewStatus};
pub use session::{Session, SessionStore};
