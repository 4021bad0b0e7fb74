//! Shared domain types for the app launcher.
//!
//! Used by both the HTTP server (`app-launcher serve`) and the API client:
//!
//! | Module    | Responsibility                                                 |
//! |-----------|----------------------------------------------------------------|
//! | `entry`   | `Entry`, `NewEntry`, `PositionUpdate` and payload validation   |
//! | `view`    | Search / category filtering, grouping and drag-drop reordering |
//! | `display` | Favicon URL, display domain and card initials                  |

pub mod display;
pub mod entry;
pub mod view;

pub use entry::{Entry, NewEntry, PositionUpdate, ValidationError, ValidationIssue};
pub use view::{CategoryFilter, EntryGroup, LauncherView, ViewQuery, UNCATEGORIZED};
