//! Terminal user interface.
//!
//! - `loop_runner` - event loop and terminal management
//! - `input` - keyboard handling for the feed list, search and reader
//! - `events` - background task results
//! - `tasks` - spawning of visits and article loads
//! - `render` - view dispatch
//! - `feed_list`, `reader`, `status`, `help` - widgets

mod events;
mod feed_list;
mod help;
mod input;
mod loop_runner;
pub mod reader;
mod render;
mod status;
mod tasks;

pub use loop_runner::{run, Action};
pub use tasks::{spawn_article_load, spawn_visit};
