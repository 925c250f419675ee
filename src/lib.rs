//! Personal reader for the Autun Infos newspaper: a JSON proxy over the
//! newspaper's feeds and pages, and a terminal client that tracks favorites,
//! read and new items.

pub mod app;
pub mod client;
pub mod config;
pub mod content;
pub mod feed;
pub mod status;
pub mod store;
pub mod ui;
pub mod util;
pub mod view;
pub mod web;
