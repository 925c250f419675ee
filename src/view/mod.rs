//! Presentation logic shared by the terminal front end: tabs and search,
//! French date rendering, reader HTML preparation and reader routes.

pub mod dates;
pub mod feed;
pub mod reader;
pub mod route;

pub use dates::{format_published, UNKNOWN_DATE};
pub use feed::{favorite_items, filter_by_title, tab_items, Tab};
pub use reader::{
    classify_links, clean_article_html, prepare_article_html, present_article_html,
    ArticleLink, LinkTarget, FAILURE_TEXT, LOADING_TEXT,
};
pub use route::{parse_reader_path, reader_path};
