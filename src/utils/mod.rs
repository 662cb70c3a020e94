pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{article_slug, is_valid_url, last_path_segment, resolve_href};
