//! Content saving for accepted articles

mod article_saver;
mod atomic;

pub use article_saver::{ContentSaver, SaveError, SavedArticle};
pub use atomic::write_atomic;
