use serde::Serialize;

use crate::error::{AppError, AppResult};

pub type ItemId = i64;

/// A media item in the catalog
///
/// `derived_length` caches the character length of `title`. Fields are private
/// so the two cannot drift apart; the only way to change a title is
/// [`Item::set_title`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    title: String,
    year: i32,
    derived_length: usize,
}

impl Item {
    /// Creates an item, rejecting blank titles
    pub fn new(id: ItemId, title: impl Into<String>, year: i32) -> AppResult<Self> {
        let title = title.into();
        validate_title(&title)?;
        Ok(Self {
            id,
            derived_length: title_length(&title),
            title,
            year,
        })
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn derived_length(&self) -> usize {
        self.derived_length
    }

    /// Replaces the title and recomputes the derived length
    pub fn set_title(&mut self, title: impl Into<String>) -> AppResult<()> {
        let title = title.into();
        validate_title(&title)?;
        self.derived_length = title_length(&title);
        self.title = title;
        Ok(())
    }
}

/// Length of a title in characters (Unicode scalar values, not bytes)
pub fn title_length(title: &str) -> usize {
    title.chars().count()
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }
    Ok(())
}
