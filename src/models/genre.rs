//! Genre seed rows.

use serde::{Deserialize, Serialize};

use super::common::FieldValue;

/// One genre available as a recommendation seed (`genres`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenreRow {
    #[serde(rename = "genres")]
    pub genre: Option<String>,
}

impl GenreRow {
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("genres", self.genre.clone().into())]
    }
}
