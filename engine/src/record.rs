use crate::normalize::normalize_text;
use crate::{Item, ItemId};
use serde::{Deserialize, Deserializer, Serialize};
use time::macros::format_description;
use time::Date;

/// Raw catalog entry as exchanged between the catalog fetcher and the indexer (one JSON object per line).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: ItemId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub poster_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Year component of a `YYYY-MM-DD` date, `None` if it does not parse.
pub fn release_year(date: &str) -> Option<i32> {
    let fmt = format_description!("[year]-[month]-[day]");
    Date::parse(date.trim(), &fmt).ok().map(|d| d.year())
}

impl CatalogRecord {
    pub fn into_item(self) -> Item {
        let year = release_year(&self.release_date);
        let text = normalize_text(&self.overview, &self.genres, year);
        let image_ref = if self.poster_path.trim().is_empty() { None } else { Some(self.poster_path) };
        Item { id: self.id, title: self.title, text, image_ref }
    }
}
