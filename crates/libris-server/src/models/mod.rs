//! Database models
//!
//! Row structs map one-to-one onto the `books`, `publishing_houses` and
//! `book_files` tables. The `*Details` types are the nested read views
//! returned by the API (a book with its houses, a house with its files).

use byte_unit::{Byte, UnitType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Book row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Publishing house row, owned by a book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublishingHouse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub name: String,
    pub lang: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored book file row, owned by a publishing house
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookFile {
    pub id: Uuid,
    pub publishing_house_id: Uuid,
    pub file_name: String,
    /// Location on the server's disk; never sent to clients
    #[serde(skip_serializing)]
    pub path: String,
    pub file_type: String,
    pub size: i64,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookFile {
    /// Size rendered with a binary unit, e.g. `1.5 KiB`
    pub fn human_size(&self) -> String {
        human_size(self.size)
    }
}

/// Render a byte count with the closest binary unit
pub fn human_size(bytes: i64) -> String {
    let adjusted = Byte::from_u64(bytes.max(0) as u64).get_appropriate_unit(UnitType::Binary);
    format!("{adjusted:.1}")
}

/// Book file as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct BookFileView {
    #[serde(flatten)]
    pub file: BookFile,
    pub size_human: String,
}

impl From<BookFile> for BookFileView {
    fn from(file: BookFile) -> Self {
        let size_human = file.human_size();
        Self { file, size_human }
    }
}

/// Publishing house with its files
#[derive(Debug, Clone, Serialize)]
pub struct PublishingHouseDetails {
    #[serde(flatten)]
    pub house: PublishingHouse,
    pub files: Vec<BookFileView>,
}

/// Book with its publishing houses and their files
#[derive(Debug, Clone, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub publishing_houses: Vec<PublishingHouseDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(size: i64) -> BookFile {
        BookFile {
            id: Uuid::new_v4(),
            publishing_house_id: Uuid::new_v4(),
            file_name: "moby-dick.epub".to_string(),
            path: "/srv/libris/temp/abc.epub".to_string(),
            file_type: "epub".to_string(),
            size,
            checksum: "00".repeat(32),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_human_size_uses_binary_units() {
        assert!(human_size(2048).contains("KiB"));
        assert!(human_size(3 * 1024 * 1024).contains("MiB"));
        assert!(human_size(12).contains('B'));
    }

    #[test]
    fn test_file_view_hides_disk_path() {
        let view = BookFileView::from(sample_file(1536));
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("path").is_none());
        assert_eq!(json["file_name"], "moby-dick.epub");
        assert_eq!(json["size"], 1536);
        assert!(json["size_human"].as_str().unwrap().contains("KiB"));
    }
}
