//! Loaders for the nested book → publishing house → file views

use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{BookFile, BookFileView, PublishingHouse, PublishingHouseDetails};

pub(crate) const HOUSE_COLUMNS: &str = "id, book_id, name, lang, created_at, updated_at";

pub(crate) const FILE_COLUMNS: &str =
    "id, publishing_house_id, file_name, path, file_type, size, checksum, created_at, updated_at";

/// Files of every given house, grouped by house id
pub async fn files_by_house(
    pool: &PgPool,
    house_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<BookFile>>, sqlx::Error> {
    if house_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT {FILE_COLUMNS} FROM book_files \
         WHERE publishing_house_id = ANY($1) \
         ORDER BY created_at"
    );
    let files: Vec<BookFile> = sqlx::query_as(&sql).bind(house_ids).fetch_all(pool).await?;

    let mut grouped: HashMap<Uuid, Vec<BookFile>> = HashMap::new();
    for file in files {
        grouped.entry(file.publishing_house_id).or_default().push(file);
    }
    Ok(grouped)
}

/// Attach files to already loaded houses, preserving their order
pub async fn with_files(
    pool: &PgPool,
    houses: Vec<PublishingHouse>,
) -> Result<Vec<PublishingHouseDetails>, sqlx::Error> {
    let ids: Vec<Uuid> = houses.iter().map(|h| h.id).collect();
    let mut files = files_by_house(pool, &ids).await?;

    Ok(houses
        .into_iter()
        .map(|house| {
            let files = files
                .remove(&house.id)
                .unwrap_or_default()
                .into_iter()
                .map(BookFileView::from)
                .collect();
            PublishingHouseDetails { house, files }
        })
        .collect())
}

/// Publishing houses of a book, each with its files
pub async fn houses_for_book(
    pool: &PgPool,
    book_id: Uuid,
) -> Result<Vec<PublishingHouseDetails>, sqlx::Error> {
    let sql = format!(
        "SELECT {HOUSE_COLUMNS} FROM publishing_houses WHERE book_id = $1 ORDER BY created_at"
    );
    let houses: Vec<PublishingHouse> = sqlx::query_as(&sql).bind(book_id).fetch_all(pool).await?;

    with_files(pool, houses).await
}

/// Whether a publishing house with this id exists
pub async fn house_exists(pool: &PgPool, house_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM publishing_houses WHERE id = $1)")
        .bind(house_id)
        .fetch_one(pool)
        .await
}
