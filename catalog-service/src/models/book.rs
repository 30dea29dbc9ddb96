use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::query::Field;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Borrowed view of a single column, used when predicates are evaluated in memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Integer(i64),
    Text(&'a str),
}

impl Book {
    pub fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Id => FieldValue::Integer(self.id),
            Field::Title => FieldValue::Text(&self.title),
            Field::Author => FieldValue::Text(&self.author),
            Field::Publisher => FieldValue::Text(&self.publisher),
            Field::Year => FieldValue::Integer(i64::from(self.year)),
        }
    }
}

/// Catalog served by the memory backend when no seed file is configured.
pub fn sample_catalog() -> Vec<Book> {
    let rows = [
        (1, "Laskar Pelangi", "Andrea Hirata", "Bentang Pustaka", 2005),
        (2, "Bumi Manusia", "Pramoedya Ananta Toer", "Hasta Mitra", 1980),
        (3, "Ronggeng Dukuh Paruk", "Ahmad Tohari", "Gramedia", 1982),
        (4, "Cantik Itu Luka", "Eka Kurniawan", "Gramedia", 2002),
        (5, "Negeri 5 Menara", "Ahmad Fuadi", "Gramedia", 2009),
        (6, "Sang Pemimpi", "Andrea Hirata", "Bentang Pustaka", 2006),
        (7, "Anak Semua Bangsa", "Pramoedya Ananta Toer", "Hasta Mitra", 1980),
        (8, "Pulang", "Leila S. Chudori", "Kepustakaan Populer Gramedia", 2012),
        (9, "Saman", "Ayu Utami", "Kepustakaan Populer Gramedia", 1998),
        (10, "Perahu Kertas", "Dee Lestari", "Bentang Pustaka", 2009),
        (11, "Supernova", "Dee Lestari", "Truedee Books", 2001),
        (12, "Lelaki Harimau", "Eka Kurniawan", "Gramedia", 2004),
    ];

    rows.into_iter()
        .map(|(id, title, author, publisher, year)| Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            publisher: publisher.to_string(),
            year,
            created_at: None,
            updated_at: None,
        })
        .collect()
}
