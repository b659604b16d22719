//! Sample library used when `repository.seed` is enabled.

use time::macros::date;
use uuid::Uuid;

use crate::entities::{Author, Book};

pub const STEPHEN_KING: Uuid = Uuid::from_u128(0x25320c5e_f58a_4b1f_b63a_8ee07a840bdf);
pub const GEORGE_MARTIN: Uuid = Uuid::from_u128(0x76053df4_6687_4353_8937_b45556748abe);
pub const DOUGLAS_ADAMS: Uuid = Uuid::from_u128(0x412c3012_d891_4f5e_9613_ff7aa63e6bb3);

fn author(id: Uuid, first_name: &str, last_name: &str, date_of_birth: time::Date, genre: &str) -> Author {
    Author {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        date_of_birth,
        genre: genre.to_string(),
    }
}

fn book(id: u128, author_id: Uuid, title: &str, description: &str) -> Book {
    Book {
        id: Uuid::from_u128(id),
        author_id,
        title: title.to_string(),
        description: Some(description.to_string()),
    }
}

/// Authors and their books with stable ids.
pub fn sample_library() -> (Vec<Author>, Vec<Book>) {
    let authors = vec![
        author(STEPHEN_KING, "Stephen", "King", date!(1947 - 09 - 21), "Horror"),
        author(GEORGE_MARTIN, "George", "RR Martin", date!(1948 - 09 - 20), "Fantasy"),
        author(DOUGLAS_ADAMS, "Douglas", "Adams", date!(1952 - 03 - 11), "Science fiction"),
    ];

    let books = vec![
        book(
            0xc7ba6add_09c4_45f8_8dd0_eaca221e5d93,
            STEPHEN_KING,
            "The Shining",
            "The Shining is a horror novel by American author Stephen King. Published in 1977.",
        ),
        book(
            0xa3749477_f823_4124_aa4a_fc9ad5e79cd6,
            STEPHEN_KING,
            "Misery",
            "Misery is a psychological horror thriller novel by Stephen King, published in 1987.",
        ),
        book(
            0x447eb762_95e9_4c31_95e1_b20053fbe215,
            GEORGE_MARTIN,
            "A Game of Thrones",
            "The first novel in A Song of Ice and Fire, published on August 1, 1996.",
        ),
        book(
            0xbc4c35c3_3857_4250_9449_155fcf5109ec,
            DOUGLAS_ADAMS,
            "The Hitchhiker's Guide to the Galaxy",
            "A comedy science fiction series created by Douglas Adams.",
        ),
    ];

    (authors, books)
}
