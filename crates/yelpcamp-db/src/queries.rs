use std::collections::HashMap;

use crate::Database;
use crate::models::{CampgroundRow, ImageRow, ReviewRow, SessionRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};
use yelpcamp_types::forms::{CampgroundInput, ReviewInput};
use yelpcamp_types::models::{Campground, Image, Review};

const CAMPGROUND_COLUMNS: &str = "c.id, c.author_id, u.username, c.title, c.price, c.description,
     c.location, c.created_at, c.updated_at";

const REVIEW_COLUMNS: &str =
    "r.id, r.campground_id, r.author_id, u.username, r.rating, r.body, r.created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Campgrounds --

    pub fn insert_campground(&self, id: &str, author_id: &str, input: &CampgroundInput) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO campgrounds (id, author_id, title, price, description, location)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    id,
                    author_id,
                    &input.title,
                    input.price,
                    &input.description,
                    &input.location,
                ],
            )?;
            insert_images(&tx, id, &input.images)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Overwrites the descriptive fields and the image list.
    /// Returns false if the campground does not exist.
    pub fn update_campground(&self, id: &str, input: &CampgroundInput) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let changed = tx.execute(
                "UPDATE campgrounds
                 SET title = ?2, price = ?3, description = ?4, location = ?5,
                     updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    &input.title,
                    input.price,
                    &input.description,
                    &input.location,
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute("DELETE FROM campground_images WHERE campground_id = ?1", [id])?;
            insert_images(&tx, id, &input.images)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Deletes the campground together with its reviews and images.
    pub fn delete_campground(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM reviews WHERE campground_id = ?1", [id])?;
            tx.execute("DELETE FROM campground_images WHERE campground_id = ?1", [id])?;
            let removed = tx.execute("DELETE FROM campgrounds WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
    }

    pub fn get_campground(&self, id: &str) -> Result<Option<Campground>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CAMPGROUND_COLUMNS}
                 FROM campgrounds c
                 LEFT JOIN users u ON c.author_id = u.id
                 WHERE c.id = ?1"
            );
            let row = conn.query_row(&sql, [id], campground_row).optional()?;
            let Some(row) = row else {
                return Ok(None);
            };

            let mut images = query_images(conn, &[row.id.clone()])?;
            let images = images.remove(&row.id).unwrap_or_default();
            Ok(Some(row.into_model(images)))
        })
    }

    /// All campgrounds, newest first.
    pub fn list_campgrounds(&self) -> Result<Vec<Campground>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CAMPGROUND_COLUMNS}
                 FROM campgrounds c
                 LEFT JOIN users u ON c.author_id = u.id
                 ORDER BY c.created_at DESC, c.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], campground_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
            let mut images = query_images(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|row| {
                    let imgs = images.remove(&row.id).unwrap_or_default();
                    row.into_model(imgs)
                })
                .collect())
        })
    }

    // -- Reviews --

    pub fn insert_review(
        &self,
        id: &str,
        campground_id: &str,
        author_id: &str,
        input: &ReviewInput,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reviews (id, campground_id, author_id, rating, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, campground_id, author_id, input.rating, &input.body],
            )?;
            Ok(())
        })
    }

    pub fn get_review(&self, id: &str) -> Result<Option<Review>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REVIEW_COLUMNS}
                 FROM reviews r
                 LEFT JOIN users u ON r.author_id = u.id
                 WHERE r.id = ?1"
            );
            let row = conn.query_row(&sql, [id], review_row).optional()?;
            Ok(row.map(ReviewRow::into_model))
        })
    }

    pub fn delete_review(&self, campground_id: &str, review_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM reviews WHERE id = ?1 AND campground_id = ?2",
                [review_id, campground_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Reviews of one campground, oldest first.
    pub fn get_reviews_for_campground(&self, campground_id: &str) -> Result<Vec<Review>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {REVIEW_COLUMNS}
                 FROM reviews r
                 LEFT JOIN users u ON r.author_id = u.id
                 WHERE r.campground_id = ?1
                 ORDER BY r.created_at ASC, r.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([campground_id], review_row)?
                .map(|r| r.map(ReviewRow::into_model))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Sessions --

    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, data, expires_at, last_modified FROM sessions WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(SessionRow {
                            id: row.get(0)?,
                            data: row.get(1)?,
                            expires_at: row.get(2)?,
                            last_modified: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn upsert_session(&self, row: &SessionRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, data, expires_at, last_modified) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     data = excluded.data,
                     expires_at = excluded.expires_at,
                     last_modified = excluded.last_modified",
                (&row.id, &row.data, &row.expires_at, &row.last_modified),
            )?;
            Ok(())
        })
    }

    /// Refreshes expiry without rewriting the session payload.
    pub fn touch_session(&self, id: &str, expires_at: &str, last_modified: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET expires_at = ?2, last_modified = ?3 WHERE id = ?1",
                (id, expires_at, last_modified),
            )?;
            Ok(())
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// `now` must use the same fixed-width RFC 3339 format as stored expiries.
    pub fn delete_expired_sessions(&self, now: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?;
            Ok(removed)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn campground_row(row: &Row<'_>) -> rusqlite::Result<CampgroundRow> {
    Ok(CampgroundRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        title: row.get(3)?,
        price: row.get(4)?,
        description: row.get(5)?,
        location: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn review_row(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    Ok(ReviewRow {
        id: row.get(0)?,
        campground_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        rating: row.get(4)?,
        body: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn insert_images(conn: &Connection, campground_id: &str, images: &[Image]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO campground_images (campground_id, position, url, filename)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, image) in images.iter().enumerate() {
        stmt.execute(rusqlite::params![
            campground_id,
            position as i64,
            &image.url,
            &image.filename
        ])?;
    }
    Ok(())
}

/// Batch-fetch images for a set of campground IDs, grouped by campground.
fn query_images(conn: &Connection, campground_ids: &[String]) -> Result<HashMap<String, Vec<Image>>> {
    let mut grouped: HashMap<String, Vec<Image>> = HashMap::new();
    if campground_ids.is_empty() {
        return Ok(grouped);
    }

    let placeholders: Vec<String> = (1..=campground_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT campground_id, url, filename FROM campground_images
         WHERE campground_id IN ({})
         ORDER BY campground_id, position",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = campground_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(params.as_slice(), |row| {
            Ok(ImageRow {
                campground_id: row.get(0)?,
                url: row.get(1)?,
                filename: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for row in rows {
        grouped
            .entry(row.campground_id.clone())
            .or_default()
            .push(row.into_model());
    }
    Ok(grouped)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_user(name: &str) -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        db.create_user(&id, name, &format!("{name}@example.com"), "$argon2id$fake").unwrap();
        (db, id)
    }

    fn input(title: &str, images: &[&str]) -> CampgroundInput {
        CampgroundInput {
            title: title.into(),
            location: "Moab, Utah".into(),
            price: 15.0,
            description: "Red rock".into(),
            images: images.iter().map(|u| Image::from_url(u)).collect(),
        }
    }

    #[test]
    fn users_are_unique_by_username_and_email() {
        let (db, id) = db_with_user("tim");
        assert_eq!(db.get_user_by_id(&id).unwrap().unwrap().username, "tim");
        assert!(db.get_user_by_email("tim@example.com").unwrap().is_some());
        let dup_name = db.create_user("other", "tim", "x@example.com", "h").unwrap_err();
        assert!(crate::is_constraint_violation(&dup_name));
        let dup_email = db.create_user("other", "tom", "tim@example.com", "h").unwrap_err();
        assert!(crate::is_constraint_violation(&dup_email));
        assert!(!crate::is_constraint_violation(&anyhow::anyhow!("disk on fire")));
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn campground_round_trip_keeps_image_order() {
        let (db, author) = db_with_user("tim");
        db.insert_campground("c1", &author, &input("Arches", &["https://a/1.jpg", "https://a/2.jpg"]))
            .unwrap();

        let camp = db.get_campground("c1").unwrap().unwrap();
        assert_eq!(camp.title, "Arches");
        assert_eq!(camp.author.username, "tim");
        let files: Vec<_> = camp.images.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(files, vec!["1.jpg", "2.jpg"]);

        assert!(db.update_campground("c1", &input("Arches NP", &["https://a/3.jpg"])).unwrap());
        let camp = db.get_campground("c1").unwrap().unwrap();
        assert_eq!(camp.title, "Arches NP");
        assert_eq!(camp.images.len(), 1);

        assert!(!db.update_campground("missing", &input("x", &[])).unwrap());
    }

    #[test]
    fn list_is_newest_first() {
        let (db, author) = db_with_user("tim");
        db.insert_campground("c1", &author, &input("First", &[])).unwrap();
        db.insert_campground("c2", &author, &input("Second", &["https://b/x.png"])).unwrap();

        let list = db.list_campgrounds().unwrap();
        let titles: Vec<_> = list.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert_eq!(list[0].images.len(), 1);
        assert!(list[1].images.is_empty());
    }

    #[test]
    fn deleting_campground_removes_reviews() {
        let (db, author) = db_with_user("tim");
        db.insert_campground("c1", &author, &input("Arches", &["https://a/1.jpg"])).unwrap();
        let review = ReviewInput { rating: 4, body: "Windy".into() };
        db.insert_review("r1", "c1", &author, &review).unwrap();
        assert_eq!(db.get_reviews_for_campground("c1").unwrap().len(), 1);

        assert!(db.delete_campground("c1").unwrap());
        assert!(db.get_campground("c1").unwrap().is_none());
        assert!(db.get_reviews_for_campground("c1").unwrap().is_empty());
        assert!(db.get_review("r1").unwrap().is_none());
        assert!(!db.delete_campground("c1").unwrap());
    }

    #[test]
    fn review_delete_is_scoped_to_campground() {
        let (db, author) = db_with_user("tim");
        db.insert_campground("c1", &author, &input("A", &[])).unwrap();
        db.insert_campground("c2", &author, &input("B", &[])).unwrap();
        let review = ReviewInput { rating: 5, body: "Great".into() };
        db.insert_review("r1", "c1", &author, &review).unwrap();

        assert!(!db.delete_review("c2", "r1").unwrap());
        assert!(db.delete_review("c1", "r1").unwrap());
    }

    #[test]
    fn session_touch_and_expiry() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_session(&SessionRow {
            id: "s1".into(),
            data: "{}".into(),
            expires_at: "2026-01-08T00:00:00Z".into(),
            last_modified: "2026-01-01T00:00:00Z".into(),
        })
        .unwrap();

        db.touch_session("s1", "2026-01-09T00:00:00Z", "2026-01-02T00:00:00Z").unwrap();
        let row = db.get_session("s1").unwrap().unwrap();
        assert_eq!(row.data, "{}");
        assert_eq!(row.expires_at, "2026-01-09T00:00:00Z");

        assert_eq!(db.delete_expired_sessions("2026-01-08T12:00:00Z").unwrap(), 0);
        assert_eq!(db.delete_expired_sessions("2026-01-09T00:00:00Z").unwrap(), 1);
        assert!(db.get_session("s1").unwrap().is_none());
    }
}
