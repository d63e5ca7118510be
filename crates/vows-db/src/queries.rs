use crate::models::{CommitmentRow, GuestRow, UserRow, WeddingRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};
use vows_types::models::{CommitmentId, NewCommitment, NewUser, NewWedding, UserId, WeddingId};

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser) -> Result<UserId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, email, password) VALUES (?1, ?2, ?3, ?4)",
                (&user.first_name, &user.last_name, &user.email, &user.password_hash),
            )?;
            Ok(UserId(conn.last_insert_rowid()))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id.0))
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| exists(conn, "SELECT 1 FROM users WHERE email = ?1", [email]))
    }

    pub fn user_exists(&self, id: UserId) -> Result<bool> {
        self.with_conn(|conn| exists(conn, "SELECT 1 FROM users WHERE id = ?1", [id.0]))
    }

    // -- Weddings --

    pub fn create_wedding(&self, wedding: &NewWedding) -> Result<WeddingId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO weddings (nearlywed_one, nearlywed_two, date, address, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    wedding.nearlywed_one,
                    wedding.nearlywed_two,
                    wedding.date,
                    wedding.address,
                    wedding.creator_id.0,
                ],
            )?;
            Ok(WeddingId(conn.last_insert_rowid()))
        })
    }

    /// Every wedding with its guest count, soonest first.
    pub fn list_weddings(&self) -> Result<Vec<WeddingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT w.id, w.nearlywed_one, w.nearlywed_two, w.date, w.address, w.user_id,
                        (SELECT COUNT(*) FROM commitments c WHERE c.wedding_id = w.id)
                 FROM weddings w
                 ORDER BY w.date, w.id",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    let mut wedding = wedding_from_row(row)?;
                    wedding.guest_count = row.get::<_, i64>(6)? as usize;
                    Ok(wedding)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_wedding(&self, id: WeddingId) -> Result<Option<WeddingRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, nearlywed_one, nearlywed_two, date, address, user_id
                 FROM weddings WHERE id = ?1",
                [id.0],
                wedding_from_row,
            )
            .optional()
        })
    }

    pub fn wedding_exists(&self, id: WeddingId) -> Result<bool> {
        self.with_conn(|conn| exists(conn, "SELECT 1 FROM weddings WHERE id = ?1", [id.0]))
    }

    /// Delete a wedding only if `owner` created it. Its commitments go with it
    /// through the foreign key cascade. Returns whether a row was removed.
    pub fn delete_wedding_owned(&self, id: WeddingId, owner: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM weddings WHERE id = ?1 AND user_id = ?2",
                [id.0, owner.0],
            )?;
            Ok(removed > 0)
        })
    }

    // -- Commitments --

    pub fn create_commitment(&self, commitment: &NewCommitment) -> Result<CommitmentId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO commitments (user_id, wedding_id) VALUES (?1, ?2)",
                [commitment.user_id.0, commitment.wedding_id.0],
            )?;
            Ok(CommitmentId(conn.last_insert_rowid()))
        })
    }

    pub fn commitment_exists(&self, user_id: UserId, wedding_id: WeddingId) -> Result<bool> {
        self.with_conn(|conn| {
            exists(
                conn,
                "SELECT 1 FROM commitments WHERE user_id = ?1 AND wedding_id = ?2",
                [user_id.0, wedding_id.0],
            )
        })
    }

    pub fn commitments_for_user(&self, user_id: UserId) -> Result<Vec<CommitmentRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, user_id, wedding_id FROM commitments WHERE user_id = ?1")?;
            let rows = stmt
                .query_map([user_id.0], commitment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Guests of one wedding in RSVP order.
    pub fn guests_for_wedding(&self, wedding_id: WeddingId) -> Result<Vec<GuestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, u.id, u.first_name, u.last_name
                 FROM commitments c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.wedding_id = ?1
                 ORDER BY c.id",
            )?;

            let rows = stmt
                .query_map([wedding_id.0], |row| {
                    Ok(GuestRow {
                        commitment_id: CommitmentId(row.get(0)?),
                        user_id: UserId(row.get(1)?),
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete a commitment only if it belongs to `guest`.
    pub fn delete_commitment_owned(&self, id: CommitmentId, guest: UserId) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM commitments WHERE id = ?1 AND user_id = ?2",
                [id.0, guest.0],
            )?;
            Ok(removed > 0)
        })
    }

    // -- Sessions --

    pub fn create_session(&self, token: &str, user_id: UserId) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id) VALUES (?1, ?2)",
                rusqlite::params![token, user_id.0],
            )?;
            Ok(())
        })
    }

    pub fn session_user(&self, token: &str) -> Result<Option<UserId>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT user_id FROM sessions WHERE token = ?1", [token], |row| {
                Ok(UserId(row.get(0)?))
            })
            .optional()
        })
    }

    /// Idempotent: removing an unknown token is not an error.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
            Ok(())
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, predicate: &str, value: P) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, first_name, last_name, password FROM users WHERE {}",
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: UserId(row.get(0)?),
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                password: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn wedding_from_row(row: &Row<'_>) -> rusqlite::Result<WeddingRow> {
    Ok(WeddingRow {
        id: WeddingId(row.get(0)?),
        nearlywed_one: row.get(1)?,
        nearlywed_two: row.get(2)?,
        date: row.get(3)?,
        address: row.get(4)?,
        creator_id: UserId(row.get(5)?),
        guest_count: 0,
    })
}

fn commitment_from_row(row: &Row<'_>) -> rusqlite::Result<CommitmentRow> {
    Ok(CommitmentRow {
        id: CommitmentId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        wedding_id: WeddingId(row.get(2)?),
    })
}

fn exists<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<bool> {
    Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
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
    use crate::is_unique_violation;
    use chrono::NaiveDate;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn user(db: &Database, email: &str) -> UserId {
        db.create_user(&NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
        })
        .unwrap()
    }

    fn wedding(db: &Database, creator: UserId) -> WeddingId {
        db.create_wedding(&NewWedding {
            nearlywed_one: "Ann".into(),
            nearlywed_two: "Bob".into(),
            date: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            address: "1 Chapel Rd".into(),
            creator_id: creator,
        })
        .unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn ids_start_at_one() {
        let db = db();
        let id = user(&db, "a@x.com");
        assert!(!id.is_unset());
        assert_eq!(id, UserId(1));
    }

    #[test]
    fn email_lookup_is_exact() {
        let db = db();
        let id = user(&db, "a@x.com");

        let found = db.get_user_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.first_name, "Ada");
        assert!(db.get_user_by_email("b@x.com").unwrap().is_none());
        assert!(db.email_exists("a@x.com").unwrap());
        assert!(db.get_user_by_id(id).unwrap().is_some());
    }

    #[test]
    fn duplicate_email_hits_unique_constraint() {
        let db = db();
        user(&db, "a@x.com");

        let err = db
            .create_user(&NewUser {
                first_name: "Other".into(),
                last_name: "Person".into(),
                email: "a@x.com".into(),
                password_hash: "x".into(),
            })
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(count(&db, "users"), 1);
    }

    #[test]
    fn listing_counts_guests() {
        let db = db();
        let a = user(&db, "a@x.com");
        let b = user(&db, "b@x.com");
        let w = wedding(&db, a);
        db.create_commitment(&NewCommitment { user_id: a, wedding_id: w }).unwrap();
        db.create_commitment(&NewCommitment { user_id: b, wedding_id: w }).unwrap();

        let rows = db.list_weddings().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].guest_count, 2);
        assert_eq!(rows[0].creator_id, a);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2030, 6, 1).unwrap());
    }

    #[test]
    fn duplicate_commitment_hits_unique_constraint() {
        let db = db();
        let a = user(&db, "a@x.com");
        let w = wedding(&db, a);
        let rsvp = NewCommitment { user_id: a, wedding_id: w };

        db.create_commitment(&rsvp).unwrap();
        let err = db.create_commitment(&rsvp).unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(count(&db, "commitments"), 1);
        assert!(db.commitment_exists(a, w).unwrap());
    }

    #[test]
    fn only_the_creator_deletes_a_wedding() {
        let db = db();
        let a = user(&db, "a@x.com");
        let b = user(&db, "b@x.com");
        let w = wedding(&db, a);

        assert!(!db.delete_wedding_owned(w, b).unwrap());
        assert!(db.wedding_exists(w).unwrap());

        assert!(db.delete_wedding_owned(w, a).unwrap());
        assert!(!db.wedding_exists(w).unwrap());
        assert!(!db.delete_wedding_owned(w, a).unwrap());
    }

    #[test]
    fn deleting_a_wedding_cascades_to_commitments() {
        let db = db();
        let a = user(&db, "a@x.com");
        let b = user(&db, "b@x.com");
        let w = wedding(&db, a);
        db.create_commitment(&NewCommitment { user_id: b, wedding_id: w }).unwrap();

        db.delete_wedding_owned(w, a).unwrap();
        assert_eq!(count(&db, "commitments"), 0);
    }

    #[test]
    fn only_the_guest_deletes_a_commitment() {
        let db = db();
        let a = user(&db, "a@x.com");
        let b = user(&db, "b@x.com");
        let w = wedding(&db, a);
        let c = db.create_commitment(&NewCommitment { user_id: b, wedding_id: w }).unwrap();

        assert!(!db.delete_commitment_owned(c, a).unwrap());
        assert_eq!(db.commitments_for_user(b).unwrap().len(), 1);
        assert!(db.delete_commitment_owned(c, b).unwrap());
        assert!(db.commitments_for_user(b).unwrap().is_empty());
    }

    #[test]
    fn guests_are_joined_with_names() {
        let db = db();
        let a = user(&db, "a@x.com");
        let w = wedding(&db, a);
        let c = db.create_commitment(&NewCommitment { user_id: a, wedding_id: w }).unwrap();

        let guests = db.guests_for_wedding(w).unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].commitment_id, c);
        assert_eq!(guests[0].last_name, "Lovelace");
        assert_eq!(db.commitments_for_user(a).unwrap().len(), 1);
    }

    #[test]
    fn sessions_resolve_and_clear() {
        let db = db();
        let a = user(&db, "a@x.com");

        db.create_session("tok", a).unwrap();
        assert_eq!(db.session_user("tok").unwrap(), Some(a));

        db.delete_session("tok").unwrap();
        assert_eq!(db.session_user("tok").unwrap(), None);
        db.delete_session("tok").unwrap();
    }

    #[test]
    fn migrations_are_idempotent() {
        let db = db();
        db.with_conn(|conn| crate::migrations::run(conn)).unwrap();
        let version: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(version, 1);
    }
}
