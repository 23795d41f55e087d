//! Graph storage operations for SQLite.
//!
//! This module provides the `GraphStore` struct for persisting and querying
//! the kinship graph in SQLite. Every write that touches more than one row
//! runs inside a single transaction, and every node or edge keyed by an
//! identity is merged rather than inserted, so retries converge.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{GraphError, Result};
use crate::schema::{
    EdgeLabel, Family, Gender, KinshipEdge, Legacy, NewPerson, Person, PersonStatus, Relative,
    VouchState,
};

type PersonRow = (String, String, String, i64, String, String, String, String, String);

/// Result of creating a family group.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyGroup {
    pub family: Family,
    /// Persons linked to the family, in uid order.
    pub members: Vec<String>,
    /// Requested uids that matched no person.
    pub skipped: Vec<String>,
}

/// Node and edge counts across the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub persons: i64,
    pub active_persons: i64,
    pub legacies: i64,
    pub verified_legacies: i64,
    pub families: i64,
    pub kinship_edges: i64,
    pub memberships: i64,
}

/// A person and their immediate parental links.
#[derive(Debug, Clone)]
pub struct FamilySnapshot {
    pub person: Person,
    pub parents: Vec<Relative>,
    pub children: Vec<Relative>,
}

/// Graph storage backed by SQLite.
#[derive(Clone)]
pub struct GraphStore {
    pool: SqlitePool,
}

impl GraphStore {
    /// Create a new GraphStore with an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) a database file and initialize the schema.
    #[instrument]
    pub async fn open(db_path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        info!("Opened kinship graph at {}", db_path.display());
        Ok(Self::new(pool))
    }

    /// Close the underlying pool, waiting for in-flight operations.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the graph schema (called during DB setup).
    #[instrument(skip_all)]
    pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS persons (
                uid TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                gender TEXT NOT NULL,
                age INTEGER NOT NULL,
                residence TEXT NOT NULL,
                phone TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'INACTIVE',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        // Directed kinship edges, keyed so that duplicates are absorbed
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kinship_edges (
                from_uid TEXT NOT NULL REFERENCES persons(uid),
                relation TEXT NOT NULL,
                to_uid TEXT NOT NULL REFERENCES persons(uid),
                created_at TEXT NOT NULL,
                PRIMARY KEY (from_uid, relation, to_uid)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_kinship_to ON kinship_edges(to_uid, relation)")
            .execute(pool)
            .await?;

        // Legacy members and their voter sets
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS legacies (
                uid TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                gender TEXT NOT NULL,
                vouch_count INTEGER NOT NULL DEFAULT 0,
                verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                verified_at TEXT
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS legacy_vouches (
                legacy_uid TEXT NOT NULL REFERENCES legacies(uid),
                voter_uid TEXT NOT NULL,
                vouched_at TEXT NOT NULL,
                PRIMARY KEY (legacy_uid, voter_uid)
            )",
        )
        .execute(pool)
        .await?;

        // Family groups
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS families (
                fid TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS family_members (
                fid TEXT NOT NULL REFERENCES families(fid),
                person_uid TEXT NOT NULL REFERENCES persons(uid),
                joined_at TEXT NOT NULL,
                PRIMARY KEY (fid, person_uid)
            )",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_family_members_person ON family_members(person_uid)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Upsert a person by uid.
    ///
    /// A repeated signup refreshes the profile fields and puts the person
    /// back to `INACTIVE`; activation has to be granted again.
    #[instrument(skip(self), fields(uid = %person.uid))]
    pub async fn upsert_person(&self, person: &NewPerson) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO persons (uid, name, gender, age, residence, phone, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'INACTIVE', ?7, ?7)
             ON CONFLICT(uid) DO UPDATE SET
                name = excluded.name,
                gender = excluded.gender,
                age = excluded.age,
                residence = excluded.residence,
                phone = excluded.phone,
                status = 'INACTIVE',
                updated_at = excluded.updated_at",
        )
        .bind(&person.uid)
        .bind(&person.name)
        .bind(person.gender.as_str())
        .bind(i64::from(person.age))
        .bind(&person.residence)
        .bind(&person.phone)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Move a person from INACTIVE to ACTIVE.
    ///
    /// Returns false when the uid is unknown or the person was already active.
    #[instrument(skip(self))]
    pub async fn activate_person(&self, uid: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE persons SET status = 'ACTIVE', updated_at = ?2
             WHERE uid = ?1 AND status = 'INACTIVE'",
        )
        .bind(uid)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn person_exists(&self, uid: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        person_exists_on(&mut conn, uid).await
    }

    /// Get a person by uid.
    pub async fn get_person(&self, uid: &str) -> Result<Option<Person>> {
        let mut conn = self.pool.acquire().await?;
        fetch_person(&mut conn, uid).await
    }

    /// A person with their parents and children, read from one snapshot.
    ///
    /// Returns `None` when no person has this uid.
    #[instrument(skip(self))]
    pub async fn family_snapshot(&self, uid: &str) -> Result<Option<FamilySnapshot>> {
        let mut tx = self.pool.begin().await?;

        let Some(person) = fetch_person(&mut tx, uid).await? else {
            tx.commit().await?;
            return Ok(None);
        };
        let parents =
            fetch_neighbors(&mut tx, uid, &EdgeLabel::PARENTAL, Direction::Incoming).await?;
        let children =
            fetch_neighbors(&mut tx, uid, &EdgeLabel::PARENTAL, Direction::Outgoing).await?;
        tx.commit().await?;

        Ok(Some(FamilySnapshot {
            person,
            parents,
            children,
        }))
    }

    /// Merge a batch of kinship edges in one transaction.
    ///
    /// Every endpoint must be a stored person; a missing one fails the batch
    /// with `NotFound` before any edge is written. Either every edge is
    /// present afterwards or none of the batch was applied. Returns how many
    /// edges were new.
    #[instrument(skip(self, edges), fields(count = edges.len()))]
    pub async fn merge_edges(&self, edges: &[KinshipEdge]) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        let endpoints: BTreeSet<&str> = edges
            .iter()
            .flat_map(|edge| [edge.from_uid.as_str(), edge.to_uid.as_str()])
            .collect();
        for uid in endpoints {
            if !person_exists_on(&mut tx, uid).await? {
                tx.rollback().await?;
                return Err(GraphError::person_not_found(uid));
            }
        }

        for edge in edges {
            let result = sqlx::query(
                "INSERT INTO kinship_edges (from_uid, relation, to_uid, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(from_uid, relation, to_uid) DO NOTHING",
            )
            .bind(&edge.from_uid)
            .bind(edge.label.as_str())
            .bind(&edge.to_uid)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            created += result.rows_affected();
        }

        tx.commit().await?;
        debug!("Merged {} kinship edges ({} new)", edges.len(), created);
        Ok(created)
    }

    /// Get all kinship edges originating from a person.
    pub async fn edges_from(&self, uid: &str) -> Result<Vec<KinshipEdge>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT from_uid, relation, to_uid FROM kinship_edges
             WHERE from_uid = ?1 ORDER BY relation, to_uid",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(edge_from_row).collect())
    }

    /// Get all kinship edges pointing to a person.
    pub async fn edges_to(&self, uid: &str) -> Result<Vec<KinshipEdge>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT from_uid, relation, to_uid FROM kinship_edges
             WHERE to_uid = ?1 ORDER BY relation, from_uid",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(edge_from_row).collect())
    }

    /// Persons reached from `uid` over any of `labels`, one hop, deduplicated.
    pub async fn outgoing(&self, uid: &str, labels: &[EdgeLabel]) -> Result<Vec<Relative>> {
        self.neighbors(uid, labels, Direction::Outgoing).await
    }

    /// Persons with an edge labelled one of `labels` into `uid`, deduplicated.
    pub async fn incoming(&self, uid: &str, labels: &[EdgeLabel]) -> Result<Vec<Relative>> {
        self.neighbors(uid, labels, Direction::Incoming).await
    }

    async fn neighbors(
        &self,
        uid: &str,
        labels: &[EdgeLabel],
        direction: Direction,
    ) -> Result<Vec<Relative>> {
        let mut conn = self.pool.acquire().await?;
        fetch_neighbors(&mut conn, uid, labels, direction).await
    }

    /// Create a legacy member with its creator as the first vouch.
    #[instrument(skip(self))]
    pub async fn insert_legacy(
        &self,
        name: &str,
        gender: Gender,
        voter_uid: &str,
        threshold: u32,
    ) -> Result<String> {
        let uid = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let verified = threshold <= 1;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO legacies (uid, name, gender, vouch_count, verified, created_at, verified_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6)",
        )
        .bind(&uid)
        .bind(name)
        .bind(gender.as_str())
        .bind(verified)
        .bind(&now)
        .bind(verified.then(|| now.clone()))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO legacy_vouches (legacy_uid, voter_uid, vouched_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&uid)
        .bind(voter_uid)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(uid)
    }

    /// Record a vouch as one guarded read-modify-write.
    ///
    /// The voter set insert comes first and is conditional on both the
    /// legacy existing and the voter being new; the counter only moves when
    /// that insert took effect. Since the insert is the transaction's first
    /// statement it takes the write lock before anything is read, so two
    /// racing submissions from one voter cannot both count.
    ///
    /// Returns `None` when no legacy has this uid.
    #[instrument(skip(self))]
    pub async fn record_vouch(
        &self,
        legacy_uid: &str,
        voter_uid: &str,
        threshold: u32,
    ) -> Result<Option<VouchState>> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let counted = sqlx::query(
            "INSERT OR IGNORE INTO legacy_vouches (legacy_uid, voter_uid, vouched_at)
             SELECT uid, ?2, ?3 FROM legacies WHERE uid = ?1",
        )
        .bind(legacy_uid)
        .bind(voter_uid)
        .bind(&now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if counted {
            sqlx::query(
                "UPDATE legacies SET
                    vouch_count = vouch_count + 1,
                    verified = CASE WHEN verified = 1 OR vouch_count + 1 >= ?2 THEN 1 ELSE 0 END,
                    verified_at = CASE WHEN verified = 0 AND vouch_count + 1 >= ?2 THEN ?3 ELSE verified_at END
                 WHERE uid = ?1",
            )
            .bind(legacy_uid)
            .bind(i64::from(threshold))
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, (i64, i64)>(
            "SELECT vouch_count, verified FROM legacies WHERE uid = ?1",
        )
        .bind(legacy_uid)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(row.map(|(vouch_count, verified)| VouchState {
            vouch_count: u32::try_from(vouch_count).unwrap_or_default(),
            verified: verified != 0,
            counted,
        }))
    }

    /// Get a legacy member together with its voter set.
    pub async fn get_legacy(&self, uid: &str) -> Result<Option<Legacy>> {
        // One read transaction so the count and the set come from one snapshot
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, (String, String, String, i64, i64, String, Option<String>)>(
            "SELECT uid, name, gender, vouch_count, verified, created_at, verified_at
             FROM legacies WHERE uid = ?1",
        )
        .bind(uid)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((uid, name, gender, vouch_count, verified, created_at, verified_at)) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let voters = sqlx::query_scalar::<_, String>(
            "SELECT voter_uid FROM legacy_vouches WHERE legacy_uid = ?1",
        )
        .bind(&uid)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let gender = decode_gender(&uid, &gender);
        Ok(Some(Legacy {
            uid,
            name,
            gender,
            vouch_count: u32::try_from(vouch_count).unwrap_or_default(),
            vouched_by: voters.into_iter().collect(),
            verified: verified != 0,
            created_at: parse_timestamp(&created_at),
            verified_at: verified_at.as_deref().map(parse_timestamp),
        }))
    }

    /// Create a family and link every matching person to it.
    ///
    /// Uids without a person row are skipped rather than failing the batch.
    #[instrument(skip(self, member_uids))]
    pub async fn insert_family(
        &self,
        name: &str,
        member_uids: &BTreeSet<String>,
    ) -> Result<FamilyGroup> {
        let fid = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let now = created_at.to_rfc3339();

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO families (fid, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&fid)
            .bind(name)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        let mut members = Vec::new();
        let mut skipped = Vec::new();
        for uid in member_uids {
            let linked = sqlx::query(
                "INSERT INTO family_members (fid, person_uid, joined_at)
                 SELECT ?1, uid, ?3 FROM persons WHERE uid = ?2
                 ON CONFLICT(fid, person_uid) DO NOTHING",
            )
            .bind(&fid)
            .bind(uid)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0;

            if linked {
                members.push(uid.clone());
            } else {
                skipped.push(uid.clone());
            }
        }
        tx.commit().await?;

        Ok(FamilyGroup {
            family: Family {
                fid,
                name: name.to_string(),
                created_at,
            },
            members,
            skipped,
        })
    }

    /// Everyone sharing at least one family with `uid`, `uid` included.
    pub async fn family_members_of(&self, uid: &str) -> Result<Vec<Relative>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT DISTINCT p.uid, p.name FROM family_members me
             JOIN family_members fm ON fm.fid = me.fid
             JOIN persons p ON p.uid = fm.person_uid
             WHERE me.person_uid = ?1
             ORDER BY p.name, p.uid",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(uid, name)| Relative { uid, name })
            .collect())
    }

    /// Families a person belongs to, oldest first.
    pub async fn families_of(&self, uid: &str) -> Result<Vec<Family>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT f.fid, f.name, f.created_at FROM families f
             JOIN family_members m ON m.fid = f.fid
             WHERE m.person_uid = ?1
             ORDER BY f.created_at, f.fid",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(fid, name, created_at)| Family {
                fid,
                name,
                created_at: parse_timestamp(&created_at),
            })
            .collect())
    }

    /// Get node and edge counts.
    pub async fn stats(&self) -> Result<GraphStats> {
        let (
            persons,
            active_persons,
            legacies,
            verified_legacies,
            families,
            kinship_edges,
            memberships,
        ) = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
            "SELECT
                (SELECT COUNT(*) FROM persons),
                (SELECT COUNT(*) FROM persons WHERE status = 'ACTIVE'),
                (SELECT COUNT(*) FROM legacies),
                (SELECT COUNT(*) FROM legacies WHERE verified = 1),
                (SELECT COUNT(*) FROM families),
                (SELECT COUNT(*) FROM kinship_edges),
                (SELECT COUNT(*) FROM family_members)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GraphStats {
            persons,
            active_persons,
            legacies,
            verified_legacies,
            families,
            kinship_edges,
            memberships,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Outgoing,
    Incoming,
}

async fn person_exists_on(conn: &mut SqliteConnection, uid: &str) -> Result<bool> {
    let found: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM persons WHERE uid = ?1)")
        .bind(uid)
        .fetch_one(conn)
        .await?;
    Ok(found != 0)
}

async fn fetch_person(conn: &mut SqliteConnection, uid: &str) -> Result<Option<Person>> {
    let row = sqlx::query_as::<_, PersonRow>(
        "SELECT uid, name, gender, age, residence, phone, status, created_at, updated_at
         FROM persons WHERE uid = ?1",
    )
    .bind(uid)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(
        |(uid, name, gender, age, residence, phone, status, created_at, updated_at)| Person {
            gender: decode_gender(&uid, &gender),
            status: decode_status(&uid, &status),
            age: u32::try_from(age).unwrap_or_default(),
            uid,
            name,
            residence,
            phone,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        },
    ))
}

async fn fetch_neighbors(
    conn: &mut SqliteConnection,
    uid: &str,
    labels: &[EdgeLabel],
    direction: Direction,
) -> Result<Vec<Relative>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    // Only placeholders are spliced in; labels themselves are bound.
    let (anchor, other) = match direction {
        Direction::Outgoing => ("from_uid", "to_uid"),
        Direction::Incoming => ("to_uid", "from_uid"),
    };
    let placeholders = vec!["?"; labels.len()].join(", ");
    let sql = format!(
        "SELECT DISTINCT p.uid, p.name FROM kinship_edges e
         JOIN persons p ON p.uid = e.{other}
         WHERE e.{anchor} = ? AND e.relation IN ({placeholders})
         ORDER BY p.name, p.uid"
    );

    let mut query = sqlx::query_as::<_, (String, String)>(&sql).bind(uid);
    for label in labels {
        query = query.bind(label.as_str());
    }
    let rows = query.fetch_all(conn).await?;

    Ok(rows
        .into_iter()
        .map(|(uid, name)| Relative { uid, name })
        .collect())
}

fn decode_gender(uid: &str, value: &str) -> Gender {
    Gender::parse(value).unwrap_or_else(|| {
        warn!(uid, value, "Unrecognized gender in store, reading as OTHER");
        Gender::Other
    })
}

fn decode_status(uid: &str, value: &str) -> PersonStatus {
    PersonStatus::parse(value).unwrap_or_else(|| {
        warn!(uid, value, "Unrecognized status in store, reading as INACTIVE");
        PersonStatus::Inactive
    })
}

fn edge_from_row((from_uid, relation, to_uid): (String, String, String)) -> Option<KinshipEdge> {
    EdgeLabel::parse(&relation).map(|label| KinshipEdge {
        from_uid,
        label,
        to_uid,
    })
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
