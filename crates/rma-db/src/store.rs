//! The atlas store and its transactional session scope.
//!
//! [`Store`] owns the SQLite connection. All reads and writes go through
//! [`Store::with_session`], which wraps the given closure in one transaction:
//! commit when the closure returns `Ok`, rollback when it returns `Err`. The
//! pipeline is single-threaded, so one connection behind a mutex is enough;
//! sessions are never shared across stages.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use crate::error::{DbError, DbResult};
use crate::records::{
    AnalysisStatus, DiscrepancyRow, LoopInfo, LoopOrderRow, LoopPositionRow, MotifLoopRow,
    MotifRow, ParentRow, PdbInfo, ReleaseDiffRow, ReleaseRow, SetDiffRow, UnitInfo,
};
use crate::schema;

/// Row counts for everything keyed on one release id, used to verify that a
/// compensating purge restored the pre-commit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseCounts {
    pub releases: i64,
    pub motifs: i64,
    pub memberships: i64,
    pub parents: i64,
    pub set_diffs: i64,
    pub release_diffs: i64,
    pub loop_orders: i64,
    pub loop_positions: i64,
    pub discrepancies: i64,
}

/// Handle to the atlas database.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if necessary) the database at the given path and bring
    /// the schema up to date.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database, for tests and bootstrap experiments.
    pub fn in_memory() -> DbResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        schema::create_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `work` inside one transaction. Commits on `Ok`, rolls back on
    /// `Err`; the connection is released either way.
    ///
    /// The error type is generic so callers can compose their own domain
    /// errors inside the transactional scope; anything the session itself
    /// raises converts in via `From<DbError>`.
    pub fn with_session<T, E>(&self, work: impl FnOnce(&Session<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError> + std::fmt::Display,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| E::from(DbError::internal("store mutex poisoned")))?;
        let txn = conn
            .transaction()
            .map_err(|e| E::from(DbError::from(e)))?;
        let session = Session { txn };
        match work(&session) {
            Ok(value) => {
                session
                    .txn
                    .commit()
                    .map_err(|e| E::from(DbError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("Transaction failed, rolling back: {err}");
                if let Err(rollback_err) = session.txn.rollback() {
                    tracing::error!("Rollback after failure also failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

/// One scoped unit of work over the atlas database.
pub struct Session<'c> {
    txn: Transaction<'c>,
}

impl Session<'_> {
    // ------------------------------------------------------------------
    // pdb_info
    // ------------------------------------------------------------------

    /// Insert or replace catalog metadata for one structure.
    pub fn upsert_pdb_info(&self, info: &PdbInfo) -> DbResult<()> {
        self.txn.execute(
            "INSERT OR REPLACE INTO pdb_info
                 (pdb_id, title, experimental_technique, resolution, release_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                info.pdb_id,
                info.title,
                info.experimental_technique,
                info.resolution,
                info.release_date,
            ],
        )?;
        Ok(())
    }

    pub fn has_pdb_info(&self, pdb: &str) -> DbResult<bool> {
        self.exists("SELECT 1 FROM pdb_info WHERE pdb_id = ?1", pdb)
    }

    /// Every structure code known to the database, sorted.
    pub fn pdb_ids(&self) -> DbResult<Vec<String>> {
        let mut statement = self
            .txn
            .prepare("SELECT pdb_id FROM pdb_info ORDER BY pdb_id")?;
        let rows = statement.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // unit_info
    // ------------------------------------------------------------------

    pub fn insert_unit(&self, unit: &UnitInfo) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO unit_info
                 (unit_id, pdb_id, model, chain, unit, number,
                  alt_id, ins_code, sym_op, chain_index)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                unit.unit_id,
                unit.pdb_id,
                unit.model,
                unit.chain,
                unit.unit,
                unit.number,
                unit.alt_id,
                unit.ins_code,
                unit.sym_op,
                unit.chain_index,
            ],
        )?;
        Ok(())
    }

    pub fn has_units(&self, pdb: &str) -> DbResult<bool> {
        self.exists("SELECT 1 FROM unit_info WHERE pdb_id = ?1", pdb)
    }

    pub fn delete_units(&self, pdb: &str) -> DbResult<()> {
        self.txn
            .execute("DELETE FROM unit_info WHERE pdb_id = ?1", params![pdb])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // pdb_analysis_status
    // ------------------------------------------------------------------

    /// Record that `stage` finished for `pdb` at `time`.
    pub fn mark_analysis_status(&self, status: &AnalysisStatus) -> DbResult<()> {
        self.txn.execute(
            "INSERT OR REPLACE INTO pdb_analysis_status (pdb, stage, time)
             VALUES (?1, ?2, ?3)",
            params![status.pdb, status.stage, status.time],
        )?;
        Ok(())
    }

    /// The last completion time for (entry, stage), if any.
    pub fn analysis_status(&self, pdb: &str, stage: &str) -> DbResult<Option<DateTime<Utc>>> {
        let time = self
            .txn
            .query_row(
                "SELECT time FROM pdb_analysis_status WHERE pdb = ?1 AND stage = ?2",
                params![pdb, stage],
                |row| row.get(0),
            )
            .optional()?;
        Ok(time)
    }

    // ------------------------------------------------------------------
    // all_loops
    // ------------------------------------------------------------------

    pub fn insert_loop(&self, info: &LoopInfo) -> DbResult<()> {
        self.store_loop(info, false)
    }

    pub fn upsert_loop(&self, info: &LoopInfo) -> DbResult<()> {
        self.store_loop(info, true)
    }

    fn store_loop(&self, info: &LoopInfo, merge: bool) -> DbResult<()> {
        let verb = if merge { "INSERT OR REPLACE" } else { "INSERT" };
        self.txn.execute(
            &format!(
                "{verb} INTO all_loops
                     (loop_id, loop_type, pdb_id, ordinal, length,
                      sequence, r_sequence, nwc_sequence, unit_ids)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                info.loop_id,
                info.loop_type,
                info.pdb_id,
                info.ordinal,
                info.length,
                info.sequence,
                info.r_sequence,
                info.nwc_sequence,
                info.unit_ids,
            ],
        )?;
        Ok(())
    }

    pub fn has_loops(&self, pdb: &str) -> DbResult<bool> {
        self.exists("SELECT 1 FROM all_loops WHERE pdb_id = ?1", pdb)
    }

    pub fn delete_loops(&self, pdb: &str) -> DbResult<()> {
        self.txn
            .execute("DELETE FROM all_loops WHERE pdb_id = ?1", params![pdb])?;
        Ok(())
    }

    pub fn loops_for_pdb(&self, pdb: &str) -> DbResult<Vec<LoopInfo>> {
        let mut statement = self.txn.prepare(
            "SELECT loop_id, loop_type, pdb_id, ordinal, length,
                    sequence, r_sequence, nwc_sequence, unit_ids
             FROM all_loops WHERE pdb_id = ?1 ORDER BY ordinal",
        )?;
        let rows = statement.query_map(params![pdb], |row| {
            Ok(LoopInfo {
                loop_id: row.get(0)?,
                loop_type: row.get(1)?,
                pdb_id: row.get(2)?,
                ordinal: row.get(3)?,
                length: row.get(4)?,
                sequence: row.get(5)?,
                r_sequence: row.get(6)?,
                nwc_sequence: row.get(7)?,
                unit_ids: row.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // ml_releases
    // ------------------------------------------------------------------

    pub fn insert_release(&self, release: &ReleaseRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_releases (release_id, release_type, date, description, graph)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                release.release_id,
                release.release_type,
                release.date,
                release.description,
                release.graph,
            ],
        )?;
        Ok(())
    }

    /// The most recently committed release of the given type.
    pub fn latest_release(&self, release_type: &str) -> DbResult<Option<ReleaseRow>> {
        let release = self
            .txn
            .query_row(
                "SELECT release_id, release_type, date, description, graph
                 FROM ml_releases WHERE release_type = ?1
                 ORDER BY date DESC, release_id DESC LIMIT 1",
                params![release_type],
                release_from_row,
            )
            .optional()?;
        Ok(release)
    }

    /// All releases of one type, oldest first.
    pub fn releases(&self, release_type: &str) -> DbResult<Vec<ReleaseRow>> {
        let mut statement = self.txn.prepare(
            "SELECT release_id, release_type, date, description, graph
             FROM ml_releases WHERE release_type = ?1
             ORDER BY date, release_id",
        )?;
        let rows = statement.query_map(params![release_type], release_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_release(&self, release_id: &str, release_type: &str) -> DbResult<Option<ReleaseRow>> {
        let release = self
            .txn
            .query_row(
                "SELECT release_id, release_type, date, description, graph
                 FROM ml_releases WHERE release_id = ?1 AND release_type = ?2",
                params![release_id, release_type],
                release_from_row,
            )
            .optional()?;
        Ok(release)
    }

    /// Attach the substituted relationship graph to an already-added release.
    pub fn set_release_graph(
        &self,
        release_id: &str,
        release_type: &str,
        graph: &str,
    ) -> DbResult<()> {
        let changed = self.txn.execute(
            "UPDATE ml_releases SET graph = ?3 WHERE release_id = ?1 AND release_type = ?2",
            params![release_id, release_type, graph],
        )?;
        if changed == 0 {
            return Err(DbError::not_found(format!(
                "release {release_id} ({release_type})"
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // ml_motifs / ml_handles
    // ------------------------------------------------------------------

    pub fn insert_motif(&self, motif: &MotifRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_motifs (motif_id, release_id, motif_type, handle, version, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                motif.motif_id,
                motif.release_id,
                motif.motif_type,
                motif.handle,
                motif.version,
                motif.comment,
            ],
        )?;
        Ok(())
    }

    /// True when any motif of any release already uses the handle.
    pub fn handle_in_use(&self, handle: &str) -> DbResult<bool> {
        self.exists("SELECT 1 FROM ml_motifs WHERE handle = ?1", handle)
    }

    /// True when the handle is in the reserved pool.
    pub fn handle_reserved(&self, handle: &str) -> DbResult<bool> {
        self.exists("SELECT 1 FROM ml_handles WHERE handle = ?1", handle)
    }

    /// Add the handle to the reserved pool.
    pub fn reserve_handle(&self, handle: &str) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_handles (handle) VALUES (?1)",
            params![handle],
        )?;
        Ok(())
    }

    pub fn motifs_for_release(
        &self,
        release_id: &str,
        release_type: &str,
    ) -> DbResult<Vec<MotifRow>> {
        let mut statement = self.txn.prepare(
            "SELECT motif_id, release_id, motif_type, handle, version, comment
             FROM ml_motifs WHERE release_id = ?1 AND motif_type = ?2
             ORDER BY motif_id",
        )?;
        let rows = statement.query_map(params![release_id, release_type], |row| {
            Ok(MotifRow {
                motif_id: row.get(0)?,
                release_id: row.get(1)?,
                motif_type: row.get(2)?,
                handle: row.get(3)?,
                version: row.get(4)?,
                comment: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // ml_loops (membership)
    // ------------------------------------------------------------------

    pub fn insert_motif_loop(&self, row: &MotifLoopRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_loops (loop_id, motif_id, release_id) VALUES (?1, ?2, ?3)",
            params![row.loop_id, row.motif_id, row.release_id],
        )?;
        Ok(())
    }

    /// All (loop, motif) pairs of a release whose loops carry the type prefix.
    pub fn release_membership(
        &self,
        release_id: &str,
        type_prefix: &str,
    ) -> DbResult<Vec<MotifLoopRow>> {
        let mut statement = self.txn.prepare(
            "SELECT loop_id, motif_id, release_id FROM ml_loops
             WHERE release_id = ?1 AND loop_id LIKE ?2
             ORDER BY motif_id, loop_id",
        )?;
        let pattern = format!("{type_prefix}%");
        let rows = statement.query_map(params![release_id, pattern], |row| {
            Ok(MotifLoopRow {
                loop_id: row.get(0)?,
                motif_id: row.get(1)?,
                release_id: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // ml_history (parents)
    // ------------------------------------------------------------------

    pub fn insert_parent(&self, row: &ParentRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_history (motif_id, release_id, parent_motif_id)
             VALUES (?1, ?2, ?3)",
            params![row.motif_id, row.release_id, row.parent_motif_id],
        )?;
        Ok(())
    }

    /// Parent ids of one motif in one release, sorted.
    pub fn parents_of(&self, motif_id: &str, release_id: &str) -> DbResult<Vec<String>> {
        let mut statement = self.txn.prepare(
            "SELECT parent_motif_id FROM ml_history
             WHERE motif_id = ?1 AND release_id = ?2
             ORDER BY parent_motif_id",
        )?;
        let rows = statement.query_map(params![motif_id, release_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// The legacy comma-joined rendering of a motif's parents.
    pub fn parents_joined(&self, motif_id: &str, release_id: &str) -> DbResult<String> {
        Ok(self.parents_of(motif_id, release_id)?.join(","))
    }

    /// Every motif of the release that has at least one recorded parent edge.
    pub fn motifs_with_parents(&self, release_id: &str) -> DbResult<Vec<String>> {
        let mut statement = self.txn.prepare(
            "SELECT DISTINCT motif_id FROM ml_history WHERE release_id = ?1 ORDER BY motif_id",
        )?;
        let rows = statement.query_map(params![release_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // ml_set_diff
    // ------------------------------------------------------------------

    pub fn insert_set_diff(&self, row: &SetDiffRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_set_diff
                 (motif_id1, motif_id2, release_id, intersection,
                  overlap, one_minus_two, two_minus_one)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.motif_id1,
                row.motif_id2,
                row.release_id,
                row.intersection,
                row.overlap,
                row.one_minus_two,
                row.two_minus_one,
            ],
        )?;
        Ok(())
    }

    pub fn set_diffs_for_release(&self, release_id: &str) -> DbResult<Vec<SetDiffRow>> {
        let mut statement = self.txn.prepare(
            "SELECT motif_id1, motif_id2, release_id, intersection,
                    overlap, one_minus_two, two_minus_one
             FROM ml_set_diff WHERE release_id = ?1
             ORDER BY motif_id1, motif_id2",
        )?;
        let rows = statement.query_map(params![release_id], |row| {
            Ok(SetDiffRow {
                motif_id1: row.get(0)?,
                motif_id2: row.get(1)?,
                release_id: row.get(2)?,
                intersection: row.get(3)?,
                overlap: row.get(4)?,
                one_minus_two: row.get(5)?,
                two_minus_one: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // ml_release_diff
    // ------------------------------------------------------------------

    pub fn insert_release_diff(&self, row: &ReleaseDiffRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_release_diff
                 (release_id1, release_id2, release_type, direct_parent,
                  added_groups, removed_groups, updated_groups, same_groups,
                  added_loops, removed_loops,
                  num_added_groups, num_removed_groups, num_updated_groups,
                  num_same_groups, num_added_loops, num_removed_loops)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                row.release_id1,
                row.release_id2,
                row.release_type,
                row.direct_parent,
                row.added_groups,
                row.removed_groups,
                row.updated_groups,
                row.same_groups,
                row.added_loops,
                row.removed_loops,
                row.num_added_groups,
                row.num_removed_groups,
                row.num_updated_groups,
                row.num_same_groups,
                row.num_added_loops,
                row.num_removed_loops,
            ],
        )?;
        Ok(())
    }

    pub fn release_diffs_for(&self, release_id1: &str) -> DbResult<Vec<ReleaseDiffRow>> {
        let mut statement = self.txn.prepare(
            "SELECT release_id1, release_id2, release_type, direct_parent,
                    added_groups, removed_groups, updated_groups, same_groups,
                    added_loops, removed_loops,
                    num_added_groups, num_removed_groups, num_updated_groups,
                    num_same_groups, num_added_loops, num_removed_loops
             FROM ml_release_diff WHERE release_id1 = ?1
             ORDER BY release_id2",
        )?;
        let rows = statement.query_map(params![release_id1], |row| {
            Ok(ReleaseDiffRow {
                release_id1: row.get(0)?,
                release_id2: row.get(1)?,
                release_type: row.get(2)?,
                direct_parent: row.get(3)?,
                added_groups: row.get(4)?,
                removed_groups: row.get(5)?,
                updated_groups: row.get(6)?,
                same_groups: row.get(7)?,
                added_loops: row.get(8)?,
                removed_loops: row.get(9)?,
                num_added_groups: row.get(10)?,
                num_removed_groups: row.get(11)?,
                num_updated_groups: row.get(12)?,
                num_same_groups: row.get(13)?,
                num_added_loops: row.get(14)?,
                num_removed_loops: row.get(15)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ------------------------------------------------------------------
    // ml_loop_order / ml_loop_positions / ml_mutual_discrepancy
    // ------------------------------------------------------------------

    pub fn insert_loop_order(&self, row: &LoopOrderRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_loop_order
                 (motif_id, loop_id, release_id, original_order, similarity_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.motif_id,
                row.loop_id,
                row.release_id,
                row.original_order,
                row.similarity_order,
            ],
        )?;
        Ok(())
    }

    pub fn insert_loop_position(&self, row: &LoopPositionRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_loop_positions
                 (motif_id, loop_id, release_id, unit_id, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.motif_id,
                row.loop_id,
                row.release_id,
                row.unit_id,
                row.position,
            ],
        )?;
        Ok(())
    }

    pub fn insert_discrepancy(&self, row: &DiscrepancyRow) -> DbResult<()> {
        self.txn.execute(
            "INSERT INTO ml_mutual_discrepancy (loop_id1, loop_id2, release_id, discrepancy)
             VALUES (?1, ?2, ?3, ?4)",
            params![row.loop_id1, row.loop_id2, row.release_id, row.discrepancy],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Compensating purge
    // ------------------------------------------------------------------

    /// Delete every row of the given release. Used as the compensating
    /// action when a release commit fails after a partial flush, and by the
    /// explicit `remove_release` path. Rows shared between types are scoped
    /// by the type's motif and loop id prefixes.
    pub fn remove_release(&self, release_id: &str, release_type: &str) -> DbResult<()> {
        let motif_prefix = format!("{release_type}_%");
        self.txn.execute(
            "DELETE FROM ml_releases WHERE release_id = ?1 AND release_type = ?2",
            params![release_id, release_type],
        )?;
        self.txn.execute(
            "DELETE FROM ml_motifs WHERE release_id = ?1 AND motif_type = ?2",
            params![release_id, release_type],
        )?;
        for table in ["ml_loops", "ml_history", "ml_loop_order", "ml_loop_positions"] {
            self.txn.execute(
                &format!("DELETE FROM {table} WHERE release_id = ?1 AND motif_id LIKE ?2"),
                params![release_id, motif_prefix],
            )?;
        }
        self.txn.execute(
            "DELETE FROM ml_set_diff
             WHERE release_id = ?1 AND (motif_id1 LIKE ?2 OR motif_id2 LIKE ?2)",
            params![release_id, motif_prefix],
        )?;
        self.txn.execute(
            "DELETE FROM ml_release_diff WHERE release_id1 = ?1 AND release_type = ?2",
            params![release_id, release_type],
        )?;
        self.txn.execute(
            "DELETE FROM ml_mutual_discrepancy WHERE release_id = ?1 AND loop_id1 LIKE ?2",
            params![release_id, motif_prefix],
        )?;
        tracing::info!(release_id, release_type, "Purged release rows");
        Ok(())
    }

    /// Row counts keyed on one release id, across every release table.
    pub fn counts_for_release(&self, release_id: &str) -> DbResult<ReleaseCounts> {
        Ok(ReleaseCounts {
            releases: self.count("ml_releases", "release_id", release_id)?,
            motifs: self.count("ml_motifs", "release_id", release_id)?,
            memberships: self.count("ml_loops", "release_id", release_id)?,
            parents: self.count("ml_history", "release_id", release_id)?,
            set_diffs: self.count("ml_set_diff", "release_id", release_id)?,
            release_diffs: self.count("ml_release_diff", "release_id1", release_id)?,
            loop_orders: self.count("ml_loop_order", "release_id", release_id)?,
            loop_positions: self.count("ml_loop_positions", "release_id", release_id)?,
            discrepancies: self.count("ml_mutual_discrepancy", "release_id", release_id)?,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn exists(&self, query: &str, key: &str) -> DbResult<bool> {
        let found: Option<i64> = self
            .txn
            .query_row(query, params![key], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn count(&self, table: &str, column: &str, value: &str) -> DbResult<i64> {
        let count = self.txn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
            params![value],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<ReleaseRow> {
    Ok(ReleaseRow {
        release_id: row.get(0)?,
        release_type: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        graph: row.get(4)?,
    })
}
