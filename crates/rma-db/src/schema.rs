//! Idempotent schema creation for the atlas database.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so [`create_all`] can run
//! at every startup. Table and column names follow the original atlas schema.

use rusqlite::Connection;

use crate::error::DbResult;

/// All atlas tables, in creation order.
const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pdb_info (
        pdb_id TEXT PRIMARY KEY,
        title TEXT,
        experimental_technique TEXT,
        resolution REAL,
        release_date TEXT
    )",
    "CREATE TABLE IF NOT EXISTS unit_info (
        unit_id TEXT PRIMARY KEY,
        pdb_id TEXT NOT NULL,
        model INTEGER NOT NULL,
        chain TEXT NOT NULL,
        unit TEXT NOT NULL,
        number INTEGER NOT NULL,
        alt_id TEXT,
        ins_code TEXT,
        sym_op TEXT NOT NULL,
        chain_index INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS pdb_analysis_status (
        pdb TEXT NOT NULL,
        stage TEXT NOT NULL,
        time TEXT NOT NULL,
        PRIMARY KEY (pdb, stage)
    )",
    "CREATE TABLE IF NOT EXISTS all_loops (
        loop_id TEXT PRIMARY KEY,
        loop_type TEXT NOT NULL,
        pdb_id TEXT NOT NULL,
        ordinal INTEGER NOT NULL,
        length INTEGER NOT NULL,
        sequence TEXT NOT NULL,
        r_sequence TEXT NOT NULL,
        nwc_sequence TEXT NOT NULL,
        unit_ids TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ml_releases (
        release_id TEXT NOT NULL,
        release_type TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL,
        graph TEXT,
        PRIMARY KEY (release_id, release_type)
    )",
    "CREATE TABLE IF NOT EXISTS ml_motifs (
        motif_id TEXT NOT NULL,
        release_id TEXT NOT NULL,
        motif_type TEXT NOT NULL,
        handle TEXT NOT NULL,
        version INTEGER NOT NULL,
        comment TEXT NOT NULL,
        PRIMARY KEY (motif_id, release_id)
    )",
    "CREATE TABLE IF NOT EXISTS ml_loops (
        loop_id TEXT NOT NULL,
        motif_id TEXT NOT NULL,
        release_id TEXT NOT NULL,
        PRIMARY KEY (loop_id, motif_id, release_id)
    )",
    "CREATE TABLE IF NOT EXISTS ml_history (
        motif_id TEXT NOT NULL,
        release_id TEXT NOT NULL,
        parent_motif_id TEXT NOT NULL,
        PRIMARY KEY (motif_id, release_id, parent_motif_id)
    )",
    "CREATE TABLE IF NOT EXISTS ml_handles (
        handle TEXT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS ml_set_diff (
        motif_id1 TEXT NOT NULL,
        motif_id2 TEXT NOT NULL,
        release_id TEXT NOT NULL,
        intersection TEXT NOT NULL,
        overlap REAL NOT NULL,
        one_minus_two TEXT NOT NULL,
        two_minus_one TEXT NOT NULL,
        PRIMARY KEY (motif_id1, motif_id2, release_id)
    )",
    "CREATE TABLE IF NOT EXISTS ml_release_diff (
        release_id1 TEXT NOT NULL,
        release_id2 TEXT NOT NULL,
        release_type TEXT NOT NULL,
        direct_parent INTEGER NOT NULL,
        added_groups TEXT NOT NULL,
        removed_groups TEXT NOT NULL,
        updated_groups TEXT NOT NULL,
        same_groups TEXT NOT NULL,
        added_loops TEXT NOT NULL,
        removed_loops TEXT NOT NULL,
        num_added_groups INTEGER NOT NULL,
        num_removed_groups INTEGER NOT NULL,
        num_updated_groups INTEGER NOT NULL,
        num_same_groups INTEGER NOT NULL,
        num_added_loops INTEGER NOT NULL,
        num_removed_loops INTEGER NOT NULL,
        PRIMARY KEY (release_id1, release_id2, release_type)
    )",
    "CREATE TABLE IF NOT EXISTS ml_loop_order (
        motif_id TEXT NOT NULL,
        loop_id TEXT NOT NULL,
        release_id TEXT NOT NULL,
        original_order INTEGER NOT NULL,
        similarity_order INTEGER NOT NULL,
        PRIMARY KEY (motif_id, loop_id, release_id)
    )",
    "CREATE TABLE IF NOT EXISTS ml_loop_positions (
        motif_id TEXT NOT NULL,
        loop_id TEXT NOT NULL,
        release_id TEXT NOT NULL,
        unit_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (motif_id, loop_id, release_id, unit_id)
    )",
    "CREATE TABLE IF NOT EXISTS ml_mutual_discrepancy (
        loop_id1 TEXT NOT NULL,
        loop_id2 TEXT NOT NULL,
        release_id TEXT NOT NULL,
        discrepancy REAL NOT NULL,
        PRIMARY KEY (loop_id1, loop_id2, release_id)
    )",
];

/// Indexes that back the hot lookups of the executor and the committer.
const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_unit_info_pdb ON unit_info(pdb_id)",
    "CREATE INDEX IF NOT EXISTS idx_all_loops_pdb ON all_loops(pdb_id)",
    "CREATE INDEX IF NOT EXISTS idx_ml_loops_release ON ml_loops(release_id)",
    "CREATE INDEX IF NOT EXISTS idx_ml_motifs_handle ON ml_motifs(handle)",
    "CREATE INDEX IF NOT EXISTS idx_ml_history_release ON ml_history(release_id)",
];

/// Create every table and index, skipping those that already exist.
pub fn create_all(conn: &Connection) -> DbResult<()> {
    for statement in TABLES.iter().chain(INDEXES) {
        conn.execute(statement, [])?;
    }
    tracing::debug!("Atlas schema is up to date");
    Ok(())
}
