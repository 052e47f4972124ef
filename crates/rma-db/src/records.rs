//! Typed row structs for every atlas table.
//!
//! Field names mirror the column names in [`schema`](crate::schema); a struct
//! here is always written and read as a whole row. All values are immutable
//! after commit except the release graph, which the committer fills in while
//! the release transaction is still open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structure-level metadata pulled from the archive catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdbInfo {
    /// Uppercase structure code.
    pub pdb_id: String,
    /// Structure title from the catalog.
    pub title: Option<String>,
    /// Experimental technique (X-RAY DIFFRACTION, SOLUTION NMR, ...).
    pub experimental_technique: Option<String>,
    /// Resolution in angstroms, when the technique reports one.
    pub resolution: Option<f64>,
    /// Archive release date, as reported by the catalog.
    pub release_date: Option<String>,
}

/// One residue-level unit observed in a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitInfo {
    /// Stable unit identifier.
    pub unit_id: String,
    /// Owning structure code.
    pub pdb_id: String,
    /// Model number.
    pub model: i64,
    /// Chain identifier.
    pub chain: String,
    /// Component sequence (A, C, G, U, or a modified residue code).
    pub unit: String,
    /// Residue number within the chain.
    pub number: i64,
    /// Alternate location id, if any.
    pub alt_id: Option<String>,
    /// Insertion code, if any.
    pub ins_code: Option<String>,
    /// Symmetry operator applied to the coordinates.
    pub sym_op: String,
    /// Zero-based index of the residue within its chain.
    pub chain_index: Option<i64>,
}

/// Completion mark for (entry, stage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatus {
    /// The processed entry.
    pub pdb: String,
    /// Dotted stage name.
    pub stage: String,
    /// When the stage last completed for this entry.
    pub time: DateTime<Utc>,
}

/// A loop fragment extracted from a structure. Immutable once observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopInfo {
    /// Stable loop identifier, e.g. `IL_1S72_001`.
    pub loop_id: String,
    /// Loop type: IL, HL or JL.
    pub loop_type: String,
    /// Owning structure code.
    pub pdb_id: String,
    /// Ordinal of the loop within its structure.
    pub ordinal: i64,
    /// Number of nucleotides in the loop.
    pub length: i64,
    /// Loop sequence.
    pub sequence: String,
    /// Sequence of the reversed strand order.
    pub r_sequence: String,
    /// Sequence restricted to non-Watson-Crick positions.
    pub nwc_sequence: String,
    /// Comma-joined nucleotide unit ids.
    pub unit_ids: String,
}

/// One versioned motif atlas release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRow {
    /// Release id of the shape `MAJOR.MINOR`.
    pub release_id: String,
    /// Release type: IL, HL, JL or NR.
    pub release_type: String,
    /// When the release was committed.
    pub date: DateTime<Utc>,
    /// Free-form description.
    pub description: String,
    /// Serialized relationship graph, filled in when a descriptor is staged.
    pub graph: Option<String>,
}

/// One motif within one release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifRow {
    /// Full motif id: `TYPE_HANDLE.VERSION`.
    pub motif_id: String,
    /// Owning release.
    pub release_id: String,
    /// Motif type: IL, HL or JL.
    pub motif_type: String,
    /// Five-digit handle shared by all versions of this lineage.
    pub handle: String,
    /// Version, starting at 1.
    pub version: i64,
    /// Classification note recorded at commit time.
    pub comment: String,
}

/// Membership of one loop in one motif for one release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifLoopRow {
    /// The member loop.
    pub loop_id: String,
    /// The owning motif.
    pub motif_id: String,
    /// The owning release.
    pub release_id: String,
}

/// One ancestry edge from a motif to a previous-release motif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRow {
    /// The child motif.
    pub motif_id: String,
    /// The release the child belongs to.
    pub release_id: String,
    /// A parent motif id from an earlier release.
    pub parent_motif_id: String,
}

/// Set comparison between two motifs with intersecting loop sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDiffRow {
    /// First motif (the "A" side of the ratios).
    pub motif_id1: String,
    /// Second motif.
    pub motif_id2: String,
    /// Release the comparison was made for.
    pub release_id: String,
    /// Comma-joined intersection loop ids.
    pub intersection: String,
    /// |A∩B| / |A|.
    pub overlap: f64,
    /// Comma-joined loops in motif 1 but not motif 2.
    pub one_minus_two: String,
    /// Comma-joined loops in motif 2 but not motif 1.
    pub two_minus_one: String,
}

/// Summary row relating a release to one of its predecessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDiffRow {
    /// The newer release.
    pub release_id1: String,
    /// The older release.
    pub release_id2: String,
    /// Release type the diff covers.
    pub release_type: String,
    /// True when release 2 is the immediate predecessor of release 1.
    pub direct_parent: bool,
    /// Comma-joined ids of motifs new in release 1.
    pub added_groups: String,
    /// Comma-joined ids of motifs present in release 2 but gone in 1.
    pub removed_groups: String,
    /// Comma-joined ids of motifs updated between the releases.
    pub updated_groups: String,
    /// Comma-joined ids of motifs identical in both releases.
    pub same_groups: String,
    /// Comma-joined loop ids new in release 1.
    pub added_loops: String,
    /// Comma-joined loop ids gone in release 1.
    pub removed_loops: String,
    pub num_added_groups: i64,
    pub num_removed_groups: i64,
    pub num_updated_groups: i64,
    pub num_same_groups: i64,
    pub num_added_loops: i64,
    pub num_removed_loops: i64,
}

/// Presentation order of a loop within its motif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopOrderRow {
    pub motif_id: String,
    pub loop_id: String,
    pub release_id: String,
    /// Order the loop appeared in the candidate grouping.
    pub original_order: i64,
    /// Order after similarity sorting.
    pub similarity_order: i64,
}

/// Alignment position of one nucleotide of one loop within its motif.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopPositionRow {
    pub motif_id: String,
    pub loop_id: String,
    pub release_id: String,
    /// Nucleotide unit id.
    pub unit_id: String,
    /// Alignment column the nucleotide occupies.
    pub position: i64,
}

/// Geometric discrepancy between two loops, recorded per release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyRow {
    pub loop_id1: String,
    pub loop_id2: String,
    pub release_id: String,
    pub discrepancy: f64,
}
