//! End-to-end scenarios for the release subsystem: first release, exact
//! match, lineage update, split, handle collision, commit failure, and the
//! collection/remove round-trip laws.

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use rma_core::{
    draw_handle, parse_motif_id, CommitSummary, Config, Context, MotifCollection,
    ReleaseCommitter, ReleaseFiles, ReleaseMode,
};
use rma_db::Store;

fn context_with_seed(seed: u64) -> Context {
    let store = Store::in_memory().expect("open store");
    Context::with_seed(Arc::new(Config::default()), store, Some(seed))
}

fn candidate(groups: &[(&str, &[&str])]) -> MotifCollection {
    let mut pairs = Vec::new();
    for (group, loops) in groups {
        for loop_id in *loops {
            pairs.push((loop_id.to_string(), group.to_string()));
        }
    }
    MotifCollection::from_pairs(pairs, "").expect("candidate collection")
}

fn commit(ctx: &Context, groups: &[(&str, &[&str])]) -> CommitSummary {
    ReleaseCommitter::new(ctx)
        .commit(
            &candidate(groups),
            "IL",
            ReleaseMode::Minor,
            "test release",
            &ReleaseFiles::default(),
        )
        .expect("commit release")
}

#[test]
fn test_first_release() {
    let ctx = context_with_seed(1);
    let summary = commit(
        &ctx,
        &[
            ("g1", &["IL_1S72_001", "IL_1S72_002"]),
            ("g2", &["IL_1J5E_001"]),
        ],
    );

    assert_eq!(summary.release_id, "0.1");
    assert_eq!(summary.added_groups.len(), 2);
    assert!(summary.removed_groups.is_empty());

    let motifs = ctx
        .store
        .with_session(|session| session.motifs_for_release("0.1", "IL"))
        .expect("query");
    assert_eq!(motifs.len(), 2);
    let handles: BTreeSet<&str> = motifs.iter().map(|m| m.handle.as_str()).collect();
    assert_eq!(handles.len(), 2, "fresh handles are distinct");
    for motif in &motifs {
        assert_eq!(motif.version, 1);
        assert_eq!(motif.handle.len(), 5);
    }

    let counts = ctx
        .store
        .with_session(|session| session.counts_for_release("0.1"))
        .expect("counts");
    assert_eq!(counts.memberships, 3);
    assert_eq!(counts.parents, 0);
    assert_eq!(counts.release_diffs, 0);
    assert_eq!(counts.set_diffs, 0);
}

#[test]
fn test_exact_match_release() {
    let ctx = context_with_seed(2);
    let groups: &[(&str, &[&str])] = &[
        ("g1", &["IL_1S72_001", "IL_1S72_002"]),
        ("g2", &["IL_1J5E_001"]),
    ];
    let first = commit(&ctx, groups);
    let second = commit(&ctx, groups);

    assert_eq!(second.release_id, "0.2");
    assert_eq!(second.same_groups.len(), 2);
    assert!(second.added_groups.is_empty());
    assert!(second.updated_groups.is_empty());
    assert!(second.removed_groups.is_empty());

    // Motif ids carry over unchanged, versions included.
    let first_ids: BTreeSet<&String> = first.final_ids.values().collect();
    let second_ids: BTreeSet<&String> = second.final_ids.values().collect();
    assert_eq!(first_ids, second_ids);

    let diffs = ctx
        .store
        .with_session(|session| session.release_diffs_for("0.2"))
        .expect("query");
    assert_eq!(diffs.len(), 1);
    let diff = &diffs[0];
    assert_eq!(diff.release_id2, "0.1");
    assert!(diff.direct_parent);
    assert_eq!(diff.num_same_groups, 2);
    assert_eq!(diff.num_added_groups, 0);
    assert_eq!(diff.num_removed_groups, 0);
    assert_eq!(diff.num_updated_groups, 0);
}

#[test]
fn test_update_one_group() {
    let ctx = context_with_seed(3);
    let first = commit(
        &ctx,
        &[
            ("g1", &["IL_1S72_001", "IL_1S72_002"]),
            ("g2", &["IL_1J5E_001"]),
        ],
    );
    let old_g1 = first.final_ids.get("g1").expect("g1 committed").clone();

    // |new ∩ old| / |new| = 2/3 and |old ∩ new| / |old| = 1: updated.
    let second = commit(
        &ctx,
        &[
            ("g1", &["IL_1S72_001", "IL_1S72_002", "IL_4V4Q_001"]),
            ("g2", &["IL_1J5E_001"]),
        ],
    );

    assert_eq!(second.release_id, "0.3");
    assert_eq!(second.updated_groups.len(), 1);
    assert_eq!(second.same_groups.len(), 1);

    let new_g1 = second.final_ids.get("g1").expect("g1 committed");
    let (_, old_handle, old_version) = parse_motif_id(&old_g1).expect("parse");
    let (_, new_handle, new_version) = parse_motif_id(new_g1).expect("parse");
    assert_eq!(new_handle, old_handle, "handle survives the update");
    assert_eq!(new_version, old_version + 1, "version increments");

    let parents = ctx
        .store
        .with_session(|session| session.parents_of(new_g1, "0.3"))
        .expect("query");
    assert_eq!(parents, vec![old_g1]);

    let diffs = ctx
        .store
        .with_session(|session| session.release_diffs_for("0.3"))
        .expect("query");
    assert_eq!(diffs[0].num_updated_groups, 1);
    assert_eq!(diffs[0].num_same_groups, 1);
    assert_eq!(diffs[0].added_loops, "IL_4V4Q_001");
}

#[test]
fn test_split_into_new_identity() {
    let ctx = context_with_seed(4);
    let first = commit(
        &ctx,
        &[
            ("g1", &["IL_L1", "IL_L2", "IL_L4"]),
            ("g2", &["IL_L3"]),
        ],
    );
    let old_a = first.final_ids.get("g1").expect("committed").clone();
    let old_b = first.final_ids.get("g2").expect("committed").clone();

    // g1 keeps only L1 (1/1 vs 1/3: old side below threshold), g3 takes
    // L2 and L4 plus two new loops (2/4 below threshold on the new side).
    // Both become new identities with the old motif as parent.
    let second = commit(
        &ctx,
        &[
            ("g1", &["IL_L1"]),
            ("g2", &["IL_L3"]),
            ("g3", &["IL_L2", "IL_L4", "IL_L5", "IL_L6"]),
        ],
    );

    assert_eq!(second.added_groups.len(), 2);
    assert_eq!(second.same_groups, vec![old_b.clone()]);
    assert_eq!(second.removed_groups, vec![old_a.clone()]);

    for group in ["g1", "g3"] {
        let new_id = second.final_ids.get(group).expect("committed");
        let parents = ctx
            .store
            .with_session(|session| session.parents_of(new_id, &second.release_id))
            .expect("query");
        assert_eq!(parents, vec![old_a.clone()], "{group} descends from the split motif");
        let (_, handle, version) = parse_motif_id(new_id).expect("parse");
        let (_, old_handle, _) = parse_motif_id(&old_a).expect("parse");
        assert_ne!(handle, old_handle, "{group} gets a fresh handle");
        assert_eq!(version, 1);
    }
}

#[test]
fn test_handle_collision_retries() {
    // Predict the first handle the seeded RNG will draw, reserve it
    // beforehand, and watch the allocator move on to its second draw.
    let seed = 42;
    let mut preview = StdRng::seed_from_u64(seed);
    let first_draw = draw_handle(&mut preview);

    let ctx = context_with_seed(seed);
    ctx.store
        .with_session(|session| session.reserve_handle(&first_draw))
        .expect("reserve");

    let summary = commit(&ctx, &[("g1", &["IL_L1", "IL_L2"])]);
    let committed = summary.final_ids.get("g1").expect("committed");
    let (_, handle, _) = parse_motif_id(committed).expect("parse");
    assert_ne!(handle, first_draw, "allocator must skip the reserved handle");
}

#[test]
fn test_commit_failure_rolls_back_and_purges() {
    let ctx = context_with_seed(5);
    commit(&ctx, &[("g1", &["IL_L1", "IL_L2"]), ("g2", &["IL_L3"])]);

    let before = ctx
        .store
        .with_session(|session| session.counts_for_release("0.2"))
        .expect("counts");
    assert_eq!(before, Default::default());

    // A graph descriptor that exists but cannot be read as text makes the
    // commit fail after every row has been added to the open transaction.
    let dir = TempDir::new().expect("create temp dir");
    let bad_graph = dir.path().join("graph");
    fs::create_dir_all(&bad_graph).expect("create dir standing in for a file");

    let files = ReleaseFiles {
        graph_descriptor: Some(bad_graph),
        ..ReleaseFiles::default()
    };
    let result = ReleaseCommitter::new(&ctx).commit(
        &candidate(&[("g1", &["IL_L1", "IL_L2", "IL_L9"]), ("g2", &["IL_L3"])]),
        "IL",
        ReleaseMode::Minor,
        "doomed release",
        &files,
    );
    assert!(matches!(
        result,
        Err(rma_core::PipelineError::ReleaseAborted { .. })
    ));

    // Post-state equals pre-state for everything keyed on the new id.
    let after = ctx
        .store
        .with_session(|session| session.counts_for_release("0.2"))
        .expect("counts");
    assert_eq!(after, before);

    let latest = ctx
        .store
        .with_session(|session| session.latest_release("IL"))
        .expect("query")
        .expect("first release untouched");
    assert_eq!(latest.release_id, "0.1");

    // The failed id is allocated again by the next successful commit.
    let retried = commit(&ctx, &[("g1", &["IL_L1", "IL_L2", "IL_L9"]), ("g2", &["IL_L3"])]);
    assert_eq!(retried.release_id, "0.2");
}

#[test]
fn test_collection_round_trip() {
    let ctx = context_with_seed(6);
    let dir = TempDir::new().expect("create temp dir");
    let csv = dir.path().join("MotifList.csv");
    fs::write(
        &csv,
        "IL_1S72_001,Group_001\nIL_1S72_002,Group_001\nIL_1J5E_001,Group_002\n",
    )
    .expect("write csv");

    let from_csv = MotifCollection::from_csv(&csv).expect("parse");
    let summary = ReleaseCommitter::new(&ctx)
        .commit(
            &from_csv,
            "IL",
            ReleaseMode::Minor,
            "round trip",
            &ReleaseFiles::default(),
        )
        .expect("commit");

    let reloaded =
        MotifCollection::from_release(&ctx.store, &summary.release_id, "IL").expect("reload");

    assert_eq!(reloaded.loop_set(), from_csv.loop_set());
    assert_eq!(reloaded.group_set().len(), from_csv.group_set().len());
    for (group, motif_id) in &summary.final_ids {
        assert_eq!(
            reloaded.loop_set_of(motif_id).expect("group exists"),
            from_csv.loop_set_of(group).expect("group exists"),
            "membership of {group} survives the round trip"
        );
    }
}

#[test]
fn test_remove_release_restores_pre_commit_state() {
    let ctx = context_with_seed(7);
    commit(&ctx, &[("g1", &["IL_L1", "IL_L2"])]);
    let before = ctx
        .store
        .with_session(|session| session.counts_for_release("0.2"))
        .expect("counts");

    commit(&ctx, &[("g1", &["IL_L1", "IL_L2", "IL_L3"])]);
    ReleaseCommitter::new(&ctx)
        .remove_release("0.2", "IL")
        .expect("remove");

    let after = ctx
        .store
        .with_session(|session| session.counts_for_release("0.2"))
        .expect("counts");
    assert_eq!(after, before);

    let latest = ctx
        .store
        .with_session(|session| session.latest_release("IL"))
        .expect("query")
        .expect("first release survives");
    assert_eq!(latest.release_id, "0.1");
}

#[test]
fn test_set_diff_rows_exist_in_both_orientations() {
    let ctx = context_with_seed(8);
    let first = commit(&ctx, &[("g1", &["IL_L1", "IL_L2"]), ("g2", &["IL_L3"])]);
    let old_g1 = first.final_ids.get("g1").expect("committed").clone();

    let second = commit(&ctx, &[("g1", &["IL_L1", "IL_L2", "IL_L4"]), ("g2", &["IL_L3"])]);
    let new_g1 = second.final_ids.get("g1").expect("committed").clone();

    let diffs = ctx
        .store
        .with_session(|session| session.set_diffs_for_release(&second.release_id))
        .expect("query");

    let forward = diffs
        .iter()
        .find(|row| row.motif_id1 == new_g1 && row.motif_id2 == old_g1)
        .expect("forward orientation");
    let backward = diffs
        .iter()
        .find(|row| row.motif_id1 == old_g1 && row.motif_id2 == new_g1)
        .expect("backward orientation");

    assert_eq!(forward.intersection, backward.intersection);
    assert_eq!(forward.one_minus_two, backward.two_minus_one);
    assert_eq!(forward.two_minus_one, backward.one_minus_two);
    assert!((forward.overlap - 2.0 / 3.0).abs() < 1e-12);
    assert!((backward.overlap - 1.0).abs() < 1e-12);

    // Exact-match groups do not diff against themselves.
    assert!(diffs
        .iter()
        .all(|row| row.motif_id1 != row.motif_id2));
}

#[test]
fn test_every_loop_belongs_to_exactly_one_motif() {
    let ctx = context_with_seed(9);
    let summary = commit(
        &ctx,
        &[
            ("g1", &["IL_L1", "IL_L2"]),
            ("g2", &["IL_L3", "IL_L4"]),
            ("g3", &["IL_L5"]),
        ],
    );

    let membership = ctx
        .store
        .with_session(|session| session.release_membership(&summary.release_id, "IL"))
        .expect("query");
    assert_eq!(membership.len(), 5);
    let distinct_loops: BTreeSet<&String> = membership.iter().map(|row| &row.loop_id).collect();
    assert_eq!(distinct_loops.len(), 5, "each loop appears exactly once");

    // Every surfaced motif id has a Motif row in this release.
    let motifs = ctx
        .store
        .with_session(|session| session.motifs_for_release(&summary.release_id, "IL"))
        .expect("query");
    let motif_ids: BTreeSet<&String> = motifs.iter().map(|m| &m.motif_id).collect();
    for motif_id in summary.final_ids.values() {
        assert!(motif_ids.contains(motif_id));
    }
}

#[test]
fn test_release_diff_against_non_adjacent_ancestor() {
    let ctx = context_with_seed(10);
    commit(&ctx, &[("g1", &["IL_L1", "IL_L2"])]);
    commit(&ctx, &[("g1", &["IL_L1", "IL_L2"]), ("g2", &["IL_L3"])]);
    commit(&ctx, &[("g1", &["IL_L1", "IL_L2"]), ("g2", &["IL_L3", "IL_L4"])]);

    ReleaseCommitter::new(&ctx)
        .commit_release_diff("0.3", "0.1", "IL")
        .expect("ancestor diff");

    let diffs = ctx
        .store
        .with_session(|session| session.release_diffs_for("0.3"))
        .expect("query");
    let ancestor = diffs
        .iter()
        .find(|row| row.release_id2 == "0.1")
        .expect("ancestor diff row");
    assert!(!ancestor.direct_parent);

    let direct = diffs
        .iter()
        .find(|row| row.release_id2 == "0.2")
        .expect("direct diff row");
    assert!(direct.direct_parent);
}

#[test]
fn test_major_mode_advances_major_component() {
    let ctx = context_with_seed(11);
    commit(&ctx, &[("g1", &["IL_L1"])]);

    let summary = ReleaseCommitter::new(&ctx)
        .commit(
            &candidate(&[("g1", &["IL_L1"])]),
            "IL",
            ReleaseMode::Major,
            "major release",
            &ReleaseFiles::default(),
        )
        .expect("commit");
    assert_eq!(summary.release_id, "1.0");
}

#[test]
fn test_auxiliary_files_and_graph_are_committed() {
    let ctx = context_with_seed(12);
    let dir = TempDir::new().expect("create temp dir");

    fs::write(
        dir.path().join("MotifLoopOrder.csv"),
        "Group_001,L1,1,1\nGroup_001,L2,2,1\n",
    )
    .expect("write order csv");
    fs::write(
        dir.path().join("MotifPositions.csv"),
        "Group_001,L1,1S72|1|0|A|C|2647,1\n",
    )
    .expect("write positions csv");
    fs::write(
        dir.path().join("MutualDiscrepancy.csv"),
        "L1,0.0000,L1\nL1,0.4210,L2\n",
    )
    .expect("write discrepancy csv");
    fs::write(
        dir.path().join("Supergroups.graphml"),
        "<node id=\"Group_001\"/>\n<node id=\"Group_002\"/>\n",
    )
    .expect("write graph");
    fs::write(dir.path().join("Group_001.mat"), b"matdata").expect("write mat");

    let diagram_source = dir.path().join("2ds");
    fs::create_dir_all(&diagram_source).expect("create diagram source");
    fs::write(diagram_source.join("Group_001.png"), b"png").expect("write png");

    let mat_destination = dir.path().join("mat-out");
    let diagram_destination = dir.path().join("2ds-out");

    let files = ReleaseFiles {
        loop_order: Some(dir.path().join("MotifLoopOrder.csv")),
        loop_positions: Some(dir.path().join("MotifPositions.csv")),
        discrepancies: Some(dir.path().join("MutualDiscrepancy.csv")),
        mat_source: Some(dir.path().to_path_buf()),
        mat_destination: Some(mat_destination.clone()),
        diagram_source: Some(diagram_source),
        diagram_destination: Some(diagram_destination.clone()),
        graph_descriptor: Some(dir.path().join("Supergroups.graphml")),
    };

    let summary = ReleaseCommitter::new(&ctx)
        .commit(
            &candidate(&[("Group_001", &["IL_L1", "IL_L2"]), ("Group_002", &["IL_L3"])]),
            "IL",
            ReleaseMode::Minor,
            "with artifacts",
            &files,
        )
        .expect("commit");

    let counts = ctx
        .store
        .with_session(|session| session.counts_for_release(&summary.release_id))
        .expect("counts");
    assert_eq!(counts.loop_orders, 2);
    assert_eq!(counts.loop_positions, 1);
    assert_eq!(counts.discrepancies, 2);

    let g1 = summary.final_ids.get("Group_001").expect("committed");
    let g2 = summary.final_ids.get("Group_002").expect("committed");
    let release = ctx
        .store
        .with_session(|session| session.get_release(&summary.release_id, "IL"))
        .expect("query")
        .expect("release row");
    let graph = release.graph.expect("graph stored");
    assert!(graph.contains(g1));
    assert!(graph.contains(g2));
    assert!(!graph.contains("Group_001"));
    assert!(!graph.contains('\n'));

    assert!(mat_destination.join(format!("{g1}.mat")).exists());
    assert!(diagram_destination
        .join(format!("IL{}", summary.release_id))
        .join(format!("{g1}.png"))
        .exists());
}

#[test]
fn test_dry_run_commits_nothing() {
    let mut ctx = context_with_seed(13);
    ctx.dry_run = true;

    let summary = ReleaseCommitter::new(&ctx)
        .commit(
            &candidate(&[("g1", &["IL_L1", "IL_L2"])]),
            "IL",
            ReleaseMode::Minor,
            "dry run",
            &ReleaseFiles::default(),
        )
        .expect("dry run");
    assert_eq!(summary.release_id, "0.1");

    let latest = ctx
        .store
        .with_session(|session| session.latest_release("IL"))
        .expect("query");
    assert!(latest.is_none());
}
