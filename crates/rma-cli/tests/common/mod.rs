//! Shared helpers for CLI integration tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;

/// Build a `rma` command against the workspace binary.
pub fn rma_cmd() -> Command {
    Command::cargo_bin("rma").expect("rma binary builds")
}

/// Lay out a minimal workspace: config, archive catalog, and staged unit
/// and loop CSVs for 1S72. Returns the config path.
pub fn setup_workspace(dir: &Path) -> std::path::PathBuf {
    let units_dir = dir.join("units");
    let loops_dir = dir.join("loops");
    fs::create_dir_all(&units_dir).expect("create units dir");
    fs::create_dir_all(&loops_dir).expect("create loops dir");

    fs::write(
        dir.join("catalog.json"),
        r#"[{"pdb_id": "1S72", "title": "Large ribosomal subunit",
             "experimental_technique": "X-RAY DIFFRACTION",
             "resolution": 2.4, "release_date": "2004-07-20"}]"#,
    )
    .expect("write catalog");

    fs::write(
        units_dir.join("1S72.csv"),
        "1S72|1|0|A|C|2647,1,0,C,2647,,,1_555,10\n\
         1S72|1|0|A|G|2648,1,0,G,2648,,,1_555,11\n",
    )
    .expect("write units");

    fs::write(
        loops_dir.join("1S72.csv"),
        "IL_1S72_001,IL,1,4,CAGG,GGAC,AG,\"1S72|1|0|A|C|2647,1S72|1|0|A|G|2648\"\n",
    )
    .expect("write loops");

    let config_path = dir.join("motifatlas.yaml");
    let config = format!(
        "db:\n  path: {db}\nlocations:\n  catalog: {catalog}\n  units_dir: {units}\n  loops_dir: {loops}\n  search_dir: {search}\n  mat_destination: {mat}\n  diagram_source: {ds}\n  diagram_destination: {dd}\n  export_dir: {export}\npdbs: [1S72]\n",
        db = dir.join("atlas.db").display(),
        catalog = dir.join("catalog.json").display(),
        units = units_dir.display(),
        loops = loops_dir.display(),
        search = dir.join("search").display(),
        mat = dir.join("mat").display(),
        ds = dir.join("2ds").display(),
        dd = dir.join("2ds-out").display(),
        export = dir.join("export").display(),
    );
    fs::write(&config_path, config).expect("write config");
    config_path
}
