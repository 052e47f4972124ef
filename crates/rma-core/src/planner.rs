//! The dependency planner.
//!
//! Given a root stage name, an exclude set and a skip-dependencies flag,
//! the planner produces the linear execution plan: containers expanded,
//! dependencies walked transitively, levels topologically sorted, each
//! level ordered by stage name so that re-planning the same inputs yields
//! the identical sequence. Planning is pure; it only reads the registry.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::PipelineError;
use crate::registry::{self, StageSpec};

/// Resolve the execution plan for `root`.
///
/// `exclude` names stages to leave out; excluding a container excludes its
/// whole expansion. With `skip_dependencies` only the root's own expansion
/// is retained.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownStage`] for any unregistered name and
/// [`PipelineError::InvalidState`] when the filtered plan is empty.
pub fn plan(
    root: &str,
    exclude: &BTreeSet<String>,
    skip_dependencies: bool,
) -> Result<Vec<&'static StageSpec>, PipelineError> {
    let excluded = expand_exclude(exclude)?;
    let allowed = leaf_expansion(root)?;

    let graph = dependency_graph(&allowed)?;
    let ordered = levels(&graph)?;

    let keep = |name: &str| {
        if skip_dependencies {
            allowed.contains(name)
        } else {
            !excluded.contains(name)
        }
    };

    let selected: Vec<&'static StageSpec> = ordered
        .iter()
        .filter(|name| keep(name))
        .map(|name| registry::spec(name))
        .collect::<Result<_, _>>()?;

    if selected.is_empty() {
        return Err(PipelineError::invalid_state("No stages to run"));
    }
    Ok(selected)
}

/// Expand the exclude set: a container contributes its whole (recursive)
/// expansion, plus its own name.
fn expand_exclude(exclude: &BTreeSet<String>) -> Result<BTreeSet<&'static str>, PipelineError> {
    let mut expanded = BTreeSet::new();
    let mut stack: Vec<&'static str> = Vec::new();
    for name in exclude {
        stack.push(registry::spec(name)?.name);
    }
    while let Some(name) = stack.pop() {
        if !expanded.insert(name) {
            continue;
        }
        let spec = registry::spec(name)?;
        stack.extend(spec.members.iter().copied());
    }
    Ok(expanded)
}

/// The executable stages a name stands for: the name itself for ordinary
/// stages, the recursive member expansion for containers.
fn leaf_expansion(name: &str) -> Result<BTreeSet<&'static str>, PipelineError> {
    let mut leaves = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let mut stack = vec![registry::spec(name)?.name];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let spec = registry::spec(current)?;
        if spec.is_container() {
            stack.extend(spec.members.iter().copied());
        } else {
            leaves.insert(spec.name);
        }
    }
    Ok(leaves)
}

/// Depth-first walk collecting the dependency edges of every stage
/// reachable from `roots`. Containers appearing as dependencies contribute
/// their members in place of themselves.
fn dependency_graph(
    roots: &BTreeSet<&'static str>,
) -> Result<BTreeMap<&'static str, BTreeSet<&'static str>>, PipelineError> {
    let mut graph: BTreeMap<&'static str, BTreeSet<&'static str>> = BTreeMap::new();
    let mut stack: Vec<&'static str> = roots.iter().copied().collect();

    while let Some(name) = stack.pop() {
        if graph.contains_key(name) {
            continue;
        }
        let spec = registry::spec(name)?;
        let mut deps = BTreeSet::new();
        for dep in spec.dependencies {
            deps.extend(leaf_expansion(dep)?);
        }
        stack.extend(deps.iter().copied());
        graph.insert(spec.name, deps);
    }
    Ok(graph)
}

/// Topologically sort the graph into levels and flatten them. Stages at the
/// same level carry no ordering constraint among themselves and are sorted
/// by name.
fn levels(
    graph: &BTreeMap<&'static str, BTreeSet<&'static str>>,
) -> Result<Vec<&'static str>, PipelineError> {
    let mut remaining: BTreeMap<&'static str, BTreeSet<&'static str>> = graph.clone();
    let mut ordered = Vec::new();

    while !remaining.is_empty() {
        // Every stage whose dependencies are already placed forms one level.
        let level: Vec<&'static str> = remaining
            .iter()
            .filter(|(_, deps)| deps.iter().all(|dep| !remaining.contains_key(dep)))
            .map(|(name, _)| *name)
            .collect();

        if level.is_empty() {
            return Err(PipelineError::invalid_state(
                "Dependency cycle among stages",
            ));
        }

        // BTreeMap iteration already yields names sorted within the level.
        for name in &level {
            remaining.remove(name);
        }
        ordered.extend(level);
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(plan: &[&'static StageSpec]) -> Vec<&'static str> {
        plan.iter().map(|spec| spec.name).collect()
    }

    fn no_exclude() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_plan_walks_dependencies_in_order() {
        let plan = plan("loops.extractor", &no_exclude(), false).expect("plan");
        assert_eq!(
            names(&plan),
            vec!["pdbs.info", "units.info", "loops.extractor"]
        );
    }

    #[test]
    fn test_plan_is_idempotent() {
        let first = plan("update", &no_exclude(), false).expect("plan");
        let second = plan("update", &no_exclude(), false).expect("plan");
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_container_expands_to_members() {
        let plan = plan("update", &no_exclude(), false).expect("plan");
        let planned = names(&plan);
        assert!(!planned.contains(&"update"));
        assert!(!planned.contains(&"loops"));
        assert_eq!(
            planned,
            vec![
                "pdbs.info",
                "units.info",
                "loops.extractor",
                "export.loops",
                "motifs.release"
            ]
        );
    }

    #[test]
    fn test_dependencies_honored_for_every_pair() {
        let plan = plan("update", &no_exclude(), false).expect("plan");
        let planned = names(&plan);
        for (index, name) in planned.iter().enumerate() {
            let spec = registry::spec(name).expect("spec");
            for dep in spec.dependencies {
                let dep_index = planned
                    .iter()
                    .position(|n| n == dep)
                    .expect("dependency planned");
                assert!(dep_index < index, "{dep} must precede {name}");
            }
        }
    }

    #[test]
    fn test_skip_dependencies_retains_only_root() {
        let plan = plan("loops.extractor", &no_exclude(), true).expect("plan");
        assert_eq!(names(&plan), vec!["loops.extractor"]);
    }

    #[test]
    fn test_skip_dependencies_on_container_retains_expansion() {
        let plan = plan("loops", &no_exclude(), true).expect("plan");
        assert_eq!(names(&plan), vec!["loops.extractor", "export.loops"]);
    }

    #[test]
    fn test_exclude_filters_stage() {
        let exclude: BTreeSet<String> = ["export.loops".to_string()].into();
        let plan = plan("update", &exclude, false).expect("plan");
        assert!(!names(&plan).contains(&"export.loops"));
    }

    #[test]
    fn test_excluding_container_excludes_members() {
        let exclude: BTreeSet<String> = ["loops".to_string()].into();
        let plan = plan("update", &exclude, false).expect("plan");
        let planned = names(&plan);
        assert!(!planned.contains(&"loops.extractor"));
        assert!(!planned.contains(&"export.loops"));
        assert!(planned.contains(&"units.info"));
    }

    #[test]
    fn test_unknown_root_fails() {
        assert!(matches!(
            plan("units.bogus", &no_exclude(), false),
            Err(PipelineError::UnknownStage(_))
        ));
    }

    #[test]
    fn test_everything_excluded_is_invalid_state() {
        let exclude: BTreeSet<String> = ["update".to_string()].into();
        let result = plan("update", &exclude, false);
        assert!(matches!(result, Err(PipelineError::InvalidState(_))));
    }
}
