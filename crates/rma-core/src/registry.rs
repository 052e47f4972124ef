//! The stage registry: dotted name to stage, populated from an explicit
//! list. Lookup fails closed; an unknown name is a fatal configuration
//! error, never a fallthrough.

use crate::errors::PipelineError;
use crate::stage::Stage;
use crate::stages;

/// Planning-time description of one stage.
///
/// Containers carry `members` and are expanded by the planner; they can
/// never be instantiated or executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    /// Dotted stage name.
    pub name: &'static str,
    /// Names of the stages this stage depends on.
    pub dependencies: &'static [&'static str],
    /// Member stages, when this spec is a container.
    pub members: &'static [&'static str],
}

impl StageSpec {
    /// Whether this spec is a container.
    pub fn is_container(&self) -> bool {
        !self.members.is_empty()
    }
}

/// Every stage the pipeline knows about.
pub const SPECS: &[StageSpec] = &[
    StageSpec {
        name: stages::pdbs::NAME,
        dependencies: stages::pdbs::DEPENDENCIES,
        members: &[],
    },
    StageSpec {
        name: stages::units::NAME,
        dependencies: stages::units::DEPENDENCIES,
        members: &[],
    },
    StageSpec {
        name: stages::loops::NAME,
        dependencies: stages::loops::DEPENDENCIES,
        members: &[],
    },
    StageSpec {
        name: stages::export::NAME,
        dependencies: stages::export::DEPENDENCIES,
        members: &[],
    },
    StageSpec {
        name: stages::motifs::NAME,
        dependencies: stages::motifs::DEPENDENCIES,
        members: &[],
    },
    // Containers.
    StageSpec {
        name: "loops",
        dependencies: &[],
        members: &[stages::loops::NAME, stages::export::NAME],
    },
    StageSpec {
        name: "update",
        dependencies: &[],
        members: &[
            stages::pdbs::NAME,
            stages::units::NAME,
            "loops",
            stages::motifs::NAME,
        ],
    },
];

/// Look up the spec for a stage name.
pub fn spec(name: &str) -> Result<&'static StageSpec, PipelineError> {
    SPECS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| PipelineError::UnknownStage(name.to_string()))
}

/// Instantiate the stage behind a name. Containers cannot be instantiated.
pub fn create(name: &str) -> Result<Box<dyn Stage>, PipelineError> {
    let spec = spec(name)?;
    if spec.is_container() {
        return Err(PipelineError::invalid_state(format!(
            "Container stage `{name}` cannot be executed directly"
        )));
    }
    let stage: Box<dyn Stage> = match name {
        stages::pdbs::NAME => Box::new(stages::pdbs::InfoLoader),
        stages::units::NAME => Box::new(stages::units::InfoLoader),
        stages::loops::NAME => Box::new(stages::loops::ExtractorLoader),
        stages::export::NAME => Box::new(stages::export::LoopsExporter),
        stages::motifs::NAME => Box::new(stages::motifs::ReleaseStage),
        _ => return Err(PipelineError::UnknownStage(name.to_string())),
    };
    Ok(stage)
}
