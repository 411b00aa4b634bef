//! Result-chain roles and template layout settings.
//!
//! Levels are loaded from the catalog at runtime, so the templates cannot
//! refer to them by id. Instead every level is assigned a [`LevelRole`] by
//! its position in the priority-ordered level list, and each template
//! partition collects the indicators of one or more roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The part of the result chain a level plays in the report templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelRole {
    Impact,
    Outcome,
    OtherOutcome,
    Output,
}

impl fmt::Display for LevelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelRole::Impact => write!(f, "impact"),
            LevelRole::Outcome => write!(f, "outcome"),
            LevelRole::OtherOutcome => write!(f, "other_outcome"),
            LevelRole::Output => write!(f, "output"),
        }
    }
}

/// Role assignment for the catalog's levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelsConfig {
    /// Role of each level, in ascending priority order. Levels beyond the
    /// end of this list are treated as [`LevelRole::OtherOutcome`].
    #[serde(default = "default_level_roles")]
    pub roles: Vec<LevelRole>,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            roles: default_level_roles(),
        }
    }
}

fn default_level_roles() -> Vec<LevelRole> {
    vec![
        LevelRole::Impact,
        LevelRole::Outcome,
        LevelRole::Output,
        LevelRole::OtherOutcome,
    ]
}

/// Layout of the narrative report table.
///
/// ## TOML Example
///
/// ```toml
/// [narrative]
/// first_row = 1
/// merge_columns = [0, 1, 7]
///
/// [[narrative.partitions]]
/// roles = ["impact"]
/// fill_baseline = true
///
/// [[narrative.partitions]]
/// roles = ["outcome", "other_outcome", "output"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Index of the first template row (row 0 is the table header).
    #[serde(default = "default_first_row")]
    pub first_row: usize,

    /// Column receiving the indicator name.
    #[serde(default = "default_name_column")]
    pub name_column: usize,

    /// Column receiving the "value (date)" baseline.
    #[serde(default = "default_baseline_column")]
    pub baseline_column: usize,

    /// Column receiving the source of verification.
    #[serde(default = "default_verification_column")]
    pub verification_column: usize,

    /// Columns merged vertically across each partition's rows
    /// (level, result statement, assumptions).
    #[serde(default = "default_merge_columns")]
    pub merge_columns: Vec<usize>,

    /// Partitions in template order, one prebuilt row each.
    #[serde(default = "default_narrative_partitions")]
    pub partitions: Vec<NarrativePartition>,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            first_row: default_first_row(),
            name_column: default_name_column(),
            baseline_column: default_baseline_column(),
            verification_column: default_verification_column(),
            merge_columns: default_merge_columns(),
            partitions: default_narrative_partitions(),
        }
    }
}

/// One level partition of the narrative report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativePartition {
    /// Roles whose indicators land in this partition.
    pub roles: Vec<LevelRole>,

    /// Whether the baseline column is filled with "value (date)".
    #[serde(default)]
    pub fill_baseline: bool,
}

fn default_first_row() -> usize {
    1
}

fn default_name_column() -> usize {
    2
}

fn default_baseline_column() -> usize {
    3
}

fn default_verification_column() -> usize {
    6
}

fn default_merge_columns() -> Vec<usize> {
    vec![0, 1, 7]
}

fn default_narrative_partitions() -> Vec<NarrativePartition> {
    vec![
        NarrativePartition {
            roles: vec![LevelRole::Impact],
            fill_baseline: true,
        },
        NarrativePartition {
            roles: vec![LevelRole::Outcome],
            fill_baseline: false,
        },
        NarrativePartition {
            roles: vec![LevelRole::OtherOutcome],
            fill_baseline: false,
        },
        NarrativePartition {
            roles: vec![LevelRole::Output],
            fill_baseline: false,
        },
    ]
}

/// Layout of the donor report worksheet.
///
/// Every partition owns `slots` prebuilt indicator blocks of four rows.
/// The last partition is the one whose overflow merge starts one row
/// before the end of its prebuilt blocks.
///
/// ## TOML Example
///
/// ```toml
/// [donor]
/// first_row = 1
///
/// [[donor.partitions]]
/// roles = ["impact"]
/// slots = 1
/// fill_baseline = true
///
/// [[donor.partitions]]
/// roles = ["outcome", "other_outcome"]
/// slots = 3
/// resplice_boundary = true
///
/// [[donor.partitions]]
/// roles = ["output"]
/// slots = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorConfig {
    /// Index of the first slot row (row 0 is the sheet header).
    #[serde(default = "default_first_row")]
    pub first_row: usize,

    /// Partitions in sheet order.
    #[serde(default = "default_donor_partitions")]
    pub partitions: Vec<DonorPartition>,
}

impl Default for DonorConfig {
    fn default() -> Self {
        Self {
            first_row: default_first_row(),
            partitions: default_donor_partitions(),
        }
    }
}

/// One level partition of the donor report worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorPartition {
    /// Roles whose indicators land in this partition.
    pub roles: Vec<LevelRole>,

    /// Number of prebuilt indicator slots.
    pub slots: usize,

    /// Whether the baseline cell is filled with "value (date)".
    #[serde(default)]
    pub fill_baseline: bool,

    /// Remove the first-column merged region ending just above the first
    /// overflow block before growing the partition.
    #[serde(default)]
    pub resplice_boundary: bool,
}

fn default_donor_partitions() -> Vec<DonorPartition> {
    vec![
        DonorPartition {
            roles: vec![LevelRole::Impact],
            slots: 1,
            fill_baseline: true,
            resplice_boundary: false,
        },
        DonorPartition {
            roles: vec![LevelRole::Outcome, LevelRole::OtherOutcome],
            slots: 3,
            fill_baseline: false,
            resplice_boundary: true,
        },
        DonorPartition {
            roles: vec![LevelRole::Output],
            slots: 2,
            fill_baseline: false,
            resplice_boundary: false,
        },
    ]
}
