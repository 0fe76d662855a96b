use crate::core::{breakend::BreakendSide, svtype::SvType};
use thiserror::Error;

/// One breakend as delivered by the upstream caller, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakendRecord {
    pub chromosome: String,
    pub position: i64,
    pub orientation: Option<i8>,
    pub copy_number: Option<f64>,
    pub copy_number_change: Option<f64>,
    pub assembly_ids: Vec<String>,
}

/// One structural variant as delivered by the upstream caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub id: String,
    pub svtype: SvType,
    pub start: BreakendRecord,
    pub end: Option<BreakendRecord>,
    pub jcn: Option<f64>,
    pub jcn_uncertainty: Option<f64>,
    pub insert_sequence: String,
    pub homology: String,
    pub is_equivalent: bool,
}

/// Reasons a record is excluded from clustering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputDefect {
    #[error("missing or invalid orientation at {side:?} breakend")]
    InvalidOrientation { side: BreakendSide },
    #[error("missing or invalid copy number at {side:?} breakend")]
    InvalidCopyNumber { side: BreakendSide },
    #[error("missing or invalid junction copy number")]
    InvalidJcn,
    #[error("{svtype} call without an end breakend")]
    MissingEnd { svtype: SvType },
}
