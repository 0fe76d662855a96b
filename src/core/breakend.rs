use crate::{error::SvReconError, utils::util::Result};
use std::fmt;

pub type VariantId = usize;

/// Strand a breakend faces.
///
/// `Plus` (+1) keeps the reference segment ending at the breakend position (bases at or
/// below it), `Minus` (-1) keeps the segment starting at it (bases at or above it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Plus,
    Minus,
}

impl Orientation {
    pub fn from_i8(value: i8) -> Result<Self> {
        match value {
            1 => Ok(Orientation::Plus),
            -1 => Ok(Orientation::Minus),
            _ => Err(SvReconError::InvalidOrientation {
                value: value.to_string(),
            }),
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Orientation::Plus => 1,
            Orientation::Minus => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Orientation::Plus => Orientation::Minus,
            Orientation::Minus => Orientation::Plus,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChromosomeArm {
    P,
    Q,
}

impl fmt::Display for ChromosomeArm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChromosomeArm::P => write!(f, "P"),
            ChromosomeArm::Q => write!(f, "Q"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BreakendSide {
    Start,
    End,
}

impl BreakendSide {
    pub fn other(self) -> Self {
        match self {
            BreakendSide::Start => BreakendSide::End,
            BreakendSide::End => BreakendSide::Start,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            BreakendSide::Start => 0,
            BreakendSide::End => 1,
        }
    }
}

/// Arena address of a breakend: the owning variant plus which end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakendId {
    pub variant: VariantId,
    pub side: BreakendSide,
}

impl BreakendId {
    pub fn new(variant: VariantId, side: BreakendSide) -> Self {
        Self { variant, side }
    }

    pub fn start(variant: VariantId) -> Self {
        Self::new(variant, BreakendSide::Start)
    }

    pub fn end(variant: VariantId) -> Self {
        Self::new(variant, BreakendSide::End)
    }

    /// The opposite breakend of the same variant.
    pub fn other(self) -> Self {
        Self::new(self.variant, self.side.other())
    }
}

impl fmt::Display for BreakendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            BreakendSide::Start => 's',
            BreakendSide::End => 'e',
        };
        write!(f, "{}:{}", self.variant, side)
    }
}

/// Junction copy number estimate with its uncertainty bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JcnRange {
    pub estimate: f64,
    pub min: f64,
    pub max: f64,
}

impl JcnRange {
    pub fn new(estimate: f64, uncertainty: f64) -> Self {
        let uncertainty = uncertainty.abs();
        Self {
            estimate,
            min: (estimate - uncertainty).max(0.0),
            max: estimate + uncertainty,
        }
    }

    pub fn from_bounds(estimate: f64, min: f64, max: f64) -> Self {
        Self {
            estimate: estimate.clamp(min, max),
            min,
            max,
        }
    }

    pub fn overlaps(&self, other: &JcnRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    pub fn intersect(&self, other: &JcnRange) -> Option<JcnRange> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then(|| JcnRange::from_bounds(self.estimate, min, max))
    }

    pub fn scaled(&self, factor: f64) -> JcnRange {
        JcnRange {
            estimate: self.estimate * factor,
            min: self.min * factor,
            max: self.max * factor,
        }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum LineElementType {
    #[default]
    None,
    Suspect,
    Known,
}

impl fmt::Display for LineElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineElementType::None => write!(f, "NONE"),
            LineElementType::Suspect => write!(f, "SUSPECT"),
            LineElementType::Known => write!(f, "KNOWN"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Breakend {
    pub id: BreakendId,
    pub chromosome: String,
    pub position: i64,
    pub orientation: Orientation,
    pub arm: ChromosomeArm,
    pub copy_number: f64,
    pub copy_number_change: f64,
    pub assembly_ids: Vec<String>,
    pub is_fragile_site: bool,
    pub has_line_motif: bool,
    pub line_element: LineElementType,
    jcn: JcnRange,
    jcn_refined: bool,
}

impl Breakend {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BreakendId,
        chromosome: String,
        position: i64,
        orientation: Orientation,
        arm: ChromosomeArm,
        copy_number: f64,
        copy_number_change: f64,
        jcn: JcnRange,
    ) -> Self {
        Self {
            id,
            chromosome,
            position,
            orientation,
            arm,
            copy_number,
            copy_number_change,
            assembly_ids: Vec::new(),
            is_fragile_site: false,
            has_line_motif: false,
            line_element: LineElementType::None,
            jcn,
            jcn_refined: false,
        }
    }

    #[inline]
    pub fn jcn(&self) -> JcnRange {
        self.jcn
    }

    pub fn is_jcn_refined(&self) -> bool {
        self.jcn_refined
    }

    /// Replaces the JCN bounds after cluster-level reconciliation; allowed once.
    pub fn refine_jcn(&mut self, range: JcnRange) -> Result<()> {
        if self.jcn_refined {
            return Err(SvReconError::JcnAlreadyRefined {
                breakend: self.id.to_string(),
            });
        }
        self.jcn = range;
        self.jcn_refined = true;
        Ok(())
    }

    /// Copy number on the side of the breakend that is not part of the junction.
    pub fn flanking_copy_number(&self) -> f64 {
        (self.copy_number - self.copy_number_change.abs()).max(0.0)
    }
}

impl fmt::Display for Breakend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.chromosome, self.position, self.orientation
        )
    }
}
