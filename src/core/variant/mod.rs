mod record;

#[cfg(test)]
pub(crate) mod test_utils;

pub use record::{BreakendRecord, InputDefect, VariantRecord};

use crate::core::{
    breakend::{
        Breakend, BreakendId, BreakendSide, JcnRange, Orientation, VariantId,
    },
    cluster::ClusterId,
    line_element::has_line_motif,
    reference::ReferenceData,
    svtype::SvType,
};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Variant {
    pub index: VariantId,
    pub id: String,
    pub svtype: SvType,
    pub jcn: JcnRange,
    pub insert_sequence: String,
    pub homology: String,
    pub is_equivalent: bool,
    pub cluster: Option<ClusterId>,
    breakends: Vec<Breakend>,
}

impl Variant {
    /// Validates a caller record and places it in the arena at `index`.
    pub fn from_record(
        index: VariantId,
        record: &VariantRecord,
        reference: &ReferenceData,
    ) -> Result<Self, InputDefect> {
        let jcn = match (record.jcn, record.jcn_uncertainty.unwrap_or(0.0)) {
            (Some(jcn), unc) if jcn.is_finite() && jcn >= 0.0 && unc.is_finite() => {
                JcnRange::new(jcn, unc)
            }
            _ => return Err(InputDefect::InvalidJcn),
        };

        let mut breakends = vec![Self::build_breakend(
            BreakendId::start(index),
            &record.start,
            record,
            jcn,
            reference,
        )?];
        if !record.svtype.is_single_breakend() {
            let end = record.end.as_ref().ok_or(InputDefect::MissingEnd {
                svtype: record.svtype,
            })?;
            breakends.push(Self::build_breakend(
                BreakendId::end(index),
                end,
                record,
                jcn,
                reference,
            )?);
        }

        Ok(Self {
            index,
            id: record.id.clone(),
            svtype: record.svtype,
            jcn,
            insert_sequence: record.insert_sequence.clone(),
            homology: record.homology.clone(),
            is_equivalent: record.is_equivalent,
            cluster: None,
            breakends,
        })
    }

    fn build_breakend(
        id: BreakendId,
        source: &BreakendRecord,
        record: &VariantRecord,
        jcn: JcnRange,
        reference: &ReferenceData,
    ) -> Result<Breakend, InputDefect> {
        let orientation = source
            .orientation
            .and_then(|o| Orientation::from_i8(o).ok())
            .ok_or(InputDefect::InvalidOrientation { side: id.side })?;
        let (copy_number, copy_number_change) =
            match (source.copy_number, source.copy_number_change) {
                (Some(cn), Some(change)) if cn.is_finite() && change.is_finite() => (cn, change),
                _ => return Err(InputDefect::InvalidCopyNumber { side: id.side }),
            };

        let mut breakend = Breakend::new(
            id,
            source.chromosome.clone(),
            source.position,
            orientation,
            reference.arm(&source.chromosome, source.position),
            copy_number,
            copy_number_change,
            jcn,
        );
        breakend.assembly_ids = source.assembly_ids.clone();
        breakend.is_fragile_site = reference.is_fragile_site(&source.chromosome, source.position);
        breakend.has_line_motif = has_line_motif(&record.insert_sequence, orientation);
        Ok(breakend)
    }

    #[inline]
    pub fn breakend(&self, side: BreakendSide) -> &Breakend {
        &self.breakends[side.index()]
    }

    #[inline]
    pub fn breakend_mut(&mut self, side: BreakendSide) -> &mut Breakend {
        &mut self.breakends[side.index()]
    }

    pub fn try_breakend(&self, side: BreakendSide) -> Option<&Breakend> {
        self.breakends.get(side.index())
    }

    pub fn breakends(&self) -> &[Breakend] {
        &self.breakends
    }

    pub fn breakends_mut(&mut self) -> &mut [Breakend] {
        &mut self.breakends
    }

    pub fn breakend_ids(&self) -> impl Iterator<Item = BreakendId> + '_ {
        self.breakends.iter().map(|be| be.id)
    }

    pub fn start(&self) -> &Breakend {
        &self.breakends[0]
    }

    pub fn end(&self) -> Option<&Breakend> {
        self.breakends.get(1)
    }

    pub fn is_single_breakend(&self) -> bool {
        self.breakends.len() == 1
    }

    pub fn is_intra_chromosomal(&self) -> bool {
        self.end()
            .is_some_and(|end| end.chromosome == self.start().chromosome)
    }

    /// Lowest and highest position for a variant whose ends share a chromosome.
    pub fn span(&self) -> Option<(i64, i64)> {
        let end = self.end()?;
        if end.chromosome != self.start().chromosome {
            return None;
        }
        let (a, b) = (self.start().position, end.position);
        Some((a.min(b), a.max(b)))
    }

    pub fn length(&self) -> i64 {
        self.span().map_or(0, |(lo, hi)| hi - lo)
    }

    pub fn is_deletion(&self) -> bool {
        self.svtype == SvType::DELETION
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} {}", self.id, self.svtype, self.start())?;
        if let Some(end) = self.end() {
            write!(f, " {}", end)?;
        }
        write!(f, ")")
    }
}

/// Id-based access into a sample's variant arena.
pub trait BreakendLookup {
    fn breakend(&self, id: BreakendId) -> &Breakend;
    fn variant(&self, id: VariantId) -> &Variant;
}

impl BreakendLookup for [Variant] {
    #[inline]
    fn breakend(&self, id: BreakendId) -> &Breakend {
        self[id.variant].breakend(id.side)
    }

    #[inline]
    fn variant(&self, id: VariantId) -> &Variant {
        &self[id]
    }
}
