use super::{BreakendRecord, Variant, VariantRecord};
use crate::core::{reference::ReferenceData, svtype::SvType};

pub const DEFAULT_JCN_UNCERTAINTY: f64 = 0.25;

fn breakend_record((chromosome, position, orientation): (&str, i64, i8), jcn: f64) -> BreakendRecord {
    BreakendRecord {
        chromosome: chromosome.to_string(),
        position,
        orientation: Some(orientation),
        copy_number: Some(2.0 + jcn),
        copy_number_change: Some(jcn),
        assembly_ids: Vec::new(),
    }
}

/// A two-breakend record on a diploid background whose copy number change equals its JCN.
pub fn record(
    id: &str,
    svtype: SvType,
    start: (&str, i64, i8),
    end: (&str, i64, i8),
    jcn: f64,
) -> VariantRecord {
    VariantRecord {
        id: id.to_string(),
        svtype,
        start: breakend_record(start, jcn),
        end: Some(breakend_record(end, jcn)),
        jcn: Some(jcn),
        jcn_uncertainty: Some(DEFAULT_JCN_UNCERTAINTY),
        insert_sequence: String::new(),
        homology: String::new(),
        is_equivalent: false,
    }
}

pub fn sgl_record(id: &str, start: (&str, i64, i8), jcn: f64) -> VariantRecord {
    VariantRecord {
        id: id.to_string(),
        svtype: SvType::SGL,
        start: breakend_record(start, jcn),
        end: None,
        jcn: Some(jcn),
        jcn_uncertainty: Some(DEFAULT_JCN_UNCERTAINTY),
        insert_sequence: String::new(),
        homology: String::new(),
        is_equivalent: false,
    }
}

pub fn del(id: &str, chromosome: &str, start: i64, end: i64) -> VariantRecord {
    record(id, SvType::DELETION, (chromosome, start, 1), (chromosome, end, -1), 1.0)
}

pub fn dup(id: &str, chromosome: &str, start: i64, end: i64) -> VariantRecord {
    record(id, SvType::DUPLICATION, (chromosome, start, -1), (chromosome, end, 1), 1.0)
}

pub fn inv(id: &str, chromosome: &str, start: i64, end: i64, orientation: i8) -> VariantRecord {
    record(
        id,
        SvType::INVERSION,
        (chromosome, start, orientation),
        (chromosome, end, orientation),
        1.0,
    )
}

pub fn bnd(id: &str, start: (&str, i64, i8), end: (&str, i64, i8)) -> VariantRecord {
    record(id, SvType::BND, start, end, 1.0)
}

pub fn with_jcn(mut rec: VariantRecord, jcn: f64, uncertainty: f64) -> VariantRecord {
    rec.jcn = Some(jcn);
    rec.jcn_uncertainty = Some(uncertainty);
    for be in std::iter::once(&mut rec.start).chain(rec.end.as_mut()) {
        be.copy_number_change = Some(jcn);
        be.copy_number = Some(2.0 + jcn);
    }
    rec
}

pub fn with_assembly(mut rec: VariantRecord, start_ids: &[&str], end_ids: &[&str]) -> VariantRecord {
    rec.start.assembly_ids = start_ids.iter().map(|s| s.to_string()).collect();
    if let Some(end) = rec.end.as_mut() {
        end.assembly_ids = end_ids.iter().map(|s| s.to_string()).collect();
    }
    rec
}

pub fn with_insert(mut rec: VariantRecord, insert_sequence: &str) -> VariantRecord {
    rec.insert_sequence = insert_sequence.to_string();
    rec
}

pub fn variants_with(reference: &ReferenceData, records: &[VariantRecord]) -> Vec<Variant> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| Variant::from_record(i, r, reference).unwrap())
        .collect()
}

pub fn variants(records: &[VariantRecord]) -> Vec<Variant> {
    variants_with(&ReferenceData::grch37(), records)
}
