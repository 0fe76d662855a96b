//! Tab-separated variant calls for one sample.

use super::readers::open_text_reader;
use crate::{
    core::{
        svtype::SvType,
        variant::{BreakendRecord, VariantRecord},
    },
    utils::util::Result,
};
use std::{collections::HashMap, io::BufRead, path::Path, str::FromStr};

const MISSING: &str = ".";

const REQUIRED_COLUMNS: [&str; 19] = [
    "id",
    "type",
    "chr_start",
    "pos_start",
    "orient_start",
    "chr_end",
    "pos_end",
    "orient_end",
    "cn_start",
    "cn_change_start",
    "cn_end",
    "cn_change_end",
    "jcn",
    "jcn_uncertainty",
    "insert_seq",
    "homology",
    "asm_start",
    "asm_end",
    "equivalent",
];

/// Column positions resolved from the header line.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &str) -> Result<Self> {
        let columns: HashMap<String, usize> = header
            .trim_start_matches('#')
            .split('\t')
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !columns.contains_key(**c)) {
            return Err(crate::svrecon_error!("Variant header is missing column '{missing}'"));
        }
        Ok(Self(columns))
    }

    fn get<'a>(&self, fields: &[&'a str], name: &str) -> Result<&'a str> {
        let index = self.0[name];
        fields
            .get(index)
            .copied()
            .ok_or_else(|| crate::svrecon_error!("Missing value for column '{name}'"))
    }
}

fn optional<T: FromStr>(value: &str, name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    if value == MISSING || value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e| crate::svrecon_error!("Invalid {name} '{value}': {e}"))
}

fn assembly_ids(value: &str) -> Vec<String> {
    if value == MISSING {
        return Vec::new();
    }
    value
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn text(value: &str) -> String {
    if value == MISSING {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_breakend(columns: &Columns, fields: &[&str], side: &str) -> Result<Option<BreakendRecord>> {
    let chromosome = columns.get(fields, &format!("chr_{side}"))?;
    if chromosome == MISSING {
        return Ok(None);
    }
    let position: i64 = optional(columns.get(fields, &format!("pos_{side}"))?, "position")?
        .ok_or_else(|| crate::svrecon_error!("Missing {side} position"))?;
    Ok(Some(BreakendRecord {
        chromosome: chromosome.to_string(),
        position,
        orientation: optional(columns.get(fields, &format!("orient_{side}"))?, "orientation")?,
        copy_number: optional(columns.get(fields, &format!("cn_{side}"))?, "copy number")?,
        copy_number_change: optional(
            columns.get(fields, &format!("cn_change_{side}"))?,
            "copy number change",
        )?,
        assembly_ids: assembly_ids(columns.get(fields, &format!("asm_{side}"))?),
    }))
}

fn parse_row(columns: &Columns, line: &str) -> Result<VariantRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    let id = columns.get(&fields, "id")?.to_string();
    let svtype: SvType = columns.get(&fields, "type")?.parse()?;
    let start = parse_breakend(columns, &fields, "start")?
        .ok_or_else(|| crate::svrecon_error!("Variant {id} has no start breakend"))?;
    let end = parse_breakend(columns, &fields, "end")?;
    let equivalent = match columns.get(&fields, "equivalent")? {
        "true" | "TRUE" | "1" => true,
        "false" | "FALSE" | "0" | MISSING => false,
        other => return Err(crate::svrecon_error!("Invalid equivalent flag '{other}'")),
    };
    Ok(VariantRecord {
        id,
        svtype,
        start,
        end,
        jcn: optional(columns.get(&fields, "jcn")?, "jcn")?,
        jcn_uncertainty: optional(columns.get(&fields, "jcn_uncertainty")?, "jcn uncertainty")?,
        insert_sequence: text(columns.get(&fields, "insert_seq")?),
        homology: text(columns.get(&fields, "homology")?),
        is_equivalent: equivalent,
    })
}

/// Reads every variant of a sample; malformed lines are fatal, missing values are not.
pub fn read_variants(path: &Path) -> Result<Vec<VariantRecord>> {
    let reader = open_text_reader(path)?;
    let mut columns: Option<Columns> = None;
    let mut records = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            crate::svrecon_error!("Error reading {} line {}: {}", path.display(), line_number + 1, e)
        })?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let Some(header) = &columns else {
            columns = Some(Columns::from_header(line)?);
            continue;
        };
        let record = parse_row(header, line).map_err(|e| {
            crate::svrecon_error!("Error at {} line {}: {}", path.display(), line_number + 1, e)
        })?;
        records.push(record);
    }
    if columns.is_none() {
        return Err(crate::svrecon_error!("Variant file {} is empty", path.display()));
    }
    log::debug!("Read {} variants from {}", records.len(), path.display());
    Ok(records)
}
