use super::readers::data_lines;
use crate::{
    core::{
        loh::{LohSegment, LohSegments},
        reference::{RegionSet, region_set},
    },
    utils::util::Result,
};
use std::{collections::HashMap, path::Path};

/// A `chrom start end [name]` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub name: String,
}

pub fn line_to_region(line: &str) -> Result<Region> {
    let split_line: Vec<&str> = line.split_whitespace().collect();
    let (chrom, start, end, name) = match &split_line[..] {
        [chrom, start, end] => (*chrom, *start, *end, ""),
        [chrom, start, end, name, ..] => (*chrom, *start, *end, *name),
        _ => {
            return Err(crate::svrecon_error!(
                "Expected at least 3 fields in the format 'chrom start end [name]', found {}: {}",
                split_line.len(),
                line
            ))
        }
    };

    let start: i64 = start
        .parse()
        .map_err(|e| crate::svrecon_error!("Invalid start position: {}", e))?;
    let end: i64 = end
        .parse()
        .map_err(|e| crate::svrecon_error!("Invalid end position: {}", e))?;
    if end < start {
        return Err(crate::svrecon_error!("Region end {end} precedes start {start}"));
    }

    Ok(Region {
        chromosome: chrom.to_string(),
        start,
        end,
        name: name.to_string(),
    })
}

pub fn read_regions(path: &Path) -> Result<Vec<Region>> {
    let mut regions = Vec::new();
    for (line_number, line) in data_lines(path)? {
        let region = line_to_region(&line)
            .map_err(|e| crate::svrecon_error!("Error at BED line {}: {}", line_number, e))?;
        regions.push(region);
    }
    Ok(regions)
}

/// Fragile-site or LINE source regions, indexed per chromosome.
pub fn read_region_set(path: &Path) -> Result<RegionSet> {
    let regions = read_regions(path)?;
    log::debug!("Loaded {} regions from {}", regions.len(), path.display());
    Ok(region_set(
        regions
            .into_iter()
            .map(|r| (r.chromosome, r.start, r.end, r.name)),
    ))
}

pub fn read_loh_segments(path: &Path) -> Result<LohSegments> {
    let segments: Vec<LohSegment> = read_regions(path)?
        .into_iter()
        .map(|r| LohSegment {
            chromosome: r.chromosome,
            start: r.start,
            end: r.end,
        })
        .collect();
    log::debug!("Loaded {} LOH segments from {}", segments.len(), path.display());
    Ok(LohSegments::new(segments))
}

/// Centromere table in `chrom position` form.
pub fn read_centromeres(path: &Path) -> Result<HashMap<String, i64>> {
    let mut centromeres = HashMap::new();
    for (line_number, line) in data_lines(path)? {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [chrom, position] = fields[..] else {
            return Err(crate::svrecon_error!(
                "Error at centromere line {}: expected 'chrom position', found: {}",
                line_number,
                line
            ));
        };
        let position: i64 = position.parse().map_err(|e| {
            crate::svrecon_error!("Error at centromere line {}: invalid position: {}", line_number, e)
        })?;
        if centromeres.insert(chrom.to_string(), position).is_some() {
            return Err(crate::svrecon_error!("Duplicate centromere for chromosome '{}'", chrom));
        }
    }
    Ok(centromeres)
}
