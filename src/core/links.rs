use crate::core::{
    breakend::{Breakend, BreakendId, Orientation, VariantId},
    breakend_index::BreakendIndex,
    svtype::SvType,
    variant::{BreakendLookup, Variant},
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

pub type LinkId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    DeletionBridge,
    TemplatedInsertion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkProvenance {
    Assembled,
    Inferred,
}

/// A pair of facing breakends on one chromosome, `lower` at or below `upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub lower: BreakendId,
    pub upper: BreakendId,
    pub chromosome: String,
    pub lower_position: i64,
    pub upper_position: i64,
    pub kind: LinkKind,
    pub provenance: LinkProvenance,
    pub length: i64,
    pub high_confidence: bool,
}

impl Link {
    /// Kind and length of the junction two breakends would form, in either argument order.
    pub fn classify(a: &Breakend, b: &Breakend) -> Option<(LinkKind, i64)> {
        if a.chromosome != b.chromosome {
            return None;
        }
        let (lower, upper) = if (a.position, a.orientation) <= (b.position, b.orientation) {
            (a, b)
        } else {
            (b, a)
        };
        let length = (upper.position - lower.position - 1).max(0);
        match (lower.orientation, upper.orientation) {
            (Orientation::Plus, Orientation::Minus) => Some((LinkKind::DeletionBridge, length)),
            (Orientation::Minus, Orientation::Plus) => Some((LinkKind::TemplatedInsertion, length)),
            _ => None,
        }
    }

    pub fn between(
        variants: &[Variant],
        id: LinkId,
        a: BreakendId,
        b: BreakendId,
        provenance: LinkProvenance,
    ) -> Option<Link> {
        let (be_a, be_b) = (variants.breakend(a), variants.breakend(b));
        let (kind, length) = Self::classify(be_a, be_b)?;
        let (lower, upper) = if (be_a.position, be_a.orientation) <= (be_b.position, be_b.orientation) {
            (be_a, be_b)
        } else {
            (be_b, be_a)
        };
        let high_confidence = provenance == LinkProvenance::Assembled
            || variants[a.variant].jcn.overlaps(&variants[b.variant].jcn);
        Some(Link {
            id,
            lower: lower.id,
            upper: upper.id,
            chromosome: lower.chromosome.clone(),
            lower_position: lower.position,
            upper_position: upper.position,
            kind,
            provenance,
            length,
            high_confidence,
        })
    }

    pub fn other(&self, be: BreakendId) -> Option<BreakendId> {
        if be == self.lower {
            Some(self.upper)
        } else if be == self.upper {
            Some(self.lower)
        } else {
            None
        }
    }

    pub fn breakends(&self) -> [BreakendId; 2] {
        [self.lower, self.upper]
    }

    /// A duplication joined to itself.
    pub fn is_self_link(&self) -> bool {
        self.lower.variant == self.upper.variant
    }

    pub fn is_templated_insertion(&self) -> bool {
        self.kind == LinkKind::TemplatedInsertion
    }

    pub fn is_deletion_bridge(&self) -> bool {
        self.kind == LinkKind::DeletionBridge
    }

    pub fn is_assembled(&self) -> bool {
        self.provenance == LinkProvenance::Assembled
    }

    /// Deletion bridges report negative lengths.
    pub fn signed_length(&self) -> i64 {
        match self.kind {
            LinkKind::DeletionBridge => -self.length,
            LinkKind::TemplatedInsertion => self.length,
        }
    }

    /// Short templated insertions behave like deletion bridges when classifying.
    pub fn is_short(&self, short_ti_length: i64) -> bool {
        self.length < short_ti_length
    }

    /// 0 = assembled, 1 = inferred with overlapping JCN, 2 = other inferred.
    pub fn evidence_rank(&self) -> u8 {
        match (self.provenance, self.high_confidence) {
            (LinkProvenance::Assembled, _) => 0,
            (LinkProvenance::Inferred, true) => 1,
            (LinkProvenance::Inferred, false) => 2,
        }
    }

    /// True when the linked segment lies between two breakends on its chromosome.
    pub fn within(&self, lower: &Breakend, upper: &Breakend) -> bool {
        self.chromosome == lower.chromosome
            && self.lower_position >= lower.position
            && self.upper_position <= upper.position
    }

    /// True when `position` on `chromosome` lies within the linked segment.
    pub fn covers(&self, chromosome: &str, position: i64) -> bool {
        self.chromosome == chromosome
            && self.lower_position <= position
            && position <= self.upper_position
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            LinkKind::DeletionBridge => "DB",
            LinkKind::TemplatedInsertion => "TI",
        };
        write!(
            f,
            "{}#{}({} {}-{} {}:{}-{} len={})",
            kind,
            self.id,
            match self.provenance {
                LinkProvenance::Assembled => "asm",
                LinkProvenance::Inferred => "inf",
            },
            self.lower,
            self.upper,
            self.chromosome,
            self.lower_position,
            self.upper_position,
            self.length
        )
    }
}

/// All links of one cluster, indexed by breakend.
#[derive(Debug, Clone, Default)]
pub struct ClusterLinks {
    links: Vec<Link>,
    by_breakend: HashMap<BreakendId, Vec<LinkId>>,
}

impl ClusterLinks {
    /// Finds assembled and inferred links between a cluster's breakends.
    ///
    /// `index` must be scoped to the cluster so adjacency ignores other clusters.
    pub fn find(variants: &[Variant], index: &BreakendIndex) -> Self {
        let mut builder = LinkSetBuilder::new(variants);

        // Assembled templated insertions may jump over other breakends.
        let mut by_assembly: BTreeMap<&str, Vec<BreakendId>> = BTreeMap::new();
        for (_, ordered) in index.chromosomes() {
            for &id in ordered {
                for asm in &variants.breakend(id).assembly_ids {
                    by_assembly.entry(asm.as_str()).or_default().push(id);
                }
            }
        }
        for members in by_assembly.values() {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    if a.variant == b.variant {
                        continue;
                    }
                    if let Some((LinkKind::TemplatedInsertion, _)) =
                        Link::classify(variants.breakend(a), variants.breakend(b))
                    {
                        builder.push(a, b, LinkProvenance::Assembled);
                    }
                }
            }
        }

        let mut self_links = Vec::new();
        for (_, ordered) in index.chromosomes() {
            for pair in ordered.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if a.variant == b.variant {
                    if variants[a.variant].svtype == SvType::DUPLICATION {
                        self_links.push((a, b));
                    }
                    continue;
                }
                match Link::classify(variants.breakend(a), variants.breakend(b)) {
                    Some((LinkKind::DeletionBridge, _)) => {
                        builder.push(a, b, LinkProvenance::Inferred);
                    }
                    Some((LinkKind::TemplatedInsertion, _))
                        if !builder.has_assembled(a) && !builder.has_assembled(b) =>
                    {
                        builder.push(a, b, LinkProvenance::Inferred);
                    }
                    _ => {}
                }
            }
        }

        // Duplications whose ends are adjacent may close on themselves
        for (a, b) in self_links {
            if let Some((LinkKind::TemplatedInsertion, _)) =
                Link::classify(variants.breakend(a), variants.breakend(b))
            {
                builder.push(a, b, LinkProvenance::Inferred);
            }
        }

        let links = builder.finish();
        log::trace!(
            "Found {} links ({} assembled)",
            links.len(),
            links.iter().filter(|l| l.is_assembled()).count()
        );
        links
    }

    pub fn from_links(links: Vec<Link>) -> Self {
        let mut by_breakend: HashMap<BreakendId, Vec<LinkId>> = HashMap::new();
        for link in &links {
            for be in link.breakends() {
                by_breakend.entry(be).or_default().push(link.id);
            }
        }
        Self { links, by_breakend }
    }

    pub fn get(&self, id: LinkId) -> &Link {
        &self.links[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links_at(&self, be: BreakendId) -> impl Iterator<Item = &Link> {
        self.by_breakend
            .get(&be)
            .into_iter()
            .flatten()
            .map(|id| &self.links[*id])
    }

    pub fn has_link(&self, be: BreakendId) -> bool {
        self.by_breakend.contains_key(&be)
    }

    pub fn deletion_bridge(&self, be: BreakendId) -> Option<&Link> {
        self.links_at(be).find(|l| l.is_deletion_bridge())
    }

    pub fn templated_insertions(&self, be: BreakendId) -> impl Iterator<Item = &Link> {
        self.links_at(be).filter(|l| l.is_templated_insertion())
    }

    pub fn deletion_bridges(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.is_deletion_bridge())
    }

    pub fn all_templated_insertions(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|l| l.is_templated_insertion())
    }

    /// Templated insertions joining two different variants of the given pair.
    pub fn insertions_between(&self, a: VariantId, b: VariantId) -> Vec<&Link> {
        self.all_templated_insertions()
            .filter(|l| {
                let (x, y) = (l.lower.variant, l.upper.variant);
                (x == a && y == b) || (x == b && y == a)
            })
            .collect()
    }

    /// Templated insertions in chaining order: strongest evidence first, self links
    /// last, shorter insertions before longer ones.
    pub fn chaining_order(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self
            .all_templated_insertions()
            .map(|l| l.id)
            .collect();
        ids.sort_by_key(|id| {
            let l = &self.links[*id];
            (l.is_self_link(), l.evidence_rank(), l.length, l.id)
        });
        ids
    }
}

struct LinkSetBuilder<'a> {
    variants: &'a [Variant],
    links: Vec<Link>,
    seen: HashSet<(BreakendId, BreakendId)>,
    assembled: HashSet<BreakendId>,
}

impl<'a> LinkSetBuilder<'a> {
    fn new(variants: &'a [Variant]) -> Self {
        Self {
            variants,
            links: Vec::new(),
            seen: HashSet::new(),
            assembled: HashSet::new(),
        }
    }

    fn push(&mut self, a: BreakendId, b: BreakendId, provenance: LinkProvenance) {
        let key = if a <= b { (a, b) } else { (b, a) };
        if !self.seen.insert(key) {
            return;
        }
        if let Some(link) = Link::between(self.variants, self.links.len(), a, b, provenance) {
            if provenance == LinkProvenance::Assembled {
                self.assembled.extend(link.breakends());
            }
            log::trace!("Added link {link}");
            self.links.push(link);
        }
    }

    fn has_assembled(&self, be: BreakendId) -> bool {
        self.assembled.contains(&be)
    }

    fn finish(self) -> ClusterLinks {
        ClusterLinks::from_links(self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::variant::test_utils::{bnd, del, dup, inv, variants, with_assembly, with_jcn};
    use proptest::prelude::*;

    fn links_for(records: &[crate::core::variant::VariantRecord]) -> (Vec<Variant>, ClusterLinks) {
        let vs = variants(records);
        let members: Vec<_> = (0..vs.len()).collect();
        let index = BreakendIndex::for_variants(&vs, &members);
        let links = ClusterLinks::find(&vs, &index);
        (vs, links)
    }

    #[test]
    fn test_overlapping_inversions_give_db_ti_db() {
        let (_, links) = links_for(&[inv("a", "1", 100, 300, 1), inv("b", "1", 200, 400, -1)]);
        let kinds: Vec<_> = links.iter().map(|l| (l.kind, l.length)).collect();
        assert_eq!(
            kinds,
            vec![
                (LinkKind::DeletionBridge, 99),
                (LinkKind::TemplatedInsertion, 99),
                (LinkKind::DeletionBridge, 99),
            ]
        );
        let ti = links.all_templated_insertions().next().unwrap();
        assert_eq!(ti.lower, BreakendId::start(1));
        assert_eq!(ti.upper, BreakendId::end(0));
        assert_eq!(ti.signed_length(), 99);
        assert_eq!(links.deletion_bridge(BreakendId::start(0)).unwrap().signed_length(), -99);
    }

    #[test]
    fn test_separate_inversions_give_single_db() {
        let (_, links) = links_for(&[inv("a", "1", 100, 200, 1), inv("b", "1", 300, 400, -1)]);
        assert_eq!(links.len(), 1);
        let db = links.get(0);
        assert!(db.is_deletion_bridge());
        assert_eq!((db.lower, db.upper), (BreakendId::end(0), BreakendId::start(1)));
        assert!(db.high_confidence);
    }

    #[test]
    fn test_zero_length_bridge_is_kept() {
        let (_, links) = links_for(&[
            bnd("a", ("1", 1_000, 1), ("2", 100, 1)),
            bnd("b", ("1", 1_000, -1), ("3", 100, 1)),
        ]);
        assert_eq!(links.len(), 1);
        assert_eq!(links.get(0).kind, LinkKind::DeletionBridge);
        assert_eq!(links.get(0).length, 0);
    }

    #[test]
    fn test_assembled_link_spans_intervening_breakend() {
        let (_, links) = links_for(&[
            with_assembly(bnd("a", ("1", 1_000, -1), ("2", 100, 1)), &["asm1"], &[]),
            del("b", "1", 1_200, 1_300),
            with_assembly(bnd("c", ("1", 1_500, 1), ("3", 100, 1)), &["asm1"], &[]),
        ]);
        let assembled: Vec<_> = links.iter().filter(|l| l.is_assembled()).collect();
        assert_eq!(assembled.len(), 1);
        assert_eq!(assembled[0].length, 499);
        assert_eq!(assembled[0].evidence_rank(), 0);
        // no inferred TI may reuse an assembled breakend
        assert!(links
            .templated_insertions(BreakendId::start(0))
            .all(|l| l.is_assembled()));
    }

    #[test]
    fn test_low_confidence_when_jcn_disagrees() {
        let (_, links) = links_for(&[
            with_jcn(bnd("a", ("1", 1_000, -1), ("2", 100, 1)), 1.0, 0.2),
            with_jcn(bnd("b", ("1", 1_500, 1), ("3", 100, 1)), 4.0, 0.2),
        ]);
        assert_eq!(links.len(), 1);
        assert!(!links.get(0).high_confidence);
        assert_eq!(links.get(0).evidence_rank(), 2);
    }

    #[test]
    fn test_duplication_self_link_only_when_adjacent() {
        let (_, links) = links_for(&[dup("a", "1", 1_000, 2_000)]);
        assert_eq!(links.len(), 1);
        assert!(links.get(0).is_self_link());
        assert_eq!(links.get(0).length, 999);

        let (_, links) = links_for(&[dup("a", "1", 1_000, 2_000), del("b", "1", 1_400, 1_600)]);
        assert!(links.iter().all(|l| !l.is_self_link()));
    }

    #[test]
    fn test_chaining_order() {
        let (_, links) = links_for(&[
            bnd("a", ("1", 1_000, -1), ("2", 100, 1)),
            with_assembly(bnd("b", ("1", 5_000, 1), ("3", 100, 1)), &["x"], &[]),
            with_assembly(bnd("c", ("1", 4_000, -1), ("4", 100, 1)), &["x"], &[]),
            bnd("d", ("1", 1_100, 1), ("5", 100, 1)),
        ]);
        let order: Vec<_> = links
            .chaining_order()
            .into_iter()
            .map(|id| links.get(id).length)
            .collect();
        assert_eq!(order, vec![999, 99]);
    }

    fn breakend_strategy() -> impl Strategy<Value = (i64, bool)> {
        (0i64..10_000, any::<bool>())
    }

    proptest! {
        #[test]
        fn prop_link_classification_is_symmetric(a in breakend_strategy(), b in breakend_strategy()) {
            let orient = |plus: bool| if plus { 1 } else { -1 };
            let vs = variants(&[
                bnd("a", ("1", a.0, orient(a.1)), ("2", 1, 1)),
                bnd("b", ("1", b.0, orient(b.1)), ("3", 1, 1)),
            ]);
            let ab = Link::between(&vs, 0, BreakendId::start(0), BreakendId::start(1), LinkProvenance::Inferred);
            let ba = Link::between(&vs, 0, BreakendId::start(1), BreakendId::start(0), LinkProvenance::Inferred);
            prop_assert_eq!(ab.as_ref().map(|l| (l.kind, l.length.abs())), ba.as_ref().map(|l| (l.kind, l.length.abs())));
            if let Some(link) = ab {
                prop_assert!(link.length >= 0);
                prop_assert!(link.lower_position <= link.upper_position);
            }
        }
    }
}
