//! Chains of linked variants approximating derivative chromosome segments.
//!
//! Variants are placed as numbered copies ("instances") so a variant with high junction
//! copy number can appear several times. Each instance has one slot per breakend and a
//! slot joins at most one link, so the slot graph is a set of paths and cycles.

mod builder;
mod search;

pub use builder::{ChainResult, ChainScore, build_chains};

use crate::core::{
    breakend::{BreakendId, BreakendSide, VariantId},
    links::LinkId,
    variant::Variant,
};
use std::{collections::BTreeSet, fmt};

pub type ChainId = usize;

/// One copy of a variant placed in a chain, entered through `entry` and left through
/// `exit`. Single breakends enter and leave through their only breakend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainedVariant {
    pub variant: VariantId,
    pub copy: usize,
    pub entry: BreakendSide,
    pub exit: BreakendSide,
}

impl ChainedVariant {
    pub fn entry_breakend(&self) -> BreakendId {
        BreakendId::new(self.variant, self.entry)
    }

    pub fn exit_breakend(&self) -> BreakendId {
        BreakendId::new(self.variant, self.exit)
    }
}

/// `links[i]` joins the exit of `elements[i]` to the entry of `elements[i + 1]`; a closed
/// chain has one more link joining the last exit back to the first entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: ChainId,
    pub elements: Vec<ChainedVariant>,
    pub links: Vec<LinkId>,
    closed: bool,
}

impl Chain {
    pub(crate) fn new(id: ChainId, elements: Vec<ChainedVariant>, links: Vec<LinkId>, closed: bool) -> Self {
        Self {
            id,
            elements,
            links,
            closed,
        }
    }

    /// A variant with no applied link, as its own open chain.
    pub fn singleton(id: ChainId, variant: &Variant) -> Self {
        let exit = if variant.is_single_breakend() {
            BreakendSide::Start
        } else {
            BreakendSide::End
        };
        Self::new(
            id,
            vec![ChainedVariant {
                variant: variant.index,
                copy: 0,
                entry: BreakendSide::Start,
                exit,
            }],
            Vec::new(),
            false,
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first_breakend(&self) -> Option<BreakendId> {
        self.elements.first().map(|e| e.entry_breakend())
    }

    pub fn last_breakend(&self) -> Option<BreakendId> {
        self.elements.last().map(|e| e.exit_breakend())
    }

    /// The link that returns from the last element to the first, for closed chains.
    pub fn closing_link(&self) -> Option<LinkId> {
        if self.closed {
            self.links.last().copied()
        } else {
            None
        }
    }

    pub fn open_breakends(&self) -> Vec<BreakendId> {
        if self.closed {
            return Vec::new();
        }
        let mut open: Vec<BreakendId> = self
            .first_breakend()
            .into_iter()
            .chain(self.last_breakend())
            .collect();
        open.dedup();
        open
    }

    pub fn variants(&self) -> BTreeSet<VariantId> {
        self.elements.iter().map(|e| e.variant).collect()
    }

    pub fn contains_variant(&self, variant: VariantId) -> bool {
        self.elements.iter().any(|e| e.variant == variant)
    }

    /// Elements placed as a second or later copy of their variant.
    pub fn replicated_elements(&self) -> usize {
        self.elements.iter().filter(|e| e.copy > 0).count()
    }

    pub(crate) fn renumber(&mut self, id: ChainId) {
        self.id = id;
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain {}:", self.id)?;
        for (i, element) in self.elements.iter().enumerate() {
            write!(
                f,
                " {}.{}[{}>{}]",
                element.variant,
                element.copy,
                element.entry_breakend(),
                element.exit_breakend()
            )?;
            if let Some(link) = self.links.get(i) {
                write!(f, " -#{link}-")?;
            }
        }
        if self.closed {
            write!(f, " (closed)")?;
        }
        Ok(())
    }
}
