//! Abstract memory locations ("alias classes") for the memory analyses.
//!
//! An [`AliasClass`] describes the set of memory locations an instruction
//! may touch: a category word (one bit per structural category) plus at
//! most one payload narrowing a single category to a concrete coordinate.
//! A set category bit without a covering payload means the whole category.
//!
//! Classes form a lattice under [`subset_of`](AliasClass::subset_of) with
//! over-approximate [`union`](AliasClass::union)/[`intersect`]
//! (AliasClass::intersect), a conservative [`difference`]
//! (AliasClass::difference), and a possible-overlap test
//! [`maybe`](AliasClass::maybe). Overlap answers are deliberately
//! conservative: two property accesses through different base values report
//! `maybe` even at different offsets — proving offset-level disjointness is
//! the alias analysis's job, via its conflict buckets, not the domain's.
//!
//! Values are immutable and `Copy`; every operation returns a new class.

use std::fmt;

use bitflags::bitflags;

use crate::ir::strings::Symbol;
use crate::ir::{FrameId, ValueId};

bitflags! {
    /// Structural location categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cat: u16 {
        /// Eval-stack slots.
        const STACK = 1 << 0;
        /// Frame locals.
        const LOCAL = 1 << 1;
        /// Module-global slots.
        const GLOBAL = 1 << 2;
        /// Member-access scratch state.
        const MSTATE = 1 << 3;
        /// Object properties by byte offset.
        const PROP = 1 << 4;
        /// Array elements by integer index.
        const ELEM_I = 1 << 5;
        /// Array elements by string key.
        const ELEM_S = 1 << 6;
        /// Iterator base pointer field.
        const ITER_BASE = 1 << 7;
        /// Iterator type tag field.
        const ITER_TYPE = 1 << 8;
        /// Iterator position field.
        const ITER_POS = 1 << 9;
        /// Iterator end field.
        const ITER_END = 1 << 10;
    }
}

bitflags! {
    /// Fields of the per-frame member-access scratch area.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MStateBits: u8 {
        const TEMP_BASE = 1 << 0;
        const TV_REF = 1 << 1;
        const TV_REF2 = 1 << 2;
        const BASE = 1 << 3;
        const PROP_KEY = 1 << 4;
    }
}

impl MStateBits {
    /// The five individual fields, each a single memory location.
    pub const SINGLES: [MStateBits; 5] = [
        MStateBits::TEMP_BASE,
        MStateBits::TV_REF,
        MStateBits::TV_REF2,
        MStateBits::BASE,
        MStateBits::PROP_KEY,
    ];
}

/// A contiguous run of eval-stack slots: `low .. low + size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackRange {
    pub low: i32,
    pub size: u32,
}

impl StackRange {
    fn high(self) -> i32 {
        self.low + self.size as i32
    }

    fn overlaps(self, other: StackRange) -> bool {
        self.low < other.high() && other.low < self.high()
    }

    fn contains(self, other: StackRange) -> bool {
        other.low >= self.low && other.high() <= self.high()
    }

    /// The single-slot ranges this range covers, in ascending order.
    pub fn slots(self) -> impl Iterator<Item = StackRange> {
        (0..self.size as i32).map(move |i| StackRange {
            low: self.low + i,
            size: 1,
        })
    }
}

/// A bounded set of frame-local ids, at most [`IdSet::BITSET_MAX`] of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdSet(u64);

impl IdSet {
    pub const BITSET_MAX: u32 = 64;
    pub const EMPTY: IdSet = IdSet(0);

    pub fn single(id: u32) -> IdSet {
        debug_assert!(id < Self::BITSET_MAX);
        IdSet(1 << id)
    }

    pub fn from_bits(bits: u64) -> IdSet {
        IdSet(bits)
    }

    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> IdSet {
        let mut set = IdSet::EMPTY;
        for id in ids {
            debug_assert!(id < Self::BITSET_MAX);
            set.0 |= 1 << id;
        }
        set
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn has_single_value(self) -> bool {
        self.0.count_ones() == 1
    }

    pub fn size(self) -> u32 {
        self.0.count_ones()
    }

    pub fn test(self, id: u32) -> bool {
        id < Self::BITSET_MAX && self.0 & (1 << id) != 0
    }

    pub fn contains_all(self, other: IdSet) -> bool {
        other.0 & !self.0 == 0
    }

    pub fn intersects(self, other: IdSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: IdSet) -> IdSet {
        IdSet(self.0 | other.0)
    }

    pub fn intersect(self, other: IdSet) -> IdSet {
        IdSet(self.0 & other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = u32> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let id = bits.trailing_zeros();
            bits &= bits - 1;
            Some(id)
        })
    }
}

impl fmt::Display for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (n, id) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}

/// One or more locals of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameLocals {
    pub frame: FrameId,
    pub ids: IdSet,
}

/// A module-global slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalSlot {
    pub slot: u32,
}

/// An object property at a fixed byte offset from a base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropSlot {
    pub base: ValueId,
    pub offset: u32,
}

/// An array element at a statically known integer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElemISlot {
    pub base: ValueId,
    pub idx: i64,
}

/// An array element at a statically known string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElemSSlot {
    pub base: ValueId,
    pub key: Symbol,
}

/// Which field of an iterator's state an access touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterField {
    Base,
    Type,
    Pos,
    End,
}

/// One field of one iterator slot of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IterSlot {
    pub frame: FrameId,
    pub iter: u32,
    pub field: IterField,
}

/// The payload narrowing one category of an [`AliasClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spec {
    Stack(StackRange),
    Local(FrameLocals),
    Global(GlobalSlot),
    MState(MStateBits),
    Prop(PropSlot),
    ElemI(ElemISlot),
    ElemS(ElemSSlot),
    Iter(IterSlot),
}

impl Spec {
    /// The category bit this payload narrows.
    fn tag(self) -> Cat {
        match self {
            Spec::Stack(_) => Cat::STACK,
            Spec::Local(_) => Cat::LOCAL,
            Spec::Global(_) => Cat::GLOBAL,
            Spec::MState(_) => Cat::MSTATE,
            Spec::Prop(_) => Cat::PROP,
            Spec::ElemI(_) => Cat::ELEM_I,
            Spec::ElemS(_) => Cat::ELEM_S,
            Spec::Iter(s) => match s.field {
                IterField::Base => Cat::ITER_BASE,
                IterField::Type => Cat::ITER_TYPE,
                IterField::Pos => Cat::ITER_POS,
                IterField::End => Cat::ITER_END,
            },
        }
    }

    fn is_empty(self) -> bool {
        match self {
            Spec::Stack(r) => r.size == 0,
            Spec::Local(l) => l.ids.is_empty(),
            Spec::MState(b) => b.is_empty(),
            Spec::Global(_) | Spec::Prop(_) | Spec::ElemI(_) | Spec::ElemS(_) | Spec::Iter(_) => {
                false
            }
        }
    }

    /// Whether the payload denotes every location of its category.
    fn is_whole(self) -> bool {
        matches!(self, Spec::MState(b) if b == MStateBits::all())
    }
}

fn spec_subset(a: Spec, b: Spec) -> bool {
    match (a, b) {
        (Spec::Stack(a), Spec::Stack(b)) => b.contains(a),
        (Spec::Local(a), Spec::Local(b)) => a.frame == b.frame && b.ids.contains_all(a.ids),
        (Spec::Global(a), Spec::Global(b)) => a == b,
        (Spec::MState(a), Spec::MState(b)) => b.contains(a),
        (Spec::Prop(a), Spec::Prop(b)) => a == b,
        (Spec::ElemI(a), Spec::ElemI(b)) => a == b,
        (Spec::ElemS(a), Spec::ElemS(b)) => a == b,
        (Spec::Iter(a), Spec::Iter(b)) => a == b,
        _ => false,
    }
}

fn spec_maybe(a: Spec, b: Spec) -> bool {
    match (a, b) {
        (Spec::Stack(a), Spec::Stack(b)) => a.overlaps(b),
        (Spec::Local(a), Spec::Local(b)) => a.frame == b.frame && a.ids.intersects(b.ids),
        (Spec::Global(a), Spec::Global(b)) => a == b,
        (Spec::MState(a), Spec::MState(b)) => a.intersects(b),
        // Heap accesses through different base values may still reach the
        // same runtime object, so only equal bases admit a sharp answer.
        (Spec::Prop(a), Spec::Prop(b)) => a.base != b.base || a.offset == b.offset,
        (Spec::ElemI(a), Spec::ElemI(b)) => a.base != b.base || a.idx == b.idx,
        (Spec::ElemS(a), Spec::ElemS(b)) => a.base != b.base || a.key == b.key,
        (Spec::Iter(a), Spec::Iter(b)) => a == b,
        _ => false,
    }
}

/// Precise union of two same-tag payloads; `None` widens to the whole
/// category.
fn spec_union(a: Spec, b: Spec) -> Option<Spec> {
    match (a, b) {
        (Spec::Stack(a), Spec::Stack(b)) => {
            // Convex hull: an over-approximation when the ranges are apart.
            let low = a.low.min(b.low);
            let high = a.high().max(b.high());
            Some(Spec::Stack(StackRange {
                low,
                size: (high - low) as u32,
            }))
        }
        (Spec::Local(a), Spec::Local(b)) if a.frame == b.frame => Some(Spec::Local(FrameLocals {
            frame: a.frame,
            ids: a.ids.union(b.ids),
        })),
        (Spec::MState(a), Spec::MState(b)) => Some(Spec::MState(a | b)),
        _ if a == b => Some(a),
        _ => None,
    }
}

/// Intersection of two same-tag payloads; `None` means provably disjoint.
fn spec_intersect(a: Spec, b: Spec) -> Option<Spec> {
    match (a, b) {
        (Spec::Stack(a), Spec::Stack(b)) => {
            if !a.overlaps(b) {
                return None;
            }
            let low = a.low.max(b.low);
            let high = a.high().min(b.high());
            Some(Spec::Stack(StackRange {
                low,
                size: (high - low) as u32,
            }))
        }
        (Spec::Local(a), Spec::Local(b)) => {
            if a.frame != b.frame {
                return None;
            }
            let ids = a.ids.intersect(b.ids);
            if ids.is_empty() {
                return None;
            }
            Some(Spec::Local(FrameLocals { frame: a.frame, ids }))
        }
        (Spec::MState(a), Spec::MState(b)) => {
            let both = a & b;
            if both.is_empty() {
                None
            } else {
                Some(Spec::MState(both))
            }
        }
        // Equal coordinates intersect exactly; unequal ones may still
        // overlap through different bases, so keep the left payload as an
        // over-approximation rather than claiming disjointness.
        _ if a == b => Some(a),
        _ if spec_maybe(a, b) => Some(a),
        _ => None,
    }
}

/// An abstract description of one or more memory locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AliasClass {
    cats: Cat,
    spec: Option<Spec>,
}

/// Build a class from parts, normalizing empty and whole-category payloads.
fn compose(cats: Cat, spec: Option<Spec>) -> AliasClass {
    match spec {
        Some(s) if s.is_empty() => AliasClass {
            cats: cats - s.tag(),
            spec: None,
        },
        Some(s) if s.is_whole() => AliasClass {
            cats: cats | s.tag(),
            spec: None,
        },
        Some(s) => AliasClass {
            cats: cats | s.tag(),
            spec: Some(s),
        },
        None => AliasClass { cats, spec: None },
    }
}

impl AliasClass {
    /// The empty class: no locations at all.
    pub const BOTTOM: AliasClass = AliasClass {
        cats: Cat::empty(),
        spec: None,
    };

    /// Every location the analysis knows about.
    pub const ANY: AliasClass = AliasClass {
        cats: Cat::all(),
        spec: None,
    };

    pub const STACK_ANY: AliasClass = AliasClass {
        cats: Cat::STACK,
        spec: None,
    };
    pub const LOCAL_ANY: AliasClass = AliasClass {
        cats: Cat::LOCAL,
        spec: None,
    };
    pub const GLOBAL_ANY: AliasClass = AliasClass {
        cats: Cat::GLOBAL,
        spec: None,
    };
    pub const MSTATE_ANY: AliasClass = AliasClass {
        cats: Cat::MSTATE,
        spec: None,
    };
    pub const PROP_ANY: AliasClass = AliasClass {
        cats: Cat::PROP,
        spec: None,
    };
    pub const ELEM_I_ANY: AliasClass = AliasClass {
        cats: Cat::ELEM_I,
        spec: None,
    };
    pub const ELEM_S_ANY: AliasClass = AliasClass {
        cats: Cat::ELEM_S,
        spec: None,
    };
    pub const ITER_BASE_ANY: AliasClass = AliasClass {
        cats: Cat::ITER_BASE,
        spec: None,
    };
    pub const ITER_TYPE_ANY: AliasClass = AliasClass {
        cats: Cat::ITER_TYPE,
        spec: None,
    };
    pub const ITER_POS_ANY: AliasClass = AliasClass {
        cats: Cat::ITER_POS,
        spec: None,
    };
    pub const ITER_END_ANY: AliasClass = AliasClass {
        cats: Cat::ITER_END,
        spec: None,
    };

    /// Every iterator-state field of every frame.
    pub const ITER_ANY: AliasClass = AliasClass {
        cats: Cat::ITER_BASE
            .union(Cat::ITER_TYPE)
            .union(Cat::ITER_POS)
            .union(Cat::ITER_END),
        spec: None,
    };

    /// Every heap location: properties and array elements.
    pub const HEAP_ANY: AliasClass = AliasClass {
        cats: Cat::PROP.union(Cat::ELEM_I).union(Cat::ELEM_S),
        spec: None,
    };

    pub const MSTATE_TEMP_BASE: AliasClass = AliasClass {
        cats: Cat::MSTATE,
        spec: Some(Spec::MState(MStateBits::TEMP_BASE)),
    };
    pub const MSTATE_TV_REF: AliasClass = AliasClass {
        cats: Cat::MSTATE,
        spec: Some(Spec::MState(MStateBits::TV_REF)),
    };
    pub const MSTATE_TV_REF2: AliasClass = AliasClass {
        cats: Cat::MSTATE,
        spec: Some(Spec::MState(MStateBits::TV_REF2)),
    };
    pub const MSTATE_BASE: AliasClass = AliasClass {
        cats: Cat::MSTATE,
        spec: Some(Spec::MState(MStateBits::BASE)),
    };
    pub const MSTATE_PROP_KEY: AliasClass = AliasClass {
        cats: Cat::MSTATE,
        spec: Some(Spec::MState(MStateBits::PROP_KEY)),
    };

    pub fn stack(range: StackRange) -> AliasClass {
        compose(Cat::empty(), Some(Spec::Stack(range)))
    }

    pub fn local(locals: FrameLocals) -> AliasClass {
        compose(Cat::empty(), Some(Spec::Local(locals)))
    }

    pub fn global(slot: GlobalSlot) -> AliasClass {
        compose(Cat::empty(), Some(Spec::Global(slot)))
    }

    pub fn mstate(fields: MStateBits) -> AliasClass {
        compose(Cat::empty(), Some(Spec::MState(fields)))
    }

    pub fn prop(slot: PropSlot) -> AliasClass {
        compose(Cat::empty(), Some(Spec::Prop(slot)))
    }

    pub fn elem_i(slot: ElemISlot) -> AliasClass {
        compose(Cat::empty(), Some(Spec::ElemI(slot)))
    }

    pub fn elem_s(slot: ElemSSlot) -> AliasClass {
        compose(Cat::empty(), Some(Spec::ElemS(slot)))
    }

    pub fn iter(slot: IterSlot) -> AliasClass {
        compose(Cat::empty(), Some(Spec::Iter(slot)))
    }

    /// True when the class denotes exactly one concrete memory location.
    pub fn is_single_location(self) -> bool {
        match self.spec {
            Some(s) if self.cats == s.tag() => match s {
                Spec::Stack(r) => r.size == 1,
                Spec::Local(l) => l.ids.has_single_value(),
                Spec::MState(b) => b.bits().count_ones() == 1,
                Spec::Global(_)
                | Spec::Prop(_)
                | Spec::ElemI(_)
                | Spec::ElemS(_)
                | Spec::Iter(_) => true,
            },
            _ => false,
        }
    }

    /// Subset test: every location of `self` is a location of `other`.
    pub fn subset_of(self, other: AliasClass) -> bool {
        if !other.cats.contains(self.cats) {
            return false;
        }
        if let Some(o) = other.spec {
            let tag = o.tag();
            if self.cats.contains(tag) {
                match self.spec {
                    Some(s) if s.tag() == tag => {
                        if !spec_subset(s, o) {
                            return false;
                        }
                    }
                    // `self` covers the whole category where `other` is
                    // narrowed.
                    _ => return false,
                }
            }
        }
        true
    }

    /// Over-approximate union.
    pub fn union(self, other: AliasClass) -> AliasClass {
        let cats = self.cats | other.cats;
        let spec = match (self.spec, other.spec) {
            (None, None) => None,
            (Some(s), None) => {
                if other.cats.contains(s.tag()) {
                    None
                } else {
                    Some(s)
                }
            }
            (None, Some(s)) => {
                if self.cats.contains(s.tag()) {
                    None
                } else {
                    Some(s)
                }
            }
            (Some(a), Some(b)) => {
                if a.tag() == b.tag() {
                    spec_union(a, b)
                } else {
                    // Only one payload fits; widen both categories.
                    None
                }
            }
        };
        compose(cats, spec)
    }

    /// Over-approximate intersection: the result contains every location
    /// shared by `self` and `other` (and possibly more).
    pub fn intersect(self, other: AliasClass) -> AliasClass {
        let mut cats = self.cats & other.cats;
        let a = self.spec.filter(|s| cats.contains(s.tag()));
        let b = other.spec.filter(|s| cats.contains(s.tag()));
        let spec = match (a, b) {
            (Some(x), Some(y)) if x.tag() == y.tag() => match spec_intersect(x, y) {
                Some(s) => Some(s),
                None => {
                    cats -= x.tag();
                    None
                }
            },
            (Some(x), _) => Some(x),
            (None, y) => y,
        };
        compose(cats, spec)
    }

    /// Conservative difference: removes only what is provably covered by
    /// `other`; the result is always a superset of the true difference.
    pub fn difference(self, other: AliasClass) -> AliasClass {
        let other_whole = match other.spec {
            Some(s) => other.cats - s.tag(),
            None => other.cats,
        };
        let mut cats = self.cats - other_whole;
        let mut spec = self.spec.filter(|s| cats.contains(s.tag()));
        if let (Some(s), Some(o)) = (spec, other.spec) {
            if s.tag() == o.tag() {
                if let (Spec::MState(a), Spec::MState(b)) = (s, o) {
                    spec = Some(Spec::MState(a - b));
                } else if spec_subset(s, o) {
                    cats -= s.tag();
                    spec = None;
                }
            }
        }
        compose(cats, spec)
    }

    /// Possible-overlap test; symmetric, never a false negative.
    pub fn maybe(self, other: AliasClass) -> bool {
        let common = self.cats & other.cats;
        if common.is_empty() {
            return false;
        }
        for cat in common.iter() {
            let a = self.spec.filter(|s| s.tag() == cat);
            let b = other.spec.filter(|s| s.tag() == cat);
            match (a, b) {
                (Some(x), Some(y)) => {
                    if spec_maybe(x, y) {
                        return true;
                    }
                }
                // At least one side covers the whole category.
                _ => return true,
            }
        }
        false
    }

    // ── Portion projections ─────────────────────────────────────────────
    //
    // Each returns the payload narrowing that category, if any. A class
    // covering the whole category projects `None` (callers fall back to
    // the category-wide pessimistic answer via `maybe`); member-state is
    // the exception, since its five fields are enumerable.

    pub fn stack_part(self) -> Option<StackRange> {
        match self.spec {
            Some(Spec::Stack(r)) => Some(r),
            _ => None,
        }
    }

    pub fn local_part(self) -> Option<FrameLocals> {
        match self.spec {
            Some(Spec::Local(l)) => Some(l),
            _ => None,
        }
    }

    pub fn global_part(self) -> Option<GlobalSlot> {
        match self.spec {
            Some(Spec::Global(g)) => Some(g),
            _ => None,
        }
    }

    pub fn mstate_part(self) -> Option<MStateBits> {
        match self.spec {
            Some(Spec::MState(b)) => Some(b),
            _ if self.cats.contains(Cat::MSTATE) => Some(MStateBits::all()),
            _ => None,
        }
    }

    pub fn prop_part(self) -> Option<PropSlot> {
        match self.spec {
            Some(Spec::Prop(p)) => Some(p),
            _ => None,
        }
    }

    pub fn elem_i_part(self) -> Option<ElemISlot> {
        match self.spec {
            Some(Spec::ElemI(e)) => Some(e),
            _ => None,
        }
    }

    pub fn elem_s_part(self) -> Option<ElemSSlot> {
        match self.spec {
            Some(Spec::ElemS(e)) => Some(e),
            _ => None,
        }
    }

    pub fn iter_part(self, field: IterField) -> Option<IterSlot> {
        match self.spec {
            Some(Spec::Iter(s)) if s.field == field => Some(s),
            _ => None,
        }
    }

    // ── Exact projections ───────────────────────────────────────────────
    //
    // Each succeeds only when the class is nothing but that narrowed
    // category.

    pub fn as_stack(self) -> Option<StackRange> {
        if self.cats == Cat::STACK {
            self.stack_part()
        } else {
            None
        }
    }

    pub fn as_local(self) -> Option<FrameLocals> {
        if self.cats == Cat::LOCAL {
            self.local_part()
        } else {
            None
        }
    }

    pub fn as_global(self) -> Option<GlobalSlot> {
        if self.cats == Cat::GLOBAL {
            self.global_part()
        } else {
            None
        }
    }

    pub fn as_mstate(self) -> Option<MStateBits> {
        match self.spec {
            Some(Spec::MState(b)) if self.cats == Cat::MSTATE => Some(b),
            _ => None,
        }
    }

    pub fn as_prop(self) -> Option<PropSlot> {
        if self.cats == Cat::PROP {
            self.prop_part()
        } else {
            None
        }
    }

    pub fn as_elem_i(self) -> Option<ElemISlot> {
        if self.cats == Cat::ELEM_I {
            self.elem_i_part()
        } else {
            None
        }
    }

    pub fn as_elem_s(self) -> Option<ElemSSlot> {
        if self.cats == Cat::ELEM_S {
            self.elem_s_part()
        } else {
            None
        }
    }

    pub fn as_iter(self) -> Option<IterSlot> {
        match self.spec {
            Some(Spec::Iter(s)) if self.cats == Spec::Iter(s).tag() => Some(s),
            _ => None,
        }
    }
}

impl std::ops::BitOr for AliasClass {
    type Output = AliasClass;
    fn bitor(self, rhs: AliasClass) -> AliasClass {
        self.union(rhs)
    }
}

impl std::ops::BitAnd for AliasClass {
    type Output = AliasClass;
    fn bitand(self, rhs: AliasClass) -> AliasClass {
        self.intersect(rhs)
    }
}

impl std::ops::Sub for AliasClass {
    type Output = AliasClass;
    fn sub(self, rhs: AliasClass) -> AliasClass {
        self.difference(rhs)
    }
}

fn cat_name(cat: Cat) -> &'static str {
    if cat == Cat::STACK {
        "Stk"
    } else if cat == Cat::LOCAL {
        "Lcl"
    } else if cat == Cat::GLOBAL {
        "Gbl"
    } else if cat == Cat::MSTATE {
        "MSt"
    } else if cat == Cat::PROP {
        "Prp"
    } else if cat == Cat::ELEM_I {
        "ElemI"
    } else if cat == Cat::ELEM_S {
        "ElemS"
    } else if cat == Cat::ITER_BASE {
        "IterBase"
    } else if cat == Cat::ITER_TYPE {
        "IterType"
    } else if cat == Cat::ITER_POS {
        "IterPos"
    } else if cat == Cat::ITER_END {
        "IterEnd"
    } else {
        "?"
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Spec::Stack(r) => write!(f, "Stk{{{}:{}}}", r.low, r.size),
            Spec::Local(l) => write!(f, "Lcl{{{}:{}}}", l.frame, l.ids),
            Spec::Global(g) => write!(f, "Gbl{{{}}}", g.slot),
            Spec::MState(b) => {
                write!(f, "MSt{{")?;
                let names = ["TempBase", "TvRef", "TvRef2", "Base", "PropKey"];
                let mut first = true;
                for (field, name) in MStateBits::SINGLES.iter().zip(names) {
                    if b.contains(*field) {
                        if !first {
                            write!(f, "|")?;
                        }
                        first = false;
                        write!(f, "{name}")?;
                    }
                }
                write!(f, "}}")
            }
            Spec::Prop(p) => write!(f, "Prp{{{}+{}}}", p.base, p.offset),
            Spec::ElemI(e) => write!(f, "ElemI{{{}[{}]}}", e.base, e.idx),
            Spec::ElemS(e) => write!(f, "ElemS{{{}[{}]}}", e.base, e.key),
            Spec::Iter(s) => {
                let name = match s.field {
                    IterField::Base => "IterBase",
                    IterField::Type => "IterType",
                    IterField::Pos => "IterPos",
                    IterField::End => "IterEnd",
                };
                write!(f, "{name}{{{}:{}}}", s.frame, s.iter)
            }
        }
    }
}

impl fmt::Display for AliasClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cats.is_empty() {
            return write!(f, "Empty");
        }
        if *self == AliasClass::ANY {
            return write!(f, "Any");
        }
        let mut first = true;
        for cat in self.cats.iter() {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            match self.spec {
                Some(s) if s.tag() == cat => write!(f, "{s}")?,
                _ => write!(f, "{}", cat_name(cat))?,
            }
        }
        Ok(())
    }
}
