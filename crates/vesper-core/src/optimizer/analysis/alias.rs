//! Memory-aliasing analysis over a unit's effect annotations.
//!
//! [`collect_aliases`] scans every instruction's [`MemoryEffects`], picks
//! the concrete locations worth tracking, assigns each a dense index
//! below [`MAX_TRACKED_LOCATIONS`], and precomputes per-location conflict
//! sets. Downstream passes then answer two kinds of query in O(1):
//!
//! * [`AliasAnalysis::may_alias`] — an over-approximation: every tracked
//!   location that might overlap the queried class.
//! * [`AliasAnalysis::expand`] — an under-approximation: every tracked
//!   location provably contained in the queried class.
//!
//! Wide classes (multi-slot stack ranges, multi-id frame-local sets) are
//! decomposed into their single-location atoms; a composite key earns an
//! entry in the expansion maps only when every one of its atoms ended up
//! tracked, so a map hit always means a complete decomposition.
//!
//! Required for: store/load elimination, sinking, and any pass that needs
//! to reason about memory without re-deriving overlap from scratch.

use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::diagnostics;
use crate::ir::alias_class::{AliasClass, FrameLocals, IdSet, IterField, MStateBits};
use crate::ir::strings::Symbol;
use crate::ir::Unit;
use crate::optimizer::analysis::loc_bits::LocBits;

/// Upper bound on tracked locations per unit. Everything past the budget
/// degrades to category-wide answers instead of failing the analysis.
pub const MAX_TRACKED_LOCATIONS: u32 = LocBits::CAPACITY;

/// Widest composite class we proactively decompose into atoms. Wider
/// classes stay unexpanded and answer queries pessimistically.
const MAX_EXPANDED_SIZE: u32 = 16;

/// Per-location bookkeeping: the dense index and the set of other tracked
/// locations that may overlap this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocMeta {
    pub index: u32,
    pub conflicts: LocBits,
}

/// Failures that indicate a broken unit rather than an imprecise one.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unit tracks {count} locations, above the supported maximum")]
    TooManyLocations { count: usize },
    #[error("tracked location {index} ({class}) fits no category")]
    UnclassifiedLocation { class: AliasClass, index: u32 },
}

/// The result of [`collect_aliases`] for one unit.
#[derive(Debug, Default)]
pub struct AliasAnalysis {
    /// Tracked locations in insertion order; a location's position is its
    /// dense index.
    pub locations: IndexMap<AliasClass, LocMeta, FxBuildHasher>,

    // Indices of all tracked locations in each category, used as the
    // pessimistic answer when a query cannot be resolved more precisely.
    pub all_stack: LocBits,
    pub all_local: LocBits,
    pub all_global: LocBits,
    pub all_props: LocBits,
    pub all_elem_is: LocBits,
    pub all_elem_ss: LocBits,
    pub all_iter_base: LocBits,
    pub all_iter_type: LocBits,
    pub all_iter_pos: LocBits,
    pub all_iter_end: LocBits,

    /// Multi-slot stack ranges whose every slot is tracked, mapped to the
    /// indices of those slots. Never holds a partial decomposition.
    pub stack_expand_map: FxHashMap<AliasClass, LocBits>,
    /// Multi-id frame-local sets, same completeness contract.
    pub local_expand_map: FxHashMap<AliasClass, LocBits>,
}

impl AliasAnalysis {
    /// Look up the metadata for an exactly-tracked class.
    pub fn find(&self, acls: AliasClass) -> Option<LocMeta> {
        self.locations.get(&acls).copied()
    }

    /// All tracked locations that may overlap `acls`. Never a false
    /// negative; unresolvable portions widen to their category's bits.
    pub fn may_alias(&self, acls: AliasClass) -> LocBits {
        if let Some(meta) = self.find(acls) {
            return meta.conflicts.with(meta.index);
        }

        let mut ret = LocBits::EMPTY;

        if let Some(range) = acls.stack_part() {
            if range.size > 1 {
                match self.stack_expand_map.get(&AliasClass::stack(range)) {
                    Some(&bits) => ret |= bits,
                    None => ret |= self.all_stack,
                }
            } else if let Some(meta) = self.find(AliasClass::stack(range)) {
                ret |= meta.conflicts.with(meta.index);
            } else {
                ret |= self.all_stack;
            }
        } else if acls.maybe(AliasClass::STACK_ANY) {
            ret |= self.all_stack;
        }

        if let Some(locals) = acls.local_part() {
            if locals.ids.has_single_value() {
                if let Some(meta) = self.find(AliasClass::local(locals)) {
                    ret |= meta.conflicts.with(meta.index);
                }
                // An untracked single id has exact coordinates, and tracked
                // locals are all single ids, so it overlaps nothing.
            } else {
                match self.local_expand_map.get(&AliasClass::local(locals)) {
                    Some(&bits) => ret |= bits,
                    None => ret |= self.all_local,
                }
            }
        } else if acls.maybe(AliasClass::LOCAL_ANY) {
            ret |= self.all_local;
        }

        if let Some(fields) = acls.mstate_part() {
            // The five fields are enumerable, so no category-wide bits are
            // kept for member state; untracked fields overlap nothing.
            for field in MStateBits::SINGLES {
                if fields.contains(field) {
                    if let Some(meta) = self.find(AliasClass::mstate(field)) {
                        ret |= meta.conflicts.with(meta.index);
                    }
                }
            }
        }

        self.may_alias_part(
            &mut ret,
            acls,
            acls.global_part().map(AliasClass::global),
            AliasClass::GLOBAL_ANY,
            self.all_global,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.prop_part().map(AliasClass::prop),
            AliasClass::PROP_ANY,
            self.all_props,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.elem_i_part().map(AliasClass::elem_i),
            AliasClass::ELEM_I_ANY,
            self.all_elem_is,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.elem_s_part().map(AliasClass::elem_s),
            AliasClass::ELEM_S_ANY,
            self.all_elem_ss,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::Base).map(AliasClass::iter),
            AliasClass::ITER_BASE_ANY,
            self.all_iter_base,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::Type).map(AliasClass::iter),
            AliasClass::ITER_TYPE_ANY,
            self.all_iter_type,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::Pos).map(AliasClass::iter),
            AliasClass::ITER_POS_ANY,
            self.all_iter_pos,
        );
        self.may_alias_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::End).map(AliasClass::iter),
            AliasClass::ITER_END_ANY,
            self.all_iter_end,
        );

        ret
    }

    fn may_alias_part(
        &self,
        ret: &mut LocBits,
        acls: AliasClass,
        part: Option<AliasClass>,
        any: AliasClass,
        any_bits: LocBits,
    ) {
        if let Some(part) = part {
            if let Some(meta) = self.find(part) {
                *ret |= meta.conflicts.with(meta.index);
            } else {
                // An untracked coordinate may still overlap tracked ones
                // through a different base value.
                debug_assert!(acls.maybe(any));
                *ret |= any_bits;
            }
        } else if acls.maybe(any) {
            *ret |= any_bits;
        }
    }

    /// All tracked locations provably contained in `acls`. Never a false
    /// positive; unresolvable portions contribute nothing.
    pub fn expand(&self, acls: AliasClass) -> LocBits {
        if let Some(meta) = self.find(acls) {
            return LocBits::single(meta.index);
        }

        let mut ret = LocBits::EMPTY;

        if let Some(range) = acls.stack_part() {
            if range.size > 1 {
                if let Some(&bits) = self.stack_expand_map.get(&AliasClass::stack(range)) {
                    ret |= bits;
                }
            } else if let Some(meta) = self.find(AliasClass::stack(range)) {
                ret.set(meta.index);
            }
        } else if AliasClass::STACK_ANY.subset_of(acls) {
            ret |= self.all_stack;
        }

        if let Some(locals) = acls.local_part() {
            if locals.ids.has_single_value() {
                if let Some(meta) = self.find(AliasClass::local(locals)) {
                    ret.set(meta.index);
                }
            } else if let Some(&bits) = self.local_expand_map.get(&AliasClass::local(locals)) {
                ret |= bits;
            }
        } else if AliasClass::LOCAL_ANY.subset_of(acls) {
            ret |= self.all_local;
        }

        if let Some(fields) = acls.mstate_part() {
            for field in MStateBits::SINGLES {
                if fields.contains(field) {
                    if let Some(meta) = self.find(AliasClass::mstate(field)) {
                        ret.set(meta.index);
                    }
                }
            }
        }

        self.expand_part(
            &mut ret,
            acls,
            acls.global_part().map(AliasClass::global),
            AliasClass::GLOBAL_ANY,
            self.all_global,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.prop_part().map(AliasClass::prop),
            AliasClass::PROP_ANY,
            self.all_props,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.elem_i_part().map(AliasClass::elem_i),
            AliasClass::ELEM_I_ANY,
            self.all_elem_is,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.elem_s_part().map(AliasClass::elem_s),
            AliasClass::ELEM_S_ANY,
            self.all_elem_ss,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::Base).map(AliasClass::iter),
            AliasClass::ITER_BASE_ANY,
            self.all_iter_base,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::Type).map(AliasClass::iter),
            AliasClass::ITER_TYPE_ANY,
            self.all_iter_type,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::Pos).map(AliasClass::iter),
            AliasClass::ITER_POS_ANY,
            self.all_iter_pos,
        );
        self.expand_part(
            &mut ret,
            acls,
            acls.iter_part(IterField::End).map(AliasClass::iter),
            AliasClass::ITER_END_ANY,
            self.all_iter_end,
        );

        ret
    }

    fn expand_part(
        &self,
        ret: &mut LocBits,
        acls: AliasClass,
        part: Option<AliasClass>,
        any: AliasClass,
        any_bits: LocBits,
    ) {
        if let Some(part) = part {
            if let Some(meta) = self.find(part) {
                ret.set(meta.index);
            }
        } else if any.subset_of(acls) {
            *ret |= any_bits;
        }
    }
}

/// Scan `unit` and build its alias-analysis tables.
pub fn collect_aliases(unit: &Unit) -> Result<AliasAnalysis, AnalysisError> {
    debug!(unit = %unit.id, func = %unit.name, "collecting alias classes");

    let mut ret = AliasAnalysis::default();

    // Conflict buckets: tracked locations keyed by the coordinate that
    // decides overlap for their category. Two props at different offsets
    // can never overlap no matter the base, so only same-bucket entries
    // need a pairwise check.
    let mut prop_buckets: FxHashMap<u32, LocBits> = FxHashMap::default();
    let mut elem_i_buckets: FxHashMap<i64, LocBits> = FxHashMap::default();
    let mut elem_s_buckets: FxHashMap<Symbol, LocBits> = FxHashMap::default();

    // Composite keys seen during the scan; turned into expansion-map
    // entries afterwards iff every atom ended up tracked.
    let mut stack_keys: FxHashSet<AliasClass> = FxHashSet::default();
    let mut local_keys: FxHashSet<AliasClass> = FxHashSet::default();

    visit_locations(unit, |acls| {
        if let Some(prop) = acls.as_prop() {
            if let Some(index) = add_class(&mut ret, acls) {
                prop_buckets.entry(prop.offset).or_default().set(index);
            }
            return;
        }
        if let Some(elem) = acls.as_elem_i() {
            if let Some(index) = add_class(&mut ret, acls) {
                elem_i_buckets.entry(elem.idx).or_default().set(index);
            }
            return;
        }
        if let Some(elem) = acls.as_elem_s() {
            if let Some(index) = add_class(&mut ret, acls) {
                elem_s_buckets.entry(elem.key).or_default().set(index);
            }
            return;
        }
        if acls.as_global().is_some() {
            add_class(&mut ret, acls);
            return;
        }
        if let Some(fields) = acls.as_mstate() {
            for field in MStateBits::SINGLES {
                if fields.contains(field) {
                    add_class(&mut ret, AliasClass::mstate(field));
                }
            }
            return;
        }
        if acls.as_iter().is_some() {
            add_class(&mut ret, acls);
            return;
        }
        if let Some(locals) = acls.local_part() {
            if locals.ids.has_single_value() {
                add_class(&mut ret, AliasClass::local(locals));
            } else if locals.ids.size() <= MAX_EXPANDED_SIZE {
                local_keys.insert(AliasClass::local(locals));
                for id in locals.ids.iter() {
                    add_class(
                        &mut ret,
                        AliasClass::local(FrameLocals {
                            frame: locals.frame,
                            ids: IdSet::single(id),
                        }),
                    );
                }
            }
            return;
        }
        if let Some(range) = acls.stack_part() {
            if range.size > 1 {
                stack_keys.insert(AliasClass::stack(range));
            }
            if range.size > MAX_EXPANDED_SIZE {
                return;
            }
            for slot in range.slots() {
                add_class(&mut ret, AliasClass::stack(slot));
            }
        }
    });

    let classes: Vec<AliasClass> = ret.locations.keys().copied().collect();
    if classes.len() > MAX_TRACKED_LOCATIONS as usize {
        return Err(AnalysisError::TooManyLocations {
            count: classes.len(),
        });
    }

    // One advisory event per unit whose table filled up, whether or not
    // anything was refused past the bound.
    if classes.len() == MAX_TRACKED_LOCATIONS as usize {
        diagnostics::perf_warning("alias-analysis-location-budget", 25_000, || {
            warn!(
                unit = %unit.id,
                func = %unit.name,
                "location budget reached; untracked locations degrade to category-wide answers"
            );
        });
    }

    for (i, &acls) in classes.iter().enumerate() {
        let index = i as u32;
        let mut conflicts = LocBits::EMPTY;

        if let Some(prop) = acls.as_prop() {
            if let Some(&bucket) = prop_buckets.get(&prop.offset) {
                conflicts = conflicting_in_bucket(&classes, index, acls, bucket);
            }
            ret.all_props.set(index);
        } else if let Some(elem) = acls.as_elem_i() {
            if let Some(&bucket) = elem_i_buckets.get(&elem.idx) {
                conflicts = conflicting_in_bucket(&classes, index, acls, bucket);
            }
            ret.all_elem_is.set(index);
        } else if let Some(elem) = acls.as_elem_s() {
            if let Some(&bucket) = elem_s_buckets.get(&elem.key) {
                conflicts = conflicting_in_bucket(&classes, index, acls, bucket);
            }
            ret.all_elem_ss.set(index);
        } else if acls.as_global().is_some() {
            // Distinct global slots never overlap.
            ret.all_global.set(index);
        } else if acls.as_local().is_some() {
            // Tracked locals are single ids; distinct ids never overlap.
            ret.all_local.set(index);
        } else if acls.as_stack().is_some() {
            // Tracked stack locations are single slots, same story.
            ret.all_stack.set(index);
        } else if acls.as_mstate().is_some() {
            // Member-state fields answer queries by enumeration; no
            // category-wide bits are kept.
        } else if let Some(iter) = acls.as_iter() {
            match iter.field {
                IterField::Base => ret.all_iter_base.set(index),
                IterField::Type => ret.all_iter_type.set(index),
                IterField::Pos => ret.all_iter_pos.set(index),
                IterField::End => ret.all_iter_end.set(index),
            }
        } else {
            return Err(AnalysisError::UnclassifiedLocation { class: acls, index });
        }

        if let Some((_, meta)) = ret.locations.get_index_mut(i) {
            meta.conflicts = conflicts;
        }
    }

    for key in stack_keys {
        let range = match key.stack_part() {
            Some(range) => range,
            None => continue,
        };
        let mut bits = LocBits::EMPTY;
        let complete = range.slots().all(|slot| {
            match ret.find(AliasClass::stack(slot)) {
                Some(meta) => {
                    bits.set(meta.index);
                    true
                }
                None => false,
            }
        });
        if complete {
            trace!(key = %key, slots = %bits, "stack expansion entry");
            ret.stack_expand_map.insert(key, bits);
        }
    }

    for key in local_keys {
        let locals = match key.local_part() {
            Some(locals) => locals,
            None => continue,
        };
        let mut bits = LocBits::EMPTY;
        let complete = locals.ids.iter().all(|id| {
            let atom = AliasClass::local(FrameLocals {
                frame: locals.frame,
                ids: IdSet::single(id),
            });
            match ret.find(atom) {
                Some(meta) => {
                    bits.set(meta.index);
                    true
                }
                None => false,
            }
        });
        if complete {
            trace!(key = %key, locals = %bits, "frame-local expansion entry");
            ret.local_expand_map.insert(key, bits);
        }
    }

    debug!(
        unit = %unit.id,
        tracked = ret.locations.len(),
        stack_entries = ret.stack_expand_map.len(),
        local_entries = ret.local_expand_map.len(),
        "alias collection finished"
    );

    Ok(ret)
}

/// Register `acls` as a tracked location, returning its index. Returns the
/// existing index on re-registration and `None` once the budget is spent.
fn add_class(ret: &mut AliasAnalysis, acls: AliasClass) -> Option<u32> {
    match ret.locations.entry(acls) {
        Entry::Occupied(entry) => Some(entry.get().index),
        Entry::Vacant(entry) => {
            let index = entry.index() as u32;
            if index >= MAX_TRACKED_LOCATIONS {
                trace!(class = %acls, "location budget spent; not tracking");
                return None;
            }
            trace!(index, class = %acls, "tracking location");
            entry.insert(LocMeta {
                index,
                conflicts: LocBits::EMPTY,
            });
            Some(index)
        }
    }
}

/// Other bucket members that may overlap `acls`.
fn conflicting_in_bucket(
    classes: &[AliasClass],
    index: u32,
    acls: AliasClass,
    bucket: LocBits,
) -> LocBits {
    let mut out = LocBits::EMPTY;
    for other in bucket.iter() {
        if other != index && acls.maybe(classes[other as usize]) {
            out.set(other);
        }
    }
    out
}

/// Feed every alias class mentioned by every instruction to `visit`, after
/// canonicalizing each effect.
fn visit_locations(unit: &Unit, mut visit: impl FnMut(AliasClass)) {
    for block in &unit.blocks {
        for instr in &block.instrs {
            let effects = instr.effects.canonicalize();
            trace!(instr = %instr.id, ?effects, "visiting effects");
            effects.for_each_alias_class(&mut visit);
        }
    }
}

impl fmt::Display for AliasAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tracked locations:")?;
        for (acls, meta) in &self.locations {
            writeln!(
                f,
                "  {:>2} {:<28} conflicts {}",
                meta.index,
                acls.to_string(),
                meta.conflicts
            )?;
        }
        writeln!(f, "all stack:     {}", self.all_stack)?;
        writeln!(f, "all local:     {}", self.all_local)?;
        writeln!(f, "all global:    {}", self.all_global)?;
        writeln!(f, "all props:     {}", self.all_props)?;
        writeln!(f, "all elemIs:    {}", self.all_elem_is)?;
        writeln!(f, "all elemSs:    {}", self.all_elem_ss)?;
        writeln!(f, "all iterBase:  {}", self.all_iter_base)?;
        writeln!(f, "all iterType:  {}", self.all_iter_type)?;
        writeln!(f, "all iterPos:   {}", self.all_iter_pos)?;
        writeln!(f, "all iterEnd:   {}", self.all_iter_end)?;

        let dump_map = |f: &mut fmt::Formatter<'_>,
                            name: &str,
                            map: &FxHashMap<AliasClass, LocBits>|
         -> fmt::Result {
            writeln!(f, "{name}:")?;
            let mut entries: Vec<(String, LocBits)> =
                map.iter().map(|(k, v)| (k.to_string(), *v)).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, bits) in entries {
                writeln!(f, "  {key} -> {bits}")?;
            }
            Ok(())
        };
        dump_map(f, "stack expansion", &self.stack_expand_map)?;
        dump_map(f, "frame-local expansion", &self.local_expand_map)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::alias_class::{ElemISlot, ElemSSlot, GlobalSlot, IterSlot, PropSlot, StackRange};
    use crate::ir::effects::MemoryEffects;
    use crate::ir::{FrameId, UnitId, ValueId};

    fn unit_with(effects: Vec<MemoryEffects>) -> Unit {
        let mut unit = Unit::new(UnitId(0), "test");
        unit.push_block(effects);
        unit
    }

    fn prop(base: u32, offset: u32) -> AliasClass {
        AliasClass::prop(PropSlot {
            base: ValueId(base),
            offset,
        })
    }

    fn stack(low: i32, size: u32) -> AliasClass {
        AliasClass::stack(StackRange { low, size })
    }

    fn locals(frame: u32, ids: &[u32]) -> AliasClass {
        AliasClass::local(FrameLocals {
            frame: FrameId(frame),
            ids: IdSet::from_ids(ids.iter().copied()),
        })
    }

    fn load(src: AliasClass) -> MemoryEffects {
        MemoryEffects::PureLoad { src }
    }

    fn store(dst: AliasClass) -> MemoryEffects {
        MemoryEffects::PureStore { dst }
    }

    fn wide_load(loads: AliasClass) -> MemoryEffects {
        MemoryEffects::General {
            loads,
            stores: AliasClass::BOTTOM,
            moves: AliasClass::BOTTOM,
            kills: AliasClass::BOTTOM,
        }
    }

    // ── Registration ────────────────────────────────────────────────────

    #[test]
    fn test_tracked_locations_contain_themselves() {
        let unit = unit_with(vec![
            load(prop(0, 8)),
            store(prop(1, 8)),
            load(AliasClass::global(GlobalSlot { slot: 3 })),
        ]);
        let aa = collect_aliases(&unit).unwrap();
        assert_eq!(aa.locations.len(), 3);

        for (&acls, meta) in &aa.locations {
            assert_eq!(aa.expand(acls), LocBits::single(meta.index));
            assert!(aa.may_alias(acls).test(meta.index));
        }
    }

    #[test]
    fn test_registration_is_idempotent() {
        let unit = unit_with(vec![load(prop(0, 8)), load(prop(0, 8)), store(prop(0, 8))]);
        let aa = collect_aliases(&unit).unwrap();
        assert_eq!(aa.locations.len(), 1);
    }

    // ── Conflicts ───────────────────────────────────────────────────────

    #[test]
    fn test_same_offset_props_conflict_symmetrically() {
        let unit = unit_with(vec![load(prop(0, 8)), load(prop(1, 8))]);
        let aa = collect_aliases(&unit).unwrap();

        let a = aa.find(prop(0, 8)).unwrap();
        let b = aa.find(prop(1, 8)).unwrap();
        assert!(a.conflicts.test(b.index));
        assert!(b.conflicts.test(a.index));
        assert!(aa.may_alias(prop(0, 8)).test(b.index));
    }

    #[test]
    fn test_different_offset_props_do_not_conflict() {
        let unit = unit_with(vec![load(prop(0, 8)), load(prop(1, 16))]);
        let aa = collect_aliases(&unit).unwrap();

        let a = aa.find(prop(0, 8)).unwrap();
        let b = aa.find(prop(1, 16)).unwrap();
        assert!(a.conflicts.is_empty());
        assert!(b.conflicts.is_empty());
        assert!(!aa.may_alias(prop(0, 8)).test(b.index));
    }

    #[test]
    fn test_elem_buckets_by_index_and_key() {
        let elem = |base: u32, idx: i64| {
            AliasClass::elem_i(ElemISlot {
                base: ValueId(base),
                idx,
            })
        };
        let unit = unit_with(vec![load(elem(0, 4)), load(elem(1, 4)), load(elem(0, 5))]);
        let aa = collect_aliases(&unit).unwrap();

        let a = aa.find(elem(0, 4)).unwrap();
        let b = aa.find(elem(1, 4)).unwrap();
        let c = aa.find(elem(0, 5)).unwrap();
        assert_eq!(a.conflicts, LocBits::single(b.index));
        assert_eq!(b.conflicts, LocBits::single(a.index));
        assert!(c.conflicts.is_empty());
    }

    #[test]
    fn test_string_keyed_elems_conflict_on_equal_keys() {
        let unit = Unit::new(UnitId(0), "test");
        let key = unit.strings.get_or_intern("name");
        let other = unit.strings.get_or_intern("other");
        let elem = |base: u32, key| {
            AliasClass::elem_s(ElemSSlot {
                base: ValueId(base),
                key,
            })
        };
        let mut unit = unit;
        unit.push_block(vec![
            load(elem(0, key)),
            load(elem(1, key)),
            load(elem(0, other)),
        ]);
        let aa = collect_aliases(&unit).unwrap();

        let a = aa.find(elem(0, key)).unwrap();
        let b = aa.find(elem(1, key)).unwrap();
        let c = aa.find(elem(0, other)).unwrap();
        assert!(a.conflicts.test(b.index));
        assert!(!a.conflicts.test(c.index));
    }

    // ── Composite expansion ─────────────────────────────────────────────

    #[test]
    fn test_stack_range_expands_completely() {
        let unit = unit_with(vec![wide_load(stack(0, 3)), store(stack(1, 1))]);
        let aa = collect_aliases(&unit).unwrap();

        assert_eq!(aa.locations.len(), 3);
        let bits = aa.expand(stack(0, 3));
        assert_eq!(bits.count(), 3);
        assert_eq!(aa.may_alias(stack(0, 3)), bits);
        assert_eq!(aa.stack_expand_map.get(&stack(0, 3)), Some(&bits));
    }

    #[test]
    fn test_overlong_stack_range_is_not_expanded() {
        let unit = unit_with(vec![wide_load(stack(0, 17))]);
        let aa = collect_aliases(&unit).unwrap();

        assert!(aa.locations.is_empty());
        assert!(aa.expand(stack(0, 17)).is_empty());
        assert!(aa.may_alias(stack(0, 17)).is_empty());
    }

    #[test]
    fn test_frame_local_set_expands_completely() {
        let unit = unit_with(vec![wide_load(locals(0, &[1, 2])), store(locals(0, &[1]))]);
        let aa = collect_aliases(&unit).unwrap();

        assert_eq!(aa.locations.len(), 2);
        let bits = aa.expand(locals(0, &[1, 2]));
        assert_eq!(bits.count(), 2);
        assert_eq!(aa.may_alias(locals(0, &[1, 2])), bits);

        // A set never seen as a key answers pessimistically.
        assert_eq!(aa.may_alias(locals(0, &[1, 3])), aa.all_local);
        assert!(aa.expand(locals(0, &[1, 3])).is_empty());
    }

    #[test]
    fn test_incomplete_range_gets_no_expansion_entry() {
        // Fill the budget with props so the last range slot is refused.
        let mut effects: Vec<MemoryEffects> = (0..62).map(|i| load(prop(0, 8 * i))).collect();
        effects.push(wide_load(stack(0, 3)));
        let unit = unit_with(effects);
        let aa = collect_aliases(&unit).unwrap();

        assert_eq!(aa.locations.len(), MAX_TRACKED_LOCATIONS as usize);
        assert_eq!(aa.all_stack.count(), 2);
        assert!(aa.stack_expand_map.is_empty());
        assert!(aa.expand(stack(0, 3)).is_empty());
        // No complete entry: the query widens to every tracked stack slot.
        assert_eq!(aa.may_alias(stack(0, 3)), aa.all_stack);
    }

    // ── Budget exhaustion ───────────────────────────────────────────────

    #[test]
    fn test_budget_degrades_untracked_queries() {
        let effects: Vec<MemoryEffects> = (0..70).map(|i| load(prop(0, 8 * i))).collect();
        let unit = unit_with(effects);
        let aa = collect_aliases(&unit).unwrap();

        assert_eq!(aa.locations.len(), MAX_TRACKED_LOCATIONS as usize);
        let untracked = prop(0, 8 * 69);
        assert!(aa.find(untracked).is_none());
        assert_eq!(aa.may_alias(untracked), aa.all_props);
        assert!(aa.expand(untracked).is_empty());
    }

    #[test]
    fn test_exactly_full_table_emits_capacity_notice() {
        // Exactly 64 registrations, nothing refused: the notice must still
        // be observed once for this unit.
        let before = diagnostics::occurrence_count("alias-analysis-location-budget");
        let effects: Vec<MemoryEffects> = (0..MAX_TRACKED_LOCATIONS)
            .map(|i| load(prop(0, 8 * i)))
            .collect();
        let unit = unit_with(effects);
        let aa = collect_aliases(&unit).unwrap();

        assert_eq!(aa.locations.len(), MAX_TRACKED_LOCATIONS as usize);
        let after = diagnostics::occurrence_count("alias-analysis-location-budget");
        assert!(after > before, "capacity notice not observed for a full table");
    }

    #[test]
    fn test_untracked_single_local_overlaps_nothing() {
        let unit = unit_with(vec![load(locals(0, &[1])), store(stack(0, 1))]);
        let aa = collect_aliases(&unit).unwrap();

        // Tracked locals all have exact coordinates; a never-seen id or a
        // different frame provably overlaps none of them.
        assert!(aa.may_alias(locals(0, &[2])).is_empty());
        assert!(aa.may_alias(locals(1, &[1])).is_empty());
        let tracked = aa.find(locals(0, &[1])).unwrap();
        assert_eq!(aa.may_alias(locals(0, &[1])), LocBits::single(tracked.index));
    }

    // ── Member state and iterators ──────────────────────────────────────

    #[test]
    fn test_mstate_fields_are_tracked_individually() {
        let unit = unit_with(vec![store(AliasClass::MSTATE_TV_REF)]);
        let aa = collect_aliases(&unit).unwrap();

        let meta = aa.find(AliasClass::MSTATE_TV_REF).unwrap();
        assert!(aa.may_alias(AliasClass::MSTATE_ANY).test(meta.index));
        assert!(aa.expand(AliasClass::MSTATE_ANY).test(meta.index));
        assert!(aa.may_alias(AliasClass::MSTATE_TEMP_BASE).is_empty());
    }

    #[test]
    fn test_multi_field_mstate_access_tracks_each_field() {
        let unit = unit_with(vec![store(AliasClass::mstate(
            MStateBits::TV_REF | MStateBits::TV_REF2,
        ))]);
        let aa = collect_aliases(&unit).unwrap();

        assert_eq!(aa.locations.len(), 2);
        assert_eq!(
            aa.expand(AliasClass::mstate(MStateBits::TV_REF | MStateBits::TV_REF2)).count(),
            2
        );
    }

    #[test]
    fn test_iter_fields_land_in_their_category() {
        let pos = AliasClass::iter(IterSlot {
            frame: FrameId(0),
            iter: 1,
            field: IterField::Pos,
        });
        let base = AliasClass::iter(IterSlot {
            frame: FrameId(0),
            iter: 1,
            field: IterField::Base,
        });
        let unit = unit_with(vec![load(pos), load(base)]);
        let aa = collect_aliases(&unit).unwrap();

        let pos_meta = aa.find(pos).unwrap();
        assert_eq!(aa.all_iter_pos, LocBits::single(pos_meta.index));
        assert_eq!(aa.all_iter_pos.count(), 1);
        assert_eq!(aa.all_iter_base.count(), 1);
        assert!(aa.may_alias(AliasClass::ITER_POS_ANY).test(pos_meta.index));
        assert!(!aa.may_alias(AliasClass::ITER_BASE_ANY).test(pos_meta.index));
    }

    // ── Effect traversal and extreme classes ────────────────────────────

    #[test]
    fn test_call_roles_are_all_collected() {
        let unit = unit_with(vec![MemoryEffects::Call {
            kills: stack(5, 1),
            inputs: stack(0, 1),
            actrec: stack(1, 1),
            outputs: stack(2, 1),
        }]);
        let aa = collect_aliases(&unit).unwrap();
        assert_eq!(aa.locations.len(), 4);
        assert_eq!(aa.all_stack.count(), 4);
    }

    #[test]
    fn test_general_canonicalizes_before_collection() {
        // A trivial General load collapses to a pure load of one location.
        let unit = unit_with(vec![wide_load(prop(0, 8))]);
        let aa = collect_aliases(&unit).unwrap();
        assert!(aa.find(prop(0, 8)).is_some());
    }

    #[test]
    fn test_top_class_covers_every_tracked_location() {
        let unit = unit_with(vec![
            load(prop(0, 8)),
            store(stack(0, 1)),
            load(locals(0, &[3])),
            store(AliasClass::MSTATE_BASE),
            load(AliasClass::global(GlobalSlot { slot: 0 })),
        ]);
        let aa = collect_aliases(&unit).unwrap();

        let everything = aa.may_alias(AliasClass::ANY);
        assert_eq!(everything.count() as usize, aa.locations.len());
        assert_eq!(aa.expand(AliasClass::ANY), everything);
    }

    #[test]
    fn test_bottom_class_covers_nothing() {
        let unit = unit_with(vec![load(prop(0, 8))]);
        let aa = collect_aliases(&unit).unwrap();
        assert!(aa.may_alias(AliasClass::BOTTOM).is_empty());
        assert!(aa.expand(AliasClass::BOTTOM).is_empty());
    }

    #[test]
    fn test_unknown_and_irrelevant_track_nothing() {
        let unit = unit_with(vec![MemoryEffects::Unknown, MemoryEffects::Irrelevant]);
        let aa = collect_aliases(&unit).unwrap();
        assert!(aa.locations.is_empty());
    }

    // ── Rendering ───────────────────────────────────────────────────────

    #[test]
    fn test_display_lists_locations_and_maps() {
        let unit = unit_with(vec![load(prop(0, 8)), wide_load(stack(0, 2))]);
        let aa = collect_aliases(&unit).unwrap();
        let dump = aa.to_string();

        assert!(dump.contains("Prp{v0+8}"));
        assert!(dump.contains("stack expansion:"));
        assert!(dump.contains("Stk{0:2} ->"));
    }
}
