//! Memory-effect annotations for IR instructions.
//!
//! Every instruction carries one [`MemoryEffects`] value describing which
//! abstract locations it may read, write, move, or kill. The shapes are
//! deliberately few; anything that does not fit a precise shape degrades
//! to [`MemoryEffects::General`] or, at worst, [`MemoryEffects::Unknown`].
//!
//! The alias analysis never looks at opcodes, only at these annotations,
//! so the effect classifier in the frontend is the single place where
//! instruction semantics are interpreted.

use crate::ir::alias_class::AliasClass;

/// What an instruction may do to memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryEffects {
    /// Touches no memory the analyses track.
    Irrelevant,
    /// May read or write anything. The effect of last resort.
    Unknown,
    /// Leaves the compiled region by returning. Everything in `kills` is
    /// dead past this point.
    Return { kills: AliasClass },
    /// A call into another function. `inputs` are the argument slots read
    /// before entry, `actrec` is the activation-record storage the call
    /// writes, `outputs` the return-value slots it defines, and `kills`
    /// the stack space it is free to clobber.
    Call {
        kills: AliasClass,
        inputs: AliasClass,
        actrec: AliasClass,
        outputs: AliasClass,
    },
    /// The general shape: may read `loads`, may write `stores`, moves
    /// values out of `moves` (reads that leave the source dead), and
    /// makes `kills` unreadable.
    General {
        loads: AliasClass,
        stores: AliasClass,
        moves: AliasClass,
        kills: AliasClass,
    },
    /// Reads exactly `src` and nothing else.
    PureLoad { src: AliasClass },
    /// Writes exactly `dst` and nothing else, without reading it.
    PureStore { dst: AliasClass },
    /// Leaves the compiled region sideways (guard failure, exception).
    /// `live` must hold correct values at the exit; `kills` need not.
    Exit { live: AliasClass, kills: AliasClass },
    /// Enters an inlined callee: materializes its frame (`inl_frame`) and
    /// stack storage (`inl_stack`) out of the caller's `actrec` slots.
    InlineEnter {
        inl_frame: AliasClass,
        inl_stack: AliasClass,
        actrec: AliasClass,
    },
    /// Leaves an inlined callee: its frame, stack, and iterator/metadata
    /// storage all die.
    InlineExit {
        inl_frame: AliasClass,
        inl_stack: AliasClass,
        inl_meta: AliasClass,
    },
}

impl MemoryEffects {
    /// Visit every alias class mentioned by this effect, in a fixed order.
    ///
    /// This is the effect structure's single traversal point; adding a
    /// field to a variant without visiting it here would silently hide
    /// locations from the analyses, so the match stays exhaustive with no
    /// wildcard arm.
    pub fn for_each_alias_class(&self, mut f: impl FnMut(AliasClass)) {
        match *self {
            MemoryEffects::Irrelevant | MemoryEffects::Unknown => {}
            MemoryEffects::Return { kills } => f(kills),
            MemoryEffects::Call {
                kills,
                inputs,
                actrec,
                outputs,
            } => {
                f(kills);
                f(inputs);
                f(actrec);
                f(outputs);
            }
            MemoryEffects::General {
                loads,
                stores,
                moves,
                kills,
            } => {
                f(loads);
                f(stores);
                f(moves);
                f(kills);
            }
            MemoryEffects::PureLoad { src } => f(src),
            MemoryEffects::PureStore { dst } => f(dst),
            MemoryEffects::Exit { live, kills } => {
                f(live);
                f(kills);
            }
            MemoryEffects::InlineEnter {
                inl_frame,
                inl_stack,
                actrec,
            } => {
                f(inl_frame);
                f(inl_stack);
                f(actrec);
            }
            MemoryEffects::InlineExit {
                inl_frame,
                inl_stack,
                inl_meta,
            } => {
                f(inl_frame);
                f(inl_stack);
                f(inl_meta);
            }
        }
    }

    /// Rewrite an effect into its most precise equivalent shape.
    ///
    /// A `General` effect that neither moves nor kills anything and
    /// touches a single location on only one side is really a pure
    /// access; downstream passes match on the pure shapes, so collapsing
    /// here lets a lazily-classified frontend still get precise answers.
    pub fn canonicalize(self) -> Self {
        if let MemoryEffects::General {
            loads,
            stores,
            moves,
            kills,
        } = self
        {
            if moves == AliasClass::BOTTOM && kills == AliasClass::BOTTOM {
                if stores == AliasClass::BOTTOM && loads.is_single_location() {
                    return MemoryEffects::PureLoad { src: loads };
                }
                if loads == AliasClass::BOTTOM && stores.is_single_location() {
                    return MemoryEffects::PureStore { dst: stores };
                }
            }
        }
        self
    }
}
