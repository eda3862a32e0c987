//! The `Symbol` trait parametrizes every automaton and alphabet structure in this crate over the
//! width of the integer used to identify one input symbol. Instantiate with `u8` for byte
//! alphabets, `u16` for UTF-16 code units, or `u32` for full Unicode code points (what the `abnf`
//! module uses throughout, since ABNF numeric values range up to `%x10FFFF`).

use num_traits::{Bounded, CheckedAdd, CheckedSub, PrimInt, Unsigned};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// An unsigned integer identifying one symbol of an automaton's input alphabet.
///
/// This is a closed trait (there is a blanket impl for `u8`/`u16`/`u32` below); it exists only to
/// let [`crate::alphabet::Alphabet`], [`crate::nfa::Nfa`] and [`crate::dfa::Dfa`] be generic over
/// symbol width without repeating the same bound everywhere.
pub trait Symbol:
    PrimInt
    + Unsigned
    + Bounded
    + CheckedAdd
    + CheckedSub
    + Hash
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
    /// `self + 1`, or `None` if `self` is already [`Symbol::max_value`].
    fn succ(self) -> Option<Self> {
        self.checked_add(&Self::one())
    }

    /// `self - 1`, or `None` if `self` is already zero.
    fn pred(self) -> Option<Self> {
        self.checked_sub(&Self::one())
    }
}

impl Symbol for u8 {}
impl Symbol for u16 {}
impl Symbol for u32 {}
