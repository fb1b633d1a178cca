//! Tools for comparing texts, fuzzily locating substrings, and patching
//! texts that have drifted apart
//!
//! The crate is built from three cooperating pieces:
//!
//! * [`diff`] computes a minimal edit script between two texts, with
//!   optional cleanup passes ([`cleanup_semantic`], [`cleanup_efficiency`])
//!   that trade minimality for human readability or smaller patches.
//! * [`locate`] finds the best fuzzy match for a pattern near an expected
//!   position, tolerating errors and positional drift.
//! * [`create_patch`] / [`apply`] turn an edit script into a serializable
//!   [`Patch`] and play it back against a text, re-anchoring each hunk by
//!   fuzzy matching so the target may differ from the text the patch was
//!   made from.
//!
//! All positions and lengths are counted in chars, not bytes.
//!
//! ```
//! use driftpatch::{apply, create_patch};
//!
//! let patch = create_patch(
//!     "The quick brown fox jumps over the lazy dog.",
//!     "That quick brown fox jumped over a lazy dog.",
//! );
//! let result = apply("The quick red fox jumps over the tired dog.", &patch);
//! assert!(result.is_complete());
//! assert_eq!(result.text(), "That quick red fox jumped over a tired dog.");
//! ```

mod apply;
mod commonality;
mod diff;
mod linemap;
mod matching;
mod patch;
mod utils;

pub use apply::{ApplyResult, apply};
pub use diff::cleanup::{cleanup_efficiency, cleanup_merge, cleanup_semantic};
pub use diff::{
    DiffOptions, Difference, EditType, diff, levenshtein, source_text, target_text, x_index,
};
pub use matching::{MatchOptions, locate};
pub use patch::{
    ParsePatchError, Patch, PatchEntry, PatchFormatter, PatchOptions, create_patch,
};
