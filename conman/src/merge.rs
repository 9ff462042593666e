//! Depth-bounded deep merge of [`Mapping`] trees.
//!
//! Merge semantics, for every key of the overlay (`src`):
//!
//! - key missing from the base: the overlay value is inserted
//! - mapping on both sides: merged recursively
//! - sequence on both sides: replaced or appended, per [`ArrayPolicy`]
//! - anything else: the overlay value wins
//!
//! Keys that only exist in the base are left untouched. Merging is not
//! commutative: the overlay always takes precedence.

use thiserror::Error;

use crate::node::{Mapping, Node};

/// Maximum nesting depth a merge may descend to.
///
/// No legitimate configuration nests this deep; hitting the limit means the
/// input is pathological and the run must stop.
pub const MAX_DEPTH: usize = 32;

/// How conflicting sequences are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayPolicy {
    /// The overlay sequence replaces the base sequence.
    #[default]
    Replace,
    /// The overlay elements are appended after the base elements.
    Append,
}

/// Errors produced by [`merge`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// The trees nest deeper than [`MAX_DEPTH`].
    #[error("merge exceeded the maximum nesting depth of {max} (at key '{key}')")]
    DepthExceeded {
        /// The configured limit.
        max: usize,
        /// The key whose value could not be merged.
        key: String,
    },
}

/// Merges `src` into `dst` in place.
///
/// # Errors
///
/// Returns [`MergeError::DepthExceeded`] when both trees share mappings nested
/// deeper than [`MAX_DEPTH`]. `dst` may be partially merged in that case and
/// should be discarded.
pub fn merge(dst: &mut Mapping, src: Mapping, policy: ArrayPolicy) -> Result<(), MergeError> {
    merge_at(dst, src, policy, 0)
}

/// By-value form of [`merge`], returning the merged base.
pub fn merged(mut dst: Mapping, src: Mapping, policy: ArrayPolicy) -> Result<Mapping, MergeError> {
    merge(&mut dst, src, policy)?;
    Ok(dst)
}

fn merge_at(
    dst: &mut Mapping,
    src: Mapping,
    policy: ArrayPolicy,
    depth: usize,
) -> Result<(), MergeError> {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(Node::Object(base)), Node::Object(overlay)) => {
                if depth + 1 > MAX_DEPTH {
                    return Err(MergeError::DepthExceeded {
                        max: MAX_DEPTH,
                        key,
                    });
                }
                merge_at(base, overlay, policy, depth + 1)?;
            }
            (Some(Node::Array(base)), Node::Array(overlay)) if policy == ArrayPolicy::Append => {
                base.extend(overlay);
            }
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
    Ok(())
}
