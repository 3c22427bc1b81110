// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Source location tracking

use std::fmt;

/// Half-open byte range `[start, end)` into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRange {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl TextRange {
    /// Create a new range
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {start}..{end}");
        Self { start, end }
    }

    /// Empty range at `offset`
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Get the range length
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if range is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this range
    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Overlap check where ranges that merely touch do not overlap.
    ///
    /// An empty range overlaps a range that strictly contains its offset.
    pub fn overlaps(&self, other: TextRange) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    /// Smallest range covering both ranges
    pub fn cover(&self, other: TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps() {
        let a = TextRange::new(0, 10);
        assert!(a.overlaps(TextRange::new(5, 15)));
        assert!(!a.overlaps(TextRange::new(20, 30)));
        assert!(!a.overlaps(TextRange::new(10, 12)));
        assert!(!TextRange::new(10, 12).overlaps(a));
        assert!(a.overlaps(TextRange::new(3, 4)));
    }

    #[test]
    fn test_cover() {
        let a = TextRange::new(4, 6);
        assert_eq!(a.cover(TextRange::new(1, 5)), TextRange::new(1, 6));
        assert_eq!(a.len(), 2);
        assert!(TextRange::empty(3).is_empty());
    }
}
