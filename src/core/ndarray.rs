// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Multi-dimensional arrays and row-major traversal.
//!
//! [`RowMajorIndex`] enumerates the positions of an N-dimensional array in
//! row-major order (last dimension varies fastest). It keeps a per-dimension
//! index vector and increments it like an odometer: the last digit is bumped
//! and, when it reaches its extent, wraps to zero and carries into the digit
//! to its left. The flat offset of the current element is tracked alongside.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// Number of elements of an array with the given extents.
///
/// Rank zero describes a single element.
pub fn element_count(dims: &[usize]) -> usize {
    dims.iter().product()
}

/// Row-major ripple-carry cursor over an N-dimensional index space.
///
/// # Example
///
/// ```
/// use cdrbridge::core::ndarray::RowMajorIndex;
///
/// let mut index = RowMajorIndex::new(&[2, 2]);
/// let mut seen = Vec::new();
/// while !index.is_done() {
///     seen.push((index.linear(), index.index().to_vec()));
///     index.advance();
/// }
/// assert_eq!(seen[3], (3, vec![1, 1]));
/// ```
#[derive(Debug, Clone)]
pub struct RowMajorIndex {
    dims: Vec<usize>,
    index: Vec<usize>,
    linear: usize,
    total: usize,
}

impl RowMajorIndex {
    /// Start at the first element of an array with the given extents.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: dims.to_vec(),
            index: vec![0; dims.len()],
            linear: 0,
            total: element_count(dims),
        }
    }

    /// Total number of positions.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Flat row-major offset of the current position.
    #[inline]
    pub fn linear(&self) -> usize {
        self.linear
    }

    /// Per-dimension index of the current position.
    #[inline]
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Check if every position has been visited.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.linear >= self.total
    }

    /// Move to the next position, carrying into higher dimensions on overflow.
    pub fn advance(&mut self) {
        if self.is_done() {
            return;
        }
        self.linear += 1;
        for dim in (0..self.dims.len()).rev() {
            self.index[dim] += 1;
            if self.index[dim] < self.dims[dim] {
                return;
            }
            self.index[dim] = 0;
        }
    }
}

/// Visit every position of `dims` in row-major order.
///
/// The callback receives the flat offset and the per-dimension index.
pub fn for_each_index<F>(dims: &[usize], mut visit: F) -> Result<()>
where
    F: FnMut(usize, &[usize]) -> Result<()>,
{
    let mut cursor = RowMajorIndex::new(dims);
    while !cursor.is_done() {
        visit(cursor.linear(), cursor.index())?;
        cursor.advance();
    }
    Ok(())
}

/// Owned N-dimensional array with fixed extents, stored row-major.
///
/// Deserialized arrays go through [`NdArray::from_vec`], so the element
/// count always matches the extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NdArrayParts<T>")]
pub struct NdArray<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

/// Unchecked serialized form of [`NdArray`].
#[derive(Deserialize)]
struct NdArrayParts<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

impl<T> TryFrom<NdArrayParts<T>> for NdArray<T> {
    type Error = CodecError;

    fn try_from(parts: NdArrayParts<T>) -> Result<Self> {
        NdArray::from_vec(&parts.dims, parts.data)
    }
}

impl<T> NdArray<T> {
    /// Build an array by evaluating `f` at every index.
    pub fn from_fn<F>(dims: &[usize], mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> T,
    {
        let mut cursor = RowMajorIndex::new(dims);
        let mut data = Vec::with_capacity(cursor.total());
        while !cursor.is_done() {
            data.push(f(cursor.index()));
            cursor.advance();
        }
        Self {
            dims: dims.to_vec(),
            data,
        }
    }

    /// Wrap row-major data.
    pub fn from_vec(dims: &[usize], data: Vec<T>) -> Result<Self> {
        let expected = element_count(dims);
        if data.len() != expected {
            return Err(CodecError::invariant_violation(format!(
                "array of extents {dims:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self {
            dims: dims.to_vec(),
            data,
        })
    }

    /// Extents of each dimension.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major offset of `index`, if it is in range.
    pub fn offset_of(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        for (&i, &extent) in index.iter().zip(&self.dims) {
            if i >= extent {
                return None;
            }
            offset = offset * extent + i;
        }
        Some(offset)
    }

    /// Element at `index`.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset_of(index).and_then(|o| self.data.get(o))
    }

    /// Mutable element at `index`.
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut T> {
        self.offset_of(index).and_then(move |o| self.data.get_mut(o))
    }

    /// Elements in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the array, returning row-major data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: Clone> NdArray<T> {
    /// Array with every element set to `value`.
    pub fn filled(dims: &[usize], value: T) -> Self {
        Self {
            dims: dims.to_vec(),
            data: vec![value; element_count(dims)],
        }
    }
}

impl<T: Default> NdArray<T> {
    /// Reset every element to its default value.
    pub fn clear_to_default(&mut self) {
        self.data.iter_mut().for_each(|v| *v = T::default());
    }
}

impl<T> Index<&[usize]> for NdArray<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {index:?} out of range for extents {:?}", self.dims),
        }
    }
}

impl<T> IndexMut<&[usize]> for NdArray<T> {
    fn index_mut(&mut self, index: &[usize]) -> &mut T {
        let dims = self.dims.clone();
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("index {index:?} out of range for extents {dims:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(dims: &[usize]) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        for_each_index(dims, |_, idx| {
            out.push(idx.to_vec());
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[3, 2, 2]), 12);
        assert_eq!(element_count(&[4]), 4);
        assert_eq!(element_count(&[3, 0]), 0);
        assert_eq!(element_count(&[]), 1);
    }

    #[test]
    fn test_rank_one_order() {
        assert_eq!(collect(&[3]), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_last_dimension_fastest() {
        assert_eq!(
            collect(&[2, 3]),
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn test_double_carry() {
        let mut cursor = RowMajorIndex::new(&[2, 2, 2]);
        for _ in 0..3 {
            cursor.advance();
        }
        assert_eq!(cursor.index(), &[0, 1, 1]);
        cursor.advance();
        // both trailing digits wrap and carry into the first dimension
        assert_eq!(cursor.index(), &[1, 0, 0]);
        assert_eq!(cursor.linear(), 4);
        for _ in 0..3 {
            cursor.advance();
        }
        assert_eq!(cursor.linear(), 7);
        assert_eq!(cursor.index(), &[1, 1, 1]);
        cursor.advance();
        assert!(cursor.is_done());
    }

    #[test]
    fn test_linear_matches_offset() {
        let array = NdArray::from_fn(&[3, 2, 2], |idx| idx.to_vec());
        for_each_index(&[3, 2, 2], |linear, idx| {
            assert_eq!(array.offset_of(idx), Some(linear));
            assert_eq!(array.as_slice()[linear], idx.to_vec());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_zero_extent_visits_nothing() {
        assert!(collect(&[2, 0, 3]).is_empty());
    }

    #[test]
    fn test_advance_past_end_is_noop() {
        let mut cursor = RowMajorIndex::new(&[1]);
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_done());
        assert_eq!(cursor.linear(), 1);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(NdArray::from_vec(&[2, 2], vec![1, 2, 3]).is_err());
        let array = NdArray::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(array[&[1, 0][..]], 3);
    }

    #[test]
    fn test_into_vec_is_row_major() {
        let array = NdArray::from_fn(&[2, 2], |idx| idx[0] * 10 + idx[1]);
        assert_eq!(array.into_vec(), vec![0, 1, 10, 11]);
    }

    #[test]
    fn test_deserialize_checks_length() {
        let err = serde_json::from_str::<NdArray<i32>>(r#"{"dims":[2,2],"data":[1]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("needs 4 elements"));

        let array: NdArray<i32> =
            serde_json::from_str(r#"{"dims":[2,2],"data":[1,2,3,4]}"#).unwrap();
        assert_eq!(array.get(&[1, 1]), Some(&4));
        let json = serde_json::to_string(&array).unwrap();
        assert_eq!(serde_json::from_str::<NdArray<i32>>(&json).unwrap(), array);
    }

    #[test]
    fn test_get_out_of_range() {
        let array = NdArray::filled(&[2, 3], 0u8);
        assert!(array.get(&[2, 0]).is_none());
        assert!(array.get(&[0, 3]).is_none());
        assert!(array.get(&[0]).is_none());
    }

    #[test]
    fn test_index_mut_and_clear() {
        let mut array = NdArray::filled(&[2, 2], 0i32);
        array[&[1, 1][..]] = 9;
        assert_eq!(array.as_slice(), &[0, 0, 0, 9]);
        array.clear_to_default();
        assert_eq!(array.as_slice(), &[0, 0, 0, 0]);
    }
}
