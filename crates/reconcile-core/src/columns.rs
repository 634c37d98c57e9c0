// crates/reconcile-core/src/columns.rs
// ============================================================================
// Module: Row Shapes and Column Intersection
// Description: Ordered column sets of a table before and after recreation.
// Purpose: Map backup columns onto the recreated table by name.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`RowShape`] is the ordered list of column names a table currently has.
//! [`ColumnIntersection::between`] keeps the old shape's order, filtered by
//! membership in the new shape, and remembers where each kept column sits in
//! the old row so value extraction and the insert column clause line up.
//! Column names compare ASCII case-insensitively.

// ============================================================================
// SECTION: Row Shape
// ============================================================================

/// Ordered column names of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowShape {
    /// Column names in table order.
    columns: Vec<String>,
}

impl RowShape {
    /// Builds a row shape from column names in table order.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the column names in table order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns true when `name` is one of this shape's columns.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.eq_ignore_ascii_case(name))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the shape has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// SECTION: Column Intersection
// ============================================================================

/// Columns shared by a backup table and its recreated table.
///
/// # Invariants
/// - `columns` and `source_indices` have equal length.
/// - `source_indices` is strictly increasing (old shape order).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnIntersection {
    /// Shared column names, spelled as in the old shape.
    columns: Vec<String>,
    /// Position of each shared column in the old shape.
    source_indices: Vec<usize>,
}

impl ColumnIntersection {
    /// Computes the shared columns of `old` and `new`, in `old` order.
    #[must_use]
    pub fn between(old: &RowShape, new: &RowShape) -> Self {
        let mut columns = Vec::new();
        let mut source_indices = Vec::new();
        for (index, column) in old.columns().iter().enumerate() {
            if new.contains(column) {
                columns.push(column.clone());
                source_indices.push(index);
            }
        }
        Self {
            columns,
            source_indices,
        }
    }

    /// Returns the shared column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the old-shape position of each shared column.
    #[must_use]
    pub fn source_indices(&self) -> &[usize] {
        &self.source_indices
    }

    /// Returns the number of shared columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the shapes share no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::ColumnIntersection;
    use super::RowShape;

    #[test]
    fn intersection_follows_old_order() {
        let old = RowShape::new(["id", "legacy", "name"]);
        let new = RowShape::new(["name", "price", "ID"]);
        let shared = ColumnIntersection::between(&old, &new);
        assert_eq!(shared.columns(), ["id", "name"]);
        assert_eq!(shared.source_indices(), [0, 2]);
    }

    #[test]
    fn disjoint_shapes_share_nothing() {
        let old = RowShape::new(["a"]);
        let new = RowShape::new(["b"]);
        assert!(ColumnIntersection::between(&old, &new).is_empty());
    }
}
