//! N-Queens problem test fixtures.
//!
//! Provides a complete N-Queens implementation for testing constraint satisfaction
//! and solver components. The N-Queens problem places N queens on an N×N chessboard
//! such that no two queens threaten each other.
//!
//! # Example
//!
//! ```
//! use planwright_test::nqueens::{calculate_conflicts, NQueensSolution};
//!
//! // A valid 4-queens placement
//! let solution = NQueensSolution::with_rows(&[1, 3, 0, 2]);
//! assert_eq!(calculate_conflicts(&solution).score(), 0);
//! ```

use std::sync::Arc;

use planwright_core::{
    EntityDescriptor, PlanningSolution, PlanningValue, SimpleScore, SolutionDescriptor,
    VariableDescriptor, VariableId,
};

/// The row planning variable.
pub const ROW: VariableId = VariableId::new(0, 0);

/// A queen entity in the N-Queens problem.
///
/// Each queen has:
/// - `id`: Unique identifier (typically the column index)
/// - `column`: The column position on the board (fixed/problem fact)
/// - `row`: The row position (planning variable, None if unassigned)
#[derive(Clone, Debug, PartialEq)]
pub struct Queen {
    pub id: i64,
    pub column: i64,
    pub row: Option<i64>,
}

impl Queen {
    /// Creates a new queen at the given column with an optional row.
    pub fn new(id: i64, column: i64, row: Option<i64>) -> Self {
        Self { id, column, row }
    }

    /// Creates a queen with an assigned row.
    pub fn assigned(id: i64, column: i64, row: i64) -> Self {
        Self {
            id,
            column,
            row: Some(row),
        }
    }

    /// Creates a queen with no row assigned.
    pub fn unassigned(id: i64, column: i64) -> Self {
        Self {
            id,
            column,
            row: None,
        }
    }
}

/// N-Queens problem solution.
///
/// Contains a vector of queens and an optional score. The score is typically
/// calculated as the negative count of conflicts (row + diagonal).
#[derive(Clone, Debug)]
pub struct NQueensSolution {
    pub queens: Vec<Queen>,
    pub score: Option<SimpleScore>,
}

impl NQueensSolution {
    /// Creates a new N-Queens solution with the given queens.
    pub fn new(queens: Vec<Queen>) -> Self {
        Self {
            queens,
            score: None,
        }
    }

    /// Creates an N-Queens solution with n uninitialized queens.
    ///
    /// Queens are placed in columns 0..n with no row assigned.
    pub fn uninitialized(n: usize) -> Self {
        let queens = (0..n)
            .map(|i| Queen::unassigned(i as i64, i as i64))
            .collect();
        Self {
            queens,
            score: None,
        }
    }

    /// Creates an N-Queens solution with queens at the specified rows.
    ///
    /// Queens are placed in columns 0..n with rows from the provided slice.
    pub fn with_rows(rows: &[i64]) -> Self {
        let queens = rows
            .iter()
            .enumerate()
            .map(|(i, &row)| Queen::assigned(i as i64, i as i64, row))
            .collect();
        Self {
            queens,
            score: None,
        }
    }

    /// Creates an N-Queens solution with optional rows.
    pub fn with_optional_rows(rows: &[Option<i64>]) -> Self {
        let queens = rows
            .iter()
            .enumerate()
            .map(|(i, &row)| Queen::new(i as i64, i as i64, row))
            .collect();
        Self {
            queens,
            score: None,
        }
    }
}

impl PlanningSolution for NQueensSolution {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

/// Gets the row value for a queen at the given index.
///
/// This is the typed getter for the planning variable.
pub fn get_queen_row(s: &NQueensSolution, idx: usize) -> PlanningValue {
    s.queens.get(idx).and_then(|q| q.row).into()
}

/// Sets the row value for a queen at the given index.
///
/// This is the typed setter for the planning variable.
pub fn set_queen_row(s: &mut NQueensSolution, idx: usize, v: PlanningValue) {
    if let Some(queen) = s.queens.get_mut(idx) {
        queen.row = v.as_int();
    }
}

/// Rows `0..n`, where `n` is the number of queens.
pub fn row_range(s: &NQueensSolution) -> Vec<PlanningValue> {
    (0..s.queens.len() as i64).map(PlanningValue::Int).collect()
}

/// Calculates the number of conflicts in an N-Queens solution.
///
/// Counts row conflicts and diagonal conflicts between all pairs of queens.
/// Returns a negative score where 0 means no conflicts (optimal).
pub fn calculate_conflicts(solution: &NQueensSolution) -> SimpleScore {
    let mut conflicts = 0i64;
    let queens = &solution.queens;

    for i in 0..queens.len() {
        for j in (i + 1)..queens.len() {
            if let (Some(row_i), Some(row_j)) = (queens[i].row, queens[j].row) {
                // Row conflict: two queens on the same row
                if row_i == row_j {
                    conflicts += 1;
                }
                // Diagonal conflict: difference in rows equals difference in columns
                let col_diff = (queens[j].column - queens[i].column).abs();
                if (row_i - row_j).abs() == col_diff {
                    conflicts += 1;
                }
            }
        }
    }

    SimpleScore::of(-conflicts)
}

/// Creates the solution descriptor for [`NQueensSolution`].
pub fn create_nqueens_descriptor() -> Arc<SolutionDescriptor<NQueensSolution>> {
    let built = SolutionDescriptor::builder("NQueensSolution")
        .entity(
            EntityDescriptor::new("Queen", |s: &NQueensSolution| s.queens.len()).with_variable(
                VariableDescriptor::genuine("row", get_queen_row, set_queen_row, row_range),
            ),
        )
        .build();
    match built {
        Ok(descriptor) => descriptor,
        Err(e) => panic!("n-queens descriptor is valid: {e}"),
    }
}
