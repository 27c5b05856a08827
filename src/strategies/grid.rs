use crate::error::StrategyError;
use crate::types::{Outcome, Side};
use super::{Family, RoundContext, Strategy};

const ROWS: usize = 5;
const COLS: usize = 5;
const CELLS: usize = ROWS * COLS;

/// The last 25 outcomes laid out row-major, right-aligned so the most recent
/// hand sits in the bottom-right cell. Leading cells stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grid {
    cells: [[Option<Outcome>; COLS]; ROWS],
}

impl Grid {
    fn from_history(outcomes: &[Outcome]) -> Self {
        let recent = &outcomes[outcomes.len().saturating_sub(CELLS)..];
        let offset = CELLS - recent.len();
        let mut cells = [[None; COLS]; ROWS];
        for (i, outcome) in recent.iter().enumerate() {
            let slot = offset + i;
            cells[slot / COLS][slot % COLS] = Some(*outcome);
        }
        Self { cells }
    }

    fn side_at(&self, row: usize, col: usize) -> Option<Side> {
        self.cells[row][col].and_then(|o| o.side())
    }

    fn count_in<I>(&self, coords: I, side: Side) -> usize
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        coords
            .into_iter()
            .filter(|&(r, c)| self.side_at(r, c) == Some(side))
            .count()
    }

    /// True when every decided cell on the line is `side`. A line without
    /// decided cells counts as satisfied.
    fn line_all<I>(&self, coords: I, side: Side) -> bool
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        coords
            .into_iter()
            .filter_map(|(r, c)| self.side_at(r, c))
            .all(|s| s == side)
    }

    fn decided_cells(&self, side: Side) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.and_then(|o| o.side()) == Some(side))
            .count()
    }

    /// Size of the largest 4-connected region of `side`.
    fn largest_region(&self, side: Side) -> usize {
        let mut visited = [[false; COLS]; ROWS];
        let mut largest = 0;
        for row in 0..ROWS {
            for col in 0..COLS {
                if visited[row][col] || self.side_at(row, col) != Some(side) {
                    continue;
                }
                visited[row][col] = true;
                let mut stack = vec![(row, col)];
                let mut size = 0;
                while let Some((r, c)) = stack.pop() {
                    size += 1;
                    let neighbours = [
                        (r.wrapping_sub(1), c),
                        (r + 1, c),
                        (r, c.wrapping_sub(1)),
                        (r, c + 1),
                    ];
                    for (nr, nc) in neighbours {
                        if nr < ROWS
                            && nc < COLS
                            && !visited[nr][nc]
                            && self.side_at(nr, nc) == Some(side)
                        {
                            visited[nr][nc] = true;
                            stack.push((nr, nc));
                        }
                    }
                }
                largest = largest.max(size);
            }
        }
        largest
    }
}

/// Oracle Grid
/// Reads "signs" off the 5x5 grid: diagonals, the centre block, the last row
/// and the first column.
pub struct OracleGrid;

impl OracleGrid {
    /// (player signs, banker signs), or `None` with fewer than 5 hands.
    fn signs(outcomes: &[Outcome]) -> Option<(u32, u32)> {
        if outcomes.len() < 5 {
            return None;
        }
        let grid = Grid::from_history(outcomes);
        let mut player = 0;
        let mut banker = 0;

        if grid.line_all((0..ROWS).map(|i| (i, i)), Side::Player) {
            player += 2;
        }
        if grid.line_all((0..ROWS).map(|i| (i, COLS - 1 - i)), Side::Banker) {
            banker += 2;
        }

        let centre = || (1..4).flat_map(|r| (1..4).map(move |c| (r, c)));
        let centre_p = grid.count_in(centre(), Side::Player);
        let centre_b = grid.count_in(centre(), Side::Banker);
        if centre_p > centre_b && centre_p >= 4 {
            player += 1;
        }
        if centre_b > centre_p && centre_b >= 4 {
            banker += 1;
        }

        if grid.count_in((0..COLS).map(|c| (ROWS - 1, c)), Side::Player) >= 3 {
            player += 1;
        }
        if grid.count_in((0..ROWS).map(|r| (r, 0)), Side::Banker) >= 3 {
            banker += 1;
        }

        Some((player, banker))
    }

    fn sign_confidence(outcomes: &[Outcome]) -> f64 {
        match Self::signs(outcomes) {
            Some((p, b)) => (30.0 + p.abs_diff(b) as f64 * 15.0).clamp(20.0, 80.0),
            None => 0.0,
        }
    }
}

impl Strategy for OracleGrid {
    fn name(&self) -> &str {
        "Oracle Grid"
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(Self::signs(ctx.history.outcomes()).and_then(|(p, b)| match p.cmp(&b) {
            std::cmp::Ordering::Greater => Some(Side::Player),
            std::cmp::Ordering::Less => Some(Side::Banker),
            std::cmp::Ordering::Equal => None,
        }))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        Ok(Self::sign_confidence(ctx.history.outcomes()))
    }

    fn probability(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        let confidence = Self::sign_confidence(ctx.history.outcomes());
        Ok((50.0 + (confidence - 50.0) * 0.4).clamp(30.0, 70.0))
    }
}

/// Visual Density
/// Bets the colour with the largest connected block on the 5x5 grid.
pub struct VisualDensity;

impl VisualDensity {
    /// (largest P block, largest B block, P cells, B cells).
    fn blocks(outcomes: &[Outcome]) -> Option<(usize, usize, usize, usize)> {
        if outcomes.len() < 5 {
            return None;
        }
        let grid = Grid::from_history(outcomes);
        let p_cells = grid.decided_cells(Side::Player);
        let b_cells = grid.decided_cells(Side::Banker);
        if p_cells + b_cells < 5 {
            return None;
        }
        Some((
            grid.largest_region(Side::Player),
            grid.largest_region(Side::Banker),
            p_cells,
            b_cells,
        ))
    }
}

impl Strategy for VisualDensity {
    fn name(&self) -> &str {
        "Visual Density"
    }

    fn family(&self) -> Option<Family> {
        Some(Family::Orderly)
    }

    fn predict(&mut self, ctx: &RoundContext<'_>) -> Result<Option<Side>, StrategyError> {
        Ok(Self::blocks(ctx.history.outcomes()).and_then(|(p, b, _, _)| match p.cmp(&b) {
            std::cmp::Ordering::Greater => Some(Side::Player),
            std::cmp::Ordering::Less => Some(Side::Banker),
            std::cmp::Ordering::Equal => None,
        }))
    }

    fn confidence(&self, ctx: &RoundContext<'_>, _side: Side) -> Result<f64, StrategyError> {
        let Some((p, b, _, _)) = Self::blocks(ctx.history.outcomes()) else {
            return Ok(0.0);
        };
        let diff = p.abs_diff(b) as f64;
        let max = p.max(b) as f64;
        Ok((35.0 + diff * 5.0 + max * 1.5).clamp(25.0, 90.0))
    }

    fn probability(&self, ctx: &RoundContext<'_>, side: Side) -> Result<f64, StrategyError> {
        let Some((p_block, b_block, p_cells, b_cells)) = Self::blocks(ctx.history.outcomes()) else {
            return Ok(0.0);
        };
        let (block, cells) = match side {
            Side::Player => (p_block, p_cells),
            Side::Banker => (b_block, b_cells),
        };
        let block_factor = block as f64 / CELLS as f64;
        let ratio = cells as f64 / (p_cells + b_cells) as f64;
        Ok((50.0 + block_factor * 30.0 + (ratio - 0.5) * 20.0).clamp(20.0, 80.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::testing::{approx, Fixture};

    fn outcomes(codes: &str) -> Vec<Outcome> {
        codes.chars().filter_map(Outcome::from_code).collect()
    }

    #[test]
    fn test_grid_is_right_aligned() {
        let grid = Grid::from_history(&outcomes("PB"));
        assert_eq!(grid.cells[4][3], Some(Outcome::Player));
        assert_eq!(grid.cells[4][4], Some(Outcome::Banker));
        assert_eq!(grid.cells[0][0], None);

        let long = outcomes(&format!("{}{}", "B".repeat(10), "P".repeat(25)));
        assert_eq!(Grid::from_history(&long).decided_cells(Side::Banker), 0);
    }

    #[test]
    fn test_largest_region_is_four_connected() {
        // Row 3 fully P, row 4 = B P B P B: the P at (4,1) and (4,3) join row 3.
        let grid = Grid::from_history(&outcomes(&format!("{}PPPPPBPBPB", "T".repeat(15))));
        assert_eq!(grid.largest_region(Side::Player), 7);
        assert_eq!(grid.largest_region(Side::Banker), 1);
    }

    #[test]
    fn test_oracle_needs_five_hands() {
        assert!(!Fixture::new("PPPP").run(&mut OracleGrid).is_call());
    }

    #[test]
    fn test_oracle_last_row_sign() {
        // Only the bottom row is filled: PPPBP.
        // Main diagonal holds (4,4)=P -> P+2. Anti-diagonal holds (4,0)=P -> no B sign.
        // Last row has 4 P -> P+1. First column has no B.
        let v = Fixture::new("PPPBP").run(&mut OracleGrid);
        assert_eq!(v.prediction, Some(Side::Player));
        assert!(approx(v.confidence, 75.0));
        assert!(approx(v.probability, 60.0));
    }

    #[test]
    fn test_oracle_vacuous_diagonals_cancel() {
        // Only ties on both diagonals: both +2 signs fire and cancel out.
        let v = Fixture::new("TTTTT").run(&mut OracleGrid);
        assert!(!v.is_call());
    }

    #[test]
    fn test_visual_density_prefers_bigger_block() {
        // The tie sits above the last B, so the B block stays a single cell.
        let v = Fixture::new("TPPPPB").run(&mut VisualDensity);
        assert_eq!(v.prediction, Some(Side::Player));
        // P block 4, B block 1: 35 + 15 + 6.
        assert!(approx(v.confidence, 56.0));
        // 50 + 4/25*30 + (4/5 - 0.5)*20
        assert!(approx(v.probability, 60.8));
    }

    #[test]
    fn test_visual_density_needs_five_decided_cells() {
        assert!(!Fixture::new("PPTTB").run(&mut VisualDensity).is_call());
    }

    #[test]
    fn test_visual_density_equal_blocks_abstain() {
        assert!(!Fixture::new("PBPBP").run(&mut VisualDensity).is_call());
    }
}
