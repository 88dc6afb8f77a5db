/// Behaviour outside the tabulated range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpMode {
    /// Hold the first/last tabulated value.
    FirstLast,

    /// Return a fixed value.
    Constant(f64),
}

/// Linear interpolation over `(x, y)` pairs sorted by non-decreasing `x`.
///
/// Zero-width segments (repeated `x`) resolve to the later point, so step
/// changes in tabulated data are preserved.
pub fn interp(points: &[(f64, f64)], xp: f64, mode: InterpMode) -> f64 {
    match points {
        [] => 0.0,
        [(_, y)] => *y,
        [(x_first, y_first), .., (x_last, y_last)] => {
            if xp < *x_first {
                return match mode {
                    InterpMode::FirstLast => *y_first,
                    InterpMode::Constant(value) => value,
                };
            }
            if xp > *x_last {
                return match mode {
                    InterpMode::FirstLast => *y_last,
                    InterpMode::Constant(value) => value,
                };
            }

            let i = segment_index(points, xp);
            let (x0, y0) = points[i];
            let (x1, y1) = points[i + 1];
            let dx = x1 - x0;
            if dx <= 0.0 {
                y1
            } else {
                y0 + (y1 - y0) * (xp - x0) / dx
            }
        }
    }
}

/// Index `i` of the segment `[x_i, x_{i+1}]` containing `xp`, clamped to the table.
pub fn segment_index(points: &[(f64, f64)], xp: f64) -> usize {
    let upper = points.partition_point(|&(x, _)| x <= xp);
    upper.saturating_sub(1).min(points.len().saturating_sub(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp() {
        assert_eq!(interp(&[], 2.0, InterpMode::FirstLast), 0.0);
        assert_eq!(interp(&[(1.0, 2.0)], 2.0, InterpMode::FirstLast), 2.0);

        let table = vec![(0.0, 0.0), (1.0, 2.0), (2.0, 5.0), (3.0, 3.0), (4.5, 2.0)];

        assert_eq!(interp(&table, 0.25, InterpMode::FirstLast), 0.5);
        assert_eq!(interp(&table, 2.5, InterpMode::FirstLast), 4.0);
        assert_eq!(interp(&table, 4.5, InterpMode::FirstLast), 2.0);
        assert_eq!(interp(&table, -1.0, InterpMode::FirstLast), 0.0);
        assert_eq!(interp(&table, 7.5, InterpMode::FirstLast), 2.0);
        assert_eq!(interp(&table, 7.5, InterpMode::Constant(0.0)), 0.0);
    }

    #[test]
    fn test_interp_step_change() {
        let table = vec![(0.0, 1.0), (1.0, 1.0), (1.0, 3.0), (2.0, 3.0)];
        assert_eq!(interp(&table, 0.5, InterpMode::FirstLast), 1.0);
        assert_eq!(interp(&table, 1.0, InterpMode::FirstLast), 3.0);
        assert_eq!(interp(&table, 1.5, InterpMode::FirstLast), 3.0);
    }
}
