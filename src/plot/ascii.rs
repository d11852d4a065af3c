//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements, one chart per selected pair:
//! - selected candidate: `-` line
//! - reference samples: `.`
//! - accepted test points for that candidate: `o`

use crate::domain::{ClassificationResult, PairSamples, RunFile};

/// Render every pair of a run, one chart after another.
pub fn render_run_plot(run: &RunFile, width: usize, height: usize) -> String {
    run.pairs
        .iter()
        .map(|pair| render_pair_plot(pair, &run.results, width, height))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one reference/candidate pair plus the test points assigned to the candidate.
pub fn render_pair_plot(
    pair: &PairSamples,
    results: &[ClassificationResult],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let matched: Vec<(f64, f64)> = results
        .iter()
        .filter(|r| r.candidate == pair.candidate)
        .map(|r| (r.x, r.y))
        .collect();
    let reference: Vec<(f64, f64)> = pair.x.iter().copied().zip(pair.reference_y.iter().copied()).collect();
    let mut candidate: Vec<(f64, f64)> = pair.x.iter().copied().zip(pair.candidate_y.iter().copied()).collect();
    candidate.sort_by(|a, b| a.0.total_cmp(&b.0));

    let all = || reference.iter().chain(&candidate).chain(&matched);
    let (x_min, x_max) = range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw the candidate first so samples and points overlay it.
    draw_curve(&mut grid, &candidate, x_min, x_max, y_min, y_max);

    for &(x, y) in &reference {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = '.';
    }
    for &(x, y) in &matched {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} -> {} | x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n",
        pair.reference, pair.candidate
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, '-');
        } else {
            grid[yy][xx] = '-';
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurveId;

    fn id(n: u16) -> CurveId {
        CurveId::new(n).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let pair = PairSamples {
            reference: id(1),
            candidate: id(5),
            x: vec![0.0, 9.0],
            reference_y: vec![0.0, 4.0],
            candidate_y: vec![0.0, 4.0],
        };
        let results = vec![
            ClassificationResult { x: 9.0, y: 0.0, candidate: id(5), deviation: 4.0 },
            // Assigned to another candidate: not drawn on this chart.
            ClassificationResult { x: 0.0, y: 4.0, candidate: id(6), deviation: 0.0 },
        ];

        let txt = render_pair_plot(&pair, &results, 10, 5);
        let expected = concat!(
            "Plot: y1 -> y5 | x=[0.000, 9.000] | y=[-0.20, 4.20]\n",
            "        -.\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            ".-       o\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn run_plot_has_one_chart_per_pair() {
        let pair = |r: u16, c: u16| PairSamples {
            reference: id(r),
            candidate: id(c),
            x: vec![0.0, 1.0],
            reference_y: vec![0.0, 1.0],
            candidate_y: vec![0.0, 1.0],
        };
        let run = RunFile {
            tool: "cm".to_string(),
            generated_at: chrono::Utc::now(),
            selection: crate::domain::Selection::from_pairs(vec![]),
            pairs: vec![pair(1, 3), pair(2, 4)],
            results: vec![],
        };
        let txt = render_run_plot(&run, 20, 6);
        assert_eq!(txt.matches("Plot: ").count(), 2);
        assert!(txt.contains("Plot: y2 -> y4"));
    }
}
