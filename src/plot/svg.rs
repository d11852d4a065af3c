//! Plotters-powered SVG export.
//!
//! The file stacks three charts:
//! - the reference curves
//! - the candidates selected for them
//! - the accepted test observations, coloured by candidate
//!
//! All series and bounds are computed from the `RunFile`, so a saved run can be
//! re-rendered without the input CSVs.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::{CurveId, RunFile};
use crate::error::AppError;

/// One colour per selected pair, in reference order.
const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(220, 20, 60),  // red
    RGBColor(30, 90, 200),  // blue
    RGBColor(34, 139, 34),  // green
    RGBColor(255, 140, 0),  // orange
];

/// Write the three-panel chart for a run to an SVG file.
pub fn write_run_svg(path: &Path, run: &RunFile, width: u32, height: u32) -> Result<(), AppError> {
    draw_run(path, run, width.max(200), height.max(300))
        .map_err(|e| AppError::io(format!("Failed to render SVG '{}': {e}", path.display())))
}

fn draw_run(path: &Path, run: &RunFile, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 1));

    let x_bounds = padded_bounds(
        run.pairs
            .iter()
            .flat_map(|p| p.x.iter().copied())
            .chain(run.results.iter().map(|r| r.x)),
    );

    let references: Vec<Series> = run
        .pairs
        .iter()
        .map(|p| Series {
            label: format!("reference {}", p.reference),
            points: sorted_points(&p.x, &p.reference_y),
        })
        .collect();
    draw_lines(&panels[0], "Reference curves", x_bounds, &references)?;

    let candidates: Vec<Series> = run
        .pairs
        .iter()
        .map(|p| Series {
            label: format!("candidate {} (for {})", p.candidate, p.reference),
            points: sorted_points(&p.x, &p.candidate_y),
        })
        .collect();
    draw_lines(&panels[1], "Selected candidates", x_bounds, &candidates)?;

    let accepted: Vec<Series> = run
        .pairs
        .iter()
        .map(|p| Series {
            label: format!("test points -> {}", p.candidate),
            points: points_for(run, p.candidate),
        })
        .collect();
    draw_points(&panels[2], "Accepted test points", x_bounds, &accepted)?;

    root.present()?;
    Ok(())
}

struct Series {
    label: String,
    points: Vec<(f64, f64)>,
}

fn draw_lines<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    x_bounds: (f64, f64),
    series: &[Series],
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let y_bounds = padded_bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
    let mut chart = build_chart(area, title, x_bounds, y_bounds)?;

    for (i, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_points<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    x_bounds: (f64, f64),
    series: &[Series],
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let y_bounds = padded_bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));
    let mut chart = build_chart(area, title, x_bounds, y_bounds)?;

    for (i, s) in series.iter().enumerate().filter(|(_, s)| !s.points.is_empty()) {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        chart
            .draw_series(
                s.points
                    .iter()
                    .map(move |&(x, y)| Circle::new((x, y), 3, color.mix(0.7).filled())),
            )?
            .label(s.label.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn build_chart<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, plotters::coord::Shift>,
    title: &str,
    x_bounds: (f64, f64),
    y_bounds: (f64, f64),
) -> Result<
    ChartContext<'a, DB, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>,
    Box<dyn Error>,
>
where
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_bounds.0..x_bounds.1, y_bounds.0..y_bounds.1)?;

    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc("y")
        .x_labels(8)
        .y_labels(6)
        .draw()?;

    Ok(chart)
}

fn sorted_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

fn points_for(run: &RunFile, candidate: CurveId) -> Vec<(f64, f64)> {
    run.results
        .iter()
        .filter(|r| r.candidate == candidate)
        .map(|r| (r.x, r.y))
        .collect()
}

/// Finite min/max with 5% padding; falls back to `[0, 1]`.
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(0.5);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassificationResult, PairSamples, Selection};

    fn id(n: u16) -> CurveId {
        CurveId::new(n).unwrap()
    }

    #[test]
    fn bounds_are_padded_and_fall_back() {
        assert_eq!(padded_bounds([0.0, 10.0].into_iter()), (-0.5, 10.5));
        assert_eq!(padded_bounds(std::iter::empty()), (0.0, 1.0));
        assert_eq!(padded_bounds([f64::NAN].into_iter()), (0.0, 1.0));
    }

    #[test]
    fn writes_svg_file() {
        let run = RunFile {
            tool: "cm".to_string(),
            generated_at: chrono::Utc::now(),
            selection: Selection::from_pairs(vec![]),
            pairs: vec![PairSamples {
                reference: id(1),
                candidate: id(5),
                x: vec![2.0, 0.0, 1.0],
                reference_y: vec![4.0, 0.0, 1.0],
                candidate_y: vec![4.1, 0.1, 1.1],
            }],
            results: vec![ClassificationResult { x: 1.0, y: 1.2, candidate: id(5), deviation: 0.1 }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.svg");
        write_run_svg(&path, &run, 600, 900).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Selected candidates"));
    }
}
