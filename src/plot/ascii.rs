//! ASCII plotting of spectra for terminal output and diagnostic files.
//!
//! Fixed-size character grid, deterministic output.
//!
//! Plot elements:
//! - smoothed model spectrum: `-` line
//! - model rebinned onto a dataset: `*`
//! - observed flux (after flux scaling): `o`

/// One dataset drawn on top of the model curve.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumOverlay<'a> {
    pub wavelength: &'a [f64],
    pub observed: &'a [f64],
    pub model: &'a [f64],
}

/// Render the model curve and the dataset overlays.
///
/// The wavelength axis spans the overlays when present, otherwise the curve.
pub fn render_spectrum_plot(
    model_curve: &[(f64, f64)],
    overlays: &[SpectrumOverlay<'_>],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let overlay_x = overlays.iter().flat_map(|o| o.wavelength.iter().copied());
    let (x_min, x_max) = finite_range(overlay_x)
        .or_else(|| finite_range(model_curve.iter().map(|&(x, _)| x)))
        .unwrap_or((0.0, 1.0));

    let curve: Vec<(f64, f64)> = model_curve
        .iter()
        .copied()
        .filter(|&(x, y)| x >= x_min && x <= x_max && y.is_finite())
        .collect();

    let overlay_y = overlays
        .iter()
        .flat_map(|o| o.observed.iter().chain(o.model.iter()).copied());
    let curve_y = curve.iter().map(|&(_, y)| y);
    let (y_min, y_max) = finite_range(overlay_y.chain(curve_y)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    draw_curve(&mut grid, &curve, x_min, x_max, y_min, y_max);

    for o in overlays {
        for (&x, &y) in o.wavelength.iter().zip(o.model) {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = '*';
        }
    }
    for o in overlays {
        for (&x, &y) in o.wavelength.iter().zip(o.observed) {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: wavelength=[{x_min:.3}, {x_max:.3}] um | flux=[{y_min:.3e}, {y_max:.3e}] W m-2 um-1\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
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
    let pad = (span * frac).max(1e-300);
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
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            if (c0, r0) != (col, row) {
                draw_line(grid, c0, r0, col, row, '-');
            }
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham).
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
