//! Fruchterman–Reingold spring layout and ring placement.

use rand::Rng;

/// A 2-D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Smallest displacement length used when normalizing a move.
const MIN_STEP: f64 = 0.01;

/// Smallest distance between two nodes when computing forces.
const MIN_DIST: f64 = 0.01;

/// Parameters for one spring layout run.
#[derive(Debug, Clone, Copy)]
pub struct SpringParams {
    /// Optimal node distance; `None` uses `1 / sqrt(n)`.
    pub k: Option<f64>,
    pub iterations: usize,
    /// Largest absolute coordinate after rescaling.
    pub scale: f64,
    pub center: Point,
}

/// Lay out `n` nodes connected by weighted `edges` (local indices).
///
/// Positions start uniformly random in the unit square, then move under
/// repulsion `k²/d` between every pair and attraction `w·d²/k` along edges,
/// with a linearly cooling step. The result is centred on `params.center`
/// and rescaled so the farthest coordinate sits at `params.scale`.
pub fn spring_layout<R: Rng>(
    n: usize,
    edges: &[(usize, usize, f64)],
    params: SpringParams,
    rng: &mut R,
) -> Vec<Point> {
    match n {
        0 => return Vec::new(),
        1 => return vec![params.center],
        _ => {}
    }

    let mut pos: Vec<Point> = (0..n)
        .map(|_| Point::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect();
    let k = params.k.unwrap_or_else(|| 1.0 / (n as f64).sqrt());

    let mut temperature = 0.1;
    let cooling = temperature / (params.iterations as f64 + 1.0);
    let mut disp = vec![Point::default(); n];

    for _ in 0..params.iterations {
        disp.iter_mut().for_each(|d| *d = Point::default());

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DIST);
                let f = k * k / (dist * dist);
                disp[i].x += dx * f;
                disp[i].y += dy * f;
                disp[j].x -= dx * f;
                disp[j].y -= dy * f;
            }
        }

        for &(u, v, w) in edges {
            if u == v {
                continue;
            }
            let dx = pos[u].x - pos[v].x;
            let dy = pos[u].y - pos[v].y;
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DIST);
            let f = w * dist / k;
            disp[u].x -= dx * f;
            disp[u].y -= dy * f;
            disp[v].x += dx * f;
            disp[v].y += dy * f;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let len = (d.x * d.x + d.y * d.y).sqrt().max(MIN_STEP);
            p.x += d.x * temperature / len;
            p.y += d.y * temperature / len;
        }
        temperature -= cooling;
    }

    rescale(&mut pos, params.scale, params.center);
    pos
}

/// Centre `pos` on the origin, stretch to `scale`, then shift to `center`.
fn rescale(pos: &mut [Point], scale: f64, center: Point) {
    let n = pos.len() as f64;
    let mx = pos.iter().map(|p| p.x).sum::<f64>() / n;
    let my = pos.iter().map(|p| p.y).sum::<f64>() / n;
    let extent = pos
        .iter()
        .map(|p| (p.x - mx).abs().max((p.y - my).abs()))
        .fold(0.0_f64, f64::max);
    let factor = if extent > 0.0 { scale / extent } else { 0.0 };
    for p in pos.iter_mut() {
        p.x = (p.x - mx) * factor + center.x;
        p.y = (p.y - my) * factor + center.y;
    }
}

/// `n` evenly spaced points on a circle, starting at angle zero.
pub fn ring(n: usize, radius: f64, center: Point) -> Vec<Point> {
    if n == 1 {
        return vec![center];
    }
    (0..n)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            Point::new(
                center.x + radius * theta.cos(),
                center.y + radius * theta.sin(),
            )
        })
        .collect()
}
