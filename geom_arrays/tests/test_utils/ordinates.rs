use geom_arrays::{array::PointArray, core::math::Vector2, core::traits::FuzzyEq};

/// Fuzzy compare two ordinate slices.
pub fn ordinates_fuzzy_eq_eps(a: &[f64], b: &[f64], eps: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.fuzzy_eq_eps(*y, eps))
}

/// Panics with both slices printed if they are not fuzzy equal.
pub fn assert_ordinates_fuzzy_eq(a: &[f64], b: &[f64], eps: f64) {
    assert!(
        ordinates_fuzzy_eq_eps(a, b, eps),
        "ordinates differ\n  left: {a:?}\n right: {b:?}"
    );
}

/// Points along a sine wave, `count` points spaced `step` apart on x.
pub fn wave(count: usize, step: f64) -> PointArray {
    PointArray::from_points((0..count).map(|i| {
        let x = i as f64 * step;
        Vector2::new(x, (x * 0.25).sin() * 10.0)
    }))
}

/// Ordinates of `array` kept by decimation at `resolution_squared`, computed point by point.
pub fn decimate_naive(array: &PointArray, resolution_squared: f64) -> Vec<f64> {
    let mut result = Vec::new();
    let mut last: Option<Vector2<f64>> = None;
    for p in array.points() {
        let keep = match last {
            Some(l) => resolution_squared <= 0.0 || p.dist_squared(l) >= resolution_squared,
            None => true,
        };
        if keep {
            result.push(p.x);
            result.push(p.y);
            last = Some(p);
        }
    }
    result
}

/// Points along a parabola with both ordinates increasing, so the distance from any point only
/// grows along the curve.
pub fn ramp(count: usize, step: f64) -> PointArray {
    PointArray::from_points((0..count).map(|i| {
        let x = i as f64 * step;
        Vector2::new(x, 0.05 * x * x)
    }))
}
