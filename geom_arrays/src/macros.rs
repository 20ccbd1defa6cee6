/// Macro used for test assertions.
#[doc(hidden)]
#[macro_export]
macro_rules! assert_fuzzy_eq {
    ($left:expr, $right:expr) => {{
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(left_val.fuzzy_eq(*right_val)) {
                    panic!(
                        r#"assertion failed: `left.fuzzy_eq(right)`
  left: `{:?}`,
 right: `{:?}`"#,
                        &*left_val, &*right_val
                    )
                }
            }
        }
    }};
    ($left:expr, $right:expr, $eps:expr) => {{
        match (&$left, &$right, &$eps) {
            (left_val, right_val, eps_val) => {
                if !(left_val.fuzzy_eq_eps(*right_val, *eps_val)) {
                    panic!(
                        r#"assertion failed: `left.fuzzy_eq_eps(right, eps)`
  left: `{:?}`,
 right: `{:?}`
 eps: `{:?}`"#,
                        &*left_val, &*right_val, &*eps_val
                    )
                }
            }
        }
    }};
}

/// Construct a live [PointArray](crate::array::PointArray) from a list of (x, y) tuples.
///
/// # Examples
///
/// ```
/// # use geom_arrays::points;
/// # use geom_arrays::core::math::vec2;
/// let array = points![(0.0, 1.0), (2.0, 0.0)];
/// assert_eq!(array.len(), 2);
/// assert!(!array.is_final());
/// assert_eq!(array.get(1), Ok(vec2(2.0, 0.0)));
/// ```
#[macro_export]
macro_rules! points {
    ($( $p:expr ),* $(,)?) => {
        $crate::array::PointArray::from_points([
            $( $crate::core::math::Vector2::<f64>::from($p) ),*
        ])
    };
}
