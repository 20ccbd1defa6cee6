mod test_utils;

use geom_arrays::{
    array::{CompressionLevel, OrdinateIter, PointArray, PointIterator},
    core::math::vec2,
    points, ArrayError,
};
use test_utils::wave;

fn backends(array: &PointArray) -> Vec<PointArray> {
    vec![
        array.clone(),
        array.get_final(None).unwrap(),
        array
            .get_final(Some(CompressionLevel::DirectAsFloats))
            .unwrap(),
        array
            .get_final(Some(CompressionLevel::RelativeAsBytes))
            .unwrap(),
    ]
}

#[test]
fn next_x_then_next_y_drains() {
    let array = wave(17, 0.5);
    for backend in backends(&array) {
        let mut iter = backend.iter();
        let mut count = 0;
        while iter.has_next() {
            iter.next_x().unwrap();
            iter.next_y().unwrap();
            count += 1;
        }
        assert_eq!(count, 17);
        assert_eq!(iter.remaining(), 0);
        assert_eq!(iter.next_x(), Err(ArrayError::Exhausted));
    }
}

#[test]
fn ordering_is_checked() {
    let array = points![(1.0, 2.0), (3.0, 4.0)];
    for backend in backends(&array) {
        let mut iter = backend.iter();
        assert_eq!(
            iter.next_y(),
            Err(ArrayError::IteratorOrder { expected: "next_x" })
        );
        assert_eq!(iter.next_x(), Ok(1.0));
        assert_eq!(
            iter.next_x(),
            Err(ArrayError::IteratorOrder { expected: "next_y" })
        );
        // a point whose x was read is still pending
        assert!(iter.has_next());
        assert_eq!(iter.next_y(), Ok(2.0));
        assert_eq!(iter.next_pair(), Ok(vec2(3.0, 4.0)));
        assert!(!iter.has_next());
    }
}

#[test]
fn clones_advance_independently() {
    let array = wave(12, 1.0);
    for backend in backends(&array) {
        let mut iter = backend.iter();
        for _ in 0..5 {
            iter.next_pair().unwrap();
        }
        let fork = iter.clone();
        let rest_of_original: Vec<_> = iter.clone().points().collect();

        // advancing the original does not move the fork
        for _ in 0..3 {
            iter.next_pair().unwrap();
        }
        let rest_of_fork: Vec<_> = fork.points().collect();
        assert_eq!(rest_of_fork.len(), 7);
        assert_eq!(rest_of_fork, rest_of_original);
        assert_eq!(iter.remaining(), 4);
    }
}

#[test]
fn remove_is_unsupported() {
    let array = points![(0.0, 0.0)];
    let mut iter = array.iter();
    assert!(matches!(iter.remove(), Err(ArrayError::Unsupported { .. })));

    let ordinates = [0.0, 0.0];
    let mut iter = OrdinateIter::new(&ordinates);
    assert!(matches!(iter.remove(), Err(ArrayError::Unsupported { .. })));
}

#[test]
fn iterator_from_index_matches_get() {
    let array = wave(30, 0.3);
    for backend in backends(&array) {
        for start in [0, 1, 13, 29, 30] {
            let points: Vec<_> = backend.iterator(start).unwrap().points().collect();
            assert_eq!(points.len(), 30 - start);
            for (i, p) in points.into_iter().enumerate() {
                assert_eq!(Ok(p), backend.get(start + i));
            }
        }
    }
}

#[test]
fn points_adaptor_size_hint() {
    let array = wave(9, 1.0);
    let mut points = array.points();
    assert_eq!(points.len(), 9);
    points.next();
    assert_eq!(points.size_hint(), (8, Some(8)));
    assert_eq!(points.count(), 8);
}

#[test]
fn byte_delta_views_iterate_from_their_start() {
    let array = wave(50, 0.2)
        .get_final(Some(CompressionLevel::RelativeAsBytes))
        .unwrap();
    let view = array.subarray(20, 35).unwrap().unwrap();
    let from_view: Vec<_> = view.points().collect();
    let from_parent: Vec<_> = array.iterator(20).unwrap().points().take(15).collect();
    assert_eq!(from_view, from_parent);
}
