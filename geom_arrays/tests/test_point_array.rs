mod test_utils;

use geom_arrays::{
    array::{ArrayData, CompressionLevel, CrsTag, DecimationSource, PointArray, PointIterator},
    assert_fuzzy_eq,
    core::{math::vec2, traits::FuzzyEq},
    points, ArrayError,
};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};
use test_utils::{decimate_naive, ramp, wave};

fn hash_of(array: &PointArray) -> u64 {
    let mut hasher = DefaultHasher::new();
    array.hash(&mut hasher);
    hasher.finish()
}

fn square() -> PointArray {
    points![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
}

#[test]
fn construction_and_parity() {
    let empty = PointArray::new();
    assert!(empty.is_empty());
    assert_eq!(empty.len(), 0);
    assert_eq!(empty.to_vec().len(), 0);

    let array = PointArray::from_ordinates(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array.to_vec().len(), 2 * array.len());

    assert_eq!(
        PointArray::from_ordinates(vec![1.0, 2.0, 3.0]).unwrap_err(),
        ArrayError::BadRange {
            lower: 0,
            upper: 3,
            len: 3
        }
    );

    let edited = array
        .insert_at(1, &square(), true)
        .unwrap()
        .reverse()
        .insert_at(0, &points![(9.0, 9.0)], false)
        .unwrap();
    assert_eq!(edited.len(), 7);
    assert_eq!(edited.to_vec().len(), 14);
}

#[test]
fn get_and_iterator_bounds() {
    let array = square();
    assert_eq!(array.get(2), Ok(vec2(1.0, 1.0)));
    assert_eq!(
        array.get(4),
        Err(ArrayError::IndexOutOfBounds { index: 4, len: 4 })
    );

    // end iterator is valid and empty
    let end = array.iterator(4).unwrap();
    assert!(!end.has_next());
    assert_eq!(end.remaining(), 0);
    assert_eq!(
        array.iterator(5).unwrap_err(),
        ArrayError::IndexOutOfBounds { index: 5, len: 4 }
    );

    let mut from_two = array.iterator(2).unwrap();
    assert_eq!(from_two.next_pair(), Ok(vec2(1.0, 1.0)));
    assert_eq!(from_two.next_pair(), Ok(vec2(0.0, 1.0)));
    assert!(!from_two.has_next());
}

#[test]
fn set_only_on_live_arrays() {
    let mut live = square();
    live.set(1, vec2(5.0, 6.0)).unwrap();
    assert_eq!(live.get(1), Ok(vec2(5.0, 6.0)));
    assert_eq!(
        live.set(4, vec2(0.0, 0.0)),
        Err(ArrayError::IndexOutOfBounds { index: 4, len: 4 })
    );

    let mut finalized = live.get_final(None).unwrap();
    assert!(matches!(
        finalized.set(0, vec2(1.0, 1.0)),
        Err(ArrayError::Unsupported { .. })
    ));
    assert!(matches!(
        finalized.push(vec2(1.0, 1.0)),
        Err(ArrayError::Unsupported { .. })
    ));

    // live array keeps its own copy after finalizing
    live.push(vec2(7.0, 7.0)).unwrap();
    assert_eq!(live.len(), 5);
    assert_eq!(finalized.len(), 4);
}

#[test]
fn subarray_shares_and_empty_is_none() {
    let array = wave(20, 1.0).get_final(None).unwrap();
    assert_eq!(array.subarray(3, 3), Ok(None));
    assert_eq!(
        array.subarray(4, 2).unwrap_err(),
        ArrayError::BadRange {
            lower: 4,
            upper: 2,
            len: 20
        }
    );
    assert!(array.subarray(0, 21).is_err());

    let sub = array.subarray(5, 9).unwrap().unwrap();
    assert_eq!(sub.len(), 4);
    assert!(sub.is_final());
    for i in 0..4 {
        assert_eq!(sub.get(i), array.get(i + 5));
    }

    let nested = sub.subarray(1, 3).unwrap().unwrap();
    assert_eq!(nested.to_vec(), array.subarray(6, 8).unwrap().unwrap().to_vec());
}

#[test]
fn insert_at_with_reverse() {
    let base = points![(0.0, 0.0), (10.0, 0.0)];
    let other = points![(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];

    let forward = base.clone().insert_at(1, &other, false).unwrap();
    assert_eq!(
        forward.to_vec(),
        vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 10.0, 0.0]
    );

    let reversed = base.clone().insert_at(1, &other, true).unwrap();
    assert_eq!(
        reversed.to_vec(),
        vec![0.0, 0.0, 3.0, 3.0, 2.0, 2.0, 1.0, 1.0, 10.0, 0.0]
    );

    let appended = base.clone().insert_at(2, &other, false).unwrap();
    assert_eq!(appended.get(4), Ok(vec2(3.0, 3.0)));

    assert_eq!(
        base.insert_at(3, &other, false).unwrap_err(),
        ArrayError::IndexOutOfBounds { index: 3, len: 2 }
    );
}

#[test]
fn finalized_arrays_are_not_mutated() {
    let finalized = square().get_final(None).unwrap();
    let before = finalized.to_vec();

    let reversed = finalized.clone().reverse();
    let inserted = finalized
        .clone()
        .insert_at(0, &points![(5.0, 5.0)], false)
        .unwrap();

    assert_eq!(finalized.to_vec(), before);
    assert!(finalized.is_final());
    assert!(!reversed.is_final());
    assert!(!inserted.is_final());
    assert_eq!(reversed.get(0), Ok(vec2(0.0, 1.0)));
    assert_eq!(inserted.len(), 5);

    // views of a finalized array are unaffected by edits of copies
    let view = finalized.subarray(1, 3).unwrap().unwrap();
    let _ = finalized.clone().reverse();
    assert_eq!(view.to_vec(), vec![1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn live_edits_do_not_disturb_views() {
    let live = wave(10, 1.0);
    let view = live.subarray(0, 3).unwrap().unwrap();
    let before = view.to_vec();
    let live = live.reverse();
    assert_eq!(view.to_vec(), before);
    assert_eq!(live.get(9), view.get(0));
}

#[test]
fn get_final_compression_rules() {
    assert!(PointArray::new().get_final(None).is_none());
    assert!(PointArray::new()
        .get_final(Some(CompressionLevel::RelativeAsBytes))
        .is_none());

    let array = points![(0.5, 0.25), (1.5, 2.0), (3.0, -1.0)];
    let plain = array.get_final(None).unwrap();
    assert!(plain.is_final());
    assert_eq!(plain.compression(), None);
    assert_eq!(plain, array);

    let floats = plain
        .get_final(Some(CompressionLevel::DirectAsFloats))
        .unwrap();
    assert_eq!(floats.compression(), Some(CompressionLevel::DirectAsFloats));
    // exactly representable as f32
    assert_eq!(floats, array);

    // never decompressed
    let again = floats.get_final(None).unwrap();
    assert_eq!(again.compression(), Some(CompressionLevel::DirectAsFloats));

    let bytes = floats
        .get_final(Some(CompressionLevel::RelativeAsBytes))
        .unwrap();
    assert_eq!(bytes.compression(), Some(CompressionLevel::RelativeAsBytes));
    assert_eq!(bytes.len(), 3);
    for (a, b) in bytes.points().zip(array.points()) {
        assert_fuzzy_eq!(a, b, 0.05);
    }
}

#[test]
fn round_trip_to_float_array() {
    let array = square().get_final(None).unwrap();
    let mut dest = ArrayData::new();
    array.to_float_array(&mut dest, 0.0);
    assert_eq!(dest.ordinates(), &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    assert_eq!(dest.len(), 4);
    assert_eq!(dest.curves(), &[0]);
}

#[test]
fn decimation_is_monotonic() {
    let array = ramp(500, 0.1);
    let full = {
        let mut dest = ArrayData::new();
        array.to_float_array(&mut dest, 0.0);
        dest.ordinate_len()
    };
    assert_eq!(full, 1000);

    let mut previous = full;
    for resolution in [0.05, 0.2, 0.5, 1.0, 3.0, 10.0] {
        let mut dest = ArrayData::new();
        array.to_float_array(&mut dest, resolution * resolution);
        assert_eq!(dest.ordinates(), &decimate_naive(&array, resolution * resolution)[..]);
        assert!(dest.ordinate_len() <= previous);
        assert!(dest.capacity() >= dest.ordinate_len());
        previous = dest.ordinate_len();
    }

    // negative disables decimation
    let mut dest = ArrayData::new();
    array.to_float_array(&mut dest, -1.0);
    assert_eq!(dest.ordinate_len(), full);
}

#[test]
fn decimation_appends_curves() {
    let arrays = [square(), PointArray::new(), points![(5.0, 5.0), (6.0, 6.0)]];
    let mut dest = ArrayData::new();
    arrays[..].to_float_array(&mut dest, 0.0);
    assert_eq!(dest.len(), 6);
    assert_eq!(dest.curves(), &[0, 4]);
    assert_eq!(arrays[..].point_count(), 6);
    assert_eq!(arrays[..].upper(), 12);
}

#[test]
fn decimation_of_views() {
    let array = wave(100, 0.5).get_final(None).unwrap();
    let view = array.subarray(10, 60).unwrap().unwrap();
    assert_eq!(view.lower(), 20);
    assert_eq!(view.upper(), 120);

    let mut dest = ArrayData::new();
    view.to_float_array(&mut dest, 0.0);
    assert_eq!(dest.ordinates(), &view.to_vec()[..]);
}

#[test]
fn equality_and_hash() {
    let a = points![(0.0, 1.0), (f64::NAN, f64::NAN), (2.0, 3.0)];
    let b = PointArray::from_ordinates(vec![0.0, 1.0, f64::NAN, f64::NAN, 2.0, 3.0]).unwrap();
    // bit exact, NaN included
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let floats = a.get_final(Some(CompressionLevel::DirectAsFloats)).unwrap();
    assert_eq!(floats.compression(), Some(CompressionLevel::DirectAsFloats));
    assert_eq!(hash_of(&a), hash_of(&floats));

    let c = points![(0.0, 1.0), (2.0, 3.0)];
    assert_ne!(a, c);
    let d = points![(0.0, 1.0), (f64::NAN, f64::NAN), (2.0, 3.5)];
    assert_ne!(a, d);
    // same length and first point, weak hash collides
    assert_eq!(hash_of(&a), hash_of(&d));

    // tag is not compared
    let tagged = c.clone().with_crs(Some(CrsTag::new("EPSG:4326")));
    assert_eq!(tagged, c);
}

#[test]
fn byte_compression_falls_back_on_holes() {
    let array = points![(0.0, 0.0), (f64::NAN, f64::NAN), (1.0, 1.0)];
    let finalized = array
        .get_final(Some(CompressionLevel::RelativeAsBytes))
        .unwrap();
    assert_eq!(
        finalized.compression(),
        Some(CompressionLevel::DirectAsFloats)
    );
    assert_eq!(finalized.get(0), Ok(vec2(0.0, 0.0)));
    assert!(!finalized.get(1).unwrap().is_finite());
    assert_eq!(finalized.get(2), Ok(vec2(1.0, 1.0)));
}

#[test]
fn crs_tag_is_carried() {
    let tag = CrsTag::new("EPSG:3857");
    let array = square().with_crs(Some(tag.clone()));
    assert_eq!(array.crs(), Some(&tag));
    assert_eq!(tag.to_string(), "EPSG:3857");

    let finalized = array
        .get_final(Some(CompressionLevel::RelativeAsBytes))
        .unwrap();
    assert_eq!(finalized.crs(), Some(&tag));
    assert_eq!(finalized.subarray(0, 2).unwrap().unwrap().crs(), Some(&tag));
    assert_eq!(finalized.reverse().crs(), Some(&tag));

    assert_eq!(square().crs(), None);
}

#[test]
fn shared_buffer_views() {
    let buffer = Arc::new(vec![9.0, 9.0, 0.0, 0.0, 1.0, 2.0, 9.0]);
    let view = PointArray::from_shared(Arc::clone(&buffer), 2, 6).unwrap();
    assert!(view.is_final());
    assert_eq!(view.to_vec(), vec![0.0, 0.0, 1.0, 2.0]);

    assert_eq!(
        PointArray::from_shared(Arc::clone(&buffer), 2, 5).unwrap_err(),
        ArrayError::BadRange {
            lower: 2,
            upper: 5,
            len: 7
        }
    );
    assert!(PointArray::from_shared(Arc::clone(&buffer), 4, 2).is_err());
    assert!(PointArray::from_shared(buffer, 2, 8).is_err());
}

#[test]
fn bounds_skip_holes() {
    let array = points![(1.0, 5.0), (f64::NAN, 0.0), (-2.0, 3.0), (4.0, f64::INFINITY)];
    let bounds = array.bounds().unwrap();
    assert!(bounds.min_x.fuzzy_eq(-2.0));
    assert!(bounds.min_y.fuzzy_eq(3.0));
    assert!(bounds.max_x.fuzzy_eq(1.0));
    assert!(bounds.max_y.fuzzy_eq(5.0));

    assert!(PointArray::new().bounds().is_none());
    assert!(points![(f64::NAN, f64::NAN)].bounds().is_none());
}

#[test]
fn memory_usage_reflects_compression() {
    let array = wave(1000, 0.1);
    let dense = array.get_final(None).unwrap().memory_usage();
    let floats = array
        .get_final(Some(CompressionLevel::DirectAsFloats))
        .unwrap()
        .memory_usage();
    let bytes = array
        .get_final(Some(CompressionLevel::RelativeAsBytes))
        .unwrap()
        .memory_usage();
    assert!(floats < dense);
    assert!(bytes < floats);
}
