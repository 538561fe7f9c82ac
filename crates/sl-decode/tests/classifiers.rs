//! Every catalog classifier on well-separated synthetic blobs.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sl_core::{ClassifierKind, ClassifierTemplate};
use sl_decode::{CatalogTemplate, accuracy};

const ALL: [ClassifierKind; 6] = [
    ClassifierKind::SvcLinear,
    ClassifierKind::SvcRbf,
    ClassifierKind::Lda,
    ClassifierKind::Gbc,
    ClassifierKind::Gnb,
    ClassifierKind::Knn,
];

/// Two blobs of `n_per_class` points in `p` dimensions, centred at -1 and +1.
fn blobs(n_per_class: usize, p: usize, seed: u64) -> (DMatrix<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = 2 * n_per_class;
    let y: Vec<usize> = (0..n).map(|i| i % 2).collect();
    let x = DMatrix::from_fn(n, p, |r, _| {
        let centre = if y[r] == 1 { 1.0 } else { -1.0 };
        centre + rng.random_range(-0.3..0.3)
    });
    (x, y)
}

#[test]
fn catalog_separates_blobs() {
    let (x_train, y_train) = blobs(15, 4, 1);
    let (x_test, y_test) = blobs(10, 4, 2);
    for kind in ALL {
        let mut clf = CatalogTemplate::new(kind, 21).instantiate();
        clf.fit(&x_train, &y_train).unwrap();
        let pred = clf.predict(&x_test).unwrap();
        assert_eq!(accuracy(&y_test, &pred).unwrap(), 1.0, "{kind}");
    }
}

#[test]
fn more_voxels_than_trials() {
    // Typical searchlight regime: a 33-voxel sphere, a dozen training trials.
    let (x_train, y_train) = blobs(6, 33, 3);
    let (x_test, y_test) = blobs(4, 33, 4);
    for kind in ALL {
        let mut clf = CatalogTemplate::new(kind, 21).instantiate();
        clf.fit(&x_train, &y_train).unwrap();
        let pred = clf.predict(&x_test).unwrap();
        assert_eq!(accuracy(&y_test, &pred).unwrap(), 1.0, "{kind}");
    }
}

#[test]
fn single_class_training_fold_is_rejected() {
    let x = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
    for kind in [ClassifierKind::SvcLinear, ClassifierKind::SvcRbf, ClassifierKind::Lda, ClassifierKind::Gbc, ClassifierKind::Gnb] {
        let mut clf = CatalogTemplate::new(kind, 21).instantiate();
        assert!(clf.fit(&x, &[1, 1, 1]).is_err(), "{kind}");
    }
}

#[test]
fn fitting_is_deterministic() {
    let (x_train, y_train) = blobs(8, 3, 5);
    let (x_test, _) = blobs(8, 3, 6);
    for kind in ALL {
        let template = CatalogTemplate::new(kind, 21);
        let mut a = template.instantiate();
        let mut b = template.instantiate();
        a.fit(&x_train, &y_train).unwrap();
        b.fit(&x_train, &y_train).unwrap();
        assert_eq!(a.predict(&x_test).unwrap(), b.predict(&x_test).unwrap(), "{kind}");
    }
}
