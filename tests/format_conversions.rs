//! Integration tests for layout conversions and interop with external libraries

use semiring_saxpy::utils::{from_sprs, to_sprs};
use semiring_saxpy::{
    multiply, multiply_with_config, plus_times, FormatControl, Matrix, MultiplyConfig,
    OptionField, OptionValue, Orientation, Sparsity, SparsityControl,
};

/// Creates a test matrix with a specific pattern
fn create_test_matrix() -> Matrix<f64> {
    // Create a 5x5 matrix with a specific pattern:
    // [ 1.0  0.0  2.0  0.0  0.0 ]
    // [ 0.0  3.0  0.0  0.0  4.0 ]
    // [ 0.0  0.0  5.0  0.0  0.0 ]
    // [ 6.0  0.0  0.0  7.0  0.0 ]
    // [ 0.0  0.0  8.0  0.0  9.0 ]
    Matrix::from_csr(
        5,
        5,
        vec![0, 2, 4, 5, 7, 9],
        vec![0, 2, 1, 4, 2, 0, 3, 2, 4],
        vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
    )
    .unwrap()
}

#[test]
fn test_to_sprs_conversion() {
    let m = create_test_matrix();

    // A by-row matrix exports as CSR
    let sprs_mat = to_sprs(&m).unwrap();
    assert_eq!(sprs_mat.rows(), 5);
    assert_eq!(sprs_mat.cols(), 5);
    assert_eq!(sprs_mat.nnz(), m.nvals());
    assert!(sprs_mat.is_csr());

    // Verify values by checking a few specific elements
    assert_eq!(sprs_mat.get(0, 0), Some(&1.0));
    assert_eq!(sprs_mat.get(0, 2), Some(&2.0));
    assert_eq!(sprs_mat.get(1, 1), Some(&3.0));
    assert_eq!(sprs_mat.get(4, 4), Some(&9.0));

    // Check that zeros are really zeros
    assert_eq!(sprs_mat.get(0, 1), None);
    assert_eq!(sprs_mat.get(2, 3), None);

    let by_col = m.to_orientation(Orientation::ByCol).unwrap();
    let csc = to_sprs(&by_col).unwrap();
    assert!(csc.is_csc());
    assert_eq!(csc.get(3, 0), Some(&6.0));
}

#[test]
fn test_sprs_roundtrip_in_both_orientations() {
    let m = create_test_matrix();

    let back = from_sprs(to_sprs(&m).unwrap()).unwrap();
    assert_eq!(back.orientation(), Orientation::ByRow);
    assert_eq!(back, m);

    let csc = to_sprs(&m).unwrap().to_csc();
    let back = from_sprs(csc).unwrap();
    assert_eq!(back.orientation(), Orientation::ByCol);
    assert_eq!(back, m);
}

#[test]
fn test_product_matches_sprs() {
    let m = create_test_matrix();
    let ours = multiply(&m, &m, &plus_times(), None).unwrap();

    let s = to_sprs(&m).unwrap();
    let theirs = &s * &s;
    assert_eq!(from_sprs(theirs).unwrap(), ours);
}

#[test]
fn test_every_layout_preserves_content() {
    // Every row and column of the 5x5 holds an entry, so it has no
    // hypersparse form; pad it with an empty row and column
    let base = create_test_matrix();
    assert!(base.convert(Sparsity::Hypersparse).is_err());
    let m = Matrix::from_triplets(6, 6, &base.to_triplets()).unwrap();
    let dense = m.to_dense(0.0);

    for orientation in [Orientation::ByRow, Orientation::ByCol] {
        let m = m.to_orientation(orientation).unwrap();
        for layout in [Sparsity::Sparse, Sparsity::Hypersparse, Sparsity::Bitmap] {
            let converted = m.convert(layout).unwrap();
            assert_eq!(converted.sparsity(), layout);
            assert_eq!(converted.orientation(), orientation);
            assert_eq!(converted.nvals(), 9);
            assert_eq!(converted.to_dense(0.0), dense);
            assert_eq!(converted, m);
            assert!(converted.validate().is_ok());
        }
        // Not every position is present
        assert!(m.convert(Sparsity::Full).is_err());
    }
}

#[test]
fn test_full_matrix_roundtrip() {
    let dense = ndarray::arr2(&[[1, 2, 3], [4, 5, 6]]);
    let m = Matrix::from_dense(&dense);

    // No vector is empty
    assert!(m.convert(Sparsity::Hypersparse).is_err());

    for layout in [Sparsity::Sparse, Sparsity::Bitmap, Sparsity::Full] {
        let converted = m.convert(layout).unwrap();
        assert_eq!(converted.to_dense(0), dense);
        let by_row = converted.to_orientation(Orientation::ByRow).unwrap();
        assert_eq!(by_row.sparsity(), layout);
        assert_eq!(by_row.to_dense(0), dense);
    }
}

#[test]
fn test_output_format_control() {
    let m = create_test_matrix();

    // 25 positions, squared pattern is dense enough for a bitmap
    let c = multiply(&m, &m, &plus_times(), None).unwrap();
    assert_eq!(c.sparsity(), Sparsity::Bitmap);

    let config = MultiplyConfig {
        output_control: FormatControl::with_sparsity(SparsityControl::SPARSE),
        ..MultiplyConfig::default()
    };
    let c = multiply_with_config(&m, &m, &plus_times(), None, &config).unwrap();
    assert_eq!(c.sparsity(), Sparsity::Sparse);
    assert_eq!(c.option_i32(OptionField::SparsityControl).unwrap(), 2);
    assert_eq!(c.option(OptionField::IsHyper), OptionValue::Bool(false));
}

#[test]
fn test_hypersparse_output() {
    // One non-empty column out of 100
    let a = Matrix::from_triplets(100, 100, &[(3, 0, 1.0), (4, 0, 2.0)]).unwrap();
    let b = Matrix::from_triplets(100, 100, &[(0, 50, 1.0)]).unwrap();
    let c = multiply(&a, &b, &plus_times(), None).unwrap();

    assert_eq!(c.sparsity(), Sparsity::Hypersparse);
    assert_eq!(c.option(OptionField::IsHyper), OptionValue::Bool(true));
    assert_eq!(c.get(4, 50), Some(2.0));
    assert_eq!(c.nonempty_vectors(), 1);
}

#[test]
fn test_hypersparse_output_leaves_a_vector_out() {
    // Every column is non-empty, so even hyper_switch 1.0 must keep it sparse
    let control =
        FormatControl::new(SparsityControl::HYPERSPARSE | SparsityControl::SPARSE, 1.0, 0.1).unwrap();
    let config = MultiplyConfig {
        output_control: control,
        ..MultiplyConfig::with_threads(2)
    };
    let eye = Matrix::identity(4, 1.0);
    let c = multiply_with_config(&eye, &eye, &plus_times(), None, &config).unwrap();
    assert_eq!(c.sparsity(), Sparsity::Sparse);
    assert!(c.validate().is_ok());
    assert_eq!(c, eye);

    // Dropping the last column makes hypersparse reachable
    let triplets: Vec<_> = eye.to_triplets().into_iter().filter(|&(_, j, _)| j != 3).collect();
    let b = Matrix::from_triplets(4, 4, &triplets).unwrap();
    let c = multiply_with_config(&eye, &b, &plus_times(), None, &config).unwrap();
    assert_eq!(c.sparsity(), Sparsity::Hypersparse);
    assert!(c.validate().is_ok());
    assert_eq!(c.nonempty_vectors(), 3);
}

#[test]
fn test_option_getters() {
    let control = FormatControl::new(SparsityControl::HYPERSPARSE | SparsityControl::SPARSE, 0.5, 0.2)
        .unwrap();
    let m = create_test_matrix().with_control(control);

    assert_eq!(m.option_f64(OptionField::HyperSwitch).unwrap(), 0.5);
    assert_eq!(m.option_f64(OptionField::BitmapSwitch).unwrap(), 0.2);
    assert_eq!(m.option_i32(OptionField::SparsityControl).unwrap(), 3);
    assert_eq!(m.option_i32(OptionField::Format).unwrap(), 0);
    assert!(m.option_i32(OptionField::BitmapSwitch).is_err());

    assert!(FormatControl::new(SparsityControl::AUTO, 1.5, 0.1).is_err());
    assert!(FormatControl::new(SparsityControl::AUTO, 0.1, f64::NAN).is_err());
}
