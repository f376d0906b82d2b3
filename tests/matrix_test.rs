// Unit tests for Matrix module

use distmatmul::matrix::{Matrix, EPSILON};
use distmatmul::Error;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn test_matrix_creation() {
    let m = Matrix::new(3, 4);
    assert_eq!(m.rows, 3);
    assert_eq!(m.cols, 4);
    assert_eq!(m.data.len(), 12);
}

#[test]
fn test_matrix_from_vec() {
    let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let m = Matrix::from_vec(data.clone(), 2, 3).unwrap();
    assert_eq!(m.rows, 2);
    assert_eq!(m.cols, 3);
    assert_eq!(m.data, data);
    assert!(Matrix::from_vec(data, 4, 2).is_err());
}

#[test]
fn test_multiply() {
    let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
    let b = Matrix::from_vec(vec![5.0, 6.0, 7.0, 8.0], 2, 2).unwrap();
    let c = a.multiply(&b).unwrap();

    // [1 2]   [5 6]   [19 22]
    // [3 4] * [7 8] = [43 50]
    assert_eq!(c.data, vec![19.0, 22.0, 43.0, 50.0]);
}

#[test]
fn test_multiply_rectangular() {
    // [1 2 3]   [7  8 ]   [58  64 ]
    // [4 5 6] * [9  10] = [139 154]
    //           [11 12]
    let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
    let b = Matrix::from_vec(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], 3, 2).unwrap();
    let c = a.multiply(&b).unwrap();
    assert_eq!((c.rows, c.cols), (2, 2));
    assert_eq!(c.data, vec![58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn test_multiply_incompatible_dimensions() {
    let a = Matrix::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
    let b = Matrix::from_vec(vec![1.0, 2.0, 3.0], 3, 1).unwrap();
    assert!(matches!(
        a.multiply(&b),
        Err(Error::IncompatibleDimensions {
            lhs_cols: 2,
            rhs_rows: 3,
            ..
        })
    ));
}

#[test]
fn test_multiply_identity() {
    let size = 5;
    let mut identity = Matrix::new(size, size);
    for i in 0..size {
        identity.set(i, i, 1.0).unwrap();
    }

    let data: Vec<f32> = (0..size * size).map(|x| x as f32).collect();
    let m = Matrix::from_vec(data, size, size).unwrap();

    assert_eq!(m.multiply(&identity).unwrap(), m);
}

#[test]
fn test_all_ones_product() {
    let mut ones = Matrix::new(4, 4);
    ones.fill(1.0);
    let c = ones.multiply(&ones).unwrap();
    assert!(c.data.iter().all(|&v| v == 4.0));
}

#[test]
fn test_get_set() {
    let mut m = Matrix::new(3, 3);
    m.set(1, 2, 42.0).unwrap();
    assert_eq!(m.get(1, 2).unwrap(), 42.0);
    assert_eq!(m.at(1, 2), 42.0);
    assert_eq!(m.get(0, 0).unwrap(), 0.0);

    *m.at_mut(2, 0) = 7.0;
    assert_eq!(m.get(2, 0).unwrap(), 7.0);
}

#[test]
fn test_get_set_out_of_bounds() {
    let mut m = Matrix::new(3, 3);
    assert!(m.get(3, 0).is_err());
    assert!(m.get(0, 3).is_err());
    assert!(m.set(3, 0, 1.0).is_err());
    assert!(m.set(0, 3, 1.0).is_err());
}

#[test]
fn test_row_chunk() {
    // 6x4 matrix holding 1..=24
    let data: Vec<f32> = (1..=24).map(|x| x as f32).collect();
    let matrix = Matrix::from_vec(data, 6, 4).unwrap();

    let chunk = matrix.row_chunk(2, 2).unwrap();
    assert_eq!((chunk.rows, chunk.cols), (2, 4));
    assert_eq!(chunk.get(0, 0).unwrap(), 9.0);
    assert_eq!(chunk.data, matrix.row_slice(2, 2));

    assert!(matrix.row_chunk(5, 2).is_err());
}

#[test]
fn test_serial_equals_itself_on_random_operands() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut a = Matrix::new(30, 20);
    let mut b = Matrix::new(20, 10);
    a.fill_random(&mut rng, 0..10);
    b.fill_random(&mut rng, 0..10);

    let c1 = a.multiply(&b).unwrap();
    let c2 = a.multiply(&b).unwrap();
    assert!(c1.equal(&c2, EPSILON));
}
