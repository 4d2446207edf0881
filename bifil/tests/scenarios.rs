//! End-to-end scenarios: build a complex, index it, slice it.

use bifil::{
    fields::{NonZeroCoefficient, Z2, Z3},
    rips::{build_rips_tree, RipsParams},
    Axis, BifilError, MultiIndex, SimplexTree,
};
use ordered_float::NotNan;

fn nn(x: f64) -> NotNan<f64> {
    NotNan::new(x).unwrap()
}

fn integer_grid(n_times: usize, n_dists: usize) -> SimplexTree {
    let mut tree = SimplexTree::new();
    for t in 0..n_times {
        tree.register_time(nn(t as f64));
    }
    for d in 0..n_dists {
        tree.register_dist(nn(d as f64));
    }
    tree
}

#[test]
fn triangle_from_distances() {
    let distances = vec![
        vec![nn(0.0), nn(1.0), nn(1.4)],
        vec![nn(1.0), nn(0.0), nn(1.0)],
        vec![nn(1.4), nn(1.0), nn(0.0)],
    ];
    let params = RipsParams::default()
        .with_max_dim(2)
        .with_max_dist(nn(1.5))
        .with_max_time(nn(0.0));
    let tree = build_rips_tree(&[nn(0.0); 3], &distances, &params).unwrap();

    assert_eq!(tree.num_simplices(), 7);
    assert_eq!(tree.simplex_counts(), vec![3, 3, 1]);
    assert_eq!(tree.max_dimension(), Some(2));

    let at = tree.dist_index(nn(1.4)).unwrap();
    let edges = tree.get_boundary_mx::<Z3>(0, at, 1).unwrap();
    assert_eq!(edges.n_rows(), 3);
    assert_eq!(edges.n_cols(), 3);
    for j in 0..edges.n_cols() {
        let column = edges.matrix.column_entries(j).unwrap();
        assert_eq!(column.len(), 2);
        // The lower vertex is dropped second, so its row carries -1
        let signs: Vec<_> = column.iter().map(|(c, _)| c.representative()).collect();
        assert_eq!(signs, vec![-1, 1]);
    }

    // Below 1.4 the long edge and the triangle are gone
    let earlier = tree.get_boundary_mx::<Z2>(0, at - 1, 2).unwrap();
    assert_eq!(earlier.n_cols(), 0);
    assert_eq!(earlier.n_rows(), 2);
}

#[test]
fn registry_lookups_never_guess() {
    let mut tree = integer_grid(2, 3);
    assert_eq!(tree.dist_index(nn(1.0)), Some(1));
    assert_eq!(tree.dist_index(nn(0.5)), None);
    assert_eq!(tree.time_index(nn(7.0)), None);
    assert_eq!(tree.get_dist(2), Ok(nn(2.0)));
    assert_eq!(
        tree.get_dist(3),
        Err(BifilError::GradeOutOfRange {
            axis: Axis::Dist,
            index: 3,
            len: 3
        })
    );
    assert!(tree.get_time(2).is_err());

    assert_eq!(tree.register_dist(nn(1.0)), 1);
    assert_eq!(tree.num_dists(), 3);
}

#[test]
fn existing_face_keeps_its_birth() {
    let mut tree = integer_grid(3, 6);
    tree.insert(&[1, 2], 1, 3).unwrap();
    tree.insert(&[3, 1, 2], 2, 5).unwrap();
    tree.reindex();

    let edge = tree.find_index(&[1, 2]).unwrap().unwrap();
    let triangle = tree.find_index(&[1, 2, 3]).unwrap().unwrap();
    assert_eq!(tree.get_simplex_data(edge).unwrap().birth, MultiIndex::new(1, 3));
    let data = tree.get_simplex_data(triangle).unwrap();
    assert_eq!(data.birth, MultiIndex::new(2, 5));
    assert_eq!(data.dim, 2);
    // New faces take the birth of the simplex that created them
    assert_eq!(tree.birth_of(&[2, 3]), Some(MultiIndex::new(2, 5)));
    assert_eq!(tree.birth_of(&[1]), Some(MultiIndex::new(1, 3)));
}

#[test]
fn merge_counts_shared_simplex_twice() {
    let mut tree = integer_grid(2, 2);
    tree.insert(&[1], 0, 0).unwrap();
    tree.insert(&[0], 0, 1).unwrap();
    tree.insert(&[2], 1, 0).unwrap();
    tree.insert(&[3], 1, 0).unwrap();
    tree.reindex();

    // B = {0, 1} at (0, 1), C = {1, 2, 3} at (1, 0), D = {0, 1, 2, 3} at (1, 1)
    let merge = tree.get_merge_mx::<Z2>(1, 1, 0).unwrap();
    assert_eq!(merge.n_cols(), 5);
    assert_eq!(merge.n_rows(), 4);
    assert_eq!(merge.first_block, 2);
    assert_eq!(merge.second_block(), &[1, 2, 3]);
    assert_eq!(merge.matrix.nnz(), 5);

    let shared = 1;
    let hits: Vec<_> = (0..merge.n_cols())
        .filter(|&j| merge.matrix.entry(shared, j).is_some())
        .collect();
    assert_eq!(hits, vec![1, 2]);
}

#[test]
fn split_maps_a_into_both_summands() {
    let mut tree = integer_grid(2, 2);
    tree.insert(&[0, 1], 0, 0).unwrap();
    tree.insert(&[1, 2], 1, 0).unwrap();
    tree.insert(&[0, 2], 0, 1).unwrap();
    tree.reindex();

    // A holds the edge {0, 1} only; B adds {0, 2}; C adds {1, 2}
    let split = tree.get_split_mx::<Z2>(1, 1, 1).unwrap();
    let edge = tree.find_index(&[0, 1]).unwrap().unwrap();
    assert_eq!(split.rows, vec![edge]);
    assert_eq!(split.n_cols(), 4);
    assert_eq!(split.first_block, 2);
    assert_eq!(split.matrix.nnz(), 2);
    assert_eq!(split.matrix.entry(0, 0), Some(Z2::one()));
    assert_eq!(split.matrix.entry(0, 2), Some(Z2::one()));
}

#[test]
fn insertion_is_idempotent() {
    let mut tree = integer_grid(3, 3);
    tree.insert(&[0, 1, 2], 1, 2).unwrap();
    tree.insert(&[0, 3], 2, 0).unwrap();
    tree.reindex();
    let before: Vec<_> = (0..tree.num_simplices())
        .map(|i| tree.get_simplex_data(i).unwrap())
        .collect();

    tree.insert(&[2, 1, 0], 1, 2).unwrap();
    assert!(tree.is_stale());
    tree.reindex();
    let after: Vec<_> = (0..tree.num_simplices())
        .map(|i| tree.get_simplex_data(i).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn extraction_waits_for_reindex() {
    let mut tree = integer_grid(1, 1);
    tree.insert(&[0, 1], 0, 0).unwrap();
    assert_eq!(
        tree.get_boundary_mx::<Z2>(0, 0, 1),
        Err(BifilError::StaleIndices)
    );
    assert_eq!(tree.find_vertices(0), Err(BifilError::StaleIndices));
    tree.reindex();
    assert_eq!(tree.get_boundary_mx::<Z2>(0, 0, 1).unwrap().n_cols(), 1);
}
