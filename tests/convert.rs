use gms2mesh::prelude::*;

const GEOMETRY: &str = "bottomleft_x, bottomleft_y, bottomleft_z, size_x, size_y, size_z
0,0,0,10,10,1
";

const MATERIAL: &str = "no, \"id\", \"k\", \"i\", \"j\", \"f\"
1, 1, 1, 1, 1, 5
2, 2, 1, 1, 2, 5
3, 3, 1, 2, 1, 5
4, 4, 1, 2, 2, 5
";

const TOP: &str = "no, \"id\", \"k\", \"i\", \"j\", \"f\", \"Active\"
1, 1, 1, 1, 1, 10, 1
2, 2, 1, 1, 2, 10, 1
3, 3, 1, 2, 1, 10, 1
4, 4, 1, 2, 2, 10, 1
";

const BOTTOM: &str = "no, \"id\", \"k\", \"i\", \"j\", \"f\", \"Active\"
1, 1, 1, 1, 1, 0, 1
2, 2, 1, 1, 2, 0, 1
3, 3, 1, 2, 1, 0, 1
4, 4, 1, 2, 2, 0, 1
";

fn two_by_two(bottom: &str) -> Mesh {
    convert(&GridSources::new(GEOMETRY, MATERIAL, TOP, bottom))
}

/// A grid with `nz` layers over an `nx * ny` footprint. Cells listed in `inactive` (as
/// `(i, j, k)`) get an active flag of 0 in the bottom export.
fn block(nx: i64, ny: i64, nz: i64, inactive: &[(i64, i64, i64)]) -> GridSources {
    let mut mat = String::from("no,id,k,i,j,f\n");
    let mut top = String::from("no,id,k,i,j,f,Active\n");
    let mut bot = top.clone();

    let mut id = 0;
    for k in 1..=nz {
        for i in 1..=nx {
            for j in 1..=ny {
                id += 1;
                let active = if inactive.contains(&(i, j, k)) { 0 } else { 1 };
                mat.push_str(&format!("{id},{id},{k},{i},{j},{}\n", 10 + k));
                top.push_str(&format!("{id},{id},{k},{i},{j},{},1\n", (nz - k + 1) * 2));
                bot.push_str(&format!("{id},{id},{k},{i},{j},{},{active}\n", (nz - k) * 2));
            }
        }
    }

    GridSources::new(
        "h\n1000.0, 2000.0, -20.0, 100, 50, 1\n".to_string(),
        mat,
        top,
        bot,
    )
}

#[test]
fn single_cube() {
    let mesh = two_by_two(BOTTOM);

    assert_eq!(mesh.nodes.len(), 8);
    assert_eq!(mesh.elements.len(), 1);

    let element = &mesh.elements[0];
    assert_eq!(element.index, 1);
    assert_eq!(element.material, 5);

    // bottom face then top face, each 000 100 110 010
    let keys: Vec<String> = element
        .nodes
        .iter()
        .map(|&idx| mesh.node(idx).unwrap().key.to_string())
        .collect();
    assert_eq!(
        keys,
        vec!["1-1-1", "2-1-1", "2-2-1", "1-2-1", "1-1-2", "2-1-2", "2-2-2", "1-2-2"]
    );

    let z: Vec<f64> = element.nodes.iter().map(|&idx| mesh.node(idx).unwrap().z).collect();
    assert_eq!(z, vec![0., 0., 0., 0., 10., 10., 10., 10.]);
}

#[test]
fn one_inactive_corner_drops_the_cube() {
    let bottom = BOTTOM.replace("4, 4, 1, 2, 2, 0, 1", "4, 4, 1, 2, 2, 0, 0");
    let mesh = two_by_two(&bottom);

    assert_eq!(mesh.nodes.len(), 8);
    assert!(mesh.elements.is_empty());
}

#[test]
fn deterministic() {
    let sources = block(4, 3, 3, &[(2, 2, 2)]);
    let a = convert(&sources);
    let b = convert(&sources);
    assert_eq!(a, b);

    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    Tecplot::default().write_mesh(&mut out_a, &a).unwrap();
    Tecplot::default().write_mesh(&mut out_b, &b).unwrap();
    assert_eq!(out_a, out_b);
}

#[test]
fn layers_plus_cap_per_column() {
    let (nx, ny, nz) = (3, 2, 4);
    let mesh = convert(&block(nx, ny, nz, &[]));

    assert_eq!(mesh.nodes.len() as i64, nx * ny * (nz + 1));

    for i in 1..=nx {
        for j in 1..=ny {
            let column: Vec<&Node> = mesh
                .nodes
                .iter()
                .filter(|n| n.key.i == i && n.key.j == j)
                .collect();
            assert_eq!(column.len() as i64, nz + 1);

            let mut layers: Vec<i64> = column.iter().map(|n| n.key.layer).collect();
            layers.sort_unstable();
            assert_eq!(layers, (1..=nz + 1).collect::<Vec<_>>());
        }
    }
}

#[test]
fn layers_count_up_from_the_bottom() {
    let mesh = convert(&block(2, 2, 3, &[]));

    for node in &mesh.nodes {
        // bottoms sit at (nz - k) * 2 and layer = nz - k + 1
        assert_eq!(node.z, ((node.key.layer - 1) * 2) as f64);
    }

    // material 10 + k, so the bottom brick belongs to stored k = 3
    let materials: Vec<i64> = mesh.elements.iter().map(|e| e.material).collect();
    assert_eq!(materials, vec![13, 12, 11]);
}

#[test]
fn every_element_is_fully_active() {
    let inactive = [(1, 1, 1), (3, 2, 2), (4, 3, 3), (2, 3, 1)];
    let mesh = convert(&block(4, 3, 3, &inactive));

    assert!(!mesh.elements.is_empty());
    for element in &mesh.elements {
        let active: i64 = element
            .nodes
            .iter()
            .map(|&idx| mesh.node(idx).unwrap().active)
            .sum();
        assert_eq!(active, 8);
    }

    // fewer bricks than the fully active block
    let full = convert(&block(4, 3, 3, &[]));
    assert!(mesh.elements.len() < full.elements.len());
    assert_eq!(mesh.nodes.len(), full.nodes.len());
}

#[test]
fn indices_are_dense_and_valid() {
    let mesh = convert(&block(3, 3, 2, &[(2, 2, 1)]));

    for (idx, node) in mesh.nodes.iter().enumerate() {
        assert_eq!(node.index, idx + 1);
    }
    for (idx, element) in mesh.elements.iter().enumerate() {
        assert_eq!(element.index, idx + 1);
        assert!(element
            .nodes
            .iter()
            .all(|&n| n >= 1 && n <= mesh.nodes.len()));
    }
}

#[test]
fn planar_coordinates_are_cell_centers() {
    let mesh = convert(&block(3, 2, 2, &[]));

    for node in &mesh.nodes {
        assert_eq!(node.x, 1000.0 + (node.key.i as f64 + 0.5) * 100.0);
        assert_eq!(node.y, 2000.0 + (node.key.j as f64 + 0.5) * 50.0);
    }

    // half a cell is lost on the low side and the mesh spans (i_max - i_min) cells
    let (lo, hi) = mesh.bounding_box().unwrap();
    assert_eq!(hi[0] - lo[0], 200.0);
    assert_eq!(hi[1] - lo[1], 50.0);
}

#[test]
fn lazy_elements_match_collected() {
    let sources = block(3, 3, 3, &[(1, 2, 2)]);
    let geometry = GridGeometry::from_records(&sources.xyz);
    let lattice = CellLattice::from_records(&sources.mat, &sources.top, &sources.bot);
    let nodes = NodeLattice::build(&lattice, &geometry);

    let first_two: Vec<Element> = nodes.elements().take(2).collect();
    let all = nodes.build_elements();
    assert_eq!(first_two[..], all[..2]);
    assert_eq!(convert(&sources).elements, all);
}

#[test]
fn empty_and_malformed_inputs_degrade_gracefully() {
    let mesh = convert(&GridSources::new("", "", "", ""));
    assert!(mesh.nodes.is_empty());
    assert!(mesh.elements.is_empty());

    // garbage fields coerce to zero instead of failing
    let mesh = convert(&GridSources::new(
        "h\nnot, a, number\n",
        "h\n1, 1, x, y, z, q\n",
        "h\n",
        "h\n",
    ));
    assert_eq!(mesh.nodes.len(), 2);
    assert!(mesh.elements.is_empty());
    assert!(mesh.nodes.iter().all(|n| n.x == 0.0 && n.y == 0.0));
}

#[test]
fn active_flag_must_be_exactly_one() {
    // 2 + 0 + 0 + 2 per face sums to 8 without a single active corner
    let bottom = BOTTOM
        .replace("1, 1, 1, 1, 1, 0, 1", "1, 1, 1, 1, 1, 0, 2")
        .replace("2, 2, 1, 1, 2, 0, 1", "2, 2, 1, 1, 2, 0, 0")
        .replace("3, 3, 1, 2, 1, 0, 1", "3, 3, 1, 2, 1, 0, 0")
        .replace("4, 4, 1, 2, 2, 0, 1", "4, 4, 1, 2, 2, 0, 2");
    let mesh = two_by_two(&bottom);

    assert_eq!(mesh.nodes.len(), 8);
    assert!(!mesh.has_elements());

    let bottom = BOTTOM.replace(", 0, 1\n", ", 0, 2\n");
    assert!(!two_by_two(&bottom).has_elements());
}

/// corner keys and material of every element, independent of node numbering
fn element_keys(mesh: &Mesh) -> Vec<(Vec<NodeKey>, i64)> {
    mesh.elements
        .iter()
        .map(|element| {
            let keys = element
                .nodes
                .iter()
                .map(|&idx| mesh.node(idx).unwrap().key)
                .collect();
            (keys, element.material)
        })
        .collect()
}

#[test]
fn far_off_row_keeps_the_regular_bricks() {
    let regular = block(3, 3, 2, &[(2, 2, 1)]);

    let mut stray = regular.clone();
    stray.mat.push_str("1000,1000,1,4000000000000000000,1,99\n");
    stray.top.push_str("1000,1000,1,4000000000000000000,1,10,1\n");
    stray.bot.push_str("1000,1000,1,4000000000000000000,1,0,1\n");

    let dense = convert(&regular);
    let sparse = convert(&stray);

    assert!(dense.has_elements());
    assert_eq!(element_keys(&sparse), element_keys(&dense));

    // only the stray cell and its cap are added, no gap nodes for the empty box
    assert_eq!(sparse.nodes.len(), dense.nodes.len() + 2);
    for element in &sparse.elements {
        assert!(element
            .nodes
            .iter()
            .all(|&n| n >= 1 && n <= sparse.nodes.len()));
    }
}

#[test]
fn extreme_indices_degrade_gracefully() {
    let mesh = convert(&GridSources::new(
        "h\n0,0,0,1,1,1\n",
        "h\n1,1,-9000000000000000000,-9000000000000000000,1,5\n2,2,9000000000000000000,9000000000000000000,1,5\n",
        "h\n",
        "h\n1,1,-9000000000000000000,-9000000000000000000,1,0,1\n2,2,9000000000000000000,9000000000000000000,1,0,1\n",
    ));

    // two bottoms plus the cap of the topmost cell
    assert_eq!(mesh.nodes.len(), 3);
    assert!(!mesh.has_elements());
}
