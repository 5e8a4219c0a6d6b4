use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array3;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use gms2mesh::prelude::*;

fn random_mesh(n: usize, nz: usize) -> Mesh {
    let bottoms: Array3<f64> = Array3::random((n, n, nz), Uniform::new(-20., 20.));

    let mut mat = String::from("no,id,k,i,j,f\n");
    let mut top = String::from("no,id,k,i,j,f,Active\n");
    let mut bot = top.clone();

    let mut id = 0;
    for ((i, j, k), bottom) in bottoms.indexed_iter() {
        id += 1;
        mat.push_str(&format!("{id},{id},{},{},{},1\n", k + 1, i + 1, j + 1));
        top.push_str(&format!("{id},{id},{},{},{},{},1\n", k + 1, i + 1, j + 1, bottom + 1.0));
        bot.push_str(&format!("{id},{id},{},{},{},{},1\n", k + 1, i + 1, j + 1, bottom));
    }

    convert(&GridSources::new("h\n0,0,0,10,10,1\n".to_string(), mat, top, bot))
}

fn write<Enc: Encode>(mesh: &Mesh) {
    let writer: Vec<u8> = Vec::new();
    let buf_writer = std::io::BufWriter::new(writer);
    Vtu::<Enc>::new().write_mesh(buf_writer, mesh).unwrap();
}

fn write_vtu_bench(c: &mut Criterion) {
    let mesh = random_mesh(60, 10);

    c.bench_function("write vtu binary", |b| b.iter(|| write::<Binary>(black_box(&mesh))));
    c.bench_function("write vtu base64", |b| b.iter(|| write::<Base64>(black_box(&mesh))));
    c.bench_function("write vtu ascii", |b| b.iter(|| write::<Ascii>(black_box(&mesh))));
    c.bench_function("write tecplot", |b| {
        b.iter(|| {
            let writer: Vec<u8> = Vec::new();
            Tecplot::default()
                .write_mesh(std::io::BufWriter::new(writer), black_box(&mesh))
                .unwrap()
        })
    });
}

criterion_group!(benches, write_vtu_bench);
criterion_main!(benches);
