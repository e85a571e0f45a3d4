use std::hint::black_box;
use std::io::Write;

use criterion::{criterion_group, criterion_main, Criterion};
use scanbench_core::{ScanConfig, Strategy};

/// 约 4 MiB 的类存档文本：键值对、嵌套块与 Windows 换行
fn sample_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("temp file");
    let mut chunk = Vec::new();
    for i in 0..64 {
        write!(chunk, "province={i}\r\n{{\r\n\towner=\"FRA\"\r\n").expect("format");
        chunk.extend_from_slice(b"\tname=\"Caf\xe9 \x80\"\r\n");
        write!(chunk, "\tbase_tax={}.000\r\n}}\r\n", i % 13).expect("format");
    }
    while f.as_file().metadata().expect("metadata").len() < 4 * 1024 * 1024 {
        f.write_all(&chunk).expect("write");
    }
    f.flush().expect("flush");
    f
}

fn bench_strategies(c: &mut Criterion) {
    let file = sample_file();
    let cfg = ScanConfig::default();
    let mut group = c.benchmark_group("tokenize_4mib");
    group.sample_size(20);
    for s in Strategy::ALL {
        group.bench_function(s.name(), |b| {
            b.iter(|| {
                let mut count = 0usize;
                s.scan(file.path(), &cfg, |t| count += t.len()).expect("scan");
                black_box(count)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
