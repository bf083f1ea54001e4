use criterion::{black_box, criterion_group, criterion_main, Criterion};
use multipart_factory::{
    CancellationToken, FormRequest, FormValue, MemoryFile, MultipartFactory, PropertyDescriptor,
};
use tokio::runtime::Runtime;

struct BenchRequest {
    title: String,
    count: i64,
    tags: Vec<String>,
    attachment: Option<MemoryFile>,
}

impl FormRequest for BenchRequest {
    fn properties() -> Vec<PropertyDescriptor<Self>> {
        vec![
            PropertyDescriptor::scalar("Title", |r| FormValue::from_scalar(Some(r.title.as_str()))),
            PropertyDescriptor::scalar("Count", |r| FormValue::from_scalar(Some(r.count))),
            PropertyDescriptor::collection("Tags", |r| {
                FormValue::from_scalars(Some(r.tags.iter().map(String::as_str)))
            }),
            PropertyDescriptor::file("Attachment", |r| FormValue::from_file(r.attachment.as_ref())),
        ]
    }
}

fn request() -> BenchRequest {
    BenchRequest {
        title: "weekly report".into(),
        count: 42,
        tags: (0..8).map(|i| format!("tag-{i}")).collect(),
        attachment: Some(MemoryFile::new(
            "report.bin",
            "application/octet-stream",
            vec![0u8; 64 * 1024],
        )),
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let token = CancellationToken::new();
    let request = request();

    let mut group = c.benchmark_group("encode");

    let cached = MultipartFactory::new();
    group.bench_function("cached", |b| {
        b.iter(|| {
            let body = rt
                .block_on(cached.create(black_box(&request), &token))
                .expect("encode");

            assert_eq!(body.parts().len(), 11);
            body
        });
    });

    let uncached = MultipartFactory::without_cache();
    group.bench_function("uncached", |b| {
        b.iter(|| {
            let body = rt
                .block_on(uncached.create(black_box(&request), &token))
                .expect("encode");

            assert_eq!(body.parts().len(), 11);
            body
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
