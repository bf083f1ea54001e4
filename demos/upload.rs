use multipart_factory::{
    CancellationToken, DiskFile, FormRequest, FormValue, MultipartFactory, PropertyDescriptor,
};

struct PublishCrate {
    name: String,
    keywords: Vec<String>,
    manifest: Option<DiskFile>,
}

impl FormRequest for PublishCrate {
    fn properties() -> Vec<PropertyDescriptor<Self>> {
        vec![
            PropertyDescriptor::scalar("Name", |r| FormValue::from_scalar(Some(r.name.as_str()))),
            PropertyDescriptor::collection("Keywords", |r| {
                FormValue::from_scalars(Some(r.keywords.iter().map(String::as_str)))
            }),
            PropertyDescriptor::file("Manifest", |r| FormValue::from_file(r.manifest.as_ref())),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let request = PublishCrate {
        name: "multipart-factory".into(),
        keywords: vec!["http".into(), "multipart".into()],
        manifest: Some(DiskFile::open("Cargo.toml").await?),
    };

    let factory = MultipartFactory::new();
    let body = factory.create(&request, &CancellationToken::new()).await?;

    println!("Content-Type: {}", body.content_type());
    println!("Content-Length: {}", body.content_length());
    println!();
    print!("{}", String::from_utf8_lossy(&body.to_bytes()));

    Ok(())
}
