use catalog_ingest::{
    parse_csv_stream, reader_from_path, CatalogConfig, CatalogService, ParseOptions, SourceFormat,
    SourceSpec,
};
use std::{fs::File, io::Write, path::Path, path::PathBuf, process::Command};

fn write_products(path: &Path, rows: usize) -> anyhow::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "\"Product Name\",description,category,price")?;
    for i in 0..rows {
        writeln!(f, "Item {i},\"Sturdy, light\",Home|Garden,{}.50", 10 + i % 90)?;
        if i % 250 == 0 {
            writeln!(f)?;
        }
    }
    Ok(())
}

fn gzip(src: &Path, dir: &Path) -> anyhow::Result<PathBuf> {
    let gz_path = dir.join("products.csv.gz");
    let status = Command::new("bash")
        .arg("-lc")
        .arg(format!("gzip -c {} > {}", src.display(), gz_path.display()))
        .status()?;
    assert!(status.success());
    Ok(gz_path)
}

#[tokio::test]
async fn parses_gzip_and_counts_rows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("products.csv");
    write_products(&csv_path, 5_000)?;
    let gz_path = gzip(&csv_path, dir.path())?;

    let (reader, meta) = reader_from_path(&gz_path).await?;
    assert!(meta.is_gzip());
    let batch = parse_csv_stream(reader, &ParseOptions::with_max_records(10_000)).await?;

    assert_eq!(batch.records.len(), 5_000);
    assert!(!batch.truncated);
    assert_eq!(batch.skipped_rows, 0);
    assert_eq!(batch.headers, vec!["Product Name", "description", "category", "price"]);
    assert_eq!(batch.records[4_999].original_index, 4_999);
    Ok(())
}

#[tokio::test]
async fn record_cap_truncates_compressed_input() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("products.csv");
    write_products(&csv_path, 5_000)?;
    let gz_path = gzip(&csv_path, dir.path())?;

    let (reader, _meta) = reader_from_path(&gz_path).await?;
    let batch = parse_csv_stream(reader, &ParseOptions::default()).await?;

    assert_eq!(batch.records.len(), 1_000);
    assert!(batch.truncated);
    Ok(())
}

#[tokio::test]
async fn file_source_flows_through_the_service() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("products.csv");
    write_products(&csv_path, 30)?;

    let config = CatalogConfig {
        sources: vec![SourceSpec::new(
            "Local CSV",
            format!("file://{}", csv_path.display()),
            SourceFormat::Csv,
        )],
        ..CatalogConfig::default()
    };
    let service = CatalogService::from_config(&config)?;
    let entry = service.get_or_fetch().await;

    assert_eq!(entry.source_label, "Local CSV");
    assert_eq!(entry.products.len(), 30);
    assert!(entry.last_error_detail.is_none());

    let first = &entry.products[0];
    assert_eq!(first.name, "Item 0");
    assert_eq!(first.description, "Sturdy, light");
    assert_eq!(first.categories, vec!["Home", "Garden"]);
    assert_eq!(first.price, 10.5);
    assert_eq!(first.id, "csv-product-0");
    Ok(())
}
