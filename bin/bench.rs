use catalog_ingest::{parse_csv_stream, reader_from_path, CsvDialect, Normalizer, ParseOptions};
use clap::{Arg, ArgAction, Command};
use crc32fast::Hasher as Crc32;
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("bench")
        .about("Stream-parse a local product CSV (.csv, .csv.gz, .csv.zst) and report throughput")
        .arg(
            Arg::new("path")
                .long("path")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("max_records")
                .long("max-records")
                .help("Record cap; the rest of the file is not read")
                .value_parser(clap::value_parser!(usize))
                .default_value("1000"),
        )
        .arg(
            Arg::new("dialect")
                .long("dialect")
                .value_parser(["compat", "rfc4180"])
                .default_value("compat"),
        )
        .arg(
            Arg::new("normalize")
                .long("normalize")
                .help("Also normalize records and print a CRC32 over the products")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches
        .get_one::<PathBuf>("path")
        .ok_or_else(|| anyhow::anyhow!("Provide --path <file>"))?;
    let dialect = match matches.get_one::<String>("dialect").map(String::as_str) {
        Some("rfc4180") => CsvDialect::Rfc4180,
        _ => CsvDialect::Compat,
    };
    let options = ParseOptions {
        max_records: matches.get_one::<usize>("max_records").copied().unwrap_or(1000),
        dialect,
    };

    let start = Instant::now();
    let (reader, meta) = reader_from_path(path).await?;
    let batch = parse_csv_stream(reader, &options).await?;
    let parsed_at = start.elapsed().as_secs_f64();

    let digest = matches.get_flag("normalize").then(|| {
        let products = Normalizer::default().normalize_batch(&batch.records, "csv-product", "bench");
        let mut crc = Crc32::new();
        for product in &products {
            crc.update(product.id.as_bytes());
            crc.update(&[0x1f]);
            crc.update(product.name.as_bytes());
            crc.update(&[0x1f]);
            crc.update(&product.price.to_le_bytes());
            crc.update(&[0x1e]);
        }
        crc.finalize()
    });
    let elapsed = start.elapsed().as_secs_f64();
    let rps = batch.records.len() as f64 / parsed_at.max(f64::EPSILON);

    println!(
        "source={} content_type={} rows={} skipped={} truncated={} headers={:?}",
        path.display(),
        meta.content_type,
        batch.records.len(),
        batch.skipped_rows,
        batch.truncated,
        batch.headers
    );
    match digest {
        Some(d) => println!("elapsed={elapsed:.3}s rows/sec={rps:.0} crc=0x{d:08x}"),
        None => println!("elapsed={elapsed:.3}s rows/sec={rps:.0}"),
    }
    Ok(())
}
