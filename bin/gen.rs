use clap::{Arg, ArgAction, Command};
use std::io::{self, Write};

const CATEGORIES: &[&str] = &[
    "Electronics|Audio",
    "Books",
    "Home & Kitchen",
    "Sports & Fitness",
    "Beauty",
    "Food & Beverage",
];

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Write a synthetic product CSV to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(Arg::new("with_header").long("with-header").action(ArgAction::SetTrue))
        .arg(
            Arg::new("quoted")
                .long("quoted")
                .help("Quote descriptions and give them embedded commas")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("blank_every")
                .long("blank-every")
                .help("Insert a blank line after every N rows")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let rows = matches.get_one::<u64>("rows").copied().unwrap_or_default();
    let with_header = matches.get_flag("with_header");
    let quoted = matches.get_flag("quoted");
    let blank_every = matches.get_one::<u64>("blank_every").copied().filter(|n| *n > 0);

    let mut out = io::BufWriter::new(io::stdout().lock());

    if with_header {
        writeln!(&mut out, "id,Product Name,description,category,price,popularity,net_feedback")?;
    }

    // deterministic: every column is a function of the row number
    for i in 0..rows {
        let category = CATEGORIES[(i as usize) % CATEGORIES.len()];
        let price = 5 + (i * 37) % 500;
        let cents = (i * 13) % 100;
        let popularity = (i * 7919) % 2000;
        let feedback = (i * 104_729) % 900;
        if quoted {
            writeln!(
                &mut out,
                "SKU{i:08},Product {i},\"Item {i}, batch {}\",{category},{price}.{cents:02},{popularity},{feedback}",
                i / 100
            )?;
        } else {
            writeln!(
                &mut out,
                "SKU{i:08},Product {i},Item {i},{category},{price}.{cents:02},{popularity},{feedback}"
            )?;
        }
        if blank_every.is_some_and(|n| (i + 1) % n == 0) {
            writeln!(&mut out)?;
        }
        if i % 10_000 == 0 {
            out.flush()?;
        }
    }

    out.flush()?;
    Ok(())
}
