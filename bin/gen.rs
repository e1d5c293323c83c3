use clap::{Arg, Command};
use std::io::{self, Write};
use trip_sync::transform::columns;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(Arg::new("banner").long("banner-lines").default_value("2"))
        .arg(Arg::new("group").long("group").default_value("OPERACIONAL"))
        .get_matches();

    let rows: u64 = *matches.get_one("rows").unwrap();
    let banner: usize = matches.get_one::<String>("banner").unwrap().parse()?;
    let group = matches.get_one::<String>("group").unwrap();

    let mut out = io::BufWriter::new(io::stdout().lock());

    for i in 0..banner {
        writeln!(&mut out, "Relatório de viagens - linha {}", i + 1)?;
    }

    writeln!(
        &mut out,
        "{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{}",
        columns::TRIP_ID,
        columns::TRANSACTION_UTC,
        columns::REQUEST_LOCAL,
        columns::ARRIVAL_UTC,
        columns::ARRIVAL_LOCAL,
        columns::FIRST_NAME,
        columns::LAST_NAME,
        columns::GROUP,
        columns::SERVICE,
        columns::CITY,
        columns::COUNTRY,
        columns::DISTANCE_MI,
        columns::DURATION_MIN,
        columns::PICKUP_ADDRESS,
        columns::DROPOFF_ADDRESS,
        columns::TOTAL_VALUE,
        columns::OTHER_CHARGES,
    )?;

    // Deterministic data so runs against the same arguments diff clean.
    for i in 0..rows {
        writeln!(
            &mut out,
            "T{i:08};2024-01-01 0{h}:00;2024-01-01 0{h}:05;2024-01-01 0{h}:30;2024-01-01 0{h}:25;Nome{i};Sobrenome{i};{group};UberX;São Paulo;Brasil;{dist}.2;{dur};Rua A {i};Rua B {i};3{i}.90;0.00",
            h = i % 8 + 1,
            dist = i % 20,
            dur = i % 60,
        )?;
        if i % 10_000 == 0 {
            out.flush()?;
        } // keep buffers moving on huge runs
    }

    out.flush()?;
    Ok(())
}
