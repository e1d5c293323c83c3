use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::time::Instant;
use trip_sync::ingest::parse_export;
use trip_sync::transform::Projection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("inspect")
        .arg(
            Arg::new("path")
                .long("path")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .help("Group to exclude; repeatable")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("sheet")
                .long("sheet")
                .help("Use the sheet schema instead of the document schema")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches.get_one::<PathBuf>("path").unwrap();
    let excluded: Vec<String> = matches
        .get_many::<String>("exclude")
        .map(|vals| vals.map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let projection = if matches.get_flag("sheet") {
        Projection::sheet()
    } else {
        Projection::document(excluded)
    };

    let start = Instant::now();
    let bytes = tokio::fs::read(path).await?;
    let rows = parse_export(&bytes).await?;
    let records = projection.apply(&rows);
    let elapsed = start.elapsed().as_secs_f64();

    let keyed = records.iter().filter(|r| !r.trip_id().is_empty()).count();
    println!(
        "source={} rows={} kept={} keyed={} schema={:?}\nelapsed={:.2}s",
        path.display(),
        rows.len(),
        records.len(),
        keyed,
        projection.field_names(),
        elapsed,
    );
    Ok(())
}
