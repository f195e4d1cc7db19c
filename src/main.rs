use cachefs::{CacheFs, ChangeSource, File as _, LocalFs};
use std::path::Path;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("demo") => {
            let (base_dir, layer_dir, file) = match (args.next(), args.next(), args.next()) {
                (Some(b), Some(l), Some(f)) => (b, l, f),
                _ => {
                    eprintln!("Usage: cachefs demo <base_dir> <layer_dir> <file>");
                    std::process::exit(2);
                }
            };
            if let Err(e) = demo(&base_dir, &layer_dir, &file).await {
                eprintln!("demo failed: {e}");
                std::process::exit(1);
            }
        }
        _ => {
            println!("cachefs - caching union filesystem\nUsage:\n  cachefs demo <base_dir> <layer_dir> <file>");
        }
    }
}

/// Read `file` through the cache twice: the first read promotes it into the
/// layer directory, the second is served from there.
async fn demo(base_dir: &str, layer_dir: &str, file: &str) -> cachefs::Result<()> {
    std::fs::create_dir_all(layer_dir)?;
    let (_tx, source) = ChangeSource::channel(64);
    let fs = CacheFs::new(
        LocalFs::new(base_dir),
        LocalFs::new(layer_dir),
        Duration::from_secs(30),
        source,
    );

    let path = Path::new(file);
    let mut f = fs.open(path).await?;
    let first = f.read_to_end().await?;
    f.close().await?;
    println!("read {} bytes from {file} (promoted into {layer_dir})", first.len());

    let mut f = fs.open(path).await?;
    let second = f.read_to_end().await?;
    f.close().await?;
    println!("read {} bytes again, served from the cache layer", second.len());
    Ok(())
}
