use anyhow::{Context, anyhow};
use mobi_decode::MOBI;
use std::fs::File;
use std::io::{BufReader, Write};

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: read <book.mobi>"))?;
    let mut data = BufReader::new(File::open(&path).with_context(|| format!("opening {path}"))?);

    let mut mobi = MOBI::open(&mut data)?;
    eprintln!("{:#?}", mobi.pdb.header);
    eprintln!("{:#?}", mobi.palmdoc_header);
    if let Some(header) = &mobi.header {
        eprintln!("{header:#?}");
    }
    if let Some(name) = &mobi.full_name {
        eprintln!("Title: {}", String::from_utf8_lossy(name));
    }

    let text = mobi.text(&mut data)?;
    std::io::stdout().lock().write_all(&text)?;

    Ok(())
}
