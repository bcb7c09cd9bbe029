//! JSON-lines dumps of the catalog, one document per line. Paths ending in
//! `.zst` are zstd compressed.

use shellindex_core::Document;
use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use tracing::warn;

fn is_compressed(path: &Path) -> bool {
    path.extension().map(|e| e == "zst").unwrap_or(false)
}

pub struct DumpWriter {
    out: Box<dyn Write>,
    pub path: PathBuf,
    pub written: usize,
}

impl DumpWriter {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let out: Box<dyn Write> = if is_compressed(&path) {
            Box::new(zstd::Encoder::new(file, 3)?.auto_finish())
        } else {
            Box::new(BufWriter::new(file))
        };
        Ok(Self {
            out,
            path,
            written: 0,
        })
    }

    pub fn write_document(&mut self, document: &Document) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, document)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Reads every document of a dump. Blank lines are skipped; lines that do
/// not parse are logged and skipped.
pub fn read_dump(path: &Path) -> io::Result<Vec<Document>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if is_compressed(path) {
        Box::new(zstd::Decoder::new(file)?)
    } else {
        Box::new(file)
    };
    let mut out = Vec::new();
    for (number, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(&line) {
            Ok(document) => out.push(document),
            Err(error) => warn!(line = number + 1, %error, path = %path.display(), "skipping dump line"),
        }
    }
    Ok(out)
}
