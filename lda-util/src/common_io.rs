use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

fn is_gz(file: &str) -> bool {
    Path::new(file).extension().is_some_and(|x| x == "gz")
}

/// Buffered reader over a plain or gzipped (`.gz`) file.
pub fn open_buf_reader(input_file: &str) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)?;
    if is_gz(input_file) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Buffered writer to `stdout`, `stderr`, or a plain or gzipped file.
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    let out: Box<dyn Write> = match output_file.to_ascii_lowercase().as_str() {
        "stdout" => Box::new(BufWriter::new(std::io::stdout())),
        "stderr" => Box::new(BufWriter::new(std::io::stderr())),
        _ if is_gz(output_file) => Box::new(BufWriter::new(GzEncoder::new(
            File::create(output_file)?,
            Compression::default(),
        ))),
        _ => Box::new(BufWriter::new(File::create(output_file)?)),
    };
    Ok(out)
}

/// All lines of a plain or gzipped file.
pub fn read_lines(input_file: &str) -> anyhow::Result<Vec<Box<str>>> {
    open_buf_reader(input_file)?
        .lines()
        .map(|x| -> anyhow::Result<Box<str>> { Ok(x?.into_boxed_str()) })
        .collect()
}

/// One `Display` line per item; a closed pipe ends the output quietly.
pub fn write_types<T, W>(lines: &[T], buf: &mut W) -> anyhow::Result<()>
where
    T: std::fmt::Display,
    W: Write + ?Sized,
{
    let written = lines
        .iter()
        .try_for_each(|line| writeln!(buf, "{}", line))
        .and_then(|_| buf.flush());

    match written {
        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(()),
    }
}

/// Split a query into whitespace-delimited tokens.
pub fn split_words(line: &str) -> Vec<Box<str>> {
    line.split_whitespace()
        .map(|x| x.to_owned().into_boxed_str())
        .collect()
}
