use crate::bio::sequence::Sequence;
use crate::PlasClassError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till},
    combinator::opt,
    IResult,
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One line without its terminator (`\n` or `\r\n`).
fn take_line(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, line) = take_till(|c: u8| c == b'\n')(input)?;
    let (input, _) = opt(tag(b"\n"))(input)?;
    Ok((input, line.strip_suffix(b"\r").unwrap_or(line)))
}

/// Parse a `>` or `@` header line into its identifier, the text up to the
/// first whitespace. The identifier may be empty.
fn parse_header<'a>(input: &'a [u8], marker: &'static [u8]) -> IResult<&'a [u8], &'a [u8]> {
    let (input, _) = tag(marker)(input)?;
    let (input, id) = take_till(|c: u8| c.is_ascii_whitespace())(input)?;
    let (input, _) = take_line(input)?;
    Ok((input, id))
}

fn push_residues(target: &mut Vec<u8>, line: &[u8]) {
    target.extend(line.iter().copied().filter(|c| !c.is_ascii_whitespace()));
}

/// Sequence lines up to the next `>` header or end of input. Residues are
/// kept exactly as written.
fn parse_fasta_body(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) = take_line(remaining)?;
        push_residues(&mut sequence, line);
        remaining = rest;
    }

    Ok((remaining, sequence))
}

fn make_record(id: &[u8], sequence: Vec<u8>) -> Sequence {
    Sequence::new(String::from_utf8_lossy(id).into_owned(), sequence)
}

fn parse_fasta_record(input: &[u8]) -> Result<(&[u8], Sequence), PlasClassError> {
    let (input, id) = parse_header(input, b">")
        .map_err(|_| PlasClassError::Parse("Failed to parse FASTA header".to_string()))?;
    let (input, sequence) = parse_fasta_body(input)
        .map_err(|_| PlasClassError::Parse("Failed to parse FASTA sequence".to_string()))?;
    Ok((input, make_record(id, sequence)))
}

/// `@id`, sequence lines, `+` separator, quality lines until the quality is
/// as long as the sequence. Quality values are checked for length only.
fn parse_fastq_record(input: &[u8]) -> Result<(&[u8], Sequence), PlasClassError> {
    let (mut input, id) = parse_header(input, b"@")
        .map_err(|_| PlasClassError::Parse("Failed to parse FASTQ header".to_string()))?;
    let name = String::from_utf8_lossy(id).into_owned();
    let line_error = |_: nom::Err<nom::error::Error<&[u8]>>| {
        PlasClassError::Parse(format!("Malformed FASTQ record {}", name))
    };

    let mut sequence = Vec::new();
    loop {
        if input.is_empty() {
            return Err(PlasClassError::Parse(format!(
                "FASTQ record {} has no '+' separator",
                name
            )));
        }
        let (rest, line) = take_line(input).map_err(line_error)?;
        input = rest;
        if line.first() == Some(&b'+') {
            break;
        }
        push_residues(&mut sequence, line);
    }

    let mut quality_len = 0;
    while quality_len < sequence.len() {
        if input.is_empty() {
            return Err(PlasClassError::Parse(format!(
                "FASTQ record {} has {} quality values for {} bases",
                name,
                quality_len,
                sequence.len()
            )));
        }
        let (rest, line) = take_line(input).map_err(line_error)?;
        quality_len += line.iter().filter(|c| !c.is_ascii_whitespace()).count();
        input = rest;
    }

    Ok((input, make_record(id, sequence)))
}

/// Lazily parsed FASTA or FASTQ records over a byte buffer.
///
/// Each record's format is decided by its first byte. Iteration stops after
/// the first error.
pub struct FastxRecords<'a> {
    data: &'a [u8],
    remaining: &'a [u8],
    done: bool,
}

impl<'a> FastxRecords<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            remaining: data,
            done: false,
        }
    }
}

impl<'a> Iterator for FastxRecords<'a> {
    type Item = Result<Sequence, PlasClassError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let start = match self.remaining.iter().position(|c| !c.is_ascii_whitespace()) {
            Some(start) => start,
            None => {
                self.done = true;
                return None;
            }
        };

        let input = &self.remaining[start..];
        let parsed = match input[0] {
            b'>' => parse_fasta_record(input),
            b'@' => parse_fastq_record(input),
            other => Err(PlasClassError::Parse(format!(
                "Expected '>' or '@' at byte {}, found {:?}",
                self.data.len() - input.len(),
                other as char
            ))),
        };

        match parsed {
            Ok((rest, seq)) => {
                self.remaining = rest;
                Some(Ok(seq))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse every FASTA/FASTQ record in `data`.
pub fn parse_fastx_from_bytes(data: &[u8]) -> Result<Vec<Sequence>, PlasClassError> {
    FastxRecords::new(data).collect()
}

/// The bytes of a sequence file: memory-mapped, or decompressed for `.gz`.
pub enum FastxBuffer {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl FastxBuffer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PlasClassError> {
        let path = path.as_ref();
        let file = File::open(path)?;

        if path.extension().and_then(|s| s.to_str()) == Some("gz") {
            let mut decoder = GzDecoder::new(BufReader::new(file));
            let mut buffer = Vec::new();
            decoder.read_to_end(&mut buffer)?;
            return Ok(FastxBuffer::Owned(buffer));
        }

        // Zero-length files cannot be mapped
        if file.metadata()?.len() == 0 {
            return Ok(FastxBuffer::Owned(Vec::new()));
        }
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(FastxBuffer::Mapped(mmap))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FastxBuffer::Mapped(mmap) => &mmap[..],
            FastxBuffer::Owned(bytes) => bytes,
        }
    }

    pub fn records(&self) -> FastxRecords<'_> {
        FastxRecords::new(self.as_bytes())
    }
}

/// Parse a FASTA/FASTQ file (supports .gz compression)
pub fn parse_fastx<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>, PlasClassError> {
    FastxBuffer::open(path)?.records().collect()
}
