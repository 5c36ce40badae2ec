use crate::sequence::Protein;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending},
    combinator::{eof, opt},
    sequence::preceded,
    IResult,
};
use protree_core::error::ProtreeError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Parse a FASTA header line into raw (identifier, description)
fn parse_header(input: &[u8]) -> IResult<&[u8], (&[u8], Option<&[u8]>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r')(input)?;
    let (input, description) = opt(preceded(alt((tag(b" "), tag(b"\t"))), not_line_ending))(input)?;
    let (input, _) = alt((line_ending, eof))(input)?;
    Ok((input, (id, description)))
}

/// Parse sequence lines until next header or EOF
fn parse_sequence(input: &[u8]) -> IResult<&[u8], String> {
    let mut sequence = String::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;

        // Whitespace and stop markers ('*') are not residues
        for &c in line {
            if c.is_ascii_alphabetic() {
                sequence.push(c.to_ascii_uppercase() as char);
            }
        }

        // Lone carriage returns are not consumed by line_ending
        remaining = if rest.len() == remaining.len() {
            &rest[1..]
        } else {
            rest
        };
    }

    Ok((remaining, sequence))
}

/// A record as read, before its header is decoded
struct RawRecord<'a> {
    id: &'a [u8],
    description: Option<&'a [u8]>,
    sequence: String,
}

impl RawRecord<'_> {
    fn into_protein(self) -> Result<Protein, ProtreeError> {
        let id = std::str::from_utf8(self.id).map_err(|_| {
            ProtreeError::InvalidInput(format!(
                "FASTA header '{}' is not valid UTF-8",
                String::from_utf8_lossy(self.id)
            ))
        })?;

        let mut protein = Protein::new(extract_accession(id), self.sequence);
        if let Some(desc) = self.description {
            let desc = String::from_utf8_lossy(desc);
            let desc = desc.trim();
            if !desc.is_empty() {
                protein = protein.with_description(desc.to_string());
            }
        }
        Ok(protein)
    }
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], RawRecord<'_>> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;
    Ok((
        input,
        RawRecord {
            id,
            description,
            sequence,
        },
    ))
}

/// Accession of a header identifier.
///
/// UniProt style identifiers (`sp|P12345|NAME_HUMAN`) are reduced to the middle token,
/// anything else is used as is.
pub fn extract_accession(id: &str) -> String {
    let mut parts = id.split('|');
    match (parts.next(), parts.next()) {
        (Some(_db), Some(accession)) if !accession.is_empty() => accession.to_string(),
        _ => id.to_string(),
    }
}

/// Parse FASTA records from a byte buffer
pub fn parse_fasta_from_bytes(buffer: &[u8]) -> Result<Vec<Protein>, ProtreeError> {
    let mut input = buffer;
    let mut proteins = Vec::new();

    while !input.is_empty() {
        // Skip empty lines and whitespace
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        if input[0] != b'>' {
            return Err(ProtreeError::Parse(
                "Failed to parse FASTA: expected '>' at record start".to_string(),
            ));
        }

        match parse_record(input) {
            Ok((remaining, record)) => {
                let protein = record.into_protein()?;
                if !protein.is_empty() {
                    proteins.push(protein);
                }
                input = remaining;
            }
            Err(e) => {
                return Err(ProtreeError::Parse(format!(
                    "Failed to parse FASTA: {:?}",
                    e
                )));
            }
        }
    }

    Ok(proteins)
}

/// Parse a FASTA file into proteins (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Protein>, ProtreeError> {
    let path = path.as_ref();

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        parse_fasta_gzip(path)
    } else {
        parse_fasta_uncompressed(path)
    }
}

fn parse_fasta_uncompressed(path: &Path) -> Result<Vec<Protein>, ProtreeError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    // SAFETY: the file is opened read-only and not modified while mapped
    let mmap = unsafe { Mmap::map(&file)? };

    parse_fasta_from_bytes(&mmap[..])
}

fn parse_fasta_gzip(path: &Path) -> Result<Vec<Protein>, ProtreeError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;

    parse_fasta_from_bytes(&buffer)
}

/// Write proteins to a FASTA file (supports .gz compression)
pub fn write_fasta<P: AsRef<Path>>(path: P, proteins: &[Protein]) -> Result<(), ProtreeError> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let file = File::create(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);
        write_fasta_to_writer(&mut writer, proteins)?;
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_fasta_to_writer(&mut writer, proteins)?;
        writer.flush()?;
    }

    Ok(())
}

fn write_fasta_to_writer<W: Write>(writer: &mut W, proteins: &[Protein]) -> Result<(), ProtreeError> {
    for protein in proteins {
        writeln!(writer, "{}", protein.header())?;
        for line in protein.sequence.as_bytes().chunks(60) {
            writer.write_all(line)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}
