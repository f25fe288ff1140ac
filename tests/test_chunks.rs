use std::io::{self, Read};

use fastcsv::{Reader, ReaderConfig, Row};

/// A reader handing out one predetermined chunk per call to `read`.
#[derive(Debug)]
struct ChunkReader<'a> {
    chunks: Vec<&'a [u8]>,
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    fn new(chunks: Vec<&'a [u8]>) -> ChunkReader<'a> {
        ChunkReader { chunks, pos: 0 }
    }
}

impl<'a> Read for ChunkReader<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = match self.chunks.first() {
            None => return Ok(0),
            Some(chunk) => &chunk[self.pos..],
        };
        let len = std::cmp::min(buf.len(), chunk.len());
        buf[..len].copy_from_slice(&chunk[..len]);
        self.pos += len;
        if self.pos == self.chunks[0].len() {
            self.chunks.remove(0);
            self.pos = 0;
        }
        Ok(len)
    }
}

fn read_chunks(config: ReaderConfig, chunks: Vec<&[u8]>) -> Vec<Row> {
    let mut rdr = Reader::from_reader(config, ChunkReader::new(chunks)).unwrap();
    rdr.read_all().unwrap()
}

fn fields(rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter().map(|r| r.fields().to_vec()).collect()
}

#[test]
fn crlf_split_between_chunks() {
    let chunks = vec![&b"a,b\r"[..], &b"\nc,d\r"[..], &b"\ne"[..]];
    let rows = read_chunks(ReaderConfig::default(), chunks);
    assert_eq!(fields(&rows), vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
    let lines: Vec<u64> = rows.iter().map(|r| r.line()).collect();
    assert_eq!(lines, vec![1, 2, 3]);
}

#[test]
fn crlf_split_keeps_empty_lines() {
    let config =
        ReaderConfig { skip_empty_rows: false, ..ReaderConfig::default() };
    let chunks = vec![&b"a\r"[..], &b"\n\r"[..], &b"\nb\n"[..]];
    let rows = read_chunks(config, chunks);
    assert_eq!(fields(&rows), vec![vec!["a"], vec![""], vec!["b"]]);
    assert_eq!(rows[2].line(), 3);
}

#[test]
fn multibyte_character_split_between_chunks() {
    let data = "é,€\n😀,x\n".as_bytes();
    let chunks = vec![&data[..1], &data[1..4], &data[4..9], &data[9..]];
    let rows = read_chunks(ReaderConfig::default(), chunks);
    assert_eq!(fields(&rows), vec![vec!["é", "€"], vec!["😀", "x"]]);
}

#[test]
fn doubled_quote_split_between_chunks() {
    let chunks = vec![&b"\"x\""[..], &b"\"y\",\"multi\r"[..], &b"\nline\"\n"[..]];
    let rows = read_chunks(ReaderConfig::default(), chunks);
    assert_eq!(fields(&rows), vec![vec!["x\"y", "multi\r\nline"]]);
}

#[test]
fn every_buffer_size_agrees_with_in_memory_text() {
    let data = "h1,h2,h3\r\n\"a,1\",\"b\"\"2\",c3\n\n#x,y\r\"é\nè\",,\r\nlast";
    let expected = Reader::from_string(ReaderConfig::default(), data)
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(expected.len(), 5);
    for size in 0..12 {
        let config =
            ReaderConfig { buffer_size: size, ..ReaderConfig::default() };
        let mut rdr = Reader::from_reader(config, data.as_bytes()).unwrap();
        let got = rdr.read_all().unwrap();
        assert_eq!(expected, got, "buffer size {}", size);
        assert_eq!(rdr.position(), data.chars().count() as u64);
    }
}
