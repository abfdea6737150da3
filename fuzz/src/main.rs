use pushjson::dom::DomBackend;
use pushjson::{Extensions, Parser};

#[macro_use]
extern crate afl;

fn parse_chunked(data: &[u8], chunk: usize) -> Result<Option<pushjson::dom::Element>, pushjson::Error> {
    let mut parser = Parser::with_extensions(DomBackend::new(), Extensions::all());
    for part in data.chunks(chunk.max(1)) {
        parser.input(part);
    }
    parser.eof()
}

fn main() {
    fuzz!(|data: &[u8]| {
        // Parsing must never panic, and the outcome must not depend on how
        // the input was chunked.
        let whole = parse_chunked(data, data.len().max(1));
        for chunk in [1, 7] {
            assert_eq!(whole, parse_chunked(data, chunk));
        }
    });
}
