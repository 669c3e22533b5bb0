mod error;
mod executor;
mod pipeline;
mod scanner;
mod signal;
mod status;

use std::io::{self, BufRead, Write};

/// Bound on a single input line, matching the REPL's read-line contract.
const MAX_LINE_BYTES: usize = 4096;

fn main() {
    signal::install();

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut stdout = io::stdout();
    let mut last_status: i32 = 0;

    loop {
        signal::clear_interrupted();

        print!("jsh> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match read_bounded_line(&mut reader, &mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("jsh: {e}");
                break;
            }
        }

        let trimmed = line.trim_end_matches('\n');
        if trimmed.trim().is_empty() {
            continue;
        }

        if trimmed.trim() == "exit" {
            break;
        }

        let pipeline = match pipeline::parse(trimmed) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        if pipeline.is_empty() {
            continue;
        }

        last_status = executor::execute(&pipeline);
    }

    std::process::exit(last_status);
}

/// Read one line, bounded to [`MAX_LINE_BYTES`]. Returns the byte count read
/// (0 at end of input), matching `BufRead::read_line`'s contract but capped
/// so a pathological unterminated line can't grow `line` without limit.
fn read_bounded_line(reader: &mut impl BufRead, line: &mut String) -> io::Result<usize> {
    let mut total = 0;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(total);
        }

        let available = buf.len().min(MAX_LINE_BYTES.saturating_sub(total));
        if available == 0 {
            // Drain and discard the rest of an oversized line.
            let to_consume = buf.iter().position(|&b| b == b'\n').map(|p| p + 1);
            match to_consume {
                Some(n) => {
                    reader.consume(n);
                    return Ok(total);
                }
                None => {
                    let len = buf.len();
                    reader.consume(len);
                    continue;
                }
            }
        }

        let newline_pos = buf[..available].iter().position(|&b| b == b'\n');
        let consume_len = newline_pos.map(|p| p + 1).unwrap_or(available);
        let chunk = &buf[..consume_len];
        line.push_str(&String::from_utf8_lossy(chunk));
        total += consume_len;
        reader.consume(consume_len);

        if newline_pos.is_some() || total >= MAX_LINE_BYTES {
            return Ok(total);
        }
    }
}
