/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::env;
use std::fs::File;
use std::io::Read;
use std::io::stdin;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use iksstream::xmpp::DecodedElement;
use iksstream::xmpp::StreamDecoder;
use iksstream::xmpp::StreamError;
use iksstream::xmpp::sm::FrameUnmarshaller;
use iksstream::xmpp::sm::Incoming;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

fn print_version() {
    println!("iksdecode (iksemel) v{}", iksstream::VERSION);
}

fn print_usage() {
    println!(
        concat!(
            "Usage: iksdecode [OPTIONS] [FILE.xml...]\n",
            "This tool decodes recorded XMPP streams into their top level elements.\n",
            "Options:\n",
            "  -b, --buffer <SIZE>  File read buffer size in bytes (default: {})\n",
            "  -d, --debug          Log decoder events to stderr (see RUST_LOG)\n",
            "  -h, --help           Display this help message and exit\n",
            "  -v, --version        Display the version and exit\n",
            "Report issues at https://github.com/meduketto/iksemel-rust/issues"
        ),
        DEFAULT_BUFFER_SIZE
    );
}

enum DecodeError {
    IoError(std::io::Error),
    StreamError(StreamError),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::IoError(err)
    }
}

impl From<StreamError> for DecodeError {
    fn from(err: StreamError) -> Self {
        DecodeError::StreamError(err)
    }
}

struct Decoder {
    buffer_size: usize,
    nr_units: usize,
    closed: bool,
}

impl Decoder {
    fn new(buffer_size: usize) -> Self {
        Decoder {
            buffer_size,
            nr_units: 0,
            closed: false,
        }
    }

    fn print_unit(&mut self, unit: DecodedElement<Incoming>) {
        self.nr_units += 1;
        match unit {
            DecodedElement::StreamOpen(header) => println!("open: {}", header),
            DecodedElement::StreamClose => {
                self.closed = true;
                println!("close");
            }
            DecodedElement::Element(Incoming::Frame(frame)) => {
                println!("sm: {}", frame.to_element())
            }
            DecodedElement::Element(Incoming::Ignored(element)) => {
                println!("ignored: {}", element)
            }
            DecodedElement::Element(Incoming::Stanza(element)) => {
                println!("stanza: {}", element)
            }
        }
    }

    fn decode_file(&mut self, file: &str, is_stream: bool) -> Result<(), DecodeError> {
        let mut f: Box<dyn Read> = if is_stream {
            Box::new(stdin())
        } else {
            Box::new(File::open(file)?)
        };
        let decoder = StreamDecoder::new(FrameUnmarshaller);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut units = Vec::new();
        loop {
            let bytes_read = f.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            decoder.decode(&buffer[..bytes_read], &mut units)?;
            for unit in units.drain(..) {
                self.print_unit(unit);
            }
        }
        Ok(())
    }

    fn run(&mut self, file: &str, is_stream: bool) -> bool {
        self.nr_units = 0;
        self.closed = false;
        match self.decode_file(file, is_stream) {
            Ok(()) => {
                if !self.closed {
                    eprintln!("Stream in '{}' is not closed", file);
                }
                println!("{} units decoded", self.nr_units);
                true
            }
            Err(DecodeError::IoError(e)) => {
                eprintln!("Error reading file '{}': {}", file, e);
                false
            }
            Err(DecodeError::StreamError(e)) => {
                eprintln!(
                    "Stream error '{}' in file '{}' after {} units: {}",
                    e.condition().as_str(),
                    file,
                    self.nr_units,
                    e.detail()
                );
                false
            }
        }
    }
}

fn main() -> ExitCode {
    let mut args = env::args();

    let mut files = Vec::new();
    let mut buffer_size = DEFAULT_BUFFER_SIZE;
    let mut debug = false;

    // Skip the first argument (program name)
    args.next();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-b" | "--buffer" => {
                if let Some(size) = args.next() {
                    match size.parse::<usize>() {
                        Ok(size) if size > 0 => buffer_size = size,
                        _ => {
                            eprintln!("Invalid buffer size");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    eprintln!("Missing buffer size");
                    return ExitCode::FAILURE;
                }
            }
            "-d" | "--debug" => {
                debug = true;
            }
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-v" | "--version" => {
                print_version();
                return ExitCode::SUCCESS;
            }
            _ => {
                files.push(arg);
            }
        }
    }

    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let mut decoder = Decoder::new(buffer_size);
    if files.is_empty() {
        if !decoder.run("stdin", true) {
            return ExitCode::FAILURE;
        }
    } else {
        for file in files {
            if !decoder.run(&file, false) {
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
