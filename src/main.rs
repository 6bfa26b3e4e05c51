use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use jxml::{Declaration, Document, Element, FlushPolicy, IndentStyle, Node, Options, XmlStream};

#[derive(Debug, Parser)]
#[command(name = "jxml", version, about = "Convert JSON to XML")]
struct Args {
    /// Input JSON file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Indentation: none, space or tab
    #[arg(short, long, default_value = "none")]
    indent: String,
    /// Prepend an XML declaration
    #[arg(long)]
    declaration: bool,
    /// Encoding named in the declaration (implies --declaration)
    #[arg(long)]
    encoding: Option<String>,
    /// Standalone flag of the declaration, yes or no (implies --declaration)
    #[arg(long)]
    standalone: Option<String>,
    /// Write each flushed chunk as soon as it is produced
    #[arg(long)]
    stream: bool,
    /// Read a sequence of JSON values and stream them into one <TAG> element
    #[arg(long, value_name = "TAG")]
    rows: Option<String>,
    /// Element wrapping each streamed value
    #[arg(long, value_name = "NAME", default_value = "row")]
    row: String,
}

impl Args {
    fn options(&self) -> Options {
        let mut options = Options::default().indent(IndentStyle::from_name(&self.indent));
        if self.declaration || self.encoding.is_some() || self.standalone.is_some() {
            options = options.declaration(Declaration {
                encoding: self.encoding.clone(),
                standalone: self
                    .standalone
                    .as_deref()
                    .and_then(Declaration::parse_standalone),
            });
        }
        options
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let options = args.options();
    let input = open_input(&args.input)?;
    let mut output = open_output(&args.output)?;

    if let Some(tag) = &args.rows {
        info!("Streaming rows into <{}>", tag);
        stream_rows(input, tag, &args.row, options, &mut output)?;
    } else {
        let value: serde_json::Value =
            serde_json::from_reader(input).context("input is not valid JSON")?;
        let node = Node::from(value);
        if args.stream {
            stream_document(node, options, &mut output)?;
        } else {
            let xml = jxml::to_xml(node, &options)?;
            output
                .write_all(xml.as_bytes())
                .context("failed to write output")?;
        }
    }

    output.flush().context("failed to flush output")?;
    Ok(())
}

fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            info!("Reading file: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to write output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Collects flushed chunks until the caller writes them out
fn collect_chunks(stream: &XmlStream) -> Arc<Mutex<Vec<String>>> {
    let chunks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&chunks);
    stream.on_data(move |chunk| sink.lock().push(chunk.to_string()));
    chunks
}

fn write_chunks(chunks: &Mutex<Vec<String>>, output: &mut dyn Write) -> Result<()> {
    let ready = std::mem::take(&mut *chunks.lock());
    for chunk in ready {
        output
            .write_all(chunk.as_bytes())
            .context("failed to write output")?;
    }
    output.flush().context("failed to flush output")
}

fn stream_document(node: Node, options: Options, output: &mut dyn Write) -> Result<()> {
    let (document, stream) = Document::with_stream(options, FlushPolicy::Immediate);
    let chunks = collect_chunks(&stream);
    document.write(node)?;
    write_chunks(&chunks, output)
}

fn stream_rows(
    input: Box<dyn Read>,
    tag: &str,
    row: &str,
    options: Options,
    output: &mut dyn Write,
) -> Result<()> {
    let (document, stream) = Document::with_stream(options, FlushPolicy::Immediate);
    let chunks = collect_chunks(&stream);

    let rows = Element::new(Node::Null);
    document.write(Node::element(tag, &rows))?;
    write_chunks(&chunks, output)?;

    let records = serde_json::Deserializer::from_reader(input).into_iter::<serde_json::Value>();
    let mut count = 0usize;
    for record in records {
        count += 1;
        let record = record.with_context(|| format!("record {count} is not valid JSON"))?;
        rows.push(Node::element(row, Node::from(record)))?;
        write_chunks(&chunks, output)?;
    }
    rows.close()?;
    write_chunks(&chunks, output)?;

    debug!(records = count, "rows streamed");
    Ok(())
}
