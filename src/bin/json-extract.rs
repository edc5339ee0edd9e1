//! CLI binary for edgequake-json-extract.
//!
//! A thin shim over the library crate: extract (and optionally decode) JSON
//! from raw LLM output, or generate a learning material from document text.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_json_extract::{
    decode_kind, decode_value, extract_json, generate_value, load_document, render_json,
    write_atomic, ExtractError, GenerationConfig, MaterialKind,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the JSON candidate found in a saved model response
  json-extract response.txt

  # Read from stdin, decode strictly and pretty-print
  cat response.txt | json-extract --pretty

  # Decode and validate against a material schema
  json-extract --schema quiz response.txt

  # Emit a typed error payload instead of failing with a message
  json-extract --schema mindmap --json response.txt

  # Generate a mind map from a document through an LLM
  json-extract --generate mindmap lecture.pdf -o mindmap.json

  # Generate a podcast script with two voices
  json-extract --generate podcast --host-voice v-host --guest-voice v-guest notes.txt

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  OPENAI_API_KEY          OpenAI API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Extract JSON from noisy LLM output, or generate learning materials.
#[derive(Parser, Debug)]
#[command(
    name = "json-extract",
    version,
    about = "Extract JSON from noisy LLM output and decode learning materials",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file, or `-` for stdin: raw model output, or a PDF/DOCX/TXT document
    /// with --generate.
    #[arg(default_value = "-")]
    input: String,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "JSON_EXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Decode and validate against a material schema.
    #[arg(long, env = "JSON_EXTRACT_SCHEMA", value_enum, conflicts_with = "generate")]
    schema: Option<KindArg>,

    /// Generate this material from the input document text via an LLM.
    #[arg(long, env = "JSON_EXTRACT_GENERATE", value_enum)]
    generate: Option<KindArg>,

    /// Host voice id (podcast generation).
    #[arg(long, env = "JSON_EXTRACT_HOST_VOICE")]
    host_voice: Option<String>,

    /// Guest voice id (podcast generation).
    #[arg(long, env = "JSON_EXTRACT_GUEST_VOICE")]
    guest_voice: Option<String>,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "JSON_EXTRACT_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Transport retries per LLM call.
    #[arg(long, env = "JSON_EXTRACT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Disable the single strict re-prompt on undecodable output.
    #[arg(long, env = "JSON_EXTRACT_NO_STRICT_RETRY")]
    no_strict_retry: bool,

    /// Number of quiz questions.
    #[arg(long, env = "JSON_EXTRACT_NUM_QUESTIONS", default_value_t = 5)]
    num_questions: usize,

    /// Quiz type, e.g. mcq, true/false, short-answer.
    #[arg(long, env = "JSON_EXTRACT_QUIZ_TYPE", default_value = "mcq")]
    quiz_type: String,

    /// Decode the candidate and pretty-print it.
    #[arg(long, env = "JSON_EXTRACT_PRETTY")]
    pretty: bool,

    /// On failure, print a JSON error payload to stdout and exit 1.
    #[arg(long, env = "JSON_EXTRACT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "JSON_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "JSON_EXTRACT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Mindmap,
    Quiz,
    Summary,
    Infographic,
    Podcast,
}

impl From<KindArg> for MaterialKind {
    fn from(v: KindArg) -> Self {
        match v {
            KindArg::Mindmap => MaterialKind::MindMap,
            KindArg::Quiz => MaterialKind::Quiz,
            KindArg::Summary => MaterialKind::Summary,
            KindArg::Infographic => MaterialKind::Infographic,
            KindArg::Podcast => MaterialKind::Podcast,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Run ──────────────────────────────────────────────────────────────
    let result: Result<String, ExtractError> = if let Some(kind) = cli.generate {
        let config = build_config(&cli)?;
        let voices = match (&cli.host_voice, &cli.guest_voice) {
            (Some(h), Some(g)) => Some((h.as_str(), g.as_str())),
            _ => None,
        };
        let document = if cli.input == "-" {
            Ok(read_stdin()?)
        } else {
            load_document(&cli.input).await
        };
        match document {
            Ok(text) => generate_value(kind.into(), &text, voices, &config)
                .await
                .and_then(|v| render_json(&v, cli.pretty)),
            Err(e) => Err(e),
        }
    } else {
        let input = read_input(&cli.input).await?;
        if let Some(kind) = cli.schema {
            decode_kind(kind.into(), &input).and_then(|v| render_json(&v, cli.pretty))
        } else if cli.pretty {
            decode_value(&input).and_then(|v| render_json(&v, true))
        } else {
            Ok(extract_json(&input))
        }
    };

    let rendered = match result {
        Ok(s) => s,
        Err(e) if cli.json => {
            let payload = render_json(&e.to_payload(), cli.pretty)?;
            println!("{payload}");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Extraction failed"),
    };

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref path) = cli.output {
        write_atomic(path, &rendered)
            .await
            .context("Failed to write output")?;
        if !cli.quiet {
            eprintln!("Wrote {} bytes → {}", rendered.len(), path.display());
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    Ok(())
}

/// Read raw model output. Invalid UTF-8 is replaced, never rejected.
async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        return read_stdin();
    }
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read input from {:?}", input))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_stdin() -> Result<String> {
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .context("Failed to read stdin")?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .strict_retry(!cli.no_strict_retry)
        .num_questions(cli.num_questions)
        .quiz_type(cli.quiz_type.clone());

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    builder.build().context("Invalid configuration")
}
