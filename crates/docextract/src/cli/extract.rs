//! The `docextract extract` command.
//!
//! Every document runs as its own extraction call. At most as many documents
//! as the provider's gate has slots are in flight, and each one reads its
//! images only when it starts. Records are written in completion order.

use clap::Args;
use docextract_core::{
    Config, Document, ExtractError, ExtractionRecord, Extractor, JsonOutputParser, ModelId,
    OutputFormat, OutputWriter, PageImage, RenderMethod,
};
use futures_util::stream::{self, StreamExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Arguments for the `extract` command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Model identifier (gpt-*, gemini-*, mistral-*, claude-*)
    #[arg(short, long)]
    pub model: ModelId,

    /// How OCR output is rendered into the prompt
    #[arg(long, default_value = "simple")]
    pub method: RenderMethod,

    /// Key to extract; repeat for several keys
    #[arg(short, long = "key", required = true)]
    pub keys: Vec<String>,

    /// Treat all images as pages of a single document
    #[arg(long)]
    pub multipage: bool,

    /// Output format
    #[arg(short, long, default_value = "jsonl")]
    pub format: OutputFormat,

    /// Write records to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Page images
    #[arg(required = true)]
    pub images: Vec<PathBuf>,
}

/// One document to extract: its page image paths, in order.
struct Job {
    pages: Vec<PathBuf>,
    multipage: bool,
}

impl Job {
    fn source(&self) -> Vec<String> {
        self.pages.iter().map(|p| display(p)).collect()
    }

    /// Read the page images off the async executor.
    async fn load(&self) -> Result<Document, ExtractError> {
        let pages = self.pages.clone();
        let multipage = self.multipage;
        tokio::task::spawn_blocking(move || {
            let mut images = pages
                .iter()
                .map(|p| PageImage::open(p))
                .collect::<Result<Vec<_>, _>>()?;
            match (multipage, images.pop()) {
                (false, Some(image)) if images.is_empty() => Ok(Document::Single(image)),
                (_, Some(last)) => {
                    images.push(last);
                    Ok(Document::Pages(images))
                }
                (_, None) => Err(ExtractError::Image {
                    message: "document has no pages".to_string(),
                }),
            }
        })
        .await
        .map_err(|e| ExtractError::Task(format!("image loader failed: {e}")))?
    }
}

/// Execute the extract command.
pub async fn execute(args: ExtractArgs, config: Config) -> anyhow::Result<()> {
    let extractor = Extractor::from_config(&config)?;
    let parser = JsonOutputParser::new(args.keys.iter().cloned());
    let jobs = plan_jobs(&args.images, args.multipage);
    let in_flight = max_in_flight(&extractor, &args.model);

    tracing::info!(
        "Extracting {} document(s) with {} ({} method, {} key(s), {in_flight} at a time)",
        jobs.len(),
        args.model,
        args.method,
        parser.keys().len()
    );

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, args.format, true);

    let mut records = stream::iter(jobs)
        .map(|job| {
            let extractor = &extractor;
            let parser = &parser;
            let model = &args.model;
            let method = args.method;
            async move {
                let outcome = match job.load().await {
                    Ok(document) => extractor.extract(model, method, parser, &document).await,
                    Err(e) => Err(e),
                };
                let source = job.source();
                if let Err(e) = &outcome {
                    tracing::error!("Failed: {} - {e}", source.join(", "));
                }
                ExtractionRecord::new(source, model, method, outcome)
            }
        })
        .buffer_unordered(in_flight);

    while let Some(record) = records.next().await {
        writer.write(record)?;
    }

    let (succeeded, failed) = writer.finish()?;
    tracing::info!("Done: {succeeded} succeeded, {failed} failed");
    if let Some(path) = &args.output {
        tracing::info!("Records written to {}", path.display());
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} document(s) failed", succeeded + failed);
    }
    Ok(())
}

/// Documents worth starting at once: the gate admits no more than this.
fn max_in_flight(extractor: &Extractor, model: &ModelId) -> usize {
    extractor.gate().capacity(model.provider()).max(1)
}

/// Group image paths into documents. No file is read here.
fn plan_jobs(images: &[PathBuf], multipage: bool) -> Vec<Job> {
    if multipage {
        vec![Job {
            pages: images.to_vec(),
            multipage: true,
        }]
    } else {
        images
            .iter()
            .map(|p| Job {
                pages: vec![p.clone()],
                multipage: false,
            })
            .collect()
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docextract_core::{ConcurrencyGate, DocumentRenderer, LlmClientFactory, OcrScanner, TextBox};
    use std::sync::Arc;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, image_bytes()).unwrap();
        path
    }

    // A valid 1x1 RGBA PNG.
    fn image_bytes() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
            0xDA, 0x63, 0x64, 0x60, 0xF8, 0x5F, 0x0F, 0x00, 0x02, 0x87, 0x01, 0x80, 0xEB, 0x47,
            0xBA, 0x92, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ]
    }

    struct NoOcr;

    impl OcrScanner for NoOcr {
        fn name(&self) -> &str {
            "none"
        }

        fn scan(&self, _image: &PageImage) -> Result<Vec<TextBox>, ExtractError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_planning_reads_no_files() {
        let missing = PathBuf::from("/nonexistent/a.png");
        let jobs = plan_jobs(&[missing.clone(), missing], false);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].source(), vec!["/nonexistent/a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_one_job_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png");
        let b = write_png(dir.path(), "b.png");

        let jobs = plan_jobs(&[a, b], false);
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].source()[0].ends_with("a.png"));
        assert!(matches!(jobs[1].load().await, Ok(Document::Single(_))));
    }

    #[tokio::test]
    async fn test_multipage_is_one_job() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png");
        let b = write_png(dir.path(), "b.png");

        let jobs = plan_jobs(&[a, b], true);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].source().len(), 2);
        match jobs[0].load().await {
            Ok(doc) => assert_eq!(doc.page_count(), 2),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_single_page_multipage_keeps_page_header() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png");

        let jobs = plan_jobs(&[a], true);
        assert!(matches!(jobs[0].load().await, Ok(Document::Pages(ref p)) if p.len() == 1));
    }

    #[tokio::test]
    async fn test_missing_image_fails_only_its_job() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png");
        let missing = dir.path().join("missing.png");

        let jobs = plan_jobs(&[a, missing], false);
        assert!(jobs[0].load().await.is_ok());
        assert!(jobs[1].load().await.is_err());
    }

    #[test]
    fn test_in_flight_follows_provider_capacity() {
        let extractor = Extractor::new(
            DocumentRenderer::new(Arc::new(NoOcr), 120),
            Arc::new(LlmClientFactory::new(&Config::default())),
            ConcurrencyGate::default(),
        );
        let claude = ModelId::parse("claude-3").unwrap();
        let gpt = ModelId::parse("gpt-4o").unwrap();
        assert_eq!(max_in_flight(&extractor, &claude), 1);
        assert_eq!(max_in_flight(&extractor, &gpt), 5);
    }
}
