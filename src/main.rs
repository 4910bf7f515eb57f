//! mdbook backend for Confluence storage format generation

use log::{debug, error, info};
use mdbook::{book::BookItem, renderer::RenderContext};

mod admonition;
mod config;
mod kind;
mod level;
mod marker;
mod render;
mod tree;


use config::RenderConfig;
use render::Renderer;

/// Main entrypoint for backend.
fn main() -> Result<(), Error> {
    env_logger::init();
    let mut stdin = std::io::stdin();
    let ctx = RenderContext::from_json(&mut stdin)
        .map_err(|e| format!("Failed to read render context: {e:?}"))?;
    let built_version = semver::Version::parse(mdbook::MDBOOK_VERSION).unwrap_or_else(|e| {
        panic!(
            "failed to parse mdbook version {}: {:?}",
            mdbook::MDBOOK_VERSION,
            e
        )
    });
    let book_version = semver::Version::parse(&ctx.version)
        .unwrap_or_else(|e| panic!("failed to parse book version {}: {:?}", ctx.version, e));
    if built_version != book_version {
        error!(
            "backend built on v{} of mdbook, processing v{} book",
            mdbook::MDBOOK_VERSION,
            ctx.version
        );
    }

    let backend = ConfluenceBackend::new(&ctx)?;
    info!(
        "created Confluence backend, outputs to '{}', config:{:?}",
        backend.dest_dir.display(),
        backend.config
    );

    backend.process(ctx)
}

/// Confluence backend processor.
struct ConfluenceBackend {
    /// Where to put output.
    pub dest_dir: std::path::PathBuf,
    pub config: RenderConfig,
}

/// Local error type.
#[derive(Debug)]
#[allow(dead_code)] // fields are reported through `Debug` when `main` fails
enum Error {
    General(String),
    Io(std::io::Error),
}

impl From<String> for Error {
    fn from(e: String) -> Error {
        Self::General(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Self::Io(e)
    }
}

impl ConfluenceBackend {
    /// Create a new backend, with options populated from the given context.
    pub fn new(ctx: &RenderContext) -> Result<Self, Error> {
        let dest_dir = ctx.destination.clone();
        let config = RenderConfig::from_book(&ctx.config)?;

        std::fs::create_dir_all(&dest_dir).map_err(|e| {
            format!(
                "Failed to create output directory '{}': {:?}",
                dest_dir.display(),
                e
            )
        })?;

        Ok(Self { dest_dir, config })
    }

    /// Render every chapter of the book into its own storage-format file.
    pub fn process(&self, ctx: RenderContext) -> Result<(), Error> {
        let renderer = Renderer::new(self.config);
        for item in ctx.book.iter() {
            match &item {
                BookItem::Chapter(ch) => {
                    let Some(path) = &ch.path else {
                        debug!("Skip draft chapter '{}'", ch.name);
                        continue;
                    };
                    debug!("Visit chapter '{}'", ch.name);
                    let doc = renderer.parse(&ch.content);
                    let outfilename = self.dest_dir.join(path).with_extension("xml");
                    self.write(&renderer, &doc, &outfilename)?;
                }
                BookItem::Separator => debug!("Visit separator"),
                BookItem::PartTitle(title) => debug!("Visit part '{title}'"),
            }
        }
        Ok(())
    }

    /// Write out the rendered chapter.
    fn write(
        &self,
        renderer: &Renderer,
        doc: &tree::Document,
        outfilename: &std::path::Path,
    ) -> Result<(), Error> {
        if let Some(dir) = outfilename.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                format!("Failed to create output directory '{}': {:?}", dir.display(), e)
            })?;
        }
        let outfile = std::fs::File::create(outfilename).map_err(|e| {
            format!(
                "Failed to create output file '{}': {:?}",
                outfilename.display(),
                e
            )
        })?;
        let mut out = std::io::BufWriter::new(outfile);
        renderer.render_document(doc, &mut out)?;
        std::io::Write::flush(&mut out)?;
        info!("wrote '{}'", outfilename.display());
        Ok(())
    }
}
