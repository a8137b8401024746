// crates/edge/src/cli.rs

use crate::error::Error;
use chrono::Utc;
use clap::{builder::ValueHint, Parser, Subcommand};
use domain::setting::RenderSettings;
use serve::render::{fragments_to_html, BlockRenderer};
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{debug, error, info};

pub type Result<T> = std::result::Result<T, Error>;

/// ToolRadar CLI — render CMS block documents to HTML
#[tracing::instrument(skip_all)]
pub fn start() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render(cmd) => do_render(cmd),
    };

    result.map_or_else(
        |e| {
            error!("Render failed: {}", e);
            ExitCode::FAILURE
        },
        |_| ExitCode::SUCCESS,
    )
}

#[derive(Parser, Debug)]
#[command(name = "toolradar", version, about = "ToolRadar content renderer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a block document (JSON) to HTML
    Render(RenderCmd),
}

#[derive(Parser, Debug)]
pub struct RenderCmd {
    /// Block document: a JSON array, or a page object with a `body` array
    #[arg(
        long,
        short,
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        value_parser = file_must_exist
    )]
    pub input: PathBuf,

    /// Render settings (or set TOOLRADAR_SETTINGS)
    #[arg(
        long,
        short,
        value_name = "FILE",
        env = "TOOLRADAR_SETTINGS",
        value_hint = ValueHint::FilePath,
        value_parser = file_must_exist
    )]
    pub settings: Option<PathBuf>,

    /// Show diagnostics for unknown or broken blocks
    #[arg(long)]
    pub diagnostics: bool,

    /// Write HTML here instead of stdout
    #[arg(long, short, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

fn file_must_exist(s: &str) -> std::result::Result<PathBuf, String> {
    let p = PathBuf::from(s);
    if !p.exists() {
        return Err(format!("Not found: {}", p.display()));
    }
    if !p.is_file() {
        return Err(format!("Not a file: {}", p.display()));
    }
    Ok(p)
}

#[tracing::instrument(skip_all)]
fn do_render(cmd: RenderCmd) -> Result<()> {
    let mut settings = match &cmd.settings {
        Some(path) => load_settings(path)?,
        None => RenderSettings::default(),
    };
    if cmd.diagnostics {
        settings.diagnostics = true;
    }
    debug!(?settings, "settings resolved");

    let then = Utc::now();
    let html = render_file(&cmd.input, settings)?;
    info!(
        "Rendered {} in {} milliseconds",
        cmd.input.display(),
        Utc::now().timestamp_millis() - then.timestamp_millis()
    );

    match &cmd.output {
        Some(path) => std::fs::write(path, html)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Load `RenderSettings` from a TOML file.
pub fn load_settings(path: &Path) -> Result<RenderSettings> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| Error::Config(format!("Failed reading {}: {}", path.display(), err)))?;

    RenderSettings::from_toml(&text)
        .map_err(|err| Error::Config(format!("Invalid settings at {}: {}", path.display(), err)))
}

/// Read a JSON document from disk and render it to an HTML string.
pub fn render_file(path: &Path, settings: RenderSettings) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    let input: serde_json::Value = serde_json::from_str(&text)?;
    let body = serve::document_body(&input);

    let renderer = BlockRenderer::with_settings(settings).map_err(serve::Error::from)?;
    let fragments = renderer.render_document(body);
    info!(fragments = fragments.len(), "document rendered");

    Ok(fragments_to_html(&fragments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn settings_file_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "diagnostics = true\n[ads]\ntoc_slot = \"AD1\"\n").unwrap();

        let s = load_settings(&path).unwrap();
        assert!(s.diagnostics);
        assert_eq!(s.ads.toc_slot(), Some("AD1"));
    }

    #[test]
    fn bad_settings_is_config_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "ads = 3").unwrap();

        match load_settings(&path) {
            Err(Error::Config(msg)) => assert!(msg.contains("Invalid settings")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn renders_page_object_with_body() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("post.json");
        fs::write(
            &path,
            r#"{
                "title": "post",
                "body": [
                    { "type": "paragraph", "value": { "text": "hello" } },
                    { "type": "table_of_contents", "value": {} },
                    { "type": "heading", "value": { "text": "Start", "level": "h2" } }
                ]
            }"#,
        )
        .unwrap();

        let settings = RenderSettings::from_toml("[ads]\ntoc_slot = \"AD1\"").unwrap();
        let html = render_file(&path, settings).unwrap();

        let toc = html.find("block-toc").unwrap();
        let ad = html.find("data-ad-slot=\"AD1\"").unwrap();
        let heading = html.find("<h2 id=\"heading-start\"").unwrap();
        assert!(toc < ad && ad < heading);
        assert!(html.contains("hello"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("post.json");
        fs::write(&path, "{ nope").unwrap();

        assert!(matches!(
            render_file(&path, RenderSettings::default()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn non_document_input_renders_empty() {
        let tmp = tempdir().unwrap();
        for (name, text) in [
            ("string.json", "\"just a string\""),
            ("page.json", r#"{ "title": "post", "body": "oops" }"#),
            ("no-body.json", r#"{ "title": "post" }"#),
        ] {
            let path = tmp.path().join(name);
            fs::write(&path, text).unwrap();
            let html = render_file(&path, RenderSettings::default().with_diagnostics(true)).unwrap();
            assert_eq!(html, "", "{name}");
        }
    }

    #[test]
    fn cli_parses_render_command() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("post.json");
        fs::write(&path, "[]").unwrap();

        let cli = Cli::try_parse_from([
            "toolradar",
            "render",
            "--input",
            path.to_str().unwrap(),
            "--diagnostics",
        ])
        .unwrap();
        let Commands::Render(cmd) = cli.command;
        assert_eq!(cmd.input, path);
        assert!(cmd.diagnostics);
        assert!(cmd.output.is_none());
    }

    #[test]
    fn cli_rejects_missing_input() {
        assert!(Cli::try_parse_from(["toolradar", "render", "--input", "/no/such/file.json"]).is_err());
    }
}
