use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ironvault_md_config::Config;
use ironvault_md_engine::{Converter, TemplateRenderer, TemplateSettings, unhandled_names};
use pulldown_cmark::{Options, Parser as MarkdownParser, html};

/// Output name meaning standard output.
const STDOUT: &str = "-";
const STYLESHEET: &str = "ironvault.css";

#[derive(Parser)]
#[command(
    name = "ironvault-md",
    about = "Convert Markdown journals with Iron Vault mechanics to HTML"
)]
struct Cli {
    /// Markdown file to convert.
    input: PathBuf,
    /// HTML file to write, `-` for stdout. Defaults to `<INPUT>.html`.
    output: Option<PathBuf>,
    /// Config file to use instead of ~/.config/ironvault-md/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Template directory, takes precedence over the config file.
    #[arg(long)]
    templates: Option<PathBuf>,
}

/// Where the page goes. `None` is stdout.
fn output_path(input: &Path, output: Option<&Path>) -> Option<PathBuf> {
    match output {
        Some(path) if path.as_os_str() == STDOUT => None,
        Some(path) => Some(path.to_path_buf()),
        None => {
            let mut name = input.as_os_str().to_owned();
            name.push(".html");
            Some(PathBuf::from(name))
        }
    }
}

fn template_settings(config: Option<Config>, templates: Option<PathBuf>) -> TemplateSettings {
    let config = config.unwrap_or_default();
    TemplateSettings {
        dir: templates.or(config.template_dir),
        overrides: config.templates,
    }
}

fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut out = String::new();
    html::push_html(&mut out, MarkdownParser::new_ext(markdown, options));
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<link rel=\"stylesheet\" href=\"{STYLESHEET}\">\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        html_escape::encode_text(title)
    )
}

/// Converts one document into a complete HTML page.
fn convert_document(converter: &Converter<TemplateRenderer>, title: &str, text: &str) -> Result<String> {
    let conversion = converter.convert(text)?;
    if !conversion.diagnostics.is_empty() {
        log::info!(
            "{}: {} mechanics line(s) needed recovery",
            title,
            conversion.diagnostics.len()
        );
    }
    Ok(page(title, &conversion.to_html(render_markdown)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Some(
            Config::load_from_path(path)?
                .with_context(|| format!("Config file {} does not exist", path.display()))?,
        ),
        None => Config::load()?,
    };
    let renderer = TemplateRenderer::with_settings(template_settings(config, cli.templates));
    let converter = Converter::new(renderer);

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let title = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let html = convert_document(&converter, &title, &text)
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    match output_path(&cli.input, cli.output.as_deref()) {
        Some(path) => {
            fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => io::stdout().write_all(html.as_bytes())?,
    }

    let unhandled = unhandled_names();
    if !unhandled.is_empty() {
        log::warn!("Unhandled mechanics: {}", unhandled.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn output_defaults_next_to_input() {
        assert_eq!(
            output_path(Path::new("notes/session.md"), None),
            Some(PathBuf::from("notes/session.md.html"))
        );
        assert_eq!(output_path(Path::new("a.md"), Some(Path::new("-"))), None);
        assert_eq!(
            output_path(Path::new("a.md"), Some(Path::new("out/b.html"))),
            Some(PathBuf::from("out/b.html"))
        );
    }

    #[test]
    fn cli_template_dir_wins_over_config() {
        let mut templates = BTreeMap::new();
        templates.insert("xp".to_string(), String::new());
        let config = Config {
            template_dir: Some(PathBuf::from("/from/config")),
            templates: templates.clone(),
        };

        let settings = template_settings(Some(config.clone()), Some(PathBuf::from("/from/cli")));
        assert_eq!(settings.dir, Some(PathBuf::from("/from/cli")));
        assert_eq!(settings.overrides, templates);

        let settings = template_settings(Some(config), None);
        assert_eq!(settings.dir, Some(PathBuf::from("/from/config")));

        assert_eq!(template_settings(None, None), TemplateSettings::default());
    }

    #[test]
    fn converts_markdown_and_mechanics() {
        let converter = Converter::new(TemplateRenderer::new());
        let text = "Some *prose*.\n\n```iron-vault-mechanics\nxp from=1 to=2\n```";

        let html = convert_document(&converter, "Session <1>", text).unwrap();

        assert!(html.contains("<title>Session &lt;1&gt;</title>"));
        assert!(html.contains(r#"<link rel="stylesheet" href="ironvault.css">"#));
        assert!(html.contains("<p>Some <em>prose</em>.</p>"));
        assert!(html.contains(r#"<div class="ivm-mechanics"><div class="ivm-xp">XP: 1 → 2</div></div>"#));
    }

    #[test]
    fn template_dir_from_settings_is_used() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nodes")).unwrap();
        fs::write(
            dir.path().join("nodes/xp.html"),
            "<span class=\"xp\">{{ to }}</span>",
        )
        .unwrap();

        let settings = template_settings(None, Some(dir.path().to_path_buf()));
        let converter = Converter::new(TemplateRenderer::with_settings(settings));
        let html =
            convert_document(&converter, "t", "```iron-vault-mechanics\nxp from=1 to=2\n```")
                .unwrap();

        assert!(html.contains(r#"<div class="ivm-mechanics"><span class="xp">2</span></div>"#));
    }
}
