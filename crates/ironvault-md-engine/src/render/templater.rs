//! `minijinja` backed [`Renderer`].
//!
//! Templates are looked up by name, `nodes/<key>.html` or `blocks/<key>.html`.
//! A configured template directory is searched first, then the packaged
//! defaults. String overrides beat both; an empty override disables the key.

use std::collections::BTreeMap;
use std::path::PathBuf;

use minijinja::{AutoEscape, Environment, ErrorKind};

use super::{RenderError, Renderer, Template, TemplateKind};
use crate::parsers::Args;

macro_rules! packaged {
    ($($path:literal),+ $(,)?) => {
        &[$(($path, include_str!(concat!("../../templates/", $path)))),+]
    };
}

/// Templates shipped with the crate, by lookup name.
const DEFAULT_TEMPLATES: &[(&str, &str)] = packaged![
    "blocks/actor.html",
    "blocks/block.html",
    "blocks/mechanics.html",
    "blocks/move.html",
    "blocks/oracle.html",
    "nodes/add.html",
    "nodes/burn.html",
    "nodes/clock.html",
    "nodes/impact.html",
    "nodes/initiative.html",
    "nodes/meter.html",
    "nodes/move.html",
    "nodes/node.html",
    "nodes/ooc.html",
    "nodes/oracle.html",
    "nodes/position.html",
    "nodes/progress.html",
    "nodes/progress_roll.html",
    "nodes/reroll.html",
    "nodes/roll.html",
    "nodes/roll_result.html",
    "nodes/rolls.html",
    "nodes/track.html",
    "nodes/xp.html",
];

fn default_template(name: &str) -> Option<&'static str> {
    DEFAULT_TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, source)| *source)
}

/// Where templates come from besides the packaged defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSettings {
    /// Directory searched before the packaged defaults.
    pub dir: Option<PathBuf>,
    /// Inline template sources keyed by override key. Node templates use their
    /// renderer key (`roll`), block templates append `_block` (`move_block`).
    pub overrides: BTreeMap<String, String>,
}

/// Normalizes a renderer key: lowercase, spaces and dashes become underscores.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase().replace([' ', '-'], "_")
}

/// Key a template is overridden under.
pub fn override_key(key: &str, kind: TemplateKind) -> String {
    match kind {
        TemplateKind::Node => normalize_key(key),
        TemplateKind::Block => format!("{}_block", normalize_key(key)),
    }
}

fn template_name(key: &str, kind: TemplateKind) -> String {
    format!("{}/{}.html", kind.dir(), normalize_key(key))
}

/// Name prefix of inline overrides. Never resolved through the loader.
const OVERRIDE_PREFIX: &str = "overrides/";

fn override_name(key: &str) -> String {
    format!("{OVERRIDE_PREFIX}{key}.html")
}

pub struct TemplateRenderer {
    env: Environment<'static>,
    disabled: Vec<String>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Renderer using only the packaged templates.
    pub fn new() -> Self {
        Self::with_settings(TemplateSettings::default())
    }

    pub fn with_settings(settings: TemplateSettings) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let user_dir = settings.dir.map(minijinja::path_loader);
        env.set_loader(move |name| {
            if name.starts_with(OVERRIDE_PREFIX) {
                return Ok(None);
            }
            if let Some(load) = &user_dir
                && let Some(source) = load(name)?
            {
                return Ok(Some(source));
            }
            Ok(default_template(name).map(str::to_owned))
        });

        let mut renderer = Self {
            env,
            disabled: Vec::new(),
        };
        for (key, source) in settings.overrides {
            renderer.set_override(&key, source);
        }
        renderer
    }

    /// Overrides the template stored under `key`. An empty source disables it.
    ///
    /// A source that fails to compile is logged and leaves the key unchanged.
    pub fn set_override(&mut self, key: &str, source: String) {
        let key = normalize_key(key);
        if source.trim().is_empty() {
            log::debug!("Disabling template {key}");
            self.disabled.push(key);
            return;
        }
        self.disabled.retain(|k| *k != key);
        if let Err(err) = self.env.add_template_owned(override_name(&key), source) {
            log::warn!("Ignoring override for {key}: {err}");
        }
    }

    fn find(&self, name: &str) -> Option<minijinja::Template<'_, '_>> {
        match self.env.get_template(name) {
            Ok(template) => Some(template),
            Err(err) if err.kind() == ErrorKind::TemplateNotFound => None,
            Err(err) => {
                log::warn!("Template {name} cannot be loaded: {err}");
                None
            }
        }
    }
}

struct JinjaTemplate<'env>(minijinja::Template<'env, 'env>);

impl Template for JinjaTemplate<'_> {
    fn render(&self, args: &Args) -> Result<String, RenderError> {
        Ok(self.0.render(args)?)
    }
}

impl Renderer for TemplateRenderer {
    fn lookup(&self, key: &str, kind: TemplateKind) -> Option<Box<dyn Template + '_>> {
        let over = override_key(key, kind);
        if self.disabled.contains(&over) {
            return None;
        }

        let template = self
            .find(&override_name(&over))
            .or_else(|| self.find(&template_name(key, kind)));
        if template.is_none() {
            log::debug!("No {} template for {key}", kind.dir());
        }
        template.map(|t| Box::new(JinjaTemplate(t)) as Box<dyn Template + '_>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn render(renderer: &TemplateRenderer, key: &str, kind: TemplateKind, args: &Args) -> String {
        renderer
            .lookup(key, kind)
            .expect("template exists")
            .render(args)
            .expect("template renders")
    }

    #[test]
    fn every_packaged_template_compiles() {
        let renderer = TemplateRenderer::new();
        for (name, _) in DEFAULT_TEMPLATES {
            assert!(renderer.env.get_template(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn keys_are_normalized() {
        assert_eq!(normalize_key("Progress Roll"), "progress_roll");
        assert_eq!(normalize_key("progress-roll"), "progress_roll");
        assert_eq!(override_key("move", TemplateKind::Block), "move_block");
        assert_eq!(override_key("move", TemplateKind::Node), "move");
    }

    #[test]
    fn unknown_key_has_no_template() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.lookup("nonexistent", TemplateKind::Node).is_none());
        assert!(renderer.lookup("roll", TemplateKind::Block).is_none());
    }

    #[test]
    fn values_are_html_escaped() {
        let renderer = TemplateRenderer::new();
        let out = render(
            &renderer,
            "node",
            TemplateKind::Node,
            &args! { "name" => "X", "content" => "<b>" },
        );
        assert!(out.contains("&lt;b&gt;"), "{out}");
    }

    #[test]
    fn override_replaces_default() {
        let mut renderer = TemplateRenderer::new();
        renderer.set_override("roll", "<p>{{ score }}</p>".to_string());
        let out = render(&renderer, "roll", TemplateKind::Node, &args! { "score" => 7 });
        assert_eq!(out, "<p>7</p>");
    }

    #[test]
    fn empty_override_disables() {
        let settings = TemplateSettings {
            overrides: BTreeMap::from([("move_block".to_string(), String::new())]),
            ..Default::default()
        };
        let renderer = TemplateRenderer::with_settings(settings);
        assert!(renderer.lookup("move", TemplateKind::Block).is_none());
        assert!(renderer.lookup("move", TemplateKind::Node).is_some());
    }

    #[test]
    fn broken_override_keeps_default() {
        let mut renderer = TemplateRenderer::new();
        renderer.set_override("xp", "{% if %}".to_string());
        let out = render(&renderer, "xp", TemplateKind::Node, &args! { "from" => 1, "to" => 2 });
        assert!(out.contains("ivm-xp"), "{out}");
    }

    #[test]
    fn template_dir_wins_over_packaged() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nodes")).unwrap();
        fs::write(dir.path().join("nodes/xp.html"), "<i>{{ to }}</i>").unwrap();

        let renderer = TemplateRenderer::with_settings(TemplateSettings {
            dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let out = render(&renderer, "xp", TemplateKind::Node, &args! { "to" => 3 });
        assert_eq!(out, "<i>3</i>");

        // Keys missing from the directory still resolve to the packaged copy
        assert!(renderer.lookup("roll", TemplateKind::Node).is_some());
    }

    #[test]
    fn template_dir_cannot_supply_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("overrides")).unwrap();
        fs::write(dir.path().join("overrides/xp.html"), "<b>shadowed</b>").unwrap();

        let renderer = TemplateRenderer::with_settings(TemplateSettings {
            dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let out = render(&renderer, "xp", TemplateKind::Node, &args! { "from" => 1, "to" => 2 });
        assert!(out.contains("ivm-xp"), "{out}");
    }
}
