//! KML 2.2 rendering of placements.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::collect::Placement;

const ICON_BASE: &str = "http://maps.google.com/mapfiles/ms/icons/";

/// Label to marker icon mapping with a fallback for unknown labels.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyles {
    icons: BTreeMap<String, String>,
    default_icon: String,
}

impl MarkerStyles {
    pub fn new(default_icon: impl Into<String>) -> Self {
        Self {
            icons: BTreeMap::new(),
            default_icon: default_icon.into(),
        }
    }

    pub fn with_icon(mut self, label: impl Into<String>, href: impl Into<String>) -> Self {
        self.insert(label, href);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, href: impl Into<String>) {
        self.icons.insert(label.into(), href.into());
    }

    pub fn set_default_icon(&mut self, href: impl Into<String>) {
        self.default_icon = href.into();
    }

    pub fn default_icon(&self) -> &str {
        &self.default_icon
    }

    pub fn icon_for(&self, label: &str) -> &str {
        self.icons
            .get(label)
            .map(String::as_str)
            .unwrap_or(&self.default_icon)
    }
}

impl Default for MarkerStyles {
    fn default() -> Self {
        let dot = |color: &str| format!("{ICON_BASE}{color}-dot.png");
        Self::new(dot("yellow"))
            .with_icon("person", dot("green"))
            .with_icon("motorcycle", dot("red"))
            .with_icon("truck", dot("yellow"))
            .with_icon("bicycle", dot("orange"))
            .with_icon("bus", dot("purple"))
            .with_icon("car", dot("red"))
    }
}

/// Render a complete KML document, one placemark per placement.
pub fn render_kml(placements: &[Placement], styles: &MarkerStyles) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\">\n  <Document>\n",
    );
    for placement in placements {
        out.push_str(&format!(
            "    <Placemark>\n      <name>{}</name>\n      <Style>\n        <IconStyle>\n          \
             <Icon>\n            <href>{}</href>\n          </Icon>\n        </IconStyle>\n      \
             </Style>\n      <Point>\n        <coordinates>{}</coordinates>\n      </Point>\n    \
             </Placemark>\n",
            escape_xml(&placement.label),
            escape_xml(styles.icon_for(&placement.label)),
            placement.point,
        ));
    }
    out.push_str("  </Document>\n</kml>\n");
    out
}

/// Render and write a KML document to `path`.
pub fn write_kml(path: &Path, placements: &[Placement], styles: &MarkerStyles) -> Result<()> {
    std::fs::write(path, render_kml(placements, styles))
        .with_context(|| format!("writing KML to {}", path.display()))?;
    log::info!("wrote {} placemarks to {}", placements.len(), path.display());
    Ok(())
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
