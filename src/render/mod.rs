//! Output rendering: the map page and the raw JSON listing array.

use crate::config::OutputFormat;
use crate::site::{Coordinates, Listing};
use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::path::Path;
use tracing::info;

const MAPS_JS_URL: &str = "https://maps.googleapis.com/maps/api/js";

const PAGE_STYLE: &str = "html, body, #map { height: 100%; margin: 0; padding: 0; } \
    .listing h3 { margin: 0 0 4px; font-size: 14px; } \
    .listing p { margin: 2px 0; font-size: 12px; }";

/// Places one marker per listing that has coordinates. Info-window content is
/// built with DOM nodes so listing text is never parsed as HTML.
const MARKER_SCRIPT: &str = r#"
function listingContent(listing) {
  var root = document.createElement('div');
  root.className = 'listing';
  var title = document.createElement('h3');
  var link = document.createElement('a');
  link.href = listing.link;
  link.target = '_blank';
  link.rel = 'noopener';
  link.textContent = listing.title;
  title.appendChild(link);
  root.appendChild(title);
  [
    listing.price !== null ? '$' + listing.price.toFixed(2) : null,
    listing.address,
    listing.posted_date,
    listing.description
  ].forEach(function (text) {
    if (text) {
      var p = document.createElement('p');
      p.textContent = text;
      root.appendChild(p);
    }
  });
  return root;
}

function initMap() {
  var map = new google.maps.Map(document.getElementById('map'), {
    center: mapCenter,
    zoom: 12
  });
  var infoWindow = new google.maps.InfoWindow();
  apartments.forEach(function (listing) {
    if (!listing.coordinates) {
      return;
    }
    var marker = new google.maps.Marker({
      position: listing.coordinates,
      map: map,
      title: listing.title
    });
    marker.addListener('click', function () {
      infoWindow.setContent(listingContent(listing));
      infoWindow.open(map, marker);
    });
  });
}
"#;

const PAGE_TITLE: &str = "Apartments";

/// Renders accepted listings onto a map page.
#[derive(Debug, Default)]
pub struct MapRenderer;

impl MapRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Renders a self-contained HTML document. Output depends only on the
    /// arguments.
    pub fn render(
        &self,
        listings: &[Listing],
        center: Coordinates,
        js_api_key: &str,
    ) -> Result<String> {
        let data = script_json(listings).context("Failed to serialize listings")?;
        let center = script_json(&center).context("Failed to serialize map center")?;
        let maps_src = format!(
            "{}?key={}&callback=initMap",
            MAPS_JS_URL,
            urlencoding::encode(js_api_key)
        );

        let markers = listings.iter().filter(|l| l.has_marker()).count();
        info!("Rendering {} listings ({} with map markers)", listings.len(), markers);

        Ok(self.page(&data, &center, &maps_src).into_string())
    }

    fn page(&self, data: &str, center: &str, maps_src: &str) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (PAGE_TITLE) }
                    style { (PreEscaped(PAGE_STYLE)) }
                }
                body {
                    div id="map" {}
                    script {
                        (PreEscaped(format!("var apartments = {};\nvar mapCenter = {};", data, center)))
                    }
                    script { (PreEscaped(MARKER_SCRIPT)) }
                    script src=(maps_src) defer {}
                }
            }
        }
    }
}

/// Serializes a value for embedding inside a `<script>` element.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// Pretty-printed JSON array of listings.
pub fn render_json(listings: &[Listing]) -> Result<String> {
    serde_json::to_string_pretty(listings).context("Failed to serialize listings")
}

/// Renders `listings` in the requested format.
pub fn render(
    format: OutputFormat,
    listings: &[Listing],
    center: Coordinates,
    js_api_key: &str,
) -> Result<String> {
    match format {
        OutputFormat::Html => MapRenderer::new().render(listings, center, js_api_key),
        OutputFormat::Json => render_json(listings),
    }
}

/// Replaces `path` with `contents` in one step (sibling temp file + rename).
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Output path has no file name: {}", path.display()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write output: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move output into place: {}", path.display()))?;

    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_listing(title: &str, price: f64, coordinates: Option<Coordinates>) -> Listing {
        Listing {
            title: title.to_string(),
            link: format!("https://www.kijiji.ca/v/{}", title.len()),
            description: "Close to transit".to_string(),
            address: Some("1 Main St".to_string()),
            price: Some(price),
            coordinates,
            posted_date: Some("Yesterday".to_string()),
        }
    }

    fn center() -> Coordinates {
        Coordinates::new(45.4214, -75.6919)
    }

    #[test]
    fn test_render_is_deterministic() {
        let listings = vec![
            make_listing("Loft", 800.0, Some(Coordinates::new(45.4, -75.7))),
            make_listing("Basement", 500.0, None),
        ];
        let renderer = MapRenderer::new();

        let first = renderer.render(&listings, center(), "js-key").unwrap();
        let second = renderer.render(&listings, center(), "js-key").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_embeds_inputs() {
        let listings = vec![make_listing("Loft", 800.0, Some(Coordinates::new(45.4, -75.7)))];
        let html = MapRenderer::new().render(&listings, center(), "js-key").unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#""title":"Loft""#));
        assert!(html.contains(r#""coordinates":{"lat":45.4,"lng":-75.7}"#));
        assert!(html.contains(r#"var mapCenter = {"lat":45.4214,"lng":-75.6919};"#));
        assert!(html.contains("maps/api/js?key=js-key&amp;callback=initMap"));
        assert!(html.contains("<div id=\"map\"></div>"));
    }

    #[test]
    fn test_render_escapes_script_breakout() {
        let listings = vec![make_listing("</script><script>alert(1)</script>", 800.0, None)];
        let html = MapRenderer::new().render(&listings, center(), "k").unwrap();

        assert!(!html.contains("</script><script>alert(1)"));
        assert!(html.contains("\\u003c/script>"));
    }

    #[test]
    fn test_render_empty_listing_set() {
        let html = MapRenderer::new().render(&[], center(), "k").unwrap();
        assert!(html.contains("var apartments = [];"));
    }

    #[test]
    fn test_render_page_title() {
        let html = MapRenderer::new().render(&[], center(), "k").unwrap();
        assert!(html.contains("<title>Apartments</title>"));
    }

    #[test]
    fn test_render_json_format() {
        let listings = vec![make_listing("Loft", 800.0, None)];
        let output = render(OutputFormat::Json, &listings, center(), "k").unwrap();

        assert!(output.starts_with('['));
        let parsed: Vec<Listing> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, listings);
    }

    #[test]
    fn test_write_output_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.html");

        write_output(&path, "first version, longer").unwrap();
        write_output(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join(".map.html.tmp").exists());
    }

    #[test]
    fn test_write_output_missing_directory() {
        let err = write_output(Path::new("/nonexistent/dir/map.html"), "x").unwrap_err();
        assert!(err.to_string().contains("Failed to write output"));
    }
}
