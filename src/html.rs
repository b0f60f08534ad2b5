//! Dashboard page construction.
//!
//! One embedded HTML page draws both figures with Plotly.js. In serve mode
//! the page fetches view specs from the JSON API; in render mode the specs
//! for every metric and the details for every city are inlined so the file
//! is self-contained.

use crate::config::AppConfig;
use crate::links::LinkTable;
use crate::types::{City, Metric};
use crate::view::{self, BarSpec, DetailView, MapSpec};
use anyhow::{Context, Result};
use geo::{BoundingRect, MultiPoint, Point};
use serde::Serialize;
use std::collections::BTreeMap;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Map framing shared by both delivery modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDefaults {
    pub style: String,
    pub zoom: f64,
    pub center: [f64; 2], // [lat, lon]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub key: String,
    pub label: String,
}

/// Dropdown order, default selection and map framing for the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogInfo {
    pub metrics: Vec<CatalogEntry>,
    pub default_metric: String,
    pub map: MapDefaults,
}

impl CatalogInfo {
    pub fn build(config: &AppConfig, cities: &[City]) -> Self {
        let center = config
            .map
            .center
            .unwrap_or_else(|| computed_center(cities));
        CatalogInfo {
            metrics: Metric::ALL
                .iter()
                .map(|m| CatalogEntry {
                    key: m.key().to_string(),
                    label: m.label().to_string(),
                })
                .collect(),
            default_metric: Metric::Population.key().to_string(),
            map: MapDefaults {
                style: config.map.style.clone(),
                zoom: config.map.zoom,
                center,
            },
        }
    }
}

/// Midpoint of the bounding rectangle of all city positions.
fn computed_center(cities: &[City]) -> [f64; 2] {
    let points: MultiPoint<f64> =
        MultiPoint::new(cities.iter().map(|c| Point::new(c.lon(), c.lat())).collect());
    match points.bounding_rect() {
        Some(rect) => {
            let c = rect.center();
            [c.y, c.x]
        }
        None => [0.0, 0.0],
    }
}

/// The `/api/view` body and the per-metric unit of inlined data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewPayload {
    pub map: MapSpec,
    pub bars: BarSpec,
}

/// Everything the exported page needs to work offline.
#[derive(Debug, Serialize)]
struct InlineData {
    views: BTreeMap<String, ViewPayload>,
    details: BTreeMap<String, serde_json::Value>,
    help: DetailView,
}

#[derive(Debug, Serialize)]
struct PageData<'a> {
    catalog: &'a CatalogInfo,
    inline: Option<InlineData>,
}

/// The page served at `/`, which fetches specs from the API.
pub fn dashboard_page(catalog: &CatalogInfo) -> Result<String> {
    build_page(&PageData {
        catalog,
        inline: None,
    })
}

/// A self-contained page with every metric view and city detail inlined.
pub fn export_page(config: &AppConfig, cities: &[City], links: &LinkTable) -> Result<String> {
    let catalog = CatalogInfo::build(config, cities);

    let mut views = BTreeMap::new();
    for metric in Metric::ALL {
        let (map, bars) = view::render(metric.key(), cities)
            .with_context(|| format!("Failed to build view for metric '{}'", metric.key()))?;
        views.insert(metric.key().to_string(), ViewPayload { map, bars });
    }

    // A missing link is a configuration defect; the export keeps going and
    // the page shows the defect inline when that city is clicked.
    let mut details = BTreeMap::new();
    for city in cities {
        let value = match view::describe(Some(&city.name), cities, links) {
            Ok(detail) => serde_json::to_value(detail)?,
            Err(e) => {
                tracing::warn!("{}", e);
                serde_json::json!({ "error": e.to_string() })
            }
        };
        details.insert(city.name.clone(), value);
    }

    let help = DetailView::Help {
        message: view::HELP_TEXT.to_string(),
    };

    build_page(&PageData {
        catalog: &catalog,
        inline: Some(InlineData {
            views,
            details,
            help,
        }),
    })
}

fn build_page(data: &PageData<'_>) -> Result<String> {
    let json = serde_json::to_string(data)
        .context("Failed to serialize page data")?
        .replace("</", "<\\/");
    Ok(PAGE_TEMPLATE
        .replace("__PLOTLY_CDN__", PLOTLY_CDN)
        .replace("__PAGE_DATA__", &json))
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>City Metric Map</title>
<script src="__PLOTLY_CDN__"></script>
<style>
  body { font-family: Arial, sans-serif; margin: 0; display: flex; flex-direction: column; }
  #controls { padding: 10px; display: flex; gap: 10px; align-items: center; }
  #status { color: #b00020; padding: 0 10px; min-height: 1.2em; }
  #charts { display: flex; flex-wrap: wrap; }
  #map { width: 720px; height: 560px; }
  #bars { width: 480px; height: 560px; }
  #details { padding: 10px; border-top: 1px solid #ccc; max-width: 720px; }
  #details h3 { margin: 4px 0; }
</style>
</head>
<body>
<div id="controls">
  <label for="metric">Metric:</label>
  <select id="metric"></select>
  <button id="clear">Clear selection</button>
</div>
<div id="status"></div>
<div id="charts">
  <div id="map"></div>
  <div id="bars"></div>
</div>
<div id="details"></div>
<script>
const PAGE = __PAGE_DATA__;
const statusEl = document.getElementById('status');
const detailsEl = document.getElementById('details');

function setStatus(message) {
  statusEl.textContent = message || '';
}

function drawDiagnostic(err) {
  setStatus('Could not draw the figures: ' + err +
    '. If the map stays blank, enable hardware acceleration (WebGL) in your browser and reload.');
}

async function fetchJson(url, options) {
  const resp = await fetch(url, options);
  const body = await resp.json();
  if (!resp.ok) {
    throw new Error(body.error || ('request failed: ' + resp.status));
  }
  return body;
}

async function loadView(metricKey) {
  if (PAGE.inline) {
    const payload = PAGE.inline.views[metricKey];
    if (!payload) {
      throw new Error("'" + metricKey + "' is not a selectable metric");
    }
    return payload;
  }
  return fetchJson('/api/view?metric=' + encodeURIComponent(metricKey));
}

async function loadDetail(cityName) {
  if (PAGE.inline) {
    if (cityName === null) {
      return PAGE.inline.help;
    }
    const detail = PAGE.inline.details[cityName];
    if (detail && detail.error) {
      throw new Error(detail.error);
    }
    return detail || PAGE.inline.help;
  }
  if (cityName === null) {
    return fetchJson('/api/clear', { method: 'POST' });
  }
  return fetchJson('/api/describe?city=' + encodeURIComponent(cityName));
}

function drawView(payload) {
  const map = payload.map;
  const names = map.markers.map(m => m.name);
  const mapTrace = {
    type: 'scattermapbox',
    mode: 'markers',
    lat: map.markers.map(m => m.lat),
    lon: map.markers.map(m => m.lon),
    marker: {
      size: map.markers.map(m => m.size),
      color: map.markers.map(m => m.value),
      colorscale: 'RdBu',
      sizemode: 'diameter',
      colorbar: { title: map.colorbar_title }
    },
    customdata: names,
    text: map.markers.map(m => m.tooltip),
    hovertemplate: '%{text}<extra></extra>'
  };
  const mapLayout = {
    title: map.title,
    mapbox: {
      style: PAGE.catalog.map.style,
      zoom: PAGE.catalog.map.zoom,
      center: { lat: PAGE.catalog.map.center[0], lon: PAGE.catalog.map.center[1] }
    },
    margin: { r: 10, t: 40, l: 10, b: 10 }
  };
  const barTrace = {
    type: 'bar',
    x: payload.bars.bars.map(b => b.name),
    y: payload.bars.bars.map(b => b.value),
    customdata: payload.bars.bars.map(b => b.name),
    text: payload.bars.bars.map(b => b.tooltip),
    hovertemplate: '%{text}<extra></extra>',
    textposition: 'none'
  };
  const barLayout = {
    title: payload.bars.title,
    yaxis: { title: payload.bars.axis_label },
    margin: { r: 10, t: 40, l: 60, b: 60 }
  };
  Plotly.react('map', [mapTrace], mapLayout);
  Plotly.react('bars', [barTrace], barLayout);
}

function renderDetail(detail) {
  if (detail.kind === 'help') {
    detailsEl.innerHTML = '<p>' + detail.message + '</p>';
    return;
  }
  const lines = detail.lines.map(line => '<li>' + line + '</li>').join('');
  detailsEl.innerHTML = '<h3>' + detail.name + '</h3><ul>' + lines + '</ul>' +
    '<p><a href="' + detail.url + '" target="_blank" rel="noopener">More about ' +
    detail.name + '</a></p>';
}

async function selectMetric(metricKey) {
  setStatus('');
  try {
    const payload = await loadView(metricKey);
    try {
      drawView(payload);
    } catch (err) {
      drawDiagnostic(err.message || err);
    }
  } catch (err) {
    setStatus(err.message || String(err));
  }
}

async function selectCity(cityName) {
  setStatus('');
  try {
    renderDetail(await loadDetail(cityName));
  } catch (err) {
    setStatus(err.message || String(err));
  }
}

function wireUp() {
  const select = document.getElementById('metric');
  for (const entry of PAGE.catalog.metrics) {
    const option = document.createElement('option');
    option.value = entry.key;
    option.textContent = entry.label;
    select.appendChild(option);
  }
  select.value = PAGE.catalog.default_metric;
  select.addEventListener('change', () => selectMetric(select.value));
  document.getElementById('clear').addEventListener('click', () => selectCity(null));

  selectMetric(PAGE.catalog.default_metric).then(() => {
    const mapEl = document.getElementById('map');
    const barsEl = document.getElementById('bars');
    if (mapEl.on) {
      mapEl.on('plotly_click', ev => selectCity(ev.points[0].customdata));
    }
    if (barsEl.on) {
      barsEl.on('plotly_click', ev => selectCity(ev.points[0].customdata));
    }
  });
  selectCity(null);
}

wireUp();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_cities;
    use std::collections::HashMap;

    #[test]
    fn catalog_preserves_dropdown_order() {
        let config = AppConfig::default();
        let cities = sample_cities();
        let catalog = CatalogInfo::build(&config, &cities);
        let keys: Vec<_> = catalog.metrics.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "population",
                "median_income",
                "growth_rate",
                "intersections",
                "traffic_spending"
            ]
        );
        assert_eq!(catalog.default_metric, "population");
    }

    #[test]
    fn center_defaults_to_bounding_rect_midpoint() {
        let config = AppConfig::default();
        let cities = sample_cities();
        let catalog = CatalogInfo::build(&config, &cities);
        let [lat, lon] = catalog.map.center;
        // sample latitudes span 32.7357..33.2148, longitudes -97.1331..-96.6989
        assert!((lat - (32.7357 + 33.2148) / 2.0).abs() < 1e-9);
        assert!((lon - (-97.1331 + -96.6989) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn config_center_overrides_computed() {
        let mut config = AppConfig::default();
        config.map.center = Some([32.7767, -96.7970]);
        let catalog = CatalogInfo::build(&config, &sample_cities());
        assert_eq!(catalog.map.center, [32.7767, -96.7970]);
    }

    #[test]
    fn exported_page_is_self_contained() {
        let config = AppConfig::default();
        let cities = sample_cities();
        let links = LinkTable::build(&HashMap::new());
        let page = export_page(&config, &cities, &links).unwrap();
        assert!(page.contains("\"inline\":"));
        assert!(page.contains("traffic_spending"));
        assert!(page.contains("en.wikipedia.org/wiki/Plano,_Texas"));
        assert!(!page.contains("__PAGE_DATA__"));
    }

    #[test]
    fn served_page_has_no_inline_data() {
        let config = AppConfig::default();
        let cities = sample_cities();
        let catalog = CatalogInfo::build(&config, &cities);
        let page = dashboard_page(&catalog).unwrap();
        assert!(page.contains("\"inline\":null"));
        assert!(page.contains("/api/view?metric="));
    }
}
