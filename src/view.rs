//! The metric view selector: pure recomputation of the map and bar specs
//! for a chosen metric, per-city detail views, and the two small pieces of
//! view state (selected metric, selected city).

use crate::links::LinkTable;
use crate::types::{City, Metric};
use serde::Serialize;
use thiserror::Error;

/// Marker diameter given to the city with the selected metric's maximum.
pub const MAX_SIZE: f64 = 50.0;

/// Shown in the details panel before any city has been clicked.
pub const HELP_TEXT: &str =
    "Select a metric from the dropdown, then click a city marker to see its full profile.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("'{0}' is not a selectable metric")]
    InvalidMetric(String),
    #[error("unknown city '{0}'")]
    UnknownCity(String),
    #[error("no link registered for city '{0}'")]
    MissingLink(String),
}

/// One map marker: position, normalized size, raw color value, tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub size: f64,
    pub value: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSpec {
    pub title: String,
    pub colorbar_title: String,
    pub markers: Vec<MarkerSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarEntry {
    pub name: String,
    pub value: f64,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSpec {
    pub title: String,
    pub axis_label: String,
    pub bars: Vec<BarEntry>,
}

/// Details panel content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailView {
    Help { message: String },
    City { name: String, lines: Vec<String>, url: String },
}

/// Recomputes the map and bar specs for the named metric. Pure: the same
/// metric and city table always produce the same specs, and nothing is
/// cached across metrics.
pub fn render(metric_key: &str, cities: &[City]) -> Result<(MapSpec, BarSpec), ViewError> {
    let metric = Metric::from_key(metric_key)
        .ok_or_else(|| ViewError::InvalidMetric(metric_key.to_string()))?;

    let sizes = normalized_sizes(metric, cities);

    let markers = cities
        .iter()
        .zip(&sizes)
        .map(|(city, &size)| {
            let value = metric.value_of(city);
            MarkerSpec {
                name: city.name.clone(),
                lat: city.lat(),
                lon: city.lon(),
                size,
                value,
                tooltip: tooltip(city, metric, value),
            }
        })
        .collect();

    let bars = cities
        .iter()
        .map(|city| {
            let value = metric.value_of(city);
            BarEntry {
                name: city.name.clone(),
                value,
                tooltip: tooltip(city, metric, value),
            }
        })
        .collect();

    let map = MapSpec {
        title: format!("Cities by {}", metric.label()),
        colorbar_title: metric.label().to_string(),
        markers,
    };
    let bar = BarSpec {
        title: format!("{} per city", metric.label()),
        axis_label: metric.label().to_string(),
        bars,
    };
    Ok((map, bar))
}

/// Details for the selected city, or the help text when nothing is selected.
pub fn describe(
    selection: Option<&str>,
    cities: &[City],
    links: &LinkTable,
) -> Result<DetailView, ViewError> {
    let Some(name) = selection else {
        return Ok(DetailView::Help {
            message: HELP_TEXT.to_string(),
        });
    };

    let city = cities
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| ViewError::UnknownCity(name.to_string()))?;

    let lines = Metric::ALL
        .iter()
        .map(|m| format!("{}: {}", m.label(), m.format_value(m.value_of(city))))
        .collect();

    let url = links
        .resolve(&city.name)
        .ok_or_else(|| ViewError::MissingLink(city.name.clone()))?
        .to_string();

    Ok(DetailView::City {
        name: city.name.clone(),
        lines,
        url,
    })
}

/// Linear scaling of the metric's values into [0, MAX_SIZE]. The maximum
/// value maps to exactly MAX_SIZE; a non-positive or non-finite maximum
/// collapses every size to 0.
fn normalized_sizes(metric: Metric, cities: &[City]) -> Vec<f64> {
    let max = cities
        .iter()
        .map(|c| metric.value_of(c))
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return vec![0.0; cities.len()];
    }
    cities
        .iter()
        .map(|c| metric.value_of(c) / max * MAX_SIZE)
        .collect()
}

fn tooltip(city: &City, metric: Metric, value: f64) -> String {
    format!(
        "<b>{}</b><br><b>{}:</b> {}",
        city.name,
        metric.label(),
        metric.format_value(value)
    )
}

/// The two independent pieces of view state. The metric changes only on a
/// successful selection; the city changes only on click or explicit clear.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    metric: Metric,
    selected: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            metric: Metric::Population,
            selected: None,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Switches the selected metric. A key outside the catalog fails and
    /// leaves the previous selection in place.
    pub fn select_metric(&mut self, key: &str) -> Result<Metric, ViewError> {
        let metric =
            Metric::from_key(key).ok_or_else(|| ViewError::InvalidMetric(key.to_string()))?;
        self.metric = metric;
        Ok(metric)
    }

    /// Marks a city as selected. An unknown name fails and leaves the
    /// previous selection in place.
    pub fn select_city(&mut self, cities: &[City], name: &str) -> Result<(), ViewError> {
        if !cities.iter().any(|c| c.name == name) {
            return Err(ViewError::UnknownCity(name.to_string()));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn clear_city(&mut self) {
        self.selected = None;
    }
}
