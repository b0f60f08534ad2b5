use crate::config::AppConfig;
use crate::types::{City, Metric};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::Point;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;

const NAME_COLUMN: &str = "city_name";
const LAT_COLUMN: &str = "latitude";
const LON_COLUMN: &str = "longitude";

/// Loads the city table from the configured CSV, or falls back to the
/// built-in sample table when no input is configured.
pub fn load_cities(config: &AppConfig) -> Result<Vec<City>> {
    let cities = match &config.input.cities_csv {
        Some(path) => {
            tracing::info!("Loading cities from {:?}", path);
            let file =
                File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
            read_cities(file)?
        }
        None => {
            tracing::info!("No input configured, using built-in sample table");
            sample_cities()
        }
    };
    tracing::info!("Loaded {} cities", cities.len());
    Ok(cities)
}

/// Parses city records from CSV. Every metric column is required; a row
/// with a missing or unparseable value rejects the whole load rather than
/// being zero-filled, since a phantom zero would skew normalization.
pub fn read_cities<R: Read>(reader: R) -> Result<Vec<City>> {
    let mut rdr = ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();

    let col = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in CSV header", name))
    };

    let name_idx = col(NAME_COLUMN)?;
    let lat_idx = col(LAT_COLUMN)?;
    let lon_idx = col(LON_COLUMN)?;
    let metric_idx: Vec<(Metric, usize)> = Metric::ALL
        .iter()
        .map(|&m| Ok((m, col(m.key())?)))
        .collect::<Result<_>>()?;

    let mut seen = HashSet::new();
    let mut cities = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", row + 1))?;

        let name = record.get(name_idx).unwrap_or("").trim().to_string();
        if name.is_empty() {
            return Err(anyhow!("Row {} has an empty city name", row + 1));
        }
        if !seen.insert(name.clone()) {
            return Err(anyhow!("Duplicate city name '{}'", name));
        }

        let field = |idx: usize, column: &str| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("").trim();
            raw.parse::<f64>().map_err(|_| {
                anyhow!("City '{}': column '{}' has invalid value '{}'", name, column, raw)
            })
        };

        let lat = field(lat_idx, LAT_COLUMN)?;
        let lon = field(lon_idx, LON_COLUMN)?;

        let mut city = City {
            name: name.clone(),
            location: Point::new(lon, lat),
            population: 0.0,
            median_income: 0.0,
            growth_rate: 0.0,
            intersections: 0.0,
            traffic_spending: 0.0,
        };
        for &(metric, idx) in &metric_idx {
            let value = field(idx, metric.key())?;
            match metric {
                Metric::Population => city.population = value,
                Metric::MedianIncome => city.median_income = value,
                Metric::GrowthRate => city.growth_rate = value,
                Metric::Intersections => city.intersections = value,
                Metric::TrafficSpending => city.traffic_spending = value,
            }
        }
        cities.push(city);
    }

    if cities.is_empty() {
        return Err(anyhow!("City table is empty"));
    }

    Ok(cities)
}

/// The built-in Dallas-region sample table.
pub fn sample_cities() -> Vec<City> {
    let rows: [(&str, f64, f64, f64, f64, f64, f64, f64); 7] = [
        ("Dallas", 32.7767, -96.7970, 1341000.0, 50000.0, 1.5, 500.0, 3000000.0),
        ("Plano", 33.0198, -96.6989, 288000.0, 85000.0, 2.0, 200.0, 800000.0),
        ("Arlington", 32.7357, -97.1081, 398000.0, 56000.0, 1.7, 300.0, 1000000.0),
        ("Frisco", 33.1507, -96.8236, 200000.0, 120000.0, 3.5, 180.0, 750000.0),
        ("Denton", 33.2148, -97.1331, 141000.0, 49000.0, 2.0, 170.0, 400000.0),
        ("Richardson", 32.9483, -96.7283, 120000.0, 77000.0, 2.2, 190.0, 600000.0),
        ("Irving", 32.8140, -96.9498, 240000.0, 58000.0, 1.8, 220.0, 1100000.0),
    ];
    rows.iter()
        .map(
            |&(name, lat, lon, pop, income, growth, intersections, spending)| City {
                name: name.to_string(),
                location: Point::new(lon, lat),
                population: pop,
                median_income: income,
                growth_rate: growth,
                intersections,
                traffic_spending: spending,
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "city_name,latitude,longitude,population,median_income,growth_rate,intersections,traffic_spending";

    #[test]
    fn sample_table_is_well_formed() {
        let cities = sample_cities();
        assert_eq!(cities.len(), 7);
        let names: HashSet<_> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 7);
        let dallas = cities.iter().find(|c| c.name == "Dallas").unwrap();
        assert_eq!(dallas.population, 1341000.0);
        assert_eq!(dallas.lat(), 32.7767);
        assert_eq!(dallas.lon(), -96.7970);
    }

    #[test]
    fn reads_valid_csv() {
        let csv = format!(
            "{}\nDallas,32.7767,-96.7970,1341000,50000,1.5,500,3000000\n\
             Plano,33.0198,-96.6989,288000,85000,2.0,200,800000\n",
            HEADER
        );
        let cities = read_cities(csv.as_bytes()).unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].name, "Plano");
        assert_eq!(cities[1].median_income, 85000.0);
    }

    #[test]
    fn rejects_missing_column() {
        let csv = "city_name,latitude,longitude,population\nDallas,32.7,-96.7,1341000\n";
        let err = read_cities(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("median_income"));
    }

    #[test]
    fn rejects_unparseable_value() {
        let csv = format!("{}\nDallas,32.7767,-96.7970,n/a,50000,1.5,500,3000000\n", HEADER);
        let err = read_cities(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("population"));
        assert!(err.to_string().contains("Dallas"));
    }

    #[test]
    fn rejects_duplicate_city() {
        let csv = format!(
            "{}\nDallas,32.7,-96.7,1,2,3,4,5\nDallas,32.8,-96.8,1,2,3,4,5\n",
            HEADER
        );
        let err = read_cities(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn rejects_empty_table() {
        let csv = format!("{}\n", HEADER);
        assert!(read_cities(csv.as_bytes()).is_err());
    }
}
