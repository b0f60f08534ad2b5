use geo::Point;
use serde::{Deserialize, Serialize};

/// One city record: unique name, position, and all metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub location: Point<f64>,
    pub population: f64,
    pub median_income: f64,
    pub growth_rate: f64, // percentage points, e.g. 3.5 = 3.5%
    pub intersections: f64,
    pub traffic_spending: f64,
}

impl City {
    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }
}

/// The closed, ordered catalog of selectable metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Population,
    MedianIncome,
    GrowthRate,
    Intersections,
    TrafficSpending,
}

/// Display rule for a metric's raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Whole number with thousands grouping.
    Count,
    /// Two decimals followed by a percent sign.
    Percent,
    /// Dollar sign plus thousands grouping, whole dollars.
    Currency,
}

impl Metric {
    /// Catalog order, which is also dropdown order.
    pub const ALL: [Metric; 5] = [
        Metric::Population,
        Metric::MedianIncome,
        Metric::GrowthRate,
        Metric::Intersections,
        Metric::TrafficSpending,
    ];

    /// Stable key used in the API and the CSV header.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Population => "population",
            Metric::MedianIncome => "median_income",
            Metric::GrowthRate => "growth_rate",
            Metric::Intersections => "intersections",
            Metric::TrafficSpending => "traffic_spending",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Population => "Population",
            Metric::MedianIncome => "Median Income ($)",
            Metric::GrowthRate => "Growth Rate",
            Metric::Intersections => "Intersections",
            Metric::TrafficSpending => "Traffic Spending ($)",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.iter().copied().find(|m| m.key() == key)
    }

    pub fn format(&self) -> ValueFormat {
        match self {
            Metric::Population | Metric::Intersections => ValueFormat::Count,
            Metric::GrowthRate => ValueFormat::Percent,
            Metric::MedianIncome | Metric::TrafficSpending => ValueFormat::Currency,
        }
    }

    pub fn value_of(&self, city: &City) -> f64 {
        match self {
            Metric::Population => city.population,
            Metric::MedianIncome => city.median_income,
            Metric::GrowthRate => city.growth_rate,
            Metric::Intersections => city.intersections,
            Metric::TrafficSpending => city.traffic_spending,
        }
    }

    /// Raw value rendered per this metric's display rule.
    pub fn format_value(&self, value: f64) -> String {
        match self.format() {
            ValueFormat::Count => group_thousands(value.round() as i64),
            ValueFormat::Percent => format!("{:.2}%", value),
            ValueFormat::Currency => format!("${}", group_thousands(value.round() as i64)),
        }
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_round_trip() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_key(m.key()), Some(m));
        }
        assert_eq!(Metric::from_key("Elevation"), None);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1341000), "1,341,000");
        assert_eq!(group_thousands(-56000), "-56,000");
    }

    #[test]
    fn format_rules() {
        assert_eq!(Metric::Population.format_value(1341000.0), "1,341,000");
        assert_eq!(Metric::GrowthRate.format_value(3.5), "3.50%");
        assert_eq!(Metric::MedianIncome.format_value(85000.0), "$85,000");
        assert_eq!(Metric::TrafficSpending.format_value(3000000.0), "$3,000,000");
    }
}
