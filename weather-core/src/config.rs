use serde::Serialize;

/// Geographic point queried against the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A named street-level monitoring location.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    /// Stable identifier used in URLs and as the storage partition name.
    pub slug: String,
    pub coordinates: Coordinates,
}

impl Location {
    pub fn new(slug: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            slug: slug.into(),
            coordinates: Coordinates { lat, lon },
        }
    }
}

/// The city-wide station.
#[derive(Debug, Clone, Serialize)]
pub struct CityConfig {
    pub name: String,
    pub coordinates: Coordinates,
}

/// Immutable service configuration, shared by the crawler and the HTTP
/// surface. Constructed once at startup; no ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenWeather API key, supplied via the process environment.
    pub api_key: String,
    pub city: CityConfig,
    pub locations: Vec<Location>,
}

impl Config {
    /// Configuration for the Samarinda deployment: the city-wide station
    /// plus the fixed table of street-level locations.
    pub fn samarinda(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            city: CityConfig {
                name: "Samarinda".to_string(),
                coordinates: Coordinates {
                    lat: -0.494823,
                    lon: 117.143616,
                },
            },
            locations: vec![
                Location::new("slamet-riyadi", -0.5098581857545632, 117.1178542019155),
                Location::new("antasari", -0.49186601488572806, 117.12722378180521),
                Location::new("simpang-agus-salim", -0.4957041096360274, 117.14971318603816),
                Location::new("mugirejo", -0.4687086559524597, 117.19277093628588),
                Location::new("simpang-lembuswana", -0.4754107332727611, 117.14615018774853),
                Location::new("kapten-sudjono", -0.5259576904539937, 117.16653946879711),
                Location::new("brigjend-katamso", -0.4821629316468126, 117.16130648629576),
                Location::new("gatot-subroto", -0.484634868556901, 117.15525241253552),
                Location::new("cendana", -0.4987184574034962, 117.12151672396949),
                Location::new("di-panjaitan", -0.4616283811244264, 117.18572338299191),
                Location::new("damanhuri", -0.4726480049586589, 117.18089748709794),
                Location::new(
                    "pertigaan-pramuka-perjuangan",
                    -0.4648328326253432,
                    117.15584721398068,
                ),
                Location::new(
                    "padat-karya-sempaja-simpang-wanyi",
                    -0.424829289116985,
                    117.15882745064134,
                ),
                Location::new("simpang-sempaja", -0.4500742226015745, 117.15303878168255),
                Location::new("ir-h-juanda", -0.472740909178976, 117.13824418741677),
                Location::new("tengkawang", -0.5016990420031888, 117.11437249596959),
                Location::new("sukorejo", -0.4317621005498969, 117.19535493819562),
            ],
        }
    }

    /// Whether `slug` names a configured street-level location.
    pub fn is_known_location(&self, slug: &str) -> bool {
        self.location(slug).is_some()
    }

    pub fn location(&self, slug: &str) -> Option<&Location> {
        self.locations.iter().find(|loc| loc.slug == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samarinda_table_is_complete() {
        let cfg = Config::samarinda("KEY");

        assert_eq!(cfg.api_key, "KEY");
        assert_eq!(cfg.city.name, "Samarinda");
        assert_eq!(cfg.locations.len(), 17);
    }

    #[test]
    fn known_location_lookup() {
        let cfg = Config::samarinda("KEY");

        assert!(cfg.is_known_location("slamet-riyadi"));
        assert!(cfg.is_known_location("sukorejo"));
        assert!(!cfg.is_known_location("unknown-slug"));
        assert!(!cfg.is_known_location("Samarinda"));

        let loc = cfg.location("tengkawang").expect("tengkawang is configured");
        assert_eq!(loc.coordinates.lat, -0.5016990420031888);
    }
}
