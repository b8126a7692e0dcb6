//! The static city-group catalog.
//!
//! Groups partition monitoring locations by offline-computed PM2.5/O₃
//! cross-correlation. Each group carries its insight text, per-city
//! reference data, and a presentation descriptor (axis mode and colors)
//! so the rendering path never branches on group names.

use serde::Serialize;

/// Whether PM2.5 and O₃ share one plot region or render as stacked regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMode {
    /// Two stacked regions: a PM2.5 peak band on top, the main band below.
    Split,
    /// One region with a single combined PM2.5 axis and a secondary O₃ axis.
    Combined,
}

/// Presentation policy attached to a group, consumed by the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Presentation {
    pub axis_mode: AxisMode,
    pub pm25_color: (u8, u8, u8),
    pub o3_color: (u8, u8, u8),
    /// PM2.5 band for the upper panel of a split chart.
    pub pm25_peak_band: (f64, f64),
    /// PM2.5 band for the lower panel, or the whole axis in combined mode.
    pub pm25_main_band: (f64, f64),
}

/// Offline reference data for one monitoring location.
#[derive(Debug, Clone, Serialize)]
pub struct CityProfile {
    #[serde(rename = "City")]
    pub name: &'static str,
    #[serde(rename = "Correlation")]
    pub correlation: f64,
    #[serde(rename = "Characteristics")]
    pub characteristics: &'static str,
}

/// A named, curated partition of cities with its insight and presentation.
#[derive(Debug, Clone)]
pub struct CityGroup {
    pub name: &'static str,
    pub insight: &'static str,
    pub cities: Vec<CityProfile>,
    pub presentation: Presentation,
}

impl CityGroup {
    pub fn city_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cities.iter().map(|c| c.name)
    }

    pub fn profile(&self, city: &str) -> Option<&CityProfile> {
        self.cities.iter().find(|c| c.name == city)
    }

    /// Rows for the detailed-insights table, restricted to the given cities
    /// in the group's own ordering. An empty selection yields an empty table.
    pub fn insight_rows(&self, selected: &[String]) -> Vec<CityProfile> {
        self.cities
            .iter()
            .filter(|c| selected.iter().any(|s| s == c.name))
            .cloned()
            .collect()
    }
}

/// The immutable group catalog, built once at process start.
#[derive(Debug, Clone)]
pub struct GroupCatalog {
    groups: Vec<CityGroup>,
}

pub const SYNERGY_ZONES: &str = "Pollutant Synergy Zones";
pub const MODERATE_ALIGNMENT: &str = "Moderate Alignment Areas";
pub const MILD_DIVERGENCE: &str = "Mild Divergence Zones";
pub const OPPOSITION_ZONES: &str = "Pollutant Opposition Zones";

impl GroupCatalog {
    pub fn groups(&self) -> &[CityGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&CityGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.groups.iter().map(|g| g.name).collect()
    }

    /// The built-in four-group taxonomy with offline correlations.
    pub fn builtin() -> Self {
        let profile = |name, correlation, characteristics| CityProfile {
            name,
            correlation,
            characteristics,
        };

        let groups = vec![
            CityGroup {
                name: SYNERGY_ZONES,
                insight: "Pollutant Synergy Zones: Inland areas where wildfires or urban \
                    emissions boost both pollutants. During wildfire seasons (May-Sep, yellow \
                    boxes), Buffalo Narrows shows sharp PM2.5 spikes, peaking at ~120 µg/m³ in \
                    July 2017, while O₃ also rises, reaching ~0.035 ppm, reflecting synergy \
                    from photochemical reactions with wildfire VOCs. Winnipeg_Ellens exhibits \
                    smaller PM2.5 peaks (~20 µg/m³ in July 2021) but steady O₃ increases (up \
                    to 0.03 ppm), likely due to urban emissions enhancing O₃ formation.",
                cities: vec![
                    profile("Buffalo Narrows", 0.393, "Wildfire-prone, inland"),
                    profile("Winnipeg_Ellens", 0.457, "Urban, inland"),
                ],
                presentation: Presentation {
                    axis_mode: AxisMode::Split,
                    pm25_color: (0xFF, 0x45, 0x00),
                    o3_color: (0x8A, 0x2B, 0xE2),
                    pm25_peak_band: (10.0, 75.0),
                    pm25_main_band: (0.0, 10.0),
                },
            },
            CityGroup {
                name: MODERATE_ALIGNMENT,
                insight: "Moderate Alignment Areas: Mix of urban and wildfire-prone inland \
                    areas with a mild positive link. In wildfire seasons (yellow boxes), \
                    Beaverlodge and Fort Chipewyan show PM2.5 peaks (~50 µg/m³ in July 2021), \
                    with O₃ slightly rising (up to 0.03 ppm), indicating some synergy from \
                    wildfire smoke. Urban areas like Toronto Downtown maintain steady O₃ \
                    (~0.02 ppm) but see smaller PM2.5 increases (~20 µg/m³ in June 2023), \
                    suggesting traffic emissions contribute to both pollutants but with less \
                    wildfire impact.",
                cities: vec![
                    profile("Beaverlodge", 0.166, "Wildfire-prone, inland"),
                    profile("Brandon", 0.263, "Urban, inland"),
                    profile("CHARLOTTETOWN", 0.026, "Coastal, urban"),
                    profile("Calgary Central2", 0.202, "Urban, inland"),
                    profile("Edmonton Central Eas", 0.226, "Urban, inland"),
                    profile("FORT ST JOHN LEARNIN", 0.183, "Wildfire-prone, inland"),
                    profile("Fort Chipewyan", 0.060, "Wildfire-prone, inland"),
                    profile("Kingston", 0.101, "Urban, inland"),
                    profile("Mont-Saint-Michel", 0.073, "Rural, inland"),
                    profile("PRINCE ALBERT", 0.195, "Urban, inland"),
                    profile("Radisson", 0.258, "Wildfire-prone, inland"),
                    profile("Regina", 0.169, "Urban, inland"),
                    profile("Rouyn-Noranda - Parc", 0.161, "Urban, inland"),
                    profile("Saskatoon", 0.105, "Urban, inland"),
                    profile("Sudbury", 0.158, "Urban, inland"),
                    profile("Toronto Downtown", 0.191, "Major urban, inland"),
                ],
                presentation: Presentation {
                    axis_mode: AxisMode::Split,
                    pm25_color: (0xFF, 0x63, 0x47),
                    o3_color: (0x99, 0x32, 0xCC),
                    pm25_peak_band: (10.0, 55.0),
                    pm25_main_band: (0.0, 10.0),
                },
            },
            CityGroup {
                name: MILD_DIVERGENCE,
                insight: "Mild Divergence Zones: Coastal and northern areas with slight \
                    pollutant divergence. During wildfire seasons (yellow boxes), Courtenay \
                    Elementary sees PM2.5 spikes (~60 µg/m³ in July 2021), but O₃ drops to \
                    ~0.02 ppm, likely due to coastal humidity reducing photochemical O₃ \
                    formation. Smithers Muheim Memo shows similar trends, with PM2.5 peaking \
                    at ~50 µg/m³ in August 2018, while O₃ remains low (~0.015 ppm), possibly \
                    from temperature inversions.",
                cities: vec![
                    profile("Auclair", -0.269, "Rural, inland"),
                    profile("Courtenay Elementary", -0.275, "Coastal, urban"),
                    profile("FIREHALL-LABRADORCIT", -0.114, "Coastal, urban"),
                    profile("Notre-Dame-du-Rosair", -0.282, "Coastal, rural"),
                    profile("PRG Plaza 400", -0.159, "Urban, inland"),
                    profile("Smithers Muheim Memo", -0.150, "Rural, inland"),
                    profile("Whitehorse NAPS", -0.136, "Urban, inland"),
                ],
                presentation: Presentation {
                    axis_mode: AxisMode::Split,
                    pm25_color: (0xFA, 0x80, 0x72),
                    o3_color: (0xBA, 0x55, 0xD3),
                    pm25_peak_band: (10.0, 50.0),
                    pm25_main_band: (0.0, 10.0),
                },
            },
            CityGroup {
                name: OPPOSITION_ZONES,
                insight: "Pollutant Opposition Zones: Northern and urban areas with strong \
                    negative correlation. In wildfire seasons (yellow boxes), Bonner Lake and \
                    Sault Ste Marie exhibit massive PM2.5 spikes (up to 40 µg/m³ in July \
                    2021), while O₃ plummets to ~0.005 ppm, likely due to NOₓ titration from \
                    wildfire smoke. Ottawa Downtown shows smaller PM2.5 peaks (~20 µg/m³ in \
                    June 2023) but a sharp O₃ drop to ~0.01 ppm, reflecting urban NOₓ \
                    emissions further suppressing O₃.",
                cities: vec![
                    profile("BATHURST", -0.420, "Coastal, urban"),
                    profile("Bonner Lake", -1.0, "Wildfire-prone, inland"),
                    profile("Dorset", -0.362, "Rural, inland"),
                    profile("Flin Flon", -0.375, "Urban, inland"),
                    profile("North Bay", -0.482, "Urban, inland"),
                    profile("Ottawa Downtown", -0.448, "Major urban, inland"),
                    profile("Parry Sound", -0.352, "Rural, inland"),
                    profile("Quesnel Johnston Ave", -0.436, "Rural, inland"),
                    profile("SYDNEY", -0.540, "Coastal, urban"),
                    profile("Sault Ste Marie", -0.849, "Urban, inland"),
                    profile("Thunder Bay", -0.598, "Urban, inland"),
                ],
                presentation: Presentation {
                    axis_mode: AxisMode::Combined,
                    pm25_color: (0xF0, 0x80, 0x80),
                    o3_color: (0xC7, 0x15, 0x85),
                    pm25_peak_band: (10.0, 20.0),
                    pm25_main_band: (0.0, 20.0),
                },
            },
        ];

        GroupCatalog { groups }
    }
}
