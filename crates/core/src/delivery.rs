//! Delivery pricing engine.
//!
//! Maps (destination city, parcel weight, cart subtotal) to a cost and transit
//! time for every delivery method in a [`RateTable`]:
//!
//! ```text
//! cost = (base_cost + weight * per_kg) * zone_modifier
//! ```
//!
//! When the subtotal reaches the free-delivery threshold, every method except
//! express gets a fixed discount, floored at zero.
//!
//! Zone resolution is a case-insensitive substring lookup against hand-kept
//! city lists ordered by tier. Unknown cities and typos fall into the most
//! expensive tier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Delivery method identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Express,
    Standard,
    Economy,
    Pickup,
}

impl MethodKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Standard => "standard",
            Self::Economy => "economy",
            Self::Pickup => "pickup",
        }
    }
}

/// A delivery method and its tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMethod {
    pub kind: MethodKind,
    pub name: String,
    pub base_cost: Decimal,
    pub per_kg: Decimal,
    /// Nominal transit time, e.g. "1-2 дня".
    pub time_label: String,
}

/// The full tariff: methods plus the free-delivery rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub methods: Vec<DeliveryMethod>,
    /// Subtotal at or above which non-express methods are discounted.
    pub free_threshold: Decimal,
    /// Fixed amount taken off non-express methods above the threshold.
    pub free_discount: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            methods: vec![
                DeliveryMethod {
                    kind: MethodKind::Express,
                    name: "Экспресс-доставка".to_string(),
                    base_cost: Decimal::new(500, 0),
                    per_kg: Decimal::new(50, 0),
                    time_label: "2-4 часа".to_string(),
                },
                DeliveryMethod {
                    kind: MethodKind::Standard,
                    name: "Стандартная доставка".to_string(),
                    base_cost: Decimal::new(200, 0),
                    per_kg: Decimal::new(20, 0),
                    time_label: "1-2 дня".to_string(),
                },
                DeliveryMethod {
                    kind: MethodKind::Economy,
                    name: "Экономная доставка".to_string(),
                    base_cost: Decimal::new(100, 0),
                    per_kg: Decimal::new(10, 0),
                    time_label: "3-5 дней".to_string(),
                },
                DeliveryMethod {
                    kind: MethodKind::Pickup,
                    name: "Самовывоз".to_string(),
                    base_cost: Decimal::ZERO,
                    per_kg: Decimal::ZERO,
                    time_label: "В любое время".to_string(),
                },
            ],
            free_threshold: Decimal::new(3000, 0),
            free_discount: Decimal::new(300, 0),
        }
    }
}

impl RateTable {
    /// Look up a method by kind.
    #[must_use]
    pub fn method(&self, kind: MethodKind) -> Option<&DeliveryMethod> {
        self.methods.iter().find(|m| m.kind == kind)
    }
}

/// A destination tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub name: String,
    /// 1 is the cheapest tier, 5 the most expensive.
    pub rank: u8,
    /// Multiplicative surcharge, always >= 1.0.
    pub modifier: Decimal,
}

struct ZoneTier {
    name: &'static str,
    rank: u8,
    /// Modifier in hundredths.
    modifier: i64,
    cities: &'static [&'static str],
}

const ZONE_TIERS: [ZoneTier; 4] = [
    ZoneTier {
        name: "Москва и Санкт-Петербург",
        rank: 1,
        modifier: 100,
        cities: &[
            "москва",
            "moscow",
            "moskva",
            "санкт-петербург",
            "петербург",
            "спб",
            "petersburg",
            "spb",
        ],
    },
    ZoneTier {
        name: "Города-миллионники",
        rank: 2,
        modifier: 120,
        cities: &[
            "новосибирск",
            "екатеринбург",
            "казань",
            "нижний новгород",
            "челябинск",
            "самара",
            "омск",
            "ростов-на-дону",
            "уфа",
            "красноярск",
            "воронеж",
            "пермь",
            "волгоград",
            "novosibirsk",
            "yekaterinburg",
            "ekaterinburg",
            "kazan",
            "nizhny novgorod",
            "chelyabinsk",
            "samara",
            "omsk",
            "rostov",
            "ufa",
            "krasnoyarsk",
            "voronezh",
            "perm",
            "volgograd",
        ],
    },
    ZoneTier {
        name: "Региональные центры",
        rank: 3,
        modifier: 150,
        cities: &[
            "краснодар",
            "саратов",
            "тюмень",
            "тольятти",
            "ижевск",
            "барнаул",
            "ульяновск",
            "иркутск",
            "хабаровск",
            "ярославль",
            "владивосток",
            "махачкала",
            "томск",
            "оренбург",
            "кемерово",
            "krasnodar",
            "saratov",
            "tyumen",
            "irkutsk",
            "khabarovsk",
            "yaroslavl",
            "vladivostok",
            "tomsk",
        ],
    },
    ZoneTier {
        name: "Малые города",
        rank: 4,
        modifier: 180,
        cities: &[
            "тула",
            "калуга",
            "рязань",
            "тверь",
            "владимир",
            "иваново",
            "кострома",
            "смоленск",
            "брянск",
            "курск",
            "орёл",
            "орел",
            "липецк",
            "белгород",
            "тамбов",
            "tula",
            "kaluga",
            "ryazan",
            "tver",
            "vladimir",
        ],
    },
];

const DEFAULT_ZONE_NAME: &str = "Отдалённые населённые пункты";
const DEFAULT_ZONE_RANK: u8 = 5;
const DEFAULT_ZONE_MODIFIER: i64 = 200;

/// Classify a free-text city name into a delivery zone.
///
/// The first tier with a list entry contained in the lowercased input wins;
/// anything unmatched (including blank input) lands in tier 5.
#[must_use]
pub fn resolve_zone(city: &str) -> DeliveryZone {
    let needle = city.trim().to_lowercase();
    if !needle.is_empty() {
        for tier in &ZONE_TIERS {
            if tier.cities.iter().any(|name| needle.contains(name)) {
                return DeliveryZone {
                    name: tier.name.to_string(),
                    rank: tier.rank,
                    modifier: Decimal::new(tier.modifier, 2),
                };
            }
        }
    }
    DeliveryZone {
        name: DEFAULT_ZONE_NAME.to_string(),
        rank: DEFAULT_ZONE_RANK,
        modifier: Decimal::new(DEFAULT_ZONE_MODIFIER, 2),
    }
}

/// Parse a user-entered weight. Accepts `,` or `.` as the decimal separator.
///
/// Blank, unparsable, zero or negative input yields 1 kg.
#[must_use]
pub fn parse_weight(raw: &str) -> Decimal {
    raw.trim()
        .replace(',', ".")
        .parse::<Decimal>()
        .ok()
        .filter(|w| *w > Decimal::ZERO)
        .unwrap_or(Decimal::ONE)
}

/// Cost of one method for one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodQuote {
    pub kind: MethodKind,
    pub name: String,
    /// `base_cost + weight * per_kg`, before zone and threshold.
    pub base_cost: Decimal,
    /// Base cost times the zone modifier.
    pub zoned_cost: Decimal,
    /// Final cost after the free-delivery discount.
    pub cost: Decimal,
    /// Whether the final cost settled to zero.
    pub is_free: bool,
    pub time_label: String,
}

/// Costs for every method to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub zone: DeliveryZone,
    /// Effective weight used for the calculation.
    pub weight: Decimal,
    pub subtotal: Decimal,
    /// Whether the subtotal reached the free-delivery threshold.
    pub threshold_reached: bool,
    /// How much more the cart needs to reach the threshold (zero once reached).
    pub amount_to_threshold: Decimal,
    pub methods: Vec<MethodQuote>,
}

impl DeliveryQuote {
    /// The cheapest method, ties broken by rate-table order.
    #[must_use]
    pub fn cheapest(&self) -> Option<&MethodQuote> {
        self.methods
            .iter()
            .reduce(|best, m| if m.cost < best.cost { m } else { best })
    }
}

/// Price every method of `table` for a destination.
///
/// Pure: no I/O, no clock. `weight <= 0` is treated as 1 kg.
#[must_use]
pub fn quote(city: &str, weight: Decimal, subtotal: Decimal, table: &RateTable) -> DeliveryQuote {
    let zone = resolve_zone(city);
    let weight = if weight > Decimal::ZERO {
        weight
    } else {
        Decimal::ONE
    };
    let threshold_reached = subtotal >= table.free_threshold;

    let methods = table
        .methods
        .iter()
        .map(|method| {
            let base_cost = method.base_cost + weight * method.per_kg;
            let zoned_cost = (base_cost * zone.modifier).round_dp(2);
            let cost = if threshold_reached && method.kind != MethodKind::Express {
                (zoned_cost - table.free_discount).max(Decimal::ZERO)
            } else {
                zoned_cost
            };
            MethodQuote {
                kind: method.kind,
                name: method.name.clone(),
                base_cost,
                zoned_cost,
                cost,
                is_free: cost.is_zero(),
                time_label: method.time_label.clone(),
            }
        })
        .collect();

    DeliveryQuote {
        zone,
        weight,
        subtotal,
        threshold_reached,
        amount_to_threshold: (table.free_threshold - subtotal).max(Decimal::ZERO),
        methods,
    }
}
