//! Keyword classification of scraped key/value cells.
//!
//! The listing site's stat tables have no fixed schema, so cells are matched
//! against an ordered rule chain, first match wins. Cells no rule recognizes
//! fall through; a `$`-bearing value with an unrecognized key fills the first
//! open price slot (input, then output).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Context,
    MaxOutput,
    Latency,
    Throughput,
    InputPrice,
    OutputPrice,
}

pub struct ExtractRule {
    pub keyword: &'static str,
    pub field: DetailField,
}

/// Ordered: price keywords must come before the bare "output" rule, or an
/// "Output Price" key would be taken for a token limit.
pub const KEY_RULES: &[ExtractRule] = &[
    ExtractRule { keyword: "context",      field: DetailField::Context },
    ExtractRule { keyword: "latency",      field: DetailField::Latency },
    ExtractRule { keyword: "throughput",   field: DetailField::Throughput },
    ExtractRule { keyword: "input",        field: DetailField::InputPrice },
    ExtractRule { keyword: "prompt",       field: DetailField::InputPrice },
    ExtractRule { keyword: "completion",   field: DetailField::OutputPrice },
    ExtractRule { keyword: "output price", field: DetailField::OutputPrice },
    ExtractRule { keyword: "max output",   field: DetailField::MaxOutput },
    ExtractRule { keyword: "output",       field: DetailField::MaxOutput },
];

/// Classify a cell by its key text alone.
pub fn classify_key(key: &str) -> Option<DetailField> {
    let key = key.to_lowercase();
    KEY_RULES
        .iter()
        .find(|rule| key.contains(rule.keyword))
        .map(|rule| rule.field)
}

/// Page-scraped stats for one provider; every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDetail {
    pub context: Option<String>,
    pub max_output: Option<String>,
    pub input_price: Option<String>,
    pub output_price: Option<String>,
    pub latency: Option<String>,
    pub throughput: Option<String>,
}

impl PageDetail {
    /// Run the rule chain over a provider section's cells.
    pub fn from_cells(cells: &[(String, String)]) -> Self {
        let mut detail = PageDetail::default();
        for (key, value) in cells {
            match classify_key(key) {
                Some(field) => detail.set(field, value),
                None if value.contains('$') => {
                    if detail.input_price.is_none() {
                        detail.set(DetailField::InputPrice, value);
                    } else {
                        detail.set(DetailField::OutputPrice, value);
                    }
                }
                None => {}
            }
        }
        detail
    }

    /// First match wins; later cells never overwrite.
    fn set(&mut self, field: DetailField, value: &str) {
        let slot = match field {
            DetailField::Context => &mut self.context,
            DetailField::MaxOutput => &mut self.max_output,
            DetailField::InputPrice => &mut self.input_price,
            DetailField::OutputPrice => &mut self.output_price,
            DetailField::Latency => &mut self.latency,
            DetailField::Throughput => &mut self.throughput,
        };
        if slot.is_none() && !value.trim().is_empty() {
            *slot = Some(value.trim().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_classify_key() {
        assert_eq!(classify_key("Context Length"), Some(DetailField::Context));
        assert_eq!(classify_key("Max Output"), Some(DetailField::MaxOutput));
        assert_eq!(classify_key("Output Price"), Some(DetailField::OutputPrice));
        assert_eq!(classify_key("Input Price"), Some(DetailField::InputPrice));
        assert_eq!(classify_key("Latency (p50)"), Some(DetailField::Latency));
        assert_eq!(classify_key("Throughput"), Some(DetailField::Throughput));
        assert_eq!(classify_key("Uptime"), None);
    }

    #[test]
    fn test_from_cells_typical_table() {
        let detail = PageDetail::from_cells(&cells(&[
            ("Context", "128K tokens"),
            ("Max Output", "4K tokens"),
            ("Input Price", "$0.01/1K tokens"),
            ("Output Price", "$0.03/1K tokens"),
            ("Latency", "0.52s"),
            ("Throughput", "44.1 tps"),
        ]));
        assert_eq!(detail.context.as_deref(), Some("128K tokens"));
        assert_eq!(detail.max_output.as_deref(), Some("4K tokens"));
        assert_eq!(detail.input_price.as_deref(), Some("$0.01/1K tokens"));
        assert_eq!(detail.output_price.as_deref(), Some("$0.03/1K tokens"));
        assert_eq!(detail.latency.as_deref(), Some("0.52s"));
        assert_eq!(detail.throughput.as_deref(), Some("44.1 tps"));
    }

    #[test]
    fn test_dollar_cells_fill_input_then_output() {
        // Unrecognized keys, but the values carry prices.
        let detail = PageDetail::from_cells(&cells(&[
            ("Per request", "$0.001/1K tokens"),
            ("Per reply", "$0.002/1K tokens"),
        ]));
        assert_eq!(detail.input_price.as_deref(), Some("$0.001/1K tokens"));
        assert_eq!(detail.output_price.as_deref(), Some("$0.002/1K tokens"));
    }

    #[test]
    fn test_first_match_wins() {
        let detail = PageDetail::from_cells(&cells(&[
            ("Context", "32K tokens"),
            ("Context window", "64K tokens"),
        ]));
        assert_eq!(detail.context.as_deref(), Some("32K tokens"));
    }

    #[test]
    fn test_unknown_cells_fall_through() {
        let detail = PageDetail::from_cells(&cells(&[("Uptime", "99.9%")]));
        assert_eq!(detail, PageDetail::default());
    }
}
