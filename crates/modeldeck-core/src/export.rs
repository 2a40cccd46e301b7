//! CSV export: one row per model x provider pair.

use crate::store::Store;
use crate::types::ProviderDetail;

const HEADER: &[&str] = &[
    "Name",
    "Model ID",
    "Provider",
    "Context Length",
    "Max Output",
    "Input Price",
    "Output Price",
    "Latency",
    "Throughput",
    "URL",
];

/// Flatten the whole catalog into CSV bytes.
pub fn export_models_csv(store: &Store) -> Vec<u8> {
    let mut out = String::new();
    write_row(&mut out, HEADER.iter().copied());

    for model in store.list_models() {
        for provider in &model.providers {
            // Records are written with a detail entry per provider, but a
            // hand-edited or partially decoded row may lack one.
            let placeholder;
            let detail = match model.provider_details.get(provider) {
                Some(d) => d,
                None => {
                    placeholder = ProviderDetail::placeholder(String::new());
                    &placeholder
                }
            };
            write_row(
                &mut out,
                [
                    model.name.as_str(),
                    model.model_id.as_str(),
                    provider.as_str(),
                    detail.context.as_str(),
                    detail.max_output.as_str(),
                    detail.input_price.as_str(),
                    detail.output_price.as_str(),
                    detail.latency.as_str(),
                    detail.throughput.as_str(),
                    detail.url.as_str(),
                ]
                .into_iter(),
            );
        }
    }
    out.into_bytes()
}

fn write_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        if needs_quotes(field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelRecord, ProviderDetail};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn store_with_model() -> (Store, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path().join("models.db"));
        store.initialize().unwrap();

        let mut details = BTreeMap::new();
        for provider in ["acme", "zeta"] {
            details.insert(
                provider.to_string(),
                ProviderDetail {
                    context: "32K tokens".into(),
                    max_output: "4K tokens".into(),
                    input_price: "$0.0005/1K tokens".into(),
                    output_price: "$0.0005/1K tokens".into(),
                    latency: "N/A".into(),
                    throughput: "N/A".into(),
                    url: "https://example.com/acme/foo-bar".into(),
                },
            );
        }
        store
            .upsert_model(&ModelRecord {
                name: "Foo, \"Bar\"".into(),
                slug: "foo-bar".into(),
                model_id: "acme/foo-bar".into(),
                providers: vec!["acme".into(), "zeta".into()],
                provider_details: details,
                description: "d".into(),
            })
            .unwrap();
        (store, temp)
    }

    #[test]
    fn test_export_one_row_per_provider() {
        let (store, _temp) = store_with_model();
        let csv = String::from_utf8(export_models_csv(&store)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 providers
        assert!(lines[0].starts_with("Name,Model ID,Provider,"));
        assert!(lines[1].contains(",acme,"));
        assert!(lines[2].contains(",zeta,"));
    }

    #[test]
    fn test_export_quotes_embedded_commas_and_quotes() {
        let (store, _temp) = store_with_model();
        let csv = String::from_utf8(export_models_csv(&store)).unwrap();
        assert!(csv.contains("\"Foo, \"\"Bar\"\"\""));
    }

    #[test]
    fn test_export_empty_store_is_header_only() {
        let temp = TempDir::new().unwrap();
        let store = Store::new(temp.path().join("models.db"));
        store.initialize().unwrap();
        let csv = String::from_utf8(export_models_csv(&store)).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
