use std::fs;
use std::path::Path;

use printdesk_core::domain::inventory::InventoryItem;
use printdesk_core::errors::ApplicationError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    items: Vec<InventoryItem>,
}

/// Reads an inventory snapshot laid out as `[[items]]` tables.
pub fn load(path: &Path) -> Result<Vec<InventoryItem>, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Data(format!(
            "could not read inventory file `{}`: {error}",
            path.display()
        ))
    })?;
    parse(&raw).map_err(|error| match error {
        ApplicationError::Data(message) => {
            ApplicationError::Data(format!("inventory file `{}`: {message}", path.display()))
        }
        other => other,
    })
}

pub fn parse(raw: &str) -> Result<Vec<InventoryItem>, ApplicationError> {
    let file: InventoryFile =
        toml::from_str(raw).map_err(|error| ApplicationError::Data(error.to_string()))?;
    if file.items.is_empty() {
        return Err(ApplicationError::Data("no [[items]] entries found".to_string()));
    }
    Ok(file.items)
}

pub fn filter_category(items: Vec<InventoryItem>, category: Option<&str>) -> Vec<InventoryItem> {
    match category {
        Some(category) => items
            .into_iter()
            .filter(|item| item.category.eq_ignore_ascii_case(category.trim()))
            .collect(),
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use printdesk_core::errors::ApplicationError;

    use super::{filter_category, parse};

    const SNAPSHOT: &str = r#"
[[items]]
sku = "FIL-PLA-WHT"
name = "PLA White 1kg"
category = "filament"
current_stock = 12
avg_daily_usage = 8
max_stock_level = 200
unit_cost = 18.00

[[items]]
sku = "ACC-NZL-04"
category = "Parts"
current_stock = 52
avg_daily_usage = 4
max_stock_level = 500
"#;

    #[test]
    fn parses_item_tables() {
        let items = parse(SNAPSHOT).expect("snapshot parses");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "PLA White 1kg");
        assert!(items[1].unit_cost.is_none());
    }

    #[test]
    fn category_filter_ignores_case() {
        let items = parse(SNAPSHOT).expect("snapshot parses");
        let parts = filter_category(items, Some("parts"));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].sku, "ACC-NZL-04");
    }

    #[test]
    fn empty_or_malformed_files_are_data_errors() {
        assert!(matches!(parse(""), Err(ApplicationError::Data(_))));
        assert!(matches!(parse("[[items]]\nsku = 3"), Err(ApplicationError::Data(_))));
    }
}
