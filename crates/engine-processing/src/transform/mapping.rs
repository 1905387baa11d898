use chrono::{DateTime, Utc};
use engine_config::settings::entity::EntityKind;
use model::{core::value::Value, records::row::RowData, records::source::SourceRecord};

const UNKNOWN: &str = "Unknown";
const UNSPECIFIED: &str = "unspecified";

/// Reshapes one source record into a destination row. Every column is
/// always present; absent source fields get their declared default.
pub fn map_record(
    kind: EntityKind,
    table: &str,
    id: i64,
    record: &SourceRecord,
    synced_at: DateTime<Utc>,
) -> RowData {
    let row = RowData::new(table).with("aumet_id", id);
    let row = match kind {
        EntityKind::SalesOrders => sales_order(row, record, synced_at),
        EntityKind::Customers => customer(row, record),
        EntityKind::Products => product(row, record),
        EntityKind::Inventory => inventory(row, record),
        EntityKind::Suppliers => supplier(row, record),
    };
    row.with("synced_at", synced_at)
}

fn text(record: &SourceRecord, field: &str) -> Option<String> {
    record.get_str(field).map(|s| s.trim().to_string())
}

fn text_or(record: &SourceRecord, field: &str, default: &str) -> String {
    text(record, field).unwrap_or_else(|| default.to_string())
}

fn amount(record: &SourceRecord, field: &str) -> f64 {
    record.get_f64(field).unwrap_or(0.0)
}

fn phone(record: &SourceRecord) -> Option<String> {
    text(record, "phone").or_else(|| text(record, "mobile"))
}

fn sales_order(row: RowData, record: &SourceRecord, synced_at: DateTime<Utc>) -> RowData {
    let date_order = match text(record, "date_order") {
        Some(date) => Value::String(date),
        None => Value::Timestamp(synced_at),
    };
    row.with("name", text_or(record, "name", ""))
        .with("partner_id", record.relation_id("partner_id"))
        .with(
            "customer_name",
            record.relation_label("partner_id").unwrap_or(UNKNOWN),
        )
        .with("date_order", date_order)
        .with("amount_total", amount(record, "amount_total"))
        .with("amount_untaxed", amount(record, "amount_untaxed"))
        .with("state", text_or(record, "state", "draft"))
}

fn customer(row: RowData, record: &SourceRecord) -> RowData {
    row.with("name", text_or(record, "name", UNKNOWN))
        .with("email", text(record, "email"))
        .with("phone", phone(record))
        .with("city", text(record, "city"))
        .with("country", record.relation_label("country_id"))
}

fn product(row: RowData, record: &SourceRecord) -> RowData {
    row.with("name", text_or(record, "name", UNKNOWN))
        .with("default_code", text(record, "default_code"))
        .with("list_price", amount(record, "list_price"))
        .with("standard_price", amount(record, "standard_price"))
        .with(
            "category",
            record.relation_label("categ_id").unwrap_or(UNSPECIFIED),
        )
        .with("qty_available", amount(record, "qty_available"))
}

fn inventory(row: RowData, record: &SourceRecord) -> RowData {
    let quantity = amount(record, "quantity");
    let reserved = amount(record, "reserved_quantity");
    row.with("product_id", record.relation_id("product_id"))
        .with(
            "product_name",
            record.relation_label("product_id").unwrap_or("unknown"),
        )
        .with(
            "location",
            record.relation_label("location_id").unwrap_or(UNSPECIFIED),
        )
        .with("quantity", quantity)
        .with("reserved_quantity", reserved)
        .with("available_quantity", quantity - reserved)
}

fn supplier(row: RowData, record: &SourceRecord) -> RowData {
    let name = text(record, "name");
    let contact_person = name
        .as_deref()
        .and_then(|n| n.split_whitespace().next())
        .unwrap_or(UNSPECIFIED)
        .to_string();

    let parts: Vec<String> = [text(record, "street"), text(record, "city")]
        .into_iter()
        .flatten()
        .chain(record.relation_label("country_id").map(str::to_string))
        .collect();
    let address = (!parts.is_empty()).then(|| parts.join(", "));

    row.with("name", name.unwrap_or_else(|| "unknown supplier".to_string()))
        .with("contact_person", contact_person)
        .with("email", text(record, "email"))
        .with("phone", phone(record))
        .with("address", address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> SourceRecord {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-10-18T08:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_sales_order_defaults() {
        let row = map_record(
            EntityKind::SalesOrders,
            "aumet_sales_orders",
            7,
            &record(json!({"id": 7, "name": "POS/0007", "partner_id": false, "state": false})),
            now(),
        );

        assert_eq!(row.get_value("aumet_id"), Value::Int(7));
        assert_eq!(row.get_value("partner_id"), Value::Null);
        assert_eq!(row.get_value("customer_name"), Value::from("Unknown"));
        assert_eq!(row.get_value("state"), Value::from("draft"));
        assert_eq!(row.get_value("amount_total"), Value::Float(0.0));
        assert_eq!(row.get_value("date_order"), Value::Timestamp(now()));
        assert_eq!(row.get_value("synced_at"), Value::Timestamp(now()));
    }

    #[test]
    fn test_sales_order_relation() {
        let row = map_record(
            EntityKind::SalesOrders,
            "aumet_sales_orders",
            8,
            &record(json!({
                "id": 8,
                "partner_id": [42, "Al Noor Pharmacy"],
                "date_order": "2026-10-01 10:15:00",
                "amount_total": "19.5"
            })),
            now(),
        );
        assert_eq!(row.get_value("partner_id"), Value::Int(42));
        assert_eq!(row.get_value("customer_name"), Value::from("Al Noor Pharmacy"));
        assert_eq!(row.get_value("date_order"), Value::from("2026-10-01 10:15:00"));
        assert_eq!(row.get_value("amount_total"), Value::Float(19.5));
    }

    #[test]
    fn test_customer_phone_falls_back_to_mobile() {
        let row = map_record(
            EntityKind::Customers,
            "aumet_customers",
            3,
            &record(json!({"id": 3, "name": "Rana", "phone": false, "mobile": "+962700000"})),
            now(),
        );
        assert_eq!(row.get_value("phone"), Value::from("+962700000"));
        assert_eq!(row.get_value("email"), Value::Null);
        assert!(row.get("country").is_some());
    }

    #[test]
    fn test_product_category_default() {
        let row = map_record(
            EntityKind::Products,
            "aumet_products",
            5,
            &record(json!({"id": 5, "name": "Paracetamol 500mg", "categ_id": false})),
            now(),
        );
        assert_eq!(row.get_value("category"), Value::from("unspecified"));
        assert_eq!(row.get_value("list_price"), Value::Float(0.0));
    }

    #[test]
    fn test_inventory_available_quantity() {
        let row = map_record(
            EntityKind::Inventory,
            "aumet_inventory",
            11,
            &record(json!({
                "id": 11,
                "product_id": [5, "Paracetamol 500mg"],
                "location_id": false,
                "quantity": 40.0,
                "reserved_quantity": 12.5
            })),
            now(),
        );
        assert_eq!(row.get_value("available_quantity"), Value::Float(27.5));
        assert_eq!(row.get_value("location"), Value::from("unspecified"));
        assert_eq!(row.get_value("product_name"), Value::from("Paracetamol 500mg"));
    }

    #[test]
    fn test_supplier_address_and_contact() {
        let row = map_record(
            EntityKind::Suppliers,
            "suppliers",
            9,
            &record(json!({
                "id": 9,
                "name": "Hikma Pharmaceuticals",
                "street": "Bayader Wadi Al Seer",
                "city": false,
                "country_id": [110, "Jordan"]
            })),
            now(),
        );
        assert_eq!(row.get_value("contact_person"), Value::from("Hikma"));
        assert_eq!(
            row.get_value("address"),
            Value::from("Bayader Wadi Al Seer, Jordan")
        );

        let bare = map_record(
            EntityKind::Suppliers,
            "suppliers",
            10,
            &record(json!({"id": 10})),
            now(),
        );
        assert_eq!(bare.get_value("name"), Value::from("unknown supplier"));
        assert_eq!(bare.get_value("contact_person"), Value::from("unspecified"));
        assert_eq!(bare.get_value("address"), Value::Null);
    }
}
