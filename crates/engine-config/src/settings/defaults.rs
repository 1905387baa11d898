use crate::settings::entity::{EntityKind, EntityPlan, RecordRule, WriteMode};
use connectors::{erp::Domain, rest::ScopeFilter};

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn plan(
    kind: EntityKind,
    collection: &str,
    filter: Domain,
    field_names: &[&str],
    table: &str,
    write_mode: WriteMode,
) -> EntityPlan {
    EntityPlan {
        name: kind.as_str().to_string(),
        kind,
        collection: collection.to_string(),
        filter,
        fields: fields(field_names),
        table: table.to_string(),
        write_mode,
        rules: Vec::new(),
        window_days: None,
        window_field: "date_order".to_string(),
        page_size: None,
        read_batch_size: None,
        insert_batch_size: None,
    }
}

fn clear_all() -> WriteMode {
    WriteMode::ClearInsert {
        scope: ScopeFilter::all_rows("aumet_id"),
    }
}

/// The five built-in entities, in the order they are synced.
pub fn default_plans() -> Vec<EntityPlan> {
    let mut orders = plan(
        EntityKind::SalesOrders,
        "pos.order",
        Domain::all(),
        &[
            "id",
            "name",
            "partner_id",
            "date_order",
            "amount_total",
            "amount_untaxed",
            "state",
        ],
        "aumet_sales_orders",
        clear_all(),
    );
    orders.rules.push(RecordRule::ExcludeNegative {
        field: "amount_total".to_string(),
    });

    vec![
        orders,
        plan(
            EntityKind::Customers,
            "res.partner",
            Domain::all().condition("customer_rank", ">", 0),
            &["id", "name", "email", "phone", "mobile", "city", "country_id"],
            "aumet_customers",
            clear_all(),
        ),
        plan(
            EntityKind::Products,
            "product.product",
            Domain::all().condition("sale_ok", "=", true),
            &[
                "id",
                "name",
                "default_code",
                "list_price",
                "standard_price",
                "categ_id",
                "qty_available",
            ],
            "aumet_products",
            clear_all(),
        ),
        plan(
            EntityKind::Inventory,
            "stock.quant",
            Domain::all().condition("quantity", ">", 0),
            &[
                "id",
                "product_id",
                "location_id",
                "quantity",
                "reserved_quantity",
            ],
            "aumet_inventory",
            WriteMode::ClearInsert {
                scope: ScopeFilter::all_rows("product_id"),
            },
        ),
        plan(
            EntityKind::Suppliers,
            "res.partner",
            Domain::all().condition("supplier_rank", ">", 0),
            &[
                "id",
                "name",
                "email",
                "phone",
                "mobile",
                "street",
                "city",
                "country_id",
            ],
            "suppliers",
            WriteMode::Upsert {
                conflict_column: "aumet_id".to_string(),
            },
        ),
    ]
}
