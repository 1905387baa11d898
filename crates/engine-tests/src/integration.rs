#[cfg(test)]
mod tests {
    use crate::utils::{
        ErpCall, FakeErp, Failure, MemoryStore, StoreCall, batches, executor, orders, partners,
        plan, products,
    };
    use engine_config::report::summary::EntityStatus;
    use engine_core::{error::ErrorClass, progress::SyncStage};
    use model::{core::value::Value, records::row::RowData};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    // Scenario: 2500 sales orders, page size 1000, read batch 500, insert batch 1000.
    // Expected Outcome:
    // - Three identifier pages at offsets 0, 1000, 2000.
    // - Five detail reads of 500 ids.
    // - One clear followed by inserts of 1000, 1000 and 500 rows.
    #[traced_test]
    #[tokio::test]
    async fn tc01_batched_sync_of_2500_orders() {
        let erp = FakeErp::new().with_records("pos.order", orders(2500));
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("sales_orders")])
            .await;

        assert!(report.is_success());
        assert_eq!(
            erp.searches("pos.order"),
            vec![(0, 1000), (1000, 1000), (2000, 1000)]
        );
        assert_eq!(erp.reads("pos.order"), vec![500; 5]);
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Clear {
                    table: "aumet_sales_orders".into(),
                    scope: "aumet_id=neq.0".into()
                },
                StoreCall::Insert {
                    table: "aumet_sales_orders".into(),
                    rows: 1000
                },
                StoreCall::Insert {
                    table: "aumet_sales_orders".into(),
                    rows: 1000
                },
                StoreCall::Insert {
                    table: "aumet_sales_orders".into(),
                    rows: 500
                },
            ]
        );
        assert_eq!(store.count("aumet_sales_orders"), 2500);

        let metrics = report.entities[0].metrics;
        assert_eq!(metrics.ids_collected, 2500);
        assert_eq!(metrics.id_pages, 3);
        assert_eq!(metrics.detail_reads, 5);
        assert_eq!(metrics.batches_written, 3);
        assert_eq!(metrics.rows_written, 2500);
        assert!(logs_contain("Entity sync complete"));
    }

    // Scenario: The destination rejects the 2nd of 3 insert batches.
    // Expected Outcome:
    // - The table holds exactly the first 1000 rows.
    // - The entity is reported as a write failure at the WRITE stage.
    // - The next entity still runs.
    #[traced_test]
    #[tokio::test]
    async fn tc02_failed_batch_keeps_committed_rows() {
        let erp = FakeErp::new()
            .with_records("pos.order", orders(2500))
            .with_records("res.partner", partners(3));
        let store = MemoryStore::new().fail_insert("aumet_sales_orders", 2);

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("sales_orders"), plan("customers")])
            .await;

        let orders_report = &report.entities[0];
        assert_eq!(orders_report.status, EntityStatus::Failed);
        assert_eq!(orders_report.failed_stage, Some(SyncStage::Write));
        assert_eq!(orders_report.error_class, Some(ErrorClass::Write));
        assert!(
            orders_report
                .error
                .as_deref()
                .unwrap()
                .contains("1000 already committed")
        );

        let mut ids: Vec<i64> = store
            .rows("aumet_sales_orders")
            .iter()
            .filter_map(|r| r.get_value("aumet_id").as_i64())
            .collect();
        ids.sort();
        assert_eq!(ids, (1..=1000).collect::<Vec<i64>>());

        assert_eq!(report.entities[1].status, EntityStatus::Succeeded);
        assert_eq!(store.count("aumet_customers"), 3);
        assert!(!report.is_success());
        assert!(logs_contain("Entity sync failed"));
    }

    // Scenario: The remote collection is empty.
    // Expected Outcome: No search or read calls; the table is still cleared and left empty.
    #[traced_test]
    #[tokio::test]
    async fn tc03_empty_collection_reads_nothing() {
        let erp = FakeErp::new().with_records("stock.quant", vec![]);
        let store = MemoryStore::new().seed(
            "aumet_inventory",
            vec![RowData::new("aumet_inventory").with("product_id", 5_i64)],
        );

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("inventory")])
            .await;

        assert!(report.is_success());
        assert!(erp.searches("stock.quant").is_empty());
        assert!(erp.reads("stock.quant").is_empty());
        assert_eq!(
            store.calls(),
            vec![StoreCall::Clear {
                table: "aumet_inventory".into(),
                scope: "product_id=neq.0".into()
            }]
        );
        assert_eq!(store.count("aumet_inventory"), 0);
    }

    // Scenario: Orders with totals of -50, 0 and missing optional fields.
    // Expected Outcome:
    // - The -50 order is skipped and counted; the 0 order is written.
    // - Missing fields get their defaults rather than being omitted.
    #[traced_test]
    #[tokio::test]
    async fn tc04_negative_totals_skipped_and_defaults_applied() {
        let erp = FakeErp::new().with_records(
            "pos.order",
            vec![
                json!({"id": 1, "name": "POS/1", "amount_total": -50, "state": "paid"}),
                json!({"id": 2, "name": "POS/2", "amount_total": 0, "partner_id": false, "state": false}),
            ],
        );
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("sales_orders")])
            .await;

        assert_eq!(report.entities[0].metrics.records_skipped, 1);
        let rows = store.rows("aumet_sales_orders");
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.get_value("aumet_id"), Value::Int(2));
        assert_eq!(row.get_value("amount_total"), Value::Float(0.0));
        assert_eq!(row.get_value("amount_untaxed"), Value::Float(0.0));
        assert_eq!(row.get_value("state"), Value::from("draft"));
        assert_eq!(row.get_value("partner_id"), Value::Null);
        assert!(row.get("partner_id").is_some());
        assert!(row.get("synced_at").is_some());
    }

    // Scenario: Product detail reads keep answering 503.
    // Expected Outcome:
    // - The read is attempted three times, then products fail as a transport error.
    // - Customers, which come after, still sync.
    #[traced_test]
    #[tokio::test]
    async fn tc05_transport_failure_isolated_to_entity() {
        let erp = FakeErp::new()
            .with_records("product.product", products(10))
            .with_records("res.partner", partners(4))
            .fail_read("product.product", Failure::Unavailable);
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("products"), plan("customers")])
            .await;

        let products_report = &report.entities[0];
        assert_eq!(products_report.status, EntityStatus::Failed);
        assert_eq!(products_report.failed_stage, Some(SyncStage::ReadDetails));
        assert_eq!(products_report.error_class, Some(ErrorClass::Transport));
        assert_eq!(products_report.metrics.retry_count, 2);
        assert_eq!(erp.reads("product.product"), vec![10; 3]);
        assert!(
            !store
                .calls()
                .iter()
                .any(|c| matches!(c, StoreCall::Clear { table, .. } if table == "aumet_products"))
        );

        assert_eq!(report.entities[1].status, EntityStatus::Succeeded);
        assert_eq!(store.count("aumet_customers"), 4);
        assert_eq!(report.failed(), 1);
        assert!(logs_contain("Transient failure, retrying"));
    }

    // Scenario: The ERP rejects the login.
    // Expected Outcome:
    // - No collection is queried and nothing is written.
    // - The first entity fails at AUTH; the rest are not attempted.
    #[traced_test]
    #[tokio::test]
    async fn tc06_login_rejected_stops_run() {
        let erp = FakeErp::new()
            .with_records("pos.order", orders(5))
            .reject_login();
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("sales_orders"), plan("customers")])
            .await;

        assert_eq!(erp.calls(), vec![ErpCall::Login]);
        assert!(store.calls().is_empty());
        assert!(report.auth_failed());
        assert_eq!(report.entities[0].status, EntityStatus::Failed);
        assert_eq!(report.entities[0].failed_stage, Some(SyncStage::Auth));
        assert_eq!(report.entities[1].status, EntityStatus::Skipped);
        assert_eq!(report.succeeded(), 0);
        assert!(logs_contain("Authentication failed"));
    }

    // Scenario: The session expires while counting the second entity.
    // Expected Outcome: That entity fails with an auth error and the run halts.
    #[traced_test]
    #[tokio::test]
    async fn tc07_session_expiry_halts_remaining_entities() {
        let erp = FakeErp::new()
            .with_records("pos.order", orders(3))
            .with_records("product.product", products(3))
            .fail_count("res.partner", Failure::Auth);
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("sales_orders"), plan("customers"), plan("products")])
            .await;

        let statuses: Vec<EntityStatus> = report.entities.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                EntityStatus::Succeeded,
                EntityStatus::Failed,
                EntityStatus::Skipped
            ]
        );
        assert_eq!(report.entities[1].error_class, Some(ErrorClass::Auth));
        assert_eq!(report.entities[1].failed_stage, Some(SyncStage::Count));
        assert!(erp.searches("product.product").is_empty());
        assert_eq!(store.count("aumet_products"), 0);
    }

    // Scenario: Dry run over customers.
    // Expected Outcome: Records are fetched and transformed, the store is never touched.
    #[traced_test]
    #[tokio::test]
    async fn tc08_dry_run_writes_nothing() {
        let erp = FakeErp::new().with_records("res.partner", partners(25));
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(10, 5, 10))
            .dry_run(true)
            .execute(&[plan("customers")])
            .await;

        let entity = &report.entities[0];
        assert!(entity.dry_run);
        assert_eq!(entity.status, EntityStatus::Succeeded);
        assert_eq!(entity.metrics.records_transformed, 25);
        assert_eq!(entity.metrics.rows_written, 0);
        assert_eq!(erp.reads("res.partner").len(), 5);
        assert!(store.calls().is_empty());
    }

    // Scenario: Suppliers are synced twice with upsert on aumet_id.
    // Expected Outcome: No clear; the second run updates rows instead of duplicating them.
    #[traced_test]
    #[tokio::test]
    async fn tc09_supplier_upsert_is_idempotent() {
        let erp = FakeErp::new().with_records("res.partner", partners(3));
        let store = MemoryStore::new();
        let exec = executor(&erp, &store, batches(1000, 500, 2));

        exec.execute(&[plan("suppliers")]).await;
        let report = exec.execute(&[plan("suppliers")]).await;

        assert!(report.is_success());
        assert_eq!(store.count("suppliers"), 3);
        assert!(
            store
                .calls()
                .iter()
                .all(|c| matches!(c, StoreCall::Upsert { conflict, .. } if conflict == "aumet_id"))
        );
        assert_eq!(store.calls().len(), 4);

        let row = &store.rows("suppliers")[0];
        assert_eq!(row.get_value("contact_person"), Value::from("Partner"));
        assert_eq!(row.get_value("address"), Value::from("Amman, Jordan"));
        assert_eq!(row.get_value("phone"), Value::from("+962790000000"));
    }

    // Scenario: The detail read for one product comes back without its id.
    // Expected Outcome: It is dropped and counted; the other records are written.
    #[traced_test]
    #[tokio::test]
    async fn tc10_record_without_id_is_dropped() {
        let erp = FakeErp::new()
            .with_records("product.product", products(3))
            .strip_id_on_read("product.product", 2);
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("products")])
            .await;

        let entity = &report.entities[0];
        assert_eq!(entity.status, EntityStatus::Succeeded);
        assert_eq!(entity.metrics.records_dropped, 1);
        assert_eq!(entity.metrics.rows_written, 2);
        assert_eq!(store.count("aumet_products"), 2);
        assert!(logs_contain("Dropping record"));
    }

    // Scenario: Shutdown was requested before the run started.
    // Expected Outcome: Login happens, but no entity is attempted.
    #[traced_test]
    #[tokio::test]
    async fn tc11_cancelled_run_attempts_nothing() {
        let erp = FakeErp::new().with_records("pos.order", orders(3));
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .with_cancel(cancel)
            .execute(&[plan("sales_orders"), plan("customers")])
            .await;

        assert!(
            report
                .entities
                .iter()
                .all(|e| e.status == EntityStatus::Skipped)
        );
        assert_eq!(erp.calls(), vec![ErpCall::Login]);
        assert!(store.calls().is_empty());
        assert!(logs_contain("Shutdown requested"));
    }

    // Scenario: 1001 sales orders, page size 1000, read batch 500, insert batch 1000.
    // Expected Outcome:
    // - Two identifier pages, the second one short.
    // - Detail reads of 500, 500 and 1 ids.
    // - Every id lands in the table exactly once.
    #[traced_test]
    #[tokio::test]
    async fn tc12_uneven_total_rounds_up_calls() {
        let erp = FakeErp::new().with_records("pos.order", orders(1001));
        let store = MemoryStore::new();

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[plan("sales_orders")])
            .await;

        assert!(report.is_success());
        assert_eq!(erp.searches("pos.order"), vec![(0, 1000), (1000, 1000)]);
        assert_eq!(erp.reads("pos.order"), vec![500, 500, 1]);

        let mut ids: Vec<i64> = store
            .rows("aumet_sales_orders")
            .iter()
            .filter_map(|r| r.get_value("aumet_id").as_i64())
            .collect();
        ids.sort();
        assert_eq!(ids, (1..=1001).collect::<Vec<i64>>());
        assert_eq!(report.entities[0].metrics.batches_written, 2);
    }

    // Scenario: A sales order plan asks for a date window far beyond the calendar.
    // Expected Outcome:
    // - Sales orders fail at COUNT as a configuration error, before any ERP query.
    // - Customers, which come after, still sync.
    #[traced_test]
    #[tokio::test]
    async fn tc13_unrepresentable_window_fails_entity() {
        let erp = FakeErp::new()
            .with_records("pos.order", orders(3))
            .with_records("res.partner", partners(2));
        let store = MemoryStore::new();
        let mut orders_plan = plan("sales_orders");
        orders_plan.window_days = Some(u32::MAX);

        let report = executor(&erp, &store, batches(1000, 500, 1000))
            .execute(&[orders_plan, plan("customers")])
            .await;

        let orders_report = &report.entities[0];
        assert_eq!(orders_report.status, EntityStatus::Failed);
        assert_eq!(orders_report.failed_stage, Some(SyncStage::Count));
        assert_eq!(orders_report.error_class, Some(ErrorClass::Config));
        assert!(erp.searches("pos.order").is_empty());
        assert!(
            !erp.calls()
                .iter()
                .any(|c| matches!(c, ErpCall::Count { collection } if collection == "pos.order"))
        );

        assert_eq!(report.entities[1].status, EntityStatus::Succeeded);
        assert_eq!(store.count("aumet_customers"), 2);
    }
}
