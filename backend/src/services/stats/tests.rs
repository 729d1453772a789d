//! Report scenarios: raw documents in, rows out

#[cfg(test)]
mod tests {
    use crate::models::{ClusterMetadata, DatabaseId, IdentifierFormat, ServerId, TableId};
    use crate::services::stats::*;
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    struct Cluster {
        db: DatabaseId,
        table: TableId,
        server_a: ServerId,
        server_b: ServerId,
        metadata: ClusterMetadata,
    }

    fn cluster() -> Cluster {
        let db = DatabaseId::new_v4();
        let table = TableId::new_v4();
        let server_a = ServerId::new_v4();
        let server_b = ServerId::new_v4();
        let metadata = ClusterMetadata::new()
            .with_database(db, "test")
            .with_table(table, "users", db)
            .with_server(server_a, "node_a")
            .with_server(server_b, "node_b");
        Cluster { db, table, server_a, server_b, metadata }
    }

    fn table_doc(table: &TableId, keys_read: f64, keys_set: f64) -> Value {
        json!({
            "query_engine": { "queries_per_sec": keys_read, "queries_total": 100 },
            table.to_string(): {
                "serializers": {
                    "shard_0": {
                        "btree-primary": {
                            "keys_read": keys_read,
                            "keys_set": keys_set,
                            "total_keys_read": keys_read * 10.0,
                            "total_keys_set": keys_set * 10.0
                        }
                    }
                }
            }
        })
    }

    fn parse(docs: Vec<(ServerId, Option<Value>)>) -> ParsedStats {
        StatsParser::new().parse(&docs.into_iter().collect::<BTreeMap<_, _>>()).unwrap()
    }

    fn number(row: &Value, pointer: &str) -> f64 {
        row.pointer(pointer)
            .and_then(Value::as_f64)
            .unwrap_or_else(|| panic!("missing {} in {}", pointer, row))
    }

    fn has_negative_zero(value: &Value) -> bool {
        match value {
            Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0 && f.is_sign_negative()),
            Value::Array(items) => items.iter().any(has_negative_zero),
            Value::Object(fields) => fields.values().any(has_negative_zero),
            _ => false,
        }
    }

    mod cluster_tests {
        use super::*;

        #[test]
        fn test_cluster_sums_queries_per_sec() {
            let c = cluster();
            let stats = parse(vec![
                (c.server_a, Some(json!({ "query_engine": { "queries_per_sec": 5 } }))),
                (c.server_b, Some(json!({ "query_engine": { "queries_per_sec": 3 } }))),
            ]);
            let row = StatsRequest::Cluster
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();

            assert_eq!(row["id"], json!(["cluster"]));
            assert_eq!(number(&row, "/query_engine/queries_per_sec"), 8.0);
            assert_eq!(number(&row, "/query_engine/client_connections"), 0.0);
            assert!(row.get("error").is_none());
        }

        #[test]
        fn test_cluster_counts_unresponsive_as_zero() {
            let c = cluster();
            let stats = parse(vec![
                (c.server_a, Some(table_doc(&c.table, 4.0, 1.0))),
                (c.server_b, None),
            ]);
            let row = StatsRequest::Cluster
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();
            assert_eq!(number(&row, "/query_engine/read_docs_per_sec"), 4.0);
            assert_eq!(number(&row, "/query_engine/written_docs_per_sec"), 1.0);
        }

        #[test]
        fn test_empty_cluster_renders_plain_zeros() {
            let c = cluster();
            let stats = parse(vec![(c.server_a, Some(json!({ "query_engine": {} })))]);
            for request in [
                StatsRequest::Cluster,
                StatsRequest::Table { table_id: c.table },
                StatsRequest::Server { server_id: c.server_a },
            ] {
                let row = request.to_result(&stats, &c.metadata, IdentifierFormat::Name).unwrap().unwrap();
                assert!(!has_negative_zero(&row), "negative zero in {}", row);
            }

            let empty = StatsRequest::Cluster
                .to_result(&parse(vec![]), &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();
            assert_eq!(empty["query_engine"]["queries_per_sec"].to_string(), "0.0");
        }
    }

    mod table_tests {
        use super::*;

        #[test]
        fn test_table_sums_across_nodes() {
            let c = cluster();
            let other = TableId::new_v4();
            let mut doc_b = table_doc(&c.table, 2.0, 3.0);
            doc_b[other.to_string()] = json!({
                "serializers": { "shard_0": { "btree-primary": { "keys_read": 100 } } }
            });
            let stats = parse(vec![
                (c.server_a, Some(table_doc(&c.table, 5.0, 1.0))),
                (c.server_b, Some(doc_b)),
            ]);
            let row = StatsRequest::Table { table_id: c.table }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();

            assert_eq!(row["id"], json!(["table", c.table.to_string()]));
            assert_eq!(row["db"], json!("test"));
            assert_eq!(row["table"], json!("users"));
            assert_eq!(number(&row, "/query_engine/read_docs_per_sec"), 7.0);
            assert_eq!(number(&row, "/query_engine/written_docs_per_sec"), 4.0);
            assert!(row.get("server").is_none());
        }

        #[test]
        fn test_deleted_table_has_no_row() {
            let mut c = cluster();
            let stats = parse(vec![(c.server_a, Some(table_doc(&c.table, 1.0, 1.0)))]);
            c.metadata.delete_table(&c.table);

            let request = StatsRequest::Table { table_id: c.table };
            assert!(!request.exists(&c.metadata));
            assert_eq!(request.to_result(&stats, &c.metadata, IdentifierFormat::Name).unwrap(), None);
        }

        #[test]
        fn test_deleted_database_uses_placeholder_name() {
            let mut c = cluster();
            c.metadata.delete_database(&c.db);
            let stats = parse(vec![(c.server_a, None)]);
            let row = StatsRequest::Table { table_id: c.table }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();
            assert_eq!(row["db"], json!(DELETED_DATABASE_NAME));
        }

        #[test]
        fn test_uuid_identifier_format() {
            let c = cluster();
            let stats = parse(vec![(c.server_a, None)]);
            let row = StatsRequest::Table { table_id: c.table }
                .to_result(&stats, &c.metadata, IdentifierFormat::Uuid)
                .unwrap()
                .unwrap();
            assert_eq!(row["db"], json!(c.db.to_string()));
            assert_eq!(row["table"], json!(c.table.to_string()));
        }
    }

    mod server_tests {
        use super::*;

        #[test]
        fn test_server_timeout() {
            let c = cluster();
            let stats = parse(vec![(c.server_a, None)]);
            let row = StatsRequest::Server { server_id: c.server_a }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();

            assert_eq!(row["server"], json!("node_a"));
            assert_eq!(row["error"], json!("Timed out. Unable to retrieve stats."));
            assert!(row.get("query_engine").is_none());
        }

        #[test]
        fn test_server_not_collected_is_timeout() {
            let c = cluster();
            let stats = parse(vec![]);
            let row = StatsRequest::Server { server_id: c.server_b }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();
            assert_eq!(row["error"], json!(TIMEOUT_ERROR));
        }

        #[test]
        fn test_server_counters() {
            let c = cluster();
            let other = TableId::new_v4();
            let mut doc = table_doc(&c.table, 5.0, 2.0);
            doc["query_engine"]["client_connections"] = json!(4);
            doc[other.to_string()] = json!({
                "serializers": { "shard_3": { "btree-primary": { "keys_read": 1, "total_keys_set": 6 } } }
            });
            let stats = parse(vec![(c.server_a, Some(doc)), (c.server_b, Some(table_doc(&c.table, 50.0, 0.0)))]);
            let row = StatsRequest::Server { server_id: c.server_a }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();

            assert_eq!(number(&row, "/query_engine/client_connections"), 4.0);
            assert_eq!(number(&row, "/query_engine/queries_per_sec"), 5.0);
            assert_eq!(number(&row, "/query_engine/queries_total"), 100.0);
            assert_eq!(number(&row, "/query_engine/read_docs_per_sec"), 6.0);
            assert_eq!(number(&row, "/query_engine/read_docs_total"), 50.0);
            assert_eq!(number(&row, "/query_engine/written_docs_total"), 26.0);
        }

        #[test]
        fn test_unknown_server_has_no_row() {
            let c = cluster();
            let stats = parse(vec![]);
            let row = StatsRequest::Server { server_id: ServerId::new_v4() }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap();
            assert!(row.is_none());
        }
    }

    mod table_server_tests {
        use super::*;

        #[test]
        fn test_full_storage_engine_block() {
            let c = cluster();
            let doc = json!({
                c.table.to_string(): {
                    "serializers": {
                        "shard_0": {
                            "btree-primary": { "keys_read": 10 },
                            "cache": { "in_use_bytes": 1000 }
                        },
                        "serializer": {
                            "serializer_data_extents": 2,
                            "serializer_lba_extents": 1,
                            "serializer_old_garbage_block_bytes": 50,
                            "serializer_bytes_in_use": 500000
                        }
                    }
                }
            });
            let docs = BTreeMap::from([(c.server_a, Some(doc))]);
            let stats = StatsParser::with_extent_size(1_000_000).parse(&docs).unwrap();
            let row = StatsRequest::TableServer { table_id: c.table, server_id: c.server_a }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();

            assert_eq!(row["id"], json!(["table_server", c.table.to_string(), c.server_a.to_string()]));
            assert_eq!(row["server"], json!("node_a"));
            assert_eq!(row["table"], json!("users"));
            assert_eq!(number(&row, "/query_engine/read_docs_per_sec"), 10.0);
            assert_eq!(number(&row, "/storage_engine/cache/in_use_bytes"), 1000.0);
            assert_eq!(number(&row, "/storage_engine/disk/read_bytes_per_sec"), 0.0);
            assert_eq!(number(&row, "/storage_engine/disk/space_usage/data_bytes"), 2_000_000.0);
            assert_eq!(number(&row, "/storage_engine/disk/space_usage/metadata_bytes"), 1_000_000.0);
            assert_eq!(number(&row, "/storage_engine/disk/space_usage/garbage_bytes"), 50.0);
            assert_eq!(number(&row, "/storage_engine/disk/space_usage/preallocated_bytes"), -2_500_050.0);
        }

        #[test]
        fn test_responsive_node_without_table_data_reports_zeros() {
            let c = cluster();
            let stats = parse(vec![(c.server_a, Some(json!({ "query_engine": {} })))]);
            let row = StatsRequest::TableServer { table_id: c.table, server_id: c.server_a }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();
            assert!(row.get("error").is_none());
            assert_eq!(number(&row, "/query_engine/written_docs_total"), 0.0);
            assert_eq!(number(&row, "/storage_engine/disk/space_usage/preallocated_bytes"), 0.0);
        }

        #[test]
        fn test_timeout_keeps_identity_fields() {
            let c = cluster();
            let stats = parse(vec![(c.server_b, None)]);
            let row = StatsRequest::TableServer { table_id: c.table, server_id: c.server_b }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap()
                .unwrap();
            let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["id", "server", "db", "table", "error"]);
        }

        #[test]
        fn test_deleted_server_has_no_row() {
            let mut c = cluster();
            c.metadata.delete_server(&c.server_a);
            let stats = parse(vec![(c.server_a, Some(table_doc(&c.table, 1.0, 1.0)))]);
            let row = StatsRequest::TableServer { table_id: c.table, server_id: c.server_a }
                .to_result(&stats, &c.metadata, IdentifierFormat::Name)
                .unwrap();
            assert!(row.is_none());
        }
    }
}
