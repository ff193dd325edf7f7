//! Ingestion tests

use legacy_modernizer::ingest::{IngestConfig, IngestError, TabularIngestor, ingest};

mod record_tests {
    use super::*;

    #[test]
    fn test_one_record_per_data_row() {
        let input = "id,name,city\n1,Ann,Oslo\n2,Bob,Rome\n3,Cy,Lima\n";
        let table = ingest(input).unwrap();

        assert_eq!(table.record_count(), 3);
        for record in &table.records {
            let keys: Vec<&str> = record.keys().map(String::as_str).collect();
            assert_eq!(keys, ["id", "name", "city"]);
        }
    }

    #[test]
    fn test_values_trimmed_and_quote_stripped() {
        let table = ingest("\"id\", \"name\"\n \"7\" , \"Dee\" ").unwrap();
        assert_eq!(table.fields.names(), ["id", "name"]);
        assert_eq!(table.records[0]["id"], "7");
        assert_eq!(table.records[0]["name"], "Dee");
    }

    #[test]
    fn test_short_and_long_lines() {
        let table = ingest("a,b,c\n1\n1,2,3,4,5").unwrap();
        assert_eq!(table.records[0]["a"], "1");
        assert_eq!(table.records[0]["b"], "");
        assert_eq!(table.records[0]["c"], "");
        assert_eq!(table.records[1].len(), 3);
        assert_eq!(table.records[1]["c"], "3");
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let table = ingest("a,b\r\n1,2\r\n\r\n   \r\n3,4\r\n").unwrap();
        assert_eq!(table.record_count(), 2);
        assert_eq!(table.records[1]["b"], "4");
    }

    #[test]
    fn test_reparse_is_identical() {
        let input = "name,email\nA,a@x.com\nB,b@y.com";
        assert_eq!(ingest(input).unwrap(), ingest(input).unwrap());
    }

    #[test]
    fn test_quoted_delimiter_is_split() {
        // Delimiters inside quotes are not protected
        let table = ingest("name,city\n\"Smith, J\",Oslo").unwrap();
        assert_eq!(table.records[0]["name"], "Smith");
        assert_eq!(table.records[0]["city"], "J");
    }
}

mod sample_tests {
    use super::*;

    #[test]
    fn test_sample_header_plus_four_rows() {
        let input = "n\n1\n2\n3\n4\n5\n6";
        let table = ingest(input).unwrap();
        assert_eq!(table.sample, "n\n1\n2\n3\n4");
        assert_eq!(table.record_count(), 6);
    }

    #[test]
    fn test_sample_keeps_blank_lines_and_carriage_returns() {
        let table = ingest("a,b\r\n1,2\r\n\r\n3,4\r\n5,6\r\n7,8").unwrap();
        assert_eq!(table.sample, "a,b\r\n1,2\r\n\r\n3,4\r\n5,6");
        assert_eq!(table.record_count(), 4);
    }

    #[test]
    fn test_sample_shorter_input() {
        let table = ingest("n\n1").unwrap();
        assert_eq!(table.sample, "n\n1");
    }

    #[test]
    fn test_custom_delimiter_and_sample_size() {
        let ingestor =
            TabularIngestor::new(IngestConfig::new().with_delimiter(';').with_sample_lines(2));
        let table = ingestor.ingest("a;b\n1;2\n3;4").unwrap();
        assert_eq!(table.sample, "a;b\n1;2");
        assert_eq!(table.records[1]["a"], "3");
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(matches!(ingest(""), Err(IngestError::Empty)));
        assert!(matches!(ingest(" \n\t\n"), Err(IngestError::Empty)));
    }

    #[test]
    fn test_header_without_names_is_accepted() {
        let table = ingest(",,\n1,2,3").unwrap();
        assert_eq!(table.fields.names(), [""]);
        assert_eq!(table.records[0][""], "3");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = TabularIngestor::default()
            .ingest_bytes(&[0x61, 0x0a, 0xc3, 0x28])
            .unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
        assert!(err.user_message().contains("UTF-8"));
    }
}
