pub mod report_catalog;
