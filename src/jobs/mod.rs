pub mod job_ingestion;
