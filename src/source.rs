//! Data acquisition boundary.
//!
//! The browser build talks to the host through `viewer::HostDataSource`;
//! native builds and tests use [`CsvDataSource`] or their own
//! implementations of [`DataSource`].

use crate::csv::parse_dataset;
use crate::error::{FlexTableError, Result};
use crate::types::{SummaryData, WorksheetInfo};

/// Something that can supply summary data for a worksheet.
pub trait DataSource {
    /// Prepare the source. Called once before the first fetch.
    fn initialize(&mut self) -> Result<()>;

    fn list_worksheets(&self) -> Result<Vec<WorksheetInfo>>;

    /// Fetch display-formatted rows. `None` selects the first worksheet.
    fn fetch_summary_data(&self, worksheet: Option<&str>) -> Result<SummaryData>;
}

/// Single-worksheet source backed by CSV bytes.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    name: String,
    bytes: Vec<u8>,
    initialized: bool,
}

impl CsvDataSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            initialized: false,
        }
    }
}

impl DataSource for CsvDataSource {
    fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn list_worksheets(&self) -> Result<Vec<WorksheetInfo>> {
        Ok(vec![WorksheetInfo {
            name: self.name.clone(),
            id: self.name.clone(),
        }])
    }

    fn fetch_summary_data(&self, worksheet: Option<&str>) -> Result<SummaryData> {
        if !self.initialized {
            return Err(FlexTableError::DataSource(
                "data source used before initialize".into(),
            ));
        }
        if let Some(requested) = worksheet {
            if requested != self.name {
                return Err(FlexTableError::DataSource(format!(
                    "unknown worksheet {requested}"
                )));
            }
        }
        let (columns, rows) = parse_dataset(&self.bytes)?.into_parts();
        Ok(SummaryData {
            worksheet_name: self.name.clone(),
            columns,
            rows,
            column_types: Vec::new(),
        })
    }
}
